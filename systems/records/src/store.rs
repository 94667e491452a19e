use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::RecordError;

/// Persistence collaborator holding string lists keyed by name.
pub trait RecordStore {
    /// Lines stored under the key; empty when the key was never written.
    fn load(&self, key: &str) -> Result<Vec<String>, RecordError>;

    /// Replaces the lines stored under the key.
    fn save(&mut self, key: &str, lines: &[String]) -> Result<(), RecordError>;
}

/// Store that lives for the duration of the process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    lists: BTreeMap<String, Vec<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Vec<String>, RecordError> {
        Ok(self.lists.get(key).cloned().unwrap_or_default())
    }

    fn save(&mut self, key: &str, lines: &[String]) -> Result<(), RecordError> {
        let _ = self.lists.insert(key.to_owned(), lines.to_vec());
        Ok(())
    }
}

/// Store keeping every list in one JSON object on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the store at the provided path; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RecordError {
        RecordError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, Vec<String>>, RecordError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(self.io_error(error)),
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|source| RecordError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Vec<String>, RecordError> {
        Ok(self.read_all()?.remove(key).unwrap_or_default())
    }

    fn save(&mut self, key: &str, lines: &[String]) -> Result<(), RecordError> {
        let mut lists = self.read_all()?;
        let _ = lists.insert(key.to_owned(), lines.to_vec());
        let text = serde_json::to_string_pretty(&lists).map_err(|source| RecordError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
        }
        fs::write(&self.path, text).map_err(|error| self.io_error(error))?;
        tracing::trace!(path = %self.path.display(), key, "records written");
        Ok(())
    }
}
