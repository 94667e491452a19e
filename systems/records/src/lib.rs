#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run records: attempt numbering, run times and their persistence.
//!
//! Entries are stored as text lines of the form `#<attempt> <mm>:<ss>:<ms>`
//! in string lists keyed by game mode. Win lists are kept sorted by run time;
//! loss lists stay in the order the runs ended.

use std::{fmt, str::FromStr, time::Duration};

use shmup_core::GameMode;
use thiserror::Error;

mod store;

pub use store::{JsonFileStore, MemoryStore, RecordStore};

/// Failure raised while reading or writing records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A stored line did not follow the `#<attempt> <mm>:<ss>:<ms>` layout.
    #[error("malformed record entry `{0}`")]
    Malformed(String),
    /// The record file could not be read or written.
    #[error("record file `{path}` is not accessible")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The record file does not hold a JSON object of string lists.
    #[error("record file `{path}` is not valid JSON")]
    Json {
        /// File that failed.
        path: String,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Duration of a run with millisecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTime(u64);

impl RunTime {
    /// Creates a run time from whole milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Total milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl From<Duration> for RunTime {
    fn from(duration: Duration) -> Self {
        Self(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for RunTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 60_000;
        let seconds = self.0 / 1_000 % 60;
        let millis = self.0 % 1_000;
        write!(f, "{minutes:02}:{seconds:02}:{millis:03}")
    }
}

impl FromStr for RunTime {
    type Err = RecordError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || RecordError::Malformed(text.to_owned());
        let mut parts = text.trim().split(':');
        let (Some(minutes), Some(seconds), Some(millis), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let number = |part: &str| part.parse::<u64>().map_err(|_| malformed());
        let (minutes, seconds, millis) = (number(minutes)?, number(seconds)?, number(millis)?);
        if seconds >= 60 || millis >= 1_000 {
            return Err(malformed());
        }
        minutes
            .checked_mul(60_000)
            .and_then(|total| total.checked_add(seconds * 1_000 + millis))
            .map(Self)
            .ok_or_else(malformed)
    }
}

/// One finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunEntry {
    /// One-based attempt number within the mode.
    pub attempt: u32,
    /// Time the run lasted.
    pub time: RunTime,
}

impl fmt::Display for RunEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.attempt, self.time)
    }
}

impl FromStr for RunEntry {
    type Err = RecordError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || RecordError::Malformed(text.to_owned());
        let (attempt, time) = text
            .trim()
            .strip_prefix('#')
            .and_then(|rest| rest.split_once(' '))
            .ok_or_else(malformed)?;
        Ok(Self {
            attempt: attempt.parse().map_err(|_| malformed())?,
            time: time.parse().map_err(|_| malformed())?,
        })
    }
}

/// Sorts wins by ascending run time; ties keep the earlier attempt first.
pub fn sort_wins(entries: &mut [RunEntry]) {
    entries.sort_by_key(|entry| (entry.time, entry.attempt));
}

/// Record lists of one game mode backed by a persistence collaborator.
#[derive(Debug)]
pub struct RecordBook<S> {
    store: S,
    mode: GameMode,
}

impl<S: RecordStore> RecordBook<S> {
    /// Opens the records of the provided mode.
    pub fn new(store: S, mode: GameMode) -> Self {
        Self { store, mode }
    }

    /// Store backing the book.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Wins sorted by ascending run time.
    pub fn wins(&self) -> Result<Vec<RunEntry>, RecordError> {
        let mut wins = self.load("wins")?;
        sort_wins(&mut wins);
        Ok(wins)
    }

    /// Losses in the order the runs ended.
    pub fn losses(&self) -> Result<Vec<RunEntry>, RecordError> {
        self.load("losses")
    }

    /// Fastest win, if any.
    pub fn best(&self) -> Result<Option<RunEntry>, RecordError> {
        Ok(self.wins()?.first().copied())
    }

    /// Attempt number the next run will carry.
    pub fn next_attempt(&self) -> Result<u32, RecordError> {
        let last = self
            .wins()?
            .into_iter()
            .chain(self.losses()?)
            .map(|entry| entry.attempt)
            .max()
            .unwrap_or(0);
        Ok(last.saturating_add(1))
    }

    /// Appends a win and keeps the list sorted.
    pub fn record_win(&mut self, time: RunTime) -> Result<RunEntry, RecordError> {
        let entry = RunEntry {
            attempt: self.next_attempt()?,
            time,
        };
        let mut wins = self.wins()?;
        wins.push(entry);
        sort_wins(&mut wins);
        self.save("wins", &wins)?;
        tracing::debug!(mode = self.mode.key(), %entry, "win recorded");
        Ok(entry)
    }

    /// Appends a loss.
    pub fn record_loss(&mut self, time: RunTime) -> Result<RunEntry, RecordError> {
        let entry = RunEntry {
            attempt: self.next_attempt()?,
            time,
        };
        let mut losses = self.losses()?;
        losses.push(entry);
        self.save("losses", &losses)?;
        tracing::debug!(mode = self.mode.key(), %entry, "loss recorded");
        Ok(entry)
    }

    fn key(&self, list: &str) -> String {
        format!("{}.{list}", self.mode.key())
    }

    fn load(&self, list: &str) -> Result<Vec<RunEntry>, RecordError> {
        let key = self.key(list);
        let mut entries = Vec::new();
        for line in self.store.load(&key)? {
            match line.parse() {
                Ok(entry) => entries.push(entry),
                Err(error) => tracing::warn!(%key, %error, "skipping stored record"),
            }
        }
        Ok(entries)
    }

    fn save(&mut self, list: &str, entries: &[RunEntry]) -> Result<(), RecordError> {
        let key = self.key(list);
        let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
        self.store.save(&key, &lines)
    }
}
