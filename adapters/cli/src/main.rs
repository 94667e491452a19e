#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that plays the arcade shooter with an autopilot and keeps
//! run records.

mod autopilot;
mod detector;

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shmup_core::{GameMode, SceneSignal};
use shmup_system_director::RunOutcome;
use shmup_system_records::{
    JsonFileStore, MemoryStore, RecordBook, RecordStore, RunEntry, RunTime,
};
use shmup_system_session::{FrameAnimator, Session, SessionConfig, Tally};
use shmup_world::query;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::{autopilot::Autopilot, detector::Detector};

/// Frames an explosion animation lasts in the headless animator.
const EFFECT_FRAMES: u32 = 12;

#[derive(Debug, Parser)]
#[command(name = "shmup", about = "Headless runner for the arcade shooter core")]
struct Cli {
    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Plays one run with the autopilot and records its time.
    Play(PlayArgs),
    /// Lists the recorded runs of a mode.
    Records {
        /// Mode whose records are listed.
        #[arg(long, value_enum, default_value_t = Mode::BossRush)]
        mode: Mode,
        /// JSON file holding the records.
        #[arg(long)]
        records: PathBuf,
    },
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Mode to play; overrides the configuration file.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Run seed; overrides the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Frames simulated before giving up on an unfinished run.
    #[arg(long, default_value_t = 36_000)]
    frames: u32,
    /// Simulated duration of one frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// TOML file with session configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file the run is recorded in; records stay in memory when omitted.
    #[arg(long)]
    records: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Campaign,
    BossRush,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Campaign => GameMode::Campaign,
            Mode::BossRush => GameMode::BossRush,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match Cli::parse().command {
        Action::Play(args) => play(args),
        Action::Records { mode, records } => list_records(mode.into(), &records),
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config: {}", path.display()))
}

fn play(args: PlayArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(seed) = args.seed {
        config.reseed(seed);
    }
    let mode = config.mode;

    let mut session = Session::new(config, FrameAnimator::new(EFFECT_FRAMES), Tally::default())
        .context("invalid session configuration")?;
    let signals = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&signals);
    let _subscription = session.subscribe(move |signal: &SceneSignal| {
        sink.borrow_mut().push(*signal);
    });

    println!("{}", query::welcome_banner(session.world()));
    tracing::info!(mode = mode.key(), frames = args.frames, "run started");

    let pilot = Autopilot;
    let detector = Detector::default();
    let dt = Duration::from_millis(args.frame_ms);
    for _ in 0..args.frames {
        let overlaps = detector.detect(session.world());
        let input = pilot.input(session.world());
        let _ = session.step(dt, input, &overlaps);
        if session.outcome().is_some() {
            break;
        }
    }

    let time = RunTime::from(session.elapsed());
    let tally = *session.scoring();
    println!("  Mode:    {}", mode.key());
    println!("  Level:   {}", query::level(session.world()));
    println!("  Time:    {time}");
    println!("  Score:   {}", tally.score);
    println!("  Money:   {}", tally.money);
    println!("  Signals: {:?}", signals.borrow());

    let Some(outcome) = session.outcome() else {
        tracing::warn!(frames = args.frames, "run did not finish; nothing recorded");
        println!("  Outcome: unfinished");
        return Ok(());
    };
    println!("  Outcome: {outcome:?}");

    match args.records {
        Some(path) => {
            let mut book = RecordBook::new(JsonFileStore::new(&path), mode);
            record(&mut book, outcome, time)
                .with_context(|| format!("failed to record run: {}", path.display()))?;
        }
        None => {
            let mut book = RecordBook::new(MemoryStore::new(), mode);
            record(&mut book, outcome, time).context("failed to record run")?;
        }
    }
    Ok(())
}

fn record<S: RecordStore>(
    book: &mut RecordBook<S>,
    outcome: RunOutcome,
    time: RunTime,
) -> Result<()> {
    let entry = match outcome {
        RunOutcome::Won => book.record_win(time)?,
        RunOutcome::Lost => book.record_loss(time)?,
    };
    println!("  Entry:   {entry}");
    if let Some(best) = book.best()? {
        println!("  Best:    {best}");
    }
    Ok(())
}

fn list_records(mode: GameMode, path: &Path) -> Result<()> {
    let book = RecordBook::new(JsonFileStore::new(path), mode);
    let context = || format!("failed to read records: {}", path.display());
    let print = |title: &str, entries: &[RunEntry]| {
        println!("{title}:");
        for entry in entries {
            println!("  {entry}");
        }
    };
    print("Wins", &book.wins().with_context(context)?);
    print("Losses", &book.losses().with_context(context)?);
    Ok(())
}
