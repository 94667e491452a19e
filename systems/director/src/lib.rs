#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level and boss-queue progression for both game modes.
//!
//! The director starts the run, reacts to scene signals and paces boss
//! spawns: a queued boss is released only once no special enemy remains and
//! the configured breather elapsed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shmup_core::{timeline::Timeline, BossKind, BossView, Command, Event, GameMode, SceneSignal};

/// Configuration parameters required to construct the director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Campaign levels divisible by this number bring a boss; zero disables bosses.
    pub boss_every: u32,
    /// Pause between a cleared formation and the next level.
    pub level_delay_ms: u64,
    /// Pause between the arena emptying and the next boss entering.
    pub boss_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boss_every: 3,
            level_delay_ms: 1_200,
            boss_delay_ms: 1_500,
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every queued boss was defeated.
    Won,
    /// The player ran out of lives or the formation broke through.
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cue {
    StartLevel(u32),
    SpawnBoss,
}

/// Pure system sequencing levels and bosses.
#[derive(Debug)]
pub struct Director {
    mode: GameMode,
    config: Config,
    now: Duration,
    level: u32,
    bosses_sent: usize,
    cues: Timeline<Cue>,
    spawn_pending: bool,
    outcome: Option<RunOutcome>,
}

impl Director {
    /// Creates a director for the provided mode.
    #[must_use]
    pub fn new(mode: GameMode, config: Config) -> Self {
        Self {
            mode,
            config,
            now: Duration::ZERO,
            level: 0,
            bosses_sent: 0,
            cues: Timeline::new(),
            spawn_pending: false,
            outcome: None,
        }
    }

    /// Mode being directed.
    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    /// Last level the director started.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Outcome of the run once it ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Emits the commands that open the run.
    pub fn begin(&mut self, out: &mut Vec<Command>) {
        tracing::debug!(mode = self.mode.key(), "run started");
        match self.mode {
            GameMode::Campaign => self.start_level(1, out),
            GameMode::BossRush => out.push(Command::EnqueueBosses {
                kinds: BossKind::ALL.to_vec(),
            }),
        }
    }

    /// Consumes world events and immutable views to emit progression commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        bosses: &BossView,
        queued_bosses: usize,
        out: &mut Vec<Command>,
    ) {
        if self.outcome.is_some() {
            return;
        }
        if let Some(now) = events.iter().rev().find_map(|event| match event {
            Event::TimeAdvanced { now, .. } => Some(*now),
            _ => None,
        }) {
            self.now = now;
        }
        for event in events {
            if let Event::Signal { signal } = event {
                self.on_signal(*signal);
            }
        }
        if self.outcome.is_some() {
            self.cues.clear();
            return;
        }

        let mut released = false;
        let mut due = Vec::new();
        self.cues.drain_due(self.now, &mut due);
        for cue in due {
            match cue {
                Cue::StartLevel(level) => self.start_level(level, out),
                Cue::SpawnBoss => {
                    self.spawn_pending = false;
                    if bosses.living_count() == 0 {
                        out.push(Command::SpawnNextBoss);
                        released = true;
                    }
                }
            }
        }

        // The views predate this batch; a boss released above is not in them yet.
        if !released && !self.spawn_pending && queued_bosses > 0 && bosses.living_count() == 0 {
            let delay = Duration::from_millis(self.config.boss_delay_ms);
            let _ = self.cues.schedule(self.now + delay, Cue::SpawnBoss);
            self.spawn_pending = true;
        }
    }

    fn on_signal(&mut self, signal: SceneSignal) {
        match (signal, self.mode) {
            (SceneSignal::FormationCleared, GameMode::Campaign) => {
                let delay = Duration::from_millis(self.config.level_delay_ms);
                let _ = self
                    .cues
                    .schedule(self.now + delay, Cue::StartLevel(self.level + 1));
            }
            (SceneSignal::BossQueueExhausted, GameMode::BossRush) => {
                self.finish(RunOutcome::Won);
            }
            (SceneSignal::PlayerOutOfLives | SceneSignal::FormationBreached, _) => {
                self.finish(RunOutcome::Lost);
            }
            (SceneSignal::FormationCleared | SceneSignal::BossQueueExhausted, _) => {}
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        if self.outcome.is_none() {
            tracing::debug!(mode = self.mode.key(), ?outcome, level = self.level, "run ended");
            self.outcome = Some(outcome);
        }
    }

    fn start_level(&mut self, level: u32, out: &mut Vec<Command>) {
        self.level = level;
        out.push(Command::StartLevel { level });
        if self.config.boss_every > 0 && level % self.config.boss_every == 0 {
            let kind = BossKind::ALL[self.bosses_sent % BossKind::ALL.len()];
            self.bosses_sent += 1;
            tracing::debug!(level, kind = kind.name(), "boss level");
            out.push(Command::EnqueueBosses { kinds: vec![kind] });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_levels_cycle_through_every_kind() {
        let mut director = Director::new(
            GameMode::Campaign,
            Config {
                boss_every: 1,
                ..Config::default()
            },
        );
        let mut out = Vec::new();
        for level in 1..=4 {
            director.start_level(level, &mut out);
        }
        let kinds: Vec<BossKind> = out
            .iter()
            .filter_map(|command| match command {
                Command::EnqueueBosses { kinds } => kinds.first().copied(),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                BossKind::Reaper,
                BossKind::Lupa,
                BossKind::Pupa,
                BossKind::Reaper
            ]
        );
    }

    #[test]
    fn zero_cadence_never_brings_a_boss() {
        let mut director = Director::new(
            GameMode::Campaign,
            Config {
                boss_every: 0,
                ..Config::default()
            },
        );
        let mut out = Vec::new();
        director.start_level(3, &mut out);
        assert_eq!(out, vec![Command::StartLevel { level: 3 }]);
    }
}
