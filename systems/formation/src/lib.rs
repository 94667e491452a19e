#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid formation AI that sweeps, descends and picks shooters.
//!
//! The whole formation shares one move clock and one shoot clock; members
//! never keep timers of their own. A tick runs in two passes: [`FormationAi::handle`]
//! emits at most one descent and at most one lateral shift, and once those are
//! applied [`FormationAi::shoot`] picks at most one shooter from the moved
//! formation.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shmup_core::{Command, EnemyId, Event, FormationView, PlayerSnapshot};

/// Configuration parameters required to construct the formation AI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed of the shooter-selection stream.
    pub rng_seed: u64,
    /// Probability that a shot uses the nearest-to-player policy.
    pub nearest_shooter_chance: f64,
}

impl Config {
    /// Creates a configuration with the provided seed and a fair coin.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            nearest_shooter_chance: 0.5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0x0f0e_0d0c_0b0a_0908)
    }
}

/// Policy used to pick the member that fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShooterPolicy {
    /// Member closest to the player.
    Nearest,
    /// Uniformly random member.
    Random,
}

/// Pure system coordinating the formation as one unit.
#[derive(Debug)]
pub struct FormationAi {
    move_clock: Duration,
    shoot_clock: Duration,
    pending_shot: Duration,
    nearest_shooter_chance: f64,
    rng: ChaCha8Rng,
}

impl FormationAi {
    /// Creates the system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            move_clock: Duration::ZERO,
            shoot_clock: Duration::ZERO,
            pending_shot: Duration::ZERO,
            nearest_shooter_chance: config.nearest_shooter_chance.clamp(0.0, 1.0),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes world events and the formation view to emit movement commands.
    ///
    /// The time seen here is banked for the following [`FormationAi::shoot`].
    pub fn handle(
        &mut self,
        events: &[Event],
        formation: &FormationView,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => elapsed = elapsed.saturating_add(*dt),
                Event::LevelStarted { .. } => self.reset(),
                _ => {}
            }
        }
        self.pending_shot = elapsed;

        if formation.is_empty() {
            self.reset();
            return;
        }

        if formation.any_out_of_horizontal_bounds() {
            out.push(Command::DescendFormation);
        }

        if elapsed.is_zero() {
            return;
        }

        let move_cadence = formation.move_cadence();
        if tick_clock(&mut self.move_clock, elapsed, move_cadence) {
            out.push(Command::ShiftFormation);
        }
    }

    /// Evaluates the shoot clock against the formation as it stands after
    /// the movement commands of [`FormationAi::handle`] were applied.
    pub fn shoot(
        &mut self,
        formation: &FormationView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        let elapsed = std::mem::take(&mut self.pending_shot);
        if elapsed.is_zero() || formation.is_empty() {
            return;
        }

        let shoot_cadence = formation.shoot_cadence();
        if tick_clock(&mut self.shoot_clock, elapsed, shoot_cadence) {
            let policy = self.next_policy();
            if let Some(enemy) = self.select_shooter(policy, formation, player) {
                out.push(Command::FireFromGridEnemy { enemy });
            }
        }
    }

    fn reset(&mut self) {
        self.move_clock = Duration::ZERO;
        self.shoot_clock = Duration::ZERO;
        self.pending_shot = Duration::ZERO;
    }

    fn next_policy(&mut self) -> ShooterPolicy {
        if self.rng.gen_bool(self.nearest_shooter_chance) {
            ShooterPolicy::Nearest
        } else {
            ShooterPolicy::Random
        }
    }

    fn select_shooter(
        &mut self,
        policy: ShooterPolicy,
        formation: &FormationView,
        player: &PlayerSnapshot,
    ) -> Option<EnemyId> {
        let member = match policy {
            ShooterPolicy::Nearest => formation.nearest_to(player.position),
            ShooterPolicy::Random => formation.nth(self.rng.gen_range(0..formation.len())),
        }?;
        tracing::trace!(?policy, enemy = member.id.get(), "formation shooter selected");
        Some(member.id)
    }
}

impl Default for FormationAi {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Advances a shared clock; fires at most once per tick and keeps the
/// remainder below one cadence so a long frame never queues a burst.
fn tick_clock(clock: &mut Duration, elapsed: Duration, cadence: Duration) -> bool {
    if cadence.is_zero() {
        return false;
    }
    *clock = clock.saturating_add(elapsed);
    if *clock < cadence {
        return false;
    }
    *clock -= cadence;
    if *clock >= cadence {
        *clock = cadence - Duration::from_nanos(1);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_fires_once_and_caps_backlog() {
        let cadence = Duration::from_millis(100);
        let mut clock = Duration::ZERO;
        assert!(!tick_clock(&mut clock, Duration::from_millis(60), cadence));
        assert!(tick_clock(&mut clock, Duration::from_millis(60), cadence));
        assert_eq!(clock, Duration::from_millis(20));

        assert!(tick_clock(&mut clock, Duration::from_secs(5), cadence));
        assert!(clock < cadence);
    }

    #[test]
    fn zero_cadence_never_fires() {
        let mut clock = Duration::ZERO;
        assert!(!tick_clock(&mut clock, Duration::from_secs(1), Duration::ZERO));
    }
}
