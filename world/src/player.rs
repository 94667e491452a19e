use std::time::Duration;

use shmup_core::{Bounds, PlayerHitOutcome, PlayerSnapshot, Vec2};

use crate::config::PlayerConfig;

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) position: Vec2,
    lives: u32,
    shielded: bool,
    invincible_until: Duration,
    next_fire_at: Duration,
}

impl Player {
    pub(crate) fn spawn(config: &PlayerConfig, bounds: &Bounds) -> Self {
        Self {
            position: Self::home(config, bounds),
            lives: config.lives,
            shielded: false,
            invincible_until: Duration::ZERO,
            next_fire_at: Duration::ZERO,
        }
    }

    fn home(config: &PlayerConfig, bounds: &Bounds) -> Vec2 {
        Vec2::new(bounds.center().x, bounds.max().y - config.bottom_margin)
    }

    /// Returns the ship to its starting point without restoring lives.
    pub(crate) fn respawn(&mut self, config: &PlayerConfig, bounds: &Bounds) {
        self.position = Self::home(config, bounds);
        self.invincible_until = Duration::ZERO;
        self.next_fire_at = Duration::ZERO;
    }

    pub(crate) const fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }

    pub(crate) fn grant_shield(&mut self) {
        self.shielded = true;
    }

    /// Starts the fire cooldown when the gun is ready.
    pub(crate) fn try_fire(&mut self, now: Duration, cooldown: Duration) -> bool {
        if self.is_out_of_lives() || now < self.next_fire_at {
            return false;
        }
        self.next_fire_at = now + cooldown;
        true
    }

    pub(crate) fn hit(&mut self, now: Duration, invincibility: Duration) -> PlayerHitOutcome {
        if self.is_out_of_lives() || now < self.invincible_until {
            return PlayerHitOutcome::Ignored;
        }
        if self.shielded {
            self.shielded = false;
            return PlayerHitOutcome::ShieldAbsorbed;
        }
        self.lives -= 1;
        if self.lives == 0 {
            return PlayerHitOutcome::OutOfLives;
        }
        self.invincible_until = now + invincibility;
        PlayerHitOutcome::LifeLost {
            remaining: self.lives,
        }
    }

    pub(crate) fn snapshot(&self, now: Duration) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            lives: self.lives,
            shielded: self.shielded,
            invincible: now < self.invincible_until,
        }
    }
}
