//! Tuning knobs for the authoritative world.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shmup_core::{BossKind, Bounds, PoolKind, Reward, Vec2};
use thiserror::Error;

/// Aggregated configuration consumed by [`crate::World::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed of the world's random stream (powerup drops, boss spawn jitter).
    pub seed: u64,
    /// Play area; pooled entities leaving it are parked.
    pub bounds: Bounds,
    /// Player ship tuning.
    pub player: PlayerConfig,
    /// Fixed pool capacities.
    pub pools: PoolCapacities,
    /// Formation layout and cadence.
    pub formation: FormationLayout,
    /// Barrier layout.
    pub barriers: BarrierLayout,
    /// Boss statistics.
    pub bosses: BossRosterConfig,
    /// A formation member drops a powerup with odds of one in this value.
    pub powerup_drop_odds: u32,
    /// Fall speed of dropped powerups.
    pub powerup_fall_speed: f32,
    /// Fallback lifetime of an explosion when no completion signal arrives.
    pub explosion_duration_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_cafe_f00d_d00d,
            bounds: Bounds::from_size(800.0, 600.0),
            player: PlayerConfig::default(),
            pools: PoolCapacities::default(),
            formation: FormationLayout::default(),
            barriers: BarrierLayout::default(),
            bosses: BossRosterConfig::default(),
            powerup_drop_odds: 30,
            powerup_fall_speed: 120.0,
            explosion_duration_ms: 400,
        }
    }
}

impl GameConfig {
    /// Checks invariants the world relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.is_empty() {
            return Err(ConfigError::EmptyBounds);
        }
        for kind in PoolKind::ALL {
            if self.pools.capacity(kind) == 0 {
                return Err(ConfigError::ZeroCapacity(kind));
            }
        }
        if self.formation.columns == 0 || self.formation.rows.is_empty() {
            return Err(ConfigError::EmptyFormation);
        }
        if self.formation.min_move_ms == 0 || self.formation.min_shoot_ms == 0 {
            return Err(ConfigError::ZeroCadence);
        }
        if self.powerup_drop_odds == 0 {
            return Err(ConfigError::ZeroDropOdds);
        }
        for kind in BossKind::ALL {
            let stats = self.bosses.stats(kind);
            if stats.hp <= self.bosses.lethal_hp {
                return Err(ConfigError::StillbornBoss {
                    kind,
                    hp: stats.hp,
                    lethal_hp: self.bosses.lethal_hp,
                });
            }
        }
        Ok(())
    }

    /// Fallback lifetime of an explosion effect.
    #[must_use]
    pub const fn explosion_duration(&self) -> Duration {
        Duration::from_millis(self.explosion_duration_ms)
    }
}

/// Errors reported by [`GameConfig::validate`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The play bounds enclose no area.
    #[error("play bounds enclose no area")]
    EmptyBounds,
    /// A pool was configured without slots.
    #[error("{0:?} pool capacity must be positive")]
    ZeroCapacity(PoolKind),
    /// The formation has no rows or no columns.
    #[error("formation needs at least one row and one column")]
    EmptyFormation,
    /// A cadence floor of zero would fire every tick.
    #[error("formation cadence floors must be positive")]
    ZeroCadence,
    /// Powerup odds of one in zero.
    #[error("powerup drop odds must be positive")]
    ZeroDropOdds,
    /// A boss would die before taking a hit.
    #[error("{kind:?} spawns with {hp} hp, at or below the lethal threshold {lethal_hp}")]
    StillbornBoss {
        /// Variant with the offending statistics.
        kind: BossKind,
        /// Configured starting hp.
        hp: i32,
        /// Configured lethal threshold.
        lethal_hp: i32,
    },
}

/// Player ship tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Distance between the ship and the bottom edge.
    pub bottom_margin: f32,
    /// Lives at the start of a scene.
    pub lives: u32,
    /// Upward speed of player bullets.
    pub bullet_speed: f32,
    /// Minimum time between two player bullets.
    pub fire_cooldown_ms: u64,
    /// Hits are ignored for this long after losing a life.
    pub invincibility_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bottom_margin: 40.0,
            lives: 3,
            bullet_speed: 520.0,
            fire_cooldown_ms: 250,
            invincibility_ms: 1_500,
        }
    }
}

/// Fixed capacities of the world's pools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolCapacities {
    /// Player bullet slots.
    pub player_bullets: usize,
    /// Enemy bullet slots shared by the formation and every boss.
    pub enemy_bullets: usize,
    /// Explosion slots.
    pub explosions: usize,
    /// Powerup slots.
    pub powerups: usize,
}

impl Default for PoolCapacities {
    fn default() -> Self {
        Self {
            player_bullets: 16,
            enemy_bullets: 96,
            explosions: 24,
            powerups: 4,
        }
    }
}

impl PoolCapacities {
    /// Capacity configured for the pool.
    #[must_use]
    pub const fn capacity(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::PlayerBullet => self.player_bullets,
            PoolKind::EnemyBullet => self.enemy_bullets,
            PoolKind::Explosion => self.explosions,
            PoolKind::Powerup => self.powerups,
        }
    }
}

/// Appearance and reward of one formation row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTier {
    /// Animation key played for members of the row.
    pub animation: String,
    /// Score granted per kill.
    pub score: u32,
    /// Money granted per kill.
    pub money: u32,
}

impl RowTier {
    fn new(animation: &str, score: u32, money: u32) -> Self {
        Self {
            animation: animation.to_owned(),
            score,
            money,
        }
    }

    pub(crate) fn reward(&self) -> Reward {
        Reward {
            score: self.score,
            money: self.money,
        }
    }
}

/// Formation layout and cadence.
///
/// Cadences shrink by `per_kill_speedup_ms` for every dead member and by
/// `level_speedup_ms` for every level past the first, never dropping below
/// the configured floors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationLayout {
    /// Row tiers from top to bottom.
    pub rows: Vec<RowTier>,
    /// Members per row.
    pub columns: u32,
    /// Position of the top-left member relative to the play area corner.
    pub origin: Vec2,
    /// Column spacing (x) and row spacing (y); descent drops by `gap.y`.
    pub gap: Vec2,
    /// Lateral distance covered by one shift.
    pub step: f32,
    /// Horizontal margin members must keep from the play area edges.
    pub side_margin: f32,
    /// Members breach once they pass this distance above the bottom edge.
    pub breach_margin: f32,
    /// Shift interval of a full formation.
    pub base_move_ms: u64,
    /// Shot interval of a full formation.
    pub base_shoot_ms: u64,
    /// Cadence reduction per dead member.
    pub per_kill_speedup_ms: u64,
    /// Cadence reduction per level past the first.
    pub level_speedup_ms: u64,
    /// Shift interval floor.
    pub min_move_ms: u64,
    /// Shot interval floor.
    pub min_shoot_ms: u64,
    /// Downward speed of formation bullets.
    pub bullet_speed: f32,
}

impl Default for FormationLayout {
    fn default() -> Self {
        Self {
            rows: vec![
                RowTier::new("squid", 30, 3),
                RowTier::new("crab", 20, 2),
                RowTier::new("crab", 20, 2),
                RowTier::new("octopus", 10, 1),
                RowTier::new("octopus", 10, 1),
            ],
            columns: 11,
            origin: Vec2::new(80.0, 60.0),
            gap: Vec2::new(44.0, 32.0),
            step: 10.0,
            side_margin: 24.0,
            breach_margin: 110.0,
            base_move_ms: 700,
            base_shoot_ms: 1_100,
            per_kill_speedup_ms: 12,
            level_speedup_ms: 60,
            min_move_ms: 60,
            min_shoot_ms: 250,
            bullet_speed: 240.0,
        }
    }
}

/// Barrier layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierLayout {
    /// Number of barriers spread evenly across the play area.
    pub count: u32,
    /// Chunk columns per barrier.
    pub columns: u32,
    /// Chunk rows per barrier.
    pub rows: u32,
    /// Edge length of a square chunk.
    pub chunk_size: f32,
    /// Distance between the barrier line and the bottom edge.
    pub bottom_margin: f32,
    /// Starting health of every chunk.
    pub health: f32,
}

impl Default for BarrierLayout {
    fn default() -> Self {
        Self {
            count: 4,
            columns: 6,
            rows: 3,
            chunk_size: 8.0,
            bottom_margin: 120.0,
            health: 3.0,
        }
    }
}

/// Statistics of one boss variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossStats {
    /// Starting hit points; rage begins below half of this.
    pub hp: i32,
    /// Score granted on death.
    pub score: u32,
    /// Money granted on death.
    pub money: u32,
}

impl BossStats {
    pub(crate) fn reward(&self) -> Reward {
        Reward {
            score: self.score,
            money: self.money,
        }
    }
}

/// Statistics of every boss variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossRosterConfig {
    /// Reaper statistics.
    pub reaper: BossStats,
    /// Lupa statistics.
    pub lupa: BossStats,
    /// Pupa statistics.
    pub pupa: BossStats,
    /// Fraction of the source's starting hp and reward a clone receives.
    pub clone_ratio: f32,
    /// A hit that leaves the boss at or below this hp kills it.
    pub lethal_hp: i32,
    /// Distance between the spawn point and the top edge.
    pub spawn_margin: f32,
}

impl Default for BossRosterConfig {
    fn default() -> Self {
        Self {
            reaper: BossStats {
                hp: 60,
                score: 1_500,
                money: 150,
            },
            lupa: BossStats {
                hp: 80,
                score: 2_000,
                money: 200,
            },
            pupa: BossStats {
                hp: 40,
                score: 2_500,
                money: 250,
            },
            clone_ratio: 0.25,
            lethal_hp: 1,
            spawn_margin: 80.0,
        }
    }
}

impl BossRosterConfig {
    /// Statistics configured for the variant.
    #[must_use]
    pub const fn stats(&self, kind: BossKind) -> &BossStats {
        match kind {
            BossKind::Reaper => &self.reaper,
            BossKind::Lupa => &self.lupa,
            BossKind::Pupa => &self.pupa,
        }
    }
}
