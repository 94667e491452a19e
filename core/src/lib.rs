#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the shooter engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and collaborators to react to deterministically. Systems
//! consume event streams, query immutable views, and respond exclusively with
//! new command batches.

use std::{fmt, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bus;
pub mod timeline;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Formation inbound. Hold the line.";

/// Off-screen position every inactive pooled entity is parked at.
pub const PARKED_POSITION: Vec2 = Vec2::new(-10_000.0, -10_000.0);

/// Animation key requested from the animation collaborator for explosions.
pub const EXPLOSION_ANIMATION: &str = "explosion";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Rebuilds the formation, barriers and pools for the provided level.
    StartLevel {
        /// One-based level number; higher levels tighten formation cadence.
        level: u32,
    },
    /// Appends bosses to the end of the boss queue.
    EnqueueBosses {
        /// Boss variants in the order they should appear.
        kinds: Vec<BossKind>,
    },
    /// Pops the next boss from the queue and spawns it.
    SpawnNextBoss,
    /// Moves the player horizontally toward the provided x coordinate.
    MovePlayer {
        /// Desired x coordinate; clamped to the play bounds.
        x: f32,
    },
    /// Requests a player bullet, subject to the player's fire cooldown.
    FirePlayerBullet,
    /// Flips the formation direction and drops every member one row.
    DescendFormation,
    /// Shifts every living formation member one gap in the current direction.
    ShiftFormation,
    /// Fires an enemy bullet from the current position of a formation member.
    FireFromGridEnemy {
        /// Member selected as the shooter.
        enemy: EnemyId,
    },
    /// Removes a formation member, awarding its score and money.
    KillGridEnemy {
        /// Member that died.
        enemy: EnemyId,
    },
    /// Places a boss at a new position.
    MoveBoss {
        /// Boss being moved.
        boss: BossId,
        /// New position of the boss.
        position: Vec2,
    },
    /// Fires a boss bullet from the boss position with the provided velocity.
    FireBossBullet {
        /// Boss that fires.
        boss: BossId,
        /// Bullet velocity in world units per second.
        velocity: Vec2,
    },
    /// Records the behaviour state a boss entered.
    SetBossState {
        /// Boss whose state changed.
        boss: BossId,
        /// State the boss entered.
        state: BossState,
    },
    /// Spawns a weakened copy of the provided boss at its position.
    CloneBoss {
        /// Boss being cloned.
        boss: BossId,
    },
    /// Applies a single hit to a boss.
    DamageBoss {
        /// Boss that was hit.
        boss: BossId,
    },
    /// Applies a single hit to the player.
    HitPlayer,
    /// Consumes a powerup touched by the player.
    CollectPowerup {
        /// Powerup pool slot that was touched.
        slot: SlotId,
    },
    /// Returns a pooled projectile to its pool.
    DeactivateProjectile {
        /// Projectile being returned.
        handle: PoolHandle,
    },
    /// Plays an explosion effect at the provided position.
    ExplodeAt {
        /// Centre of the explosion.
        position: Vec2,
    },
    /// Signals that an explosion finished playing.
    EffectCompleted {
        /// Effect reported by [`Event::ExplosionStarted`]; stale ones are ignored.
        effect: EffectId,
    },
    /// Subtracts health from a barrier chunk.
    DamageBarrier {
        /// Chunk receiving the damage.
        chunk: ChunkId,
        /// Health removed from the chunk.
        amount: f32,
    },
    /// Removes a barrier chunk outright.
    DestroyBarrier {
        /// Chunk being removed.
        chunk: ChunkId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulation time after the tick.
        now: Duration,
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a level was built.
    LevelStarted {
        /// Level number that started.
        level: u32,
        /// Number of formation members created.
        enemies: u32,
        /// Number of barrier chunks created.
        barrier_chunks: u32,
    },
    /// Confirms that a pooled projectile was activated.
    ProjectileSpawned {
        /// Pool slot that was activated.
        handle: PoolHandle,
        /// Position the projectile starts from.
        position: Vec2,
        /// Velocity assigned to the projectile.
        velocity: Vec2,
    },
    /// Reports that a spawn request was dropped because the pool was full.
    SpawnDropped {
        /// Pool that had no inactive slot left.
        kind: PoolKind,
    },
    /// Confirms that a pooled entity returned to its parked position.
    EntityParked {
        /// Pool slot that was deactivated.
        handle: PoolHandle,
    },
    /// Requests the animation collaborator to play an explosion.
    ExplosionStarted {
        /// Identifier the completion must quote; never reused within a world.
        effect: EffectId,
        /// Explosion pool slot occupied by the effect.
        slot: SlotId,
        /// Centre of the explosion.
        position: Vec2,
        /// Animation key to play.
        animation: &'static str,
    },
    /// Confirms that the formation descended one row and flipped direction.
    FormationDescended {
        /// Direction the formation travels after the descent.
        direction: HorizontalDirection,
    },
    /// Confirms that the formation shifted one gap sideways.
    FormationShifted {
        /// Direction of the shift.
        direction: HorizontalDirection,
    },
    /// Confirms that a formation member died.
    GridEnemyKilled {
        /// Member that died.
        enemy: EnemyId,
        /// Position the member occupied.
        position: Vec2,
    },
    /// Confirms that a powerup was dropped into play.
    PowerupDropped {
        /// Powerup pool slot that was activated.
        slot: SlotId,
        /// Position the powerup starts from.
        position: Vec2,
    },
    /// Confirms that the player picked up a powerup.
    PowerupCollected {
        /// Powerup pool slot that was consumed.
        slot: SlotId,
    },
    /// Confirms that a boss entered play.
    BossSpawned {
        /// Identifier assigned to the boss.
        boss: BossId,
        /// Variant of the boss.
        kind: BossKind,
        /// Spawn position.
        position: Vec2,
        /// Starting hit points.
        hp: i32,
        /// Whether the boss is a clone of another boss.
        clone: bool,
    },
    /// Confirms that a boss lost hit points.
    BossDamaged {
        /// Boss that was hit.
        boss: BossId,
        /// Remaining hit points.
        hp: i32,
    },
    /// Confirms that a boss entered a new behaviour state.
    BossStateChanged {
        /// Boss whose state changed.
        boss: BossId,
        /// State the boss entered.
        state: BossState,
    },
    /// Confirms that a boss died. Emitted exactly once per boss.
    BossDied {
        /// Boss that died.
        boss: BossId,
        /// Variant of the boss.
        kind: BossKind,
        /// Position the boss occupied.
        position: Vec2,
    },
    /// Reports how a hit on the player was resolved.
    PlayerHit {
        /// Resolution of the hit.
        outcome: PlayerHitOutcome,
    },
    /// Confirms that the player gained a shield.
    ShieldGranted,
    /// Announces score and money owed to the scoring collaborator.
    RewardGranted {
        /// Score and money awarded.
        reward: Reward,
    },
    /// Confirms that a barrier chunk lost health.
    BarrierDamaged {
        /// Chunk that was damaged.
        chunk: ChunkId,
        /// Remaining health.
        health: f32,
    },
    /// Confirms that a barrier chunk was removed.
    BarrierDestroyed {
        /// Chunk that was removed.
        chunk: ChunkId,
    },
    /// Terminal or transitional condition routed to the scene collaborator.
    Signal {
        /// Condition that occurred.
        signal: SceneSignal,
    },
}

/// Conditions the core reports to the scene-transition collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneSignal {
    /// Every formation member died.
    FormationCleared,
    /// A formation member crossed its bottom bound.
    FormationBreached,
    /// Every queued boss, clones included, was defeated.
    BossQueueExhausted,
    /// The player lost the last life.
    PlayerOutOfLives,
}

/// Gameplay modes a session can run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Formation levels with a boss every few levels.
    #[default]
    Campaign,
    /// Every boss back to back against the clock.
    BossRush,
}

impl GameMode {
    /// Stable key used for records and logs.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::BossRush => "boss-rush",
        }
    }
}

/// Score and money awarded for a kill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reward {
    /// Points added to the score.
    pub score: u32,
    /// Currency added to the wallet.
    pub money: u32,
}

/// Resolution of a single hit on the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerHitOutcome {
    /// An active shield absorbed the hit and was consumed.
    ShieldAbsorbed,
    /// The player was still invincible from a previous hit.
    Ignored,
    /// The player lost a life and has lives remaining.
    LifeLost {
        /// Lives left after the hit.
        remaining: u32,
    },
    /// The player lost the last life.
    OutOfLives,
}

/// Axis-aligned rectangle in world units. The y axis grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    /// Creates bounds spanning the provided corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates bounds anchored at the origin with the provided size.
    #[must_use]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Lower-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Reports whether the bounds enclose no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Reports whether the point lies inside the bounds, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Clamps the point into the bounds.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Shrinks the bounds by the provided margin on every side.
    #[must_use]
    pub fn inset(&self, margin: f32) -> Self {
        Self::new(
            self.min + Vec2::splat(margin),
            self.max - Vec2::splat(margin),
        )
    }
}

/// Pools owned by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolKind {
    /// Bullets fired by the player.
    PlayerBullet,
    /// Bullets fired by formation members and bosses.
    EnemyBullet,
    /// Explosion effects.
    Explosion,
    /// Falling powerups.
    Powerup,
}

impl PoolKind {
    /// Every pool kind in a stable order.
    pub const ALL: [PoolKind; 4] = [
        PoolKind::PlayerBullet,
        PoolKind::EnemyBullet,
        PoolKind::Explosion,
        PoolKind::Powerup,
    ];
}

/// Index of an entity inside a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Generation of one explosion effect, unique for the lifetime of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(u64);

impl EffectId {
    /// Creates an effect identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Non-owning reference from a pooled entity back to its pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolHandle {
    /// Pool the entity belongs to.
    pub kind: PoolKind,
    /// Slot the entity occupies.
    pub slot: SlotId,
}

impl PoolHandle {
    /// Creates a handle for the slot inside the provided pool.
    #[must_use]
    pub const fn new(kind: PoolKind, slot: SlotId) -> Self {
        Self { kind, slot }
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier assigned to a formation member.
    EnemyId
);
numeric_id!(
    /// Unique identifier assigned to a boss, clones included.
    BossId
);
numeric_id!(
    /// Unique identifier assigned to a barrier chunk.
    ChunkId
);

/// Lateral travel direction shared by the whole formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalDirection {
    /// Travel toward decreasing x.
    Left,
    /// Travel toward increasing x.
    Right,
}

impl HorizontalDirection {
    /// Unit sign of the direction along the x axis.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Boss variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BossKind {
    /// Chases the player and clones itself.
    Reaper,
    /// Sweeps the barriers, then random-walks between roaming and shooting.
    Lupa,
    /// Roams a figure eight and illuminates a triangle of vertices.
    Pupa,
}

impl BossKind {
    /// Every boss variant in queue order.
    pub const ALL: [BossKind; 3] = [BossKind::Reaper, BossKind::Lupa, BossKind::Pupa];

    /// Display name of the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reaper => "Reaper",
            Self::Lupa => "Lupa",
            Self::Pupa => "Pupa",
        }
    }
}

/// Behaviour states of the Reaper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaperState {
    /// Pursues the player's x coordinate.
    Chasing,
    /// Travels to a random point.
    Roaming,
    /// Fires while tracing an ellipse.
    ShootEllipse,
    /// Fires while tracing a bezier curve.
    ShootBezier,
    /// Fires while tracing a lemniscate.
    ShootLemniscate,
}

/// Behaviour states of Lupa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LupaState {
    /// One-time entry sweep along the barrier line.
    BarrierSweep,
    /// Travels to the top centre of the play area.
    RoamCenter,
    /// Travels to a random point.
    Roaming,
    /// Fires a rotating spiral while tracing an ellipse.
    ShootSpiral,
    /// Fires aimed shots while tracing a bezier curve.
    ShootAimed,
    /// Holds position and fires a fast rotating spray.
    ShootInPlace,
}

/// Behaviour states of Pupa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PupaState {
    /// Traces a lemniscate around the top of the play area.
    Roaming,
    /// Seeds the triangle traversal, then behaves like [`PupaState::IllumNext`].
    IllumStart,
    /// Travels to the next triangle vertex.
    IllumNext,
    /// Holds at a vertex and fires a rotating stream.
    IllumPause,
}

/// Behaviour state of any boss variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossState {
    /// Reaper state.
    Reaper(ReaperState),
    /// Lupa state.
    Lupa(LupaState),
    /// Pupa state.
    Pupa(PupaState),
}

impl BossState {
    /// Boss variant the state belongs to.
    #[must_use]
    pub const fn kind(self) -> BossKind {
        match self {
            Self::Reaper(_) => BossKind::Reaper,
            Self::Lupa(_) => BossKind::Lupa,
            Self::Pupa(_) => BossKind::Pupa,
        }
    }

    /// Stable string key shown on the state label.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Reaper(ReaperState::Chasing) => "CHASING",
            Self::Reaper(ReaperState::Roaming) => "ROAMING",
            Self::Reaper(ReaperState::ShootEllipse) => "SHOOT1",
            Self::Reaper(ReaperState::ShootBezier) => "SHOOT2",
            Self::Reaper(ReaperState::ShootLemniscate) => "SHOOT3",
            Self::Lupa(LupaState::BarrierSweep) => "BARRIER_SWEEP",
            Self::Lupa(LupaState::RoamCenter) => "ROAM_CENTER",
            Self::Lupa(LupaState::Roaming) => "ROAMING",
            Self::Lupa(LupaState::ShootSpiral) => "SHOOT1",
            Self::Lupa(LupaState::ShootAimed) => "SHOOT2",
            Self::Lupa(LupaState::ShootInPlace) => "SHOOT_INPLACE",
            Self::Pupa(PupaState::Roaming) => "ROAMING",
            Self::Pupa(PupaState::IllumStart) => "ILLUM_START",
            Self::Pupa(PupaState::IllumNext) => "ILLUM_NEXT",
            Self::Pupa(PupaState::IllumPause) => "ILLUM_PAUSE",
        }
    }

    /// Every state of the provided variant.
    #[must_use]
    pub fn all(kind: BossKind) -> &'static [BossState] {
        const REAPER: [BossState; 5] = [
            BossState::Reaper(ReaperState::Chasing),
            BossState::Reaper(ReaperState::Roaming),
            BossState::Reaper(ReaperState::ShootEllipse),
            BossState::Reaper(ReaperState::ShootBezier),
            BossState::Reaper(ReaperState::ShootLemniscate),
        ];
        const LUPA: [BossState; 6] = [
            BossState::Lupa(LupaState::BarrierSweep),
            BossState::Lupa(LupaState::RoamCenter),
            BossState::Lupa(LupaState::Roaming),
            BossState::Lupa(LupaState::ShootSpiral),
            BossState::Lupa(LupaState::ShootAimed),
            BossState::Lupa(LupaState::ShootInPlace),
        ];
        const PUPA: [BossState; 4] = [
            BossState::Pupa(PupaState::Roaming),
            BossState::Pupa(PupaState::IllumStart),
            BossState::Pupa(PupaState::IllumNext),
            BossState::Pupa(PupaState::IllumPause),
        ];
        match kind {
            BossKind::Reaper => &REAPER,
            BossKind::Lupa => &LUPA,
            BossKind::Pupa => &PUPA,
        }
    }

    /// Resolves a state label key for the provided variant.
    ///
    /// Keys are matched case-insensitively against [`BossState::key`].
    pub fn parse(kind: BossKind, key: &str) -> Result<Self, UnknownStateKey> {
        let trimmed = key.trim();
        Self::all(kind)
            .iter()
            .copied()
            .find(|state| state.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStateKey {
                kind,
                key: trimmed.to_owned(),
            })
    }
}

impl fmt::Display for BossState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a state label does not name a state of the variant.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("`{key}` is not a {} state", .kind.name())]
pub struct UnknownStateKey {
    /// Variant the key was resolved against.
    pub kind: BossKind,
    /// Key that failed to resolve.
    pub key: String,
}

/// Physical body reported by the overlap collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Body {
    /// The player ship.
    Player,
    /// A player bullet.
    PlayerBullet(SlotId),
    /// An enemy bullet.
    EnemyBullet(SlotId),
    /// A falling powerup.
    Powerup(SlotId),
    /// A formation member.
    GridEnemy(EnemyId),
    /// A boss or boss clone.
    Boss(BossId),
    /// A barrier chunk.
    BarrierChunk(ChunkId),
}

/// Spatial intersection of two bodies detected during a physics step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Overlap {
    /// First body of the pair.
    pub a: Body,
    /// Second body of the pair.
    pub b: Body,
}

impl Overlap {
    /// Creates an overlap between two bodies.
    #[must_use]
    pub const fn new(a: Body, b: Body) -> Self {
        Self { a, b }
    }
}

/// Immutable representation of a pooled entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Pool and slot of the entity.
    pub handle: PoolHandle,
    /// Current position; the parked position while inactive.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Whether the entity is in play.
    pub active: bool,
}

/// Read-only snapshot of every slot in a pool.
#[derive(Clone, Debug, Default)]
pub struct PoolView {
    snapshots: Vec<EntitySnapshot>,
}

impl PoolView {
    /// Creates a view from snapshots ordered by slot.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.handle.slot);
        Self { snapshots }
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.snapshots.len()
    }

    /// Iterator over every slot in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over active slots in slot order.
    pub fn active(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Retrieves the snapshot stored for the slot.
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&slot, |snapshot| snapshot.handle.slot)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Reports whether the slot is currently active.
    #[must_use]
    pub fn is_active(&self, slot: SlotId) -> bool {
        self.get(slot).is_some_and(|snapshot| snapshot.active)
    }
}

/// Immutable representation of a formation member.
#[derive(Clone, Debug, PartialEq)]
pub struct GridEnemySnapshot {
    /// Identifier of the member.
    pub id: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Animation key played for the member's row tier.
    pub animation: String,
    /// Reward granted when the member dies.
    pub reward: Reward,
    /// Smallest x the member may occupy before the formation descends.
    pub min_x: f32,
    /// Largest x the member may occupy before the formation descends.
    pub max_x: f32,
    /// y coordinate past which the member breaches the defence line.
    pub max_y: f32,
}

impl GridEnemySnapshot {
    /// Reports whether the member violates its horizontal bounds.
    #[must_use]
    pub fn is_out_of_horizontal_bounds(&self) -> bool {
        self.position.x < self.min_x || self.position.x > self.max_x
    }
}

/// Read-only snapshot of the formation.
#[derive(Clone, Debug)]
pub struct FormationView {
    direction: HorizontalDirection,
    members: Vec<GridEnemySnapshot>,
    move_cadence: Duration,
    shoot_cadence: Duration,
}

impl FormationView {
    /// Creates a view from member snapshots and formation-level state.
    #[must_use]
    pub fn new(
        direction: HorizontalDirection,
        mut members: Vec<GridEnemySnapshot>,
        move_cadence: Duration,
        shoot_cadence: Duration,
    ) -> Self {
        members.sort_by_key(|member| member.id);
        Self {
            direction,
            members,
            move_cadence,
            shoot_cadence,
        }
    }

    /// Direction the formation currently travels.
    #[must_use]
    pub const fn direction(&self) -> HorizontalDirection {
        self.direction
    }

    /// Interval between lateral shifts at the current enemy count.
    #[must_use]
    pub const fn move_cadence(&self) -> Duration {
        self.move_cadence
    }

    /// Interval between shots at the current enemy count.
    #[must_use]
    pub const fn shoot_cadence(&self) -> Duration {
        self.shoot_cadence
    }

    /// Iterator over living members ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &GridEnemySnapshot> {
        self.members.iter()
    }

    /// Number of living members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether the formation has no living members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Retrieves a member by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&GridEnemySnapshot> {
        self.members
            .binary_search_by_key(&id, |member| member.id)
            .ok()
            .map(|index| &self.members[index])
    }

    /// Member at the provided position in identifier order.
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&GridEnemySnapshot> {
        self.members.get(index)
    }

    /// Reports whether any member violates its horizontal bounds.
    #[must_use]
    pub fn any_out_of_horizontal_bounds(&self) -> bool {
        self.members
            .iter()
            .any(GridEnemySnapshot::is_out_of_horizontal_bounds)
    }

    /// Member nearest to the point by Euclidean distance.
    ///
    /// Ties resolve to the lowest identifier.
    #[must_use]
    pub fn nearest_to(&self, point: Vec2) -> Option<&GridEnemySnapshot> {
        let mut best: Option<(&GridEnemySnapshot, f32)> = None;
        for member in &self.members {
            let distance = member.position.distance_squared(point);
            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((member, distance)),
            }
        }
        best.map(|(member, _)| member)
    }
}

/// Immutable representation of a boss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossSnapshot {
    /// Identifier of the boss.
    pub id: BossId,
    /// Variant of the boss.
    pub kind: BossKind,
    /// Current position.
    pub position: Vec2,
    /// Remaining hit points.
    pub hp: i32,
    /// Hit points the boss started with.
    pub max_hp: i32,
    /// Hit points below which the boss rages.
    pub rage_hp: i32,
    /// Whether the boss already died.
    pub is_dead: bool,
    /// Whether the boss is a clone.
    pub is_clone: bool,
    /// Last behaviour state recorded for the boss.
    pub state: Option<BossState>,
}

impl BossSnapshot {
    /// Reports whether the boss is below its rage threshold.
    #[must_use]
    pub const fn in_rage(&self) -> bool {
        self.hp < self.rage_hp
    }
}

/// Read-only snapshot of every boss in play.
#[derive(Clone, Debug, Default)]
pub struct BossView {
    snapshots: Vec<BossSnapshot>,
}

impl BossView {
    /// Creates a view from snapshots ordered by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BossSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over bosses ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &BossSnapshot> {
        self.snapshots.iter()
    }

    /// Retrieves a boss by identifier.
    #[must_use]
    pub fn get(&self, id: BossId) -> Option<&BossSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of bosses that are still alive.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.snapshots.iter().filter(|boss| !boss.is_dead).count()
    }
}

/// Immutable representation of the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current position.
    pub position: Vec2,
    /// Remaining lives.
    pub lives: u32,
    /// Whether a shield will absorb the next hit.
    pub shielded: bool,
    /// Whether hits are currently ignored.
    pub invincible: bool,
}

/// Immutable representation of a barrier chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarrierChunkSnapshot {
    /// Identifier of the chunk.
    pub id: ChunkId,
    /// Centre of the chunk.
    pub position: Vec2,
    /// Remaining health.
    pub health: f32,
}

/// Read-only snapshot of the standing barrier chunks.
#[derive(Clone, Debug, Default)]
pub struct BarrierView {
    chunks: Vec<BarrierChunkSnapshot>,
}

impl BarrierView {
    /// Creates a view from chunk snapshots ordered by identifier.
    #[must_use]
    pub fn from_snapshots(mut chunks: Vec<BarrierChunkSnapshot>) -> Self {
        chunks.sort_by_key(|chunk| chunk.id);
        Self { chunks }
    }

    /// Iterator over standing chunks ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &BarrierChunkSnapshot> {
        self.chunks.iter()
    }

    /// Retrieves a standing chunk by identifier.
    #[must_use]
    pub fn get(&self, id: ChunkId) -> Option<&BarrierChunkSnapshot> {
        self.chunks
            .binary_search_by_key(&id, |chunk| chunk.id)
            .ok()
            .map(|index| &self.chunks[index])
    }

    /// Number of standing chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Reports whether every chunk was destroyed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u32, x: f32, y: f32) -> GridEnemySnapshot {
        GridEnemySnapshot {
            id: EnemyId::new(id),
            position: Vec2::new(x, y),
            animation: "grunt".to_owned(),
            reward: Reward::default(),
            min_x: -500.0,
            max_x: 500.0,
            max_y: 500.0,
        }
    }

    #[test]
    fn nearest_member_uses_euclidean_distance() {
        let view = FormationView::new(
            HorizontalDirection::Right,
            vec![
                member(0, 0.0, 0.0),
                member(1, 100.0, 0.0),
                member(2, 50.0, 0.0),
            ],
            Duration::from_millis(500),
            Duration::from_millis(900),
        );

        let nearest = view.nearest_to(Vec2::new(48.0, 0.0)).expect("non-empty");
        assert_eq!(nearest.id, EnemyId::new(2));
    }

    #[test]
    fn nearest_member_ties_resolve_to_lowest_identifier() {
        let view = FormationView::new(
            HorizontalDirection::Left,
            vec![member(4, 10.0, 0.0), member(3, -10.0, 0.0)],
            Duration::ZERO,
            Duration::ZERO,
        );

        let nearest = view.nearest_to(Vec2::ZERO).expect("non-empty");
        assert_eq!(nearest.id, EnemyId::new(3));
    }

    #[test]
    fn state_keys_parse_case_insensitively() {
        assert_eq!(
            BossState::parse(BossKind::Pupa, "illum_start"),
            Ok(BossState::Pupa(PupaState::IllumStart)),
        );
        assert_eq!(
            BossState::parse(BossKind::Reaper, "SHOOT3"),
            Ok(BossState::Reaper(ReaperState::ShootLemniscate)),
        );
    }

    #[test]
    fn state_keys_are_scoped_to_the_variant() {
        let error = BossState::parse(BossKind::Reaper, "ILLUM_PAUSE").unwrap_err();
        assert_eq!(error.kind, BossKind::Reaper);
        assert_eq!(error.key, "ILLUM_PAUSE");
        assert_eq!(error.to_string(), "`ILLUM_PAUSE` is not a Reaper state");
    }

    #[test]
    fn every_state_round_trips_through_its_key() {
        for kind in BossKind::ALL {
            for state in BossState::all(kind) {
                assert_eq!(state.kind(), kind);
                assert_eq!(BossState::parse(kind, state.key()), Ok(*state));
            }
        }
    }

    #[test]
    fn bounds_contain_edges_but_not_parked_position() {
        let bounds = Bounds::from_size(800.0, 600.0);
        assert!(bounds.contains(Vec2::new(0.0, 600.0)));
        assert!(!bounds.contains(PARKED_POSITION));
        assert_eq!(bounds.center(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn rage_begins_strictly_below_threshold() {
        let mut boss = BossSnapshot {
            id: BossId::new(1),
            kind: BossKind::Pupa,
            position: Vec2::ZERO,
            hp: 20,
            max_hp: 40,
            rage_hp: 20,
            is_dead: false,
            is_clone: false,
            state: None,
        };
        assert!(!boss.in_rage());
        boss.hp = 19;
        assert!(boss.in_rage());
    }
}
