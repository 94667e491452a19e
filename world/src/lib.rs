#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the shooter.
//!
//! The world owns every mutable gameplay entity: the player ship, the
//! pools of projectiles and effects, the enemy formation, the boss roster,
//! and the barriers. It only changes in response to [`Command`] values passed
//! to [`apply`], and reports every change as an [`Event`].

use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    time::Duration,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shmup_core::{
    timeline::{TimerId, Timeline},
    BossId, BossKind, Command, EffectId, EnemyId, Event, PoolHandle, PoolKind, SceneSignal, SlotId,
    Vec2, EXPLOSION_ANIMATION, WELCOME_BANNER,
};

mod barrier;
mod boss;
mod config;
mod formation;
mod player;
pub mod pool;

pub use config::{
    BarrierLayout, BossRosterConfig, BossStats, ConfigError, FormationLayout, GameConfig,
    PlayerConfig, PoolCapacities, RowTier,
};

use barrier::{Barriers, ChunkDamage};
use boss::{BossRoster, HitOutcome};
use formation::Formation;
use player::Player;
use pool::Pool;

const WORLD_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Offset between the ship's centre and the muzzle a player bullet leaves.
const MUZZLE_OFFSET: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorldTimer {
    ExpireEffect(EffectId),
}

/// Explosion in play and the fallback timer that parks it.
#[derive(Clone, Copy, Debug)]
struct LiveEffect {
    id: EffectId,
    timer: TimerId,
}

#[derive(Clone, Debug)]
struct Pools {
    player_bullets: Pool,
    enemy_bullets: Pool,
    explosions: Pool,
    powerups: Pool,
}

impl Pools {
    fn new(config: &GameConfig) -> Self {
        let pool = |kind| Pool::new(kind, config.pools.capacity(kind), config.bounds);
        Self {
            player_bullets: pool(PoolKind::PlayerBullet),
            enemy_bullets: pool(PoolKind::EnemyBullet),
            explosions: pool(PoolKind::Explosion),
            powerups: pool(PoolKind::Powerup),
        }
    }

    fn get(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::PlayerBullet => &self.player_bullets,
            PoolKind::EnemyBullet => &self.enemy_bullets,
            PoolKind::Explosion => &self.explosions,
            PoolKind::Powerup => &self.powerups,
        }
    }

    fn get_mut(&mut self, kind: PoolKind) -> &mut Pool {
        match kind {
            PoolKind::PlayerBullet => &mut self.player_bullets,
            PoolKind::EnemyBullet => &mut self.enemy_bullets,
            PoolKind::Explosion => &mut self.explosions,
            PoolKind::Powerup => &mut self.powerups,
        }
    }
}

/// Represents the authoritative state of one scene.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    now: Duration,
    level: u32,
    player: Player,
    pools: Pools,
    formation: Formation,
    bosses: BossRoster,
    boss_queue: VecDeque<BossKind>,
    barriers: Barriers,
    timeline: Timeline<WorldTimer>,
    effects: BTreeMap<SlotId, LiveEffect>,
    next_effect: u64,
    signalled: HashSet<SceneSignal>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world after validating the configuration.
    ///
    /// The world starts without a formation; submit [`Command::StartLevel`]
    /// or [`Command::EnqueueBosses`] to populate it.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GameConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            now: Duration::ZERO,
            level: 0,
            player: Player::spawn(&config.player, &config.bounds),
            pools: Pools::new(&config),
            formation: Formation::empty(&config.formation),
            bosses: BossRoster::default(),
            boss_queue: VecDeque::new(),
            barriers: Barriers::default(),
            timeline: Timeline::new(),
            effects: BTreeMap::new(),
            next_effect: 0,
            signalled: HashSet::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ WORLD_STREAM),
            config,
        }
    }

    fn signal(&mut self, signal: SceneSignal, out_events: &mut Vec<Event>) {
        if self.signalled.insert(signal) {
            tracing::info!(?signal, level = self.level, "scene signal");
            out_events.push(Event::Signal { signal });
        }
    }

    fn spawn_projectile(
        &mut self,
        kind: PoolKind,
        position: Vec2,
        velocity: Vec2,
        out_events: &mut Vec<Event>,
    ) {
        let Some(claim) = self.pools.get_mut(kind).acquire() else {
            tracing::trace!(?kind, "pool exhausted; spawn dropped");
            out_events.push(Event::SpawnDropped { kind });
            return;
        };
        if let Some(slot) = claim.activate(position, velocity) {
            out_events.push(Event::ProjectileSpawned {
                handle: PoolHandle::new(kind, slot),
                position,
                velocity,
            });
        }
    }

    fn explode_at(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        let Some(claim) = self.pools.explosions.acquire() else {
            tracing::trace!("explosion pool exhausted; effect dropped");
            out_events.push(Event::SpawnDropped {
                kind: PoolKind::Explosion,
            });
            return;
        };
        let Some(slot) = claim.activate(position, Vec2::ZERO) else {
            return;
        };
        let id = EffectId::new(self.next_effect);
        self.next_effect += 1;
        let deadline = self.now + self.config.explosion_duration();
        let timer = self
            .timeline
            .schedule(deadline, WorldTimer::ExpireEffect(id));
        if let Some(stale) = self.effects.insert(slot, LiveEffect { id, timer }) {
            let _ = self.timeline.cancel(stale.timer);
        }
        out_events.push(Event::ExplosionStarted {
            effect: id,
            slot,
            position,
            animation: EXPLOSION_ANIMATION,
        });
    }

    fn finish_effect(&mut self, effect: EffectId, out_events: &mut Vec<Event>) {
        let Some(slot) = self
            .effects
            .iter()
            .find_map(|(slot, live)| (live.id == effect).then_some(*slot))
        else {
            tracing::trace!(effect = effect.get(), "stale effect completion ignored");
            return;
        };
        if let Some(live) = self.effects.remove(&slot) {
            let _ = self.timeline.cancel(live.timer);
        }
        park(&mut self.pools, PoolKind::Explosion, slot, out_events);
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.now += dt;
        out_events.push(Event::TimeAdvanced { now: self.now, dt });

        let pruned = self.bosses.prune_dead();
        if pruned > 0 {
            tracing::debug!(pruned, "removed dead bosses");
        }

        let seconds = dt.as_secs_f32();
        let mut parked = Vec::new();
        for kind in PoolKind::ALL {
            parked.clear();
            self.pools.get_mut(kind).update(seconds, &mut parked);
            for &slot in &parked {
                if kind == PoolKind::Explosion {
                    if let Some(live) = self.effects.remove(&slot) {
                        let _ = self.timeline.cancel(live.timer);
                    }
                }
                out_events.push(Event::EntityParked {
                    handle: PoolHandle::new(kind, slot),
                });
            }
        }

        let mut due = Vec::new();
        self.timeline.drain_due(self.now, &mut due);
        for timer in due {
            match timer {
                WorldTimer::ExpireEffect(effect) => self.finish_effect(effect, out_events),
            }
        }
    }

    fn start_level(&mut self, level: u32, out_events: &mut Vec<Event>) {
        self.level = level.max(1);
        self.formation = Formation::build(&self.config.formation, &self.config.bounds, self.level);
        self.barriers = Barriers::build(&self.config.barriers, &self.config.bounds);
        self.player.respawn(&self.config.player, &self.config.bounds);

        let mut parked = Vec::new();
        for kind in PoolKind::ALL {
            parked.clear();
            self.pools.get_mut(kind).deactivate_all(&mut parked);
            for &slot in &parked {
                out_events.push(Event::EntityParked {
                    handle: PoolHandle::new(kind, slot),
                });
            }
        }
        self.timeline.clear();
        self.effects.clear();
        self.signalled
            .retain(|signal| *signal == SceneSignal::PlayerOutOfLives);

        tracing::debug!(
            level = self.level,
            enemies = self.formation.len(),
            chunks = self.barriers.len(),
            "level started"
        );
        out_events.push(Event::LevelStarted {
            level: self.level,
            enemies: count(self.formation.len()),
            barrier_chunks: count(self.barriers.len()),
        });
    }

    fn spawn_next_boss(&mut self, out_events: &mut Vec<Event>) {
        if self.bosses.living_count() > 0 {
            tracing::trace!("special enemies remain; boss spawn deferred");
            return;
        }
        let Some(kind) = self.boss_queue.pop_front() else {
            return;
        };
        let bounds = self.config.bounds;
        let jitter = bounds.width() * 0.1;
        let position = Vec2::new(
            bounds.center().x + self.rng.gen_range(-jitter..=jitter),
            bounds.min().y + self.config.bosses.spawn_margin,
        );
        let boss = self.bosses.spawn(kind, position, &self.config.bosses);
        tracing::debug!(boss = boss.id.get(), kind = kind.name(), hp = boss.hp(), "boss spawned");
        out_events.push(Event::BossSpawned {
            boss: boss.id,
            kind,
            position: boss.position,
            hp: boss.hp(),
            clone: false,
        });
    }

    fn clone_boss(&mut self, source: BossId, out_events: &mut Vec<Event>) {
        let Some(clone) = self.bosses.spawn_clone(source, &self.config.bosses) else {
            return;
        };
        tracing::debug!(source = source.get(), clone = clone.id.get(), "boss cloned");
        out_events.push(Event::BossSpawned {
            boss: clone.id,
            kind: clone.kind,
            position: clone.position,
            hp: clone.hp(),
            clone: true,
        });
    }

    fn damage_boss(&mut self, id: BossId, out_events: &mut Vec<Event>) {
        let lethal_hp = self.config.bosses.lethal_hp;
        let Some(boss) = self.bosses.get_mut(id) else {
            return;
        };
        match boss.hit(lethal_hp) {
            HitOutcome::Ignored => {
                tracing::trace!(boss = id.get(), "hit on dead boss ignored");
            }
            HitOutcome::Wounded(hp) => {
                out_events.push(Event::BossDamaged { boss: id, hp });
            }
            HitOutcome::Died => {
                let (kind, position, reward) = (boss.kind, boss.position, boss.reward);
                out_events.push(Event::BossDamaged {
                    boss: id,
                    hp: boss.hp(),
                });
                out_events.push(Event::BossDied {
                    boss: id,
                    kind,
                    position,
                });
                out_events.push(Event::RewardGranted { reward });
                tracing::debug!(boss = id.get(), kind = kind.name(), "boss died");
                self.explode_at(position, out_events);
                if self.bosses.living_count() == 0 && self.boss_queue.is_empty() {
                    self.signal(SceneSignal::BossQueueExhausted, out_events);
                }
            }
        }
    }

    fn kill_grid_enemy(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        let Some(member) = self.formation.remove(enemy) else {
            return;
        };
        out_events.push(Event::GridEnemyKilled {
            enemy,
            position: member.position,
        });
        out_events.push(Event::RewardGranted {
            reward: member.reward,
        });

        if self.rng.gen_ratio(1, self.config.powerup_drop_odds) {
            let velocity = Vec2::new(0.0, self.config.powerup_fall_speed);
            match self.pools.powerups.acquire_wrapping() {
                Some(claim) => {
                    if let Some(slot) = claim.activate(member.position, velocity) {
                        out_events.push(Event::PowerupDropped {
                            slot,
                            position: member.position,
                        });
                    }
                }
                None => out_events.push(Event::SpawnDropped {
                    kind: PoolKind::Powerup,
                }),
            }
        }

        if self.formation.is_empty() {
            self.signal(SceneSignal::FormationCleared, out_events);
        }
    }

    fn check_breach(&mut self, out_events: &mut Vec<Event>) {
        if self.formation.breached() {
            self.signal(SceneSignal::FormationBreached, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::build(GameConfig::default())
    }
}

fn park(pools: &mut Pools, kind: PoolKind, slot: SlotId, out_events: &mut Vec<Event>) {
    if pools.get_mut(kind).deactivate(slot) {
        out_events.push(Event::EntityParked {
            handle: PoolHandle::new(kind, slot),
        });
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance(dt, out_events),
        Command::StartLevel { level } => world.start_level(level, out_events),
        Command::EnqueueBosses { kinds } => {
            world.boss_queue.extend(kinds);
            let _ = world.signalled.remove(&SceneSignal::BossQueueExhausted);
        }
        Command::SpawnNextBoss => world.spawn_next_boss(out_events),
        Command::MovePlayer { x } => {
            let bounds = world.config.bounds;
            world.player.position.x = x.clamp(bounds.min().x, bounds.max().x);
        }
        Command::FirePlayerBullet => {
            let cooldown = Duration::from_millis(world.config.player.fire_cooldown_ms);
            if world.player.try_fire(world.now, cooldown) {
                let position = world.player.position - Vec2::new(0.0, MUZZLE_OFFSET);
                let velocity = Vec2::new(0.0, -world.config.player.bullet_speed);
                world.spawn_projectile(PoolKind::PlayerBullet, position, velocity, out_events);
            }
        }
        Command::DescendFormation => {
            if world.formation.is_empty() {
                return;
            }
            let direction = world.formation.descend();
            out_events.push(Event::FormationDescended { direction });
            world.check_breach(out_events);
        }
        Command::ShiftFormation => {
            if world.formation.is_empty() {
                return;
            }
            let direction = world.formation.shift();
            out_events.push(Event::FormationShifted { direction });
            world.check_breach(out_events);
        }
        Command::FireFromGridEnemy { enemy } => {
            let Some(position) = world.formation.get(enemy).map(|member| member.position) else {
                return;
            };
            let velocity = Vec2::new(0.0, world.config.formation.bullet_speed);
            world.spawn_projectile(PoolKind::EnemyBullet, position, velocity, out_events);
        }
        Command::KillGridEnemy { enemy } => world.kill_grid_enemy(enemy, out_events),
        Command::MoveBoss { boss, position } => {
            let bounds = world.config.bounds;
            if let Some(boss) = world.bosses.living_mut(boss) {
                boss.position = bounds.clamp(position);
            }
        }
        Command::FireBossBullet { boss, velocity } => {
            let Some(position) = world.bosses.living_mut(boss).map(|boss| boss.position) else {
                return;
            };
            world.spawn_projectile(PoolKind::EnemyBullet, position, velocity, out_events);
        }
        Command::SetBossState { boss, state } => {
            let Some(entry) = world.bosses.living_mut(boss) else {
                return;
            };
            if entry.kind != state.kind() {
                tracing::warn!(boss = boss.get(), %state, "state belongs to another boss variant");
                return;
            }
            entry.state = Some(state);
            tracing::debug!(boss = boss.get(), %state, "boss state changed");
            out_events.push(Event::BossStateChanged { boss, state });
        }
        Command::CloneBoss { boss } => world.clone_boss(boss, out_events),
        Command::DamageBoss { boss } => world.damage_boss(boss, out_events),
        Command::HitPlayer => {
            let invincibility = Duration::from_millis(world.config.player.invincibility_ms);
            let outcome = world.player.hit(world.now, invincibility);
            out_events.push(Event::PlayerHit { outcome });
            if world.player.is_out_of_lives() {
                world.signal(SceneSignal::PlayerOutOfLives, out_events);
            }
        }
        Command::CollectPowerup { slot } => {
            if world.player.is_out_of_lives() || !world.pools.powerups.deactivate(slot) {
                return;
            }
            out_events.push(Event::EntityParked {
                handle: PoolHandle::new(PoolKind::Powerup, slot),
            });
            out_events.push(Event::PowerupCollected { slot });
            world.player.grant_shield();
            out_events.push(Event::ShieldGranted);
        }
        Command::DeactivateProjectile { handle } => {
            park(&mut world.pools, handle.kind, handle.slot, out_events);
        }
        Command::ExplodeAt { position } => world.explode_at(position, out_events),
        Command::EffectCompleted { effect } => world.finish_effect(effect, out_events),
        Command::DamageBarrier { chunk, amount } => match world.barriers.damage(chunk, amount) {
            Some(ChunkDamage::Damaged(health)) => {
                out_events.push(Event::BarrierDamaged { chunk, health });
            }
            Some(ChunkDamage::Destroyed) => out_events.push(Event::BarrierDestroyed { chunk }),
            None => {}
        },
        Command::DestroyBarrier { chunk } => {
            if world.barriers.destroy(chunk) {
                out_events.push(Event::BarrierDestroyed { chunk });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use shmup_core::{
        BarrierView, BossKind, BossView, Bounds, FormationView, PlayerSnapshot, PoolKind,
        PoolView,
    };

    use super::{GameConfig, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Play area of the scene.
    #[must_use]
    pub fn bounds(world: &World) -> Bounds {
        world.config.bounds
    }

    /// Simulation time accumulated by ticks.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Level most recently started; zero before the first level.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// Captures the player ship.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot(world.now)
    }

    /// Captures every slot of the pool.
    #[must_use]
    pub fn pool_view(world: &World, kind: PoolKind) -> PoolView {
        world.pools.get(kind).view()
    }

    /// Captures the living formation members.
    #[must_use]
    pub fn formation_view(world: &World) -> FormationView {
        world.formation.view()
    }

    /// Captures the bosses in play, including ones that died this tick.
    #[must_use]
    pub fn boss_view(world: &World) -> BossView {
        world.bosses.view()
    }

    /// Captures the standing barrier chunks.
    #[must_use]
    pub fn barrier_view(world: &World) -> BarrierView {
        world.barriers.view()
    }

    /// Bosses waiting to be spawned, front first.
    #[must_use]
    pub fn boss_queue(world: &World) -> Vec<BossKind> {
        world.boss_queue.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmup_core::{BossState, ChunkId, PlayerHitOutcome, ReaperState, PARKED_POSITION};

    fn world_with(config: GameConfig) -> World {
        World::new(config).expect("valid config")
    }

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.formation.rows.truncate(1);
        config.formation.columns = 2;
        config
    }

    fn run(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            apply(world, command, &mut events);
        }
        events
    }

    fn signals(events: &[Event]) -> Vec<SceneSignal> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Signal { signal } => Some(*signal),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = GameConfig::default();
        config.powerup_drop_odds = 0;
        assert_eq!(World::new(config).err(), Some(ConfigError::ZeroDropOdds));
    }

    #[test]
    fn start_level_reports_created_entities() {
        let mut world = World::default();
        let events = run(&mut world, [Command::StartLevel { level: 1 }]);
        assert_eq!(
            events,
            vec![Event::LevelStarted {
                level: 1,
                enemies: 55,
                barrier_chunks: 72,
            }],
        );
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn bullets_spawned_into_full_pool_are_dropped() {
        let mut config = small_config();
        config.pools.enemy_bullets = 2;
        let mut world = world_with(config);
        let _ = run(&mut world, [Command::StartLevel { level: 1 }]);

        let fire = Command::FireFromGridEnemy {
            enemy: EnemyId::new(0),
        };
        let events = run(&mut world, [fire.clone(), fire.clone(), fire]);
        assert!(matches!(events[0], Event::ProjectileSpawned { .. }));
        assert!(matches!(events[1], Event::ProjectileSpawned { .. }));
        assert_eq!(
            events[2],
            Event::SpawnDropped {
                kind: PoolKind::EnemyBullet
            },
        );
        let view = query::pool_view(&world, PoolKind::EnemyBullet);
        assert_eq!(view.active_count(), 2);
        for snapshot in view.iter() {
            assert_eq!(snapshot.active, snapshot.position != PARKED_POSITION);
        }
    }

    #[test]
    fn clearing_the_formation_signals_once() {
        let mut config = small_config();
        config.powerup_drop_odds = u32::MAX;
        let mut world = world_with(config);
        let _ = run(&mut world, [Command::StartLevel { level: 1 }]);

        let events = run(
            &mut world,
            [
                Command::KillGridEnemy {
                    enemy: EnemyId::new(0),
                },
                Command::KillGridEnemy {
                    enemy: EnemyId::new(1),
                },
                Command::KillGridEnemy {
                    enemy: EnemyId::new(1),
                },
            ],
        );
        assert_eq!(signals(&events), vec![SceneSignal::FormationCleared]);
        let rewards = events
            .iter()
            .filter(|event| matches!(event, Event::RewardGranted { .. }))
            .count();
        assert_eq!(rewards, 2);
    }

    #[test]
    fn boss_dies_once_and_exhausts_the_queue() {
        let mut config = GameConfig::default();
        config.bosses.reaper.hp = 3;
        let mut world = world_with(config);
        let _ = run(
            &mut world,
            [
                Command::EnqueueBosses {
                    kinds: vec![BossKind::Reaper],
                },
                Command::SpawnNextBoss,
            ],
        );
        let boss = query::boss_view(&world).iter().next().expect("spawned").id;

        let events = run(&mut world, vec![Command::DamageBoss { boss }; 4]);
        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::BossDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(signals(&events), vec![SceneSignal::BossQueueExhausted]);

        let after_death = run(
            &mut world,
            [Command::SetBossState {
                boss,
                state: BossState::Reaper(ReaperState::Chasing),
            }],
        );
        assert!(after_death.is_empty());

        let _ = run(&mut world, [Command::Tick { dt: Duration::ZERO }]);
        assert_eq!(query::boss_view(&world).iter().count(), 0);
    }

    #[test]
    fn next_boss_waits_for_living_specials() {
        let mut world = World::default();
        let events = run(
            &mut world,
            [
                Command::EnqueueBosses {
                    kinds: vec![BossKind::Lupa, BossKind::Pupa],
                },
                Command::SpawnNextBoss,
                Command::SpawnNextBoss,
            ],
        );
        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::BossSpawned { .. }))
            .count();
        assert_eq!(spawned, 1);
        assert_eq!(query::boss_queue(&world), vec![BossKind::Pupa]);
    }

    fn explosions(events: &[Event]) -> Vec<(EffectId, SlotId)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::ExplosionStarted { effect, slot, .. } => Some((*effect, *slot)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn explosions_expire_on_completion_or_timeout() {
        let mut world = World::default();
        let centre = query::bounds(&world).center();
        let events = run(
            &mut world,
            [
                Command::ExplodeAt { position: centre },
                Command::ExplodeAt { position: centre },
            ],
        );
        let started = explosions(&events);
        assert_eq!(
            started,
            vec![
                (EffectId::new(0), SlotId::new(0)),
                (EffectId::new(1), SlotId::new(1)),
            ],
        );

        let completed = run(
            &mut world,
            [Command::EffectCompleted {
                effect: started[0].0,
            }],
        );
        assert_eq!(completed.len(), 1);

        let timed_out = run(
            &mut world,
            [Command::Tick {
                dt: Duration::from_secs(1),
            }],
        );
        let parked: Vec<&Event> = timed_out
            .iter()
            .filter(|event| matches!(event, Event::EntityParked { .. }))
            .collect();
        assert_eq!(parked.len(), 1);
        assert_eq!(query::pool_view(&world, PoolKind::Explosion).active_count(), 0);
    }

    #[test]
    fn late_completion_leaves_the_reused_slot_alone() {
        let mut world = World::default();
        let centre = query::bounds(&world).center();
        let first = explosions(&run(&mut world, [Command::ExplodeAt { position: centre }]));
        let _ = run(
            &mut world,
            [Command::Tick {
                dt: Duration::from_secs(1),
            }],
        );
        let second = explosions(&run(&mut world, [Command::ExplodeAt { position: centre }]));
        assert_eq!(first[0].1, second[0].1, "timed out slot is reused");
        assert_ne!(first[0].0, second[0].0);

        let late = run(
            &mut world,
            [Command::EffectCompleted {
                effect: first[0].0,
            }],
        );
        assert!(late.is_empty(), "{late:?}");
        assert!(query::pool_view(&world, PoolKind::Explosion).is_active(second[0].1));

        let done = run(
            &mut world,
            [Command::EffectCompleted {
                effect: second[0].0,
            }],
        );
        assert_eq!(done.len(), 1);
        assert_eq!(query::pool_view(&world, PoolKind::Explosion).active_count(), 0);
    }

    #[test]
    fn losing_last_life_signals_once() {
        let mut config = GameConfig::default();
        config.player.lives = 1;
        let mut world = world_with(config);
        let events = run(&mut world, [Command::HitPlayer, Command::HitPlayer]);
        assert_eq!(
            events[0],
            Event::PlayerHit {
                outcome: PlayerHitOutcome::OutOfLives
            },
        );
        assert_eq!(signals(&events), vec![SceneSignal::PlayerOutOfLives]);
    }

    #[test]
    fn barrier_chunks_take_damage_until_destroyed() {
        let mut world = World::default();
        let _ = run(&mut world, [Command::StartLevel { level: 1 }]);
        let chunk = ChunkId::new(0);
        let events = run(
            &mut world,
            [
                Command::DamageBarrier { chunk, amount: 1.0 },
                Command::DamageBarrier { chunk, amount: 5.0 },
                Command::DestroyBarrier { chunk },
            ],
        );
        assert_eq!(
            events,
            vec![
                Event::BarrierDamaged { chunk, health: 2.0 },
                Event::BarrierDestroyed { chunk },
            ],
        );
    }

    #[test]
    fn player_bullets_respect_fire_cooldown() {
        let mut world = World::default();
        let events = run(
            &mut world,
            [Command::FirePlayerBullet, Command::FirePlayerBullet],
        );
        assert_eq!(events.len(), 1);
        let later = run(
            &mut world,
            [
                Command::Tick {
                    dt: Duration::from_millis(250),
                },
                Command::FirePlayerBullet,
            ],
        );
        assert!(later
            .iter()
            .any(|event| matches!(event, Event::ProjectileSpawned { .. })));
    }
}
