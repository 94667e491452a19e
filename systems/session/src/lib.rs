#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-scene pump wiring the world, the pure systems and the collaborators.
//!
//! One [`Session::step`] applies player input, advances the clock, runs the
//! formation AI, the boss AI, the collision resolver and the director in that
//! order, and dispatches the resulting events to the scoring and animation
//! collaborators and to the scene signal bus.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shmup_core::{
    bus::{EventBus, Subscription},
    BossId, Command, Event, GameMode, Overlap, PoolKind, SceneSignal, SlotId,
};
use shmup_system_boss_ai::{BossAi, Tuning};
use shmup_system_collision::{CollisionResolver, Scene};
use shmup_system_director::{Director, RunOutcome};
use shmup_system_formation::FormationAi;
use shmup_world::{self as world, query, ConfigError, GameConfig, World};

mod collaborators;

pub use collaborators::{Animator, FrameAnimator, NullAnimator, Scoring, Tally};

/// Every tunable of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Mode being played.
    pub mode: GameMode,
    /// World layout and tuning.
    pub world: GameConfig,
    /// Formation AI.
    pub formation: shmup_system_formation::Config,
    /// Boss behaviour.
    pub bosses: Tuning,
    /// Collision resolution.
    pub collision: shmup_system_collision::Config,
    /// Level and boss pacing.
    pub director: shmup_system_director::Config,
}

impl SessionConfig {
    /// Derives every system seed from one run seed.
    pub fn reseed(&mut self, seed: u64) {
        self.world.seed = seed;
        self.formation.rng_seed = seed.rotate_left(13) ^ 0x5eed_f0f0;
        self.bosses.rng_seed = seed.rotate_left(29) ^ 0x5eed_b055;
        self.collision.rng_seed = seed.rotate_left(43) ^ 0x5eed_c011;
    }
}

/// Player intent sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerInput {
    /// Horizontal position the ship should move to.
    pub move_to: Option<f32>,
    /// Whether the fire button is held.
    pub fire: bool,
}

/// Gameplay scene driven one frame at a time.
#[derive(Debug)]
pub struct Session<A, S> {
    world: World,
    formation: FormationAi,
    bosses: BossAi,
    collision: CollisionResolver,
    director: Director,
    signals: EventBus<SceneSignal>,
    animator: A,
    scoring: S,
    carried: Vec<Event>,
    elapsed: Duration,
}

impl<A: Animator, S: Scoring> Session<A, S> {
    /// Builds the world and systems and opens the run.
    pub fn new(config: SessionConfig, animator: A, scoring: S) -> Result<Self, ConfigError> {
        let mut session = Self {
            world: World::new(config.world)?,
            formation: FormationAi::new(config.formation),
            bosses: BossAi::new(config.bosses),
            collision: CollisionResolver::new(config.collision),
            director: Director::new(config.mode, config.director),
            signals: EventBus::new(),
            animator,
            scoring,
            carried: Vec::new(),
            elapsed: Duration::ZERO,
        };
        let mut commands = Vec::new();
        session.director.begin(&mut commands);
        let mut events = Vec::new();
        session.apply(commands, &mut events);
        session.dispatch(&events);
        session.carried = events;
        Ok(session)
    }

    /// Registers a listener for scene signals; it stays registered while the
    /// returned handle lives.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<SceneSignal>
    where
        F: FnMut(&SceneSignal) + 'static,
    {
        self.signals.subscribe(listener)
    }

    /// Advances the scene by one frame and returns every event it produced.
    pub fn step(&mut self, dt: Duration, input: PlayerInput, overlaps: &[Overlap]) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.carried);
        let fresh = events.len();

        let mut commands = Vec::new();
        let mut finished = Vec::new();
        self.animator.drain_finished(&mut finished);
        commands.extend(
            finished
                .into_iter()
                .map(|effect| Command::EffectCompleted { effect }),
        );
        if let Some(x) = input.move_to {
            commands.push(Command::MovePlayer { x });
        }
        if input.fire {
            commands.push(Command::FirePlayerBullet);
        }
        commands.push(Command::Tick { dt });
        self.apply(commands, &mut events);
        if self.director.outcome().is_none() {
            self.elapsed += dt;
        }

        let mut commands = Vec::new();
        self.formation
            .handle(&events, &query::formation_view(&self.world), &mut commands);
        self.apply(commands, &mut events);

        let mut commands = Vec::new();
        self.formation.shoot(
            &query::formation_view(&self.world),
            &query::player(&self.world),
            &mut commands,
        );
        self.apply(commands, &mut events);

        let mut commands = Vec::new();
        self.bosses.handle(
            &events,
            &query::boss_view(&self.world),
            &query::player(&self.world),
            &query::barrier_view(&self.world),
            query::bounds(&self.world),
            &mut commands,
        );
        self.apply(commands, &mut events);

        let mut commands = Vec::new();
        let player_bullets = query::pool_view(&self.world, PoolKind::PlayerBullet);
        let enemy_bullets = query::pool_view(&self.world, PoolKind::EnemyBullet);
        let powerups = query::pool_view(&self.world, PoolKind::Powerup);
        let formation = query::formation_view(&self.world);
        let bosses = query::boss_view(&self.world);
        let player = query::player(&self.world);
        let barriers = query::barrier_view(&self.world);
        self.collision.handle(
            overlaps,
            Scene {
                player_bullets: &player_bullets,
                enemy_bullets: &enemy_bullets,
                powerups: &powerups,
                formation: &formation,
                bosses: &bosses,
                player: &player,
                barriers: &barriers,
            },
            &mut commands,
        );
        self.apply(commands, &mut events);

        let mut commands = Vec::new();
        let outcome = self.director.outcome();
        self.director.handle(
            &events,
            &query::boss_view(&self.world),
            query::boss_queue(&self.world).len(),
            &mut commands,
        );
        let mut carried = Vec::new();
        self.apply(commands, &mut carried);
        if outcome.is_none() {
            if let Some(outcome) = self.director.outcome() {
                tracing::debug!(?outcome, elapsed = ?self.elapsed, "session finished");
            }
        }

        self.dispatch(&events[fresh..]);
        self.dispatch(&carried);
        events.extend(carried.iter().cloned());
        self.carried = carried;
        events
    }

    /// Forces a boss into the named state; see [`BossAi::request_state`].
    pub fn request_boss_state(&mut self, boss: BossId, key: &str) -> bool {
        let mut commands = Vec::new();
        let changed = self.bosses.request_state(boss, key, &mut commands);
        let mut events = Vec::new();
        self.apply(commands, &mut events);
        self.dispatch(&events);
        self.carried.extend(events);
        changed
    }

    /// World driven by the session.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Boss AI driven by the session.
    #[must_use]
    pub fn boss_ai(&self) -> &BossAi {
        &self.bosses
    }

    /// Scoring collaborator.
    #[must_use]
    pub fn scoring(&self) -> &S {
        &self.scoring
    }

    /// Animation collaborator.
    #[must_use]
    pub fn animator(&self) -> &A {
        &self.animator
    }

    /// Outcome of the run once it ended.
    #[must_use]
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.director.outcome()
    }

    /// Simulated time played until the run ended.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn apply(&mut self, commands: Vec<Command>, events: &mut Vec<Event>) {
        for command in commands {
            world::apply(&mut self.world, command, events);
        }
    }

    fn dispatch(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::RewardGranted { reward } => {
                    self.scoring.add_score(reward.score);
                    self.scoring.add_money(reward.money);
                }
                Event::ExplosionStarted {
                    effect,
                    position,
                    animation,
                    ..
                } => self.animator.play(*effect, animation, *position),
                Event::Signal { signal } => {
                    let _ = self.signals.publish(signal);
                }
                _ => {}
            }
        }
    }
}

/// Slots of every active explosion, for adapters that render effects.
#[must_use]
pub fn active_effects(world: &World) -> Vec<SlotId> {
    query::pool_view(world, PoolKind::Explosion)
        .active()
        .map(|snapshot| snapshot.handle.slot)
        .collect()
}
