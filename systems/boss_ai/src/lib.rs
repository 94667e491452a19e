#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Finite state machines driving every boss in play.
//!
//! Each boss gets a brain when it first shows up in the [`BossView`]. A brain
//! records the behaviour state, the path currently being followed, its aim
//! and its fire clock. Transitions go through one function that clears the
//! path, bumps the path epoch and announces the state to the world; delayed
//! transitions carry the epoch they were scheduled under and are discarded
//! when it no longer matches.

use std::{collections::BTreeMap, f32::consts::FRAC_PI_2, time::Duration};

use rand::{
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
    Rng, SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shmup_core::{
    timeline::Timeline, BarrierView, BossId, BossKind, BossSnapshot, BossState, BossView, Bounds,
    Command, Event, LupaState, PlayerSnapshot, PupaState, ReaperState, Vec2,
};

mod lupa;
pub mod path;
mod pupa;
mod reaper;

pub use lupa::LupaTuning;
pub use pupa::PupaTuning;
pub use reaper::ReaperTuning;

use path::{Follower, Path, Repeat};

/// Clearance kept above the barrier line when no chunk is standing.
const FALLBACK_BARRIER_CLEARANCE: f32 = 140.0;

/// Tuning shared by every boss variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed of the stream used for random targets and transitions.
    pub rng_seed: u64,
    /// Speed of every boss bullet.
    pub bullet_speed: f32,
    /// Random roaming targets keep this distance from the play area edges.
    pub roam_margin: f32,
    /// Fraction of the play area height, from the top, that roaming may use.
    pub roam_depth: f32,
    /// Reaper tuning.
    pub reaper: ReaperTuning,
    /// Lupa tuning.
    pub lupa: LupaTuning,
    /// Pupa tuning.
    pub pupa: PupaTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            rng_seed: 0xb055_a1b0_55a1_b055,
            bullet_speed: 260.0,
            roam_margin: 60.0,
            roam_depth: 0.45,
            reaper: ReaperTuning::default(),
            lupa: LupaTuning::default(),
            pupa: PupaTuning::default(),
        }
    }
}

/// Read-only copy of a brain, for adapters and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct BrainSnapshot {
    /// Boss the brain drives.
    pub boss: BossId,
    /// Variant of the boss.
    pub kind: BossKind,
    /// Current behaviour state.
    pub state: Option<BossState>,
    /// Target position chosen by the current state.
    pub target: Option<Vec2>,
    /// Progress along the current path, if any.
    pub path_progress: Option<f32>,
    /// Shots fired since the state was entered.
    pub shots_fired: u32,
    /// Firing angle in radians; zero points right, the y axis grows downward.
    pub facing: f32,
    /// Signed rotation applied to the firing angle per shot.
    pub angular_velocity: f32,
    /// Number of transitions so far; delayed transitions must match it.
    pub epoch: u64,
    /// Whether the boss died.
    pub is_dead: bool,
    /// Whether the boss is a clone.
    pub is_clone: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    Enter(BossState),
    Clone,
}

/// Delayed callback scheduled on the tick clock.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Deferred {
    boss: BossId,
    /// `None` survives transitions; used by timers tied to the boss, not a state.
    epoch: Option<u64>,
    action: Action,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Triangle {
    vertices: [Vec2; 3],
    next: usize,
    visited: u32,
}

#[derive(Clone, Debug)]
struct Brain {
    id: BossId,
    kind: BossKind,
    state: Option<BossState>,
    position: Vec2,
    in_rage: bool,
    is_dead: bool,
    is_clone: bool,
    follower: Option<Follower>,
    target: Option<Vec2>,
    next_fire: Duration,
    shots_fired: u32,
    facing: f32,
    angular_velocity: f32,
    epoch: u64,
    triangle: Triangle,
}

impl Brain {
    fn new(snapshot: &BossSnapshot) -> Self {
        Self {
            id: snapshot.id,
            kind: snapshot.kind,
            state: None,
            position: snapshot.position,
            in_rage: snapshot.in_rage(),
            is_dead: snapshot.is_dead,
            is_clone: snapshot.is_clone,
            follower: None,
            target: None,
            next_fire: Duration::ZERO,
            shots_fired: 0,
            facing: FRAC_PI_2,
            angular_velocity: 0.0,
            epoch: 0,
            triangle: Triangle::default(),
        }
    }

    /// Target chosen by the current state.
    ///
    /// # Panics
    ///
    /// Panics when read before the current state chose a target; every state
    /// that reads it sets it on entry or earlier in the same update.
    fn target(&self) -> Vec2 {
        match self.target {
            Some(target) => target,
            None => panic!(
                "{} {} read its target before any state set one",
                self.kind.name(),
                self.id.get()
            ),
        }
    }

    fn follow(&mut self, path: Path, seconds: f32, repeat: Repeat) {
        self.follower = Some(Follower::new(path, seconds, repeat));
    }

    fn aim_at(&mut self, point: Vec2) {
        let delta = point - self.position;
        if delta != Vec2::ZERO {
            self.facing = delta.y.atan2(delta.x);
        }
    }

    fn snapshot(&self) -> BrainSnapshot {
        BrainSnapshot {
            boss: self.id,
            kind: self.kind,
            state: self.state,
            target: self.target,
            path_progress: self.follower.as_ref().map(Follower::progress),
            shots_fired: self.shots_fired,
            facing: self.facing,
            angular_velocity: self.angular_velocity,
            epoch: self.epoch,
            is_dead: self.is_dead,
            is_clone: self.is_clone,
        }
    }
}

/// Everything a state handler may read or produce during one update.
struct Ctx<'a> {
    now: Duration,
    dt: f32,
    player: Vec2,
    bounds: Bounds,
    barrier_line: f32,
    tuning: &'a Tuning,
    rng: &'a mut ChaCha8Rng,
    timeline: &'a mut Timeline<Deferred>,
    out: &'a mut Vec<Command>,
}

impl Ctx<'_> {
    /// Schedules a transition that is dropped if the boss changes state first.
    fn defer_transition(&mut self, brain: &Brain, delay: Duration, state: BossState) {
        let _ = self.timeline.schedule(
            self.now + delay,
            Deferred {
                boss: brain.id,
                epoch: Some(brain.epoch),
                action: Action::Enter(state),
            },
        );
    }

    fn random_point(&mut self) -> Vec2 {
        let margin = self.tuning.roam_margin;
        let min = self.bounds.min();
        let max = self.bounds.max();
        let floor = min.y + self.bounds.height() * self.tuning.roam_depth;
        Vec2::new(
            span(self.rng, min.x + margin, max.x - margin),
            span(self.rng, min.y + margin, floor),
        )
    }

    fn top_centre(&self) -> Vec2 {
        Vec2::new(
            self.bounds.center().x,
            self.bounds.min().y + self.tuning.roam_margin * 1.5,
        )
    }

    fn move_boss(&mut self, brain: &mut Brain, position: Vec2) {
        brain.position = position;
        self.out.push(Command::MoveBoss {
            boss: brain.id,
            position,
        });
    }

    /// Fires along the facing angle once the cooldown elapsed.
    fn fire(&mut self, brain: &mut Brain, cooldown: Duration) -> bool {
        if self.now <= brain.next_fire {
            return false;
        }
        let (sin, cos) = brain.facing.sin_cos();
        self.out.push(Command::FireBossBullet {
            boss: brain.id,
            velocity: Vec2::new(cos, sin) * self.tuning.bullet_speed,
        });
        brain.next_fire = self.now + cooldown;
        brain.shots_fired += 1;
        true
    }
}

fn span(rng: &mut ChaCha8Rng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Transition request.
enum Next<'s> {
    To(BossState),
    AnyOf(&'s [BossState]),
    Weighted(&'s [(BossState, u32)]),
}

/// Enters a new state: clears the path, bumps the epoch and runs the entry
/// handler. Dead bosses never transition.
fn change_state(brain: &mut Brain, next: Next<'_>, ctx: &mut Ctx<'_>) {
    if brain.is_dead {
        return;
    }
    let state = match next {
        Next::To(state) => state,
        Next::AnyOf(states) => match states.choose(&mut *ctx.rng) {
            Some(state) => *state,
            None => return,
        },
        Next::Weighted(options) => {
            let Ok(weights) = WeightedIndex::new(options.iter().map(|(_, weight)| *weight)) else {
                tracing::warn!(boss = brain.id.get(), "no positive transition weight");
                return;
            };
            options[weights.sample(&mut *ctx.rng)].0
        }
    };
    if state.kind() != brain.kind {
        tracing::warn!(boss = brain.id.get(), %state, "state belongs to another variant");
        return;
    }

    brain.follower = None;
    brain.target = None;
    brain.shots_fired = 0;
    brain.epoch = brain.epoch.wrapping_add(1);
    brain.state = Some(state);
    tracing::debug!(boss = brain.id.get(), kind = brain.kind.name(), %state, "boss entered state");
    ctx.out.push(Command::SetBossState {
        boss: brain.id,
        state,
    });

    match state {
        BossState::Reaper(state) => reaper::enter(brain, state, ctx),
        BossState::Lupa(state) => lupa::enter(brain, state, ctx),
        BossState::Pupa(state) => pupa::enter(brain, state, ctx),
    }
}

fn initial_state(kind: BossKind) -> BossState {
    match kind {
        BossKind::Reaper => BossState::Reaper(ReaperState::Roaming),
        BossKind::Lupa => BossState::Lupa(LupaState::BarrierSweep),
        BossKind::Pupa => BossState::Pupa(PupaState::Roaming),
    }
}

fn update(brain: &mut Brain, ctx: &mut Ctx<'_>) {
    if let Some(follower) = brain.follower.as_mut() {
        let position = follower.advance(ctx.dt);
        let finished = follower.is_finished();
        ctx.move_boss(brain, position);
        if finished {
            brain.follower = None;
            if let Some(state) = brain.state {
                path_finished(brain, state, ctx);
            }
        }
    }

    match brain.state {
        Some(BossState::Reaper(state)) => reaper::update(brain, state, ctx),
        Some(BossState::Lupa(state)) => lupa::update(brain, state, ctx),
        Some(BossState::Pupa(state)) => pupa::update(brain, state, ctx),
        None => {}
    }
}

fn path_finished(brain: &mut Brain, state: BossState, ctx: &mut Ctx<'_>) {
    match state {
        BossState::Reaper(state) => reaper::path_finished(brain, state, ctx),
        BossState::Lupa(state) => lupa::path_finished(brain, state, ctx),
        BossState::Pupa(state) => pupa::path_finished(brain, state, ctx),
    }
}

/// Pure system running one state machine per boss.
#[derive(Debug)]
pub struct BossAi {
    tuning: Tuning,
    brains: BTreeMap<BossId, Brain>,
    timeline: Timeline<Deferred>,
    rng: ChaCha8Rng,
    now: Duration,
    player: Vec2,
    bounds: Bounds,
    barrier_line: f32,
}

impl BossAi {
    /// Creates the system using the supplied tuning.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(tuning.rng_seed),
            tuning,
            brains: BTreeMap::new(),
            timeline: Timeline::new(),
            now: Duration::ZERO,
            player: Vec2::ZERO,
            bounds: Bounds::from_size(1.0, 1.0),
            barrier_line: 0.0,
        }
    }

    /// Consumes world events and immutable views to emit boss commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        bosses: &BossView,
        player: &PlayerSnapshot,
        barriers: &BarrierView,
        bounds: Bounds,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { now, dt } => {
                    self.now = *now;
                    elapsed = elapsed.saturating_add(*dt);
                }
                Event::BossDied { boss, .. } => self.retire(*boss),
                _ => {}
            }
        }
        self.player = player.position;
        self.bounds = bounds;
        self.barrier_line = barriers
            .iter()
            .map(|chunk| chunk.position.y)
            .reduce(f32::min)
            .unwrap_or(bounds.max().y - FALLBACK_BARRIER_CLEARANCE);

        self.sync(bosses, out);
        self.run_due(out);

        if elapsed.is_zero() {
            return;
        }
        let (brains, mut ctx) = self.split(elapsed.as_secs_f32(), out);
        for brain in brains.values_mut() {
            if !brain.is_dead {
                update(brain, &mut ctx);
            }
        }
    }

    /// Forces a boss into the state named by `key`.
    ///
    /// Keys are resolved against the boss variant. Unknown keys, keys of
    /// another variant, entry-only states and dead bosses are logged and
    /// leave the boss in its current state. Returns whether the state changed.
    pub fn request_state(&mut self, boss: BossId, key: &str, out: &mut Vec<Command>) -> bool {
        let (brains, mut ctx) = self.split(0.0, out);
        let Some(brain) = brains.get_mut(&boss) else {
            tracing::warn!(boss = boss.get(), key, "state override for unknown boss ignored");
            return false;
        };
        let state = match BossState::parse(brain.kind, key) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(boss = boss.get(), %error, "state override ignored");
                return false;
            }
        };
        if state == BossState::Lupa(LupaState::BarrierSweep) {
            tracing::warn!(boss = boss.get(), %state, "entry-only state cannot be requested");
            return false;
        }
        if brain.is_dead {
            return false;
        }
        change_state(brain, Next::To(state), &mut ctx);
        true
    }

    /// Snapshot of the brain driving the boss.
    #[must_use]
    pub fn brain(&self, boss: BossId) -> Option<BrainSnapshot> {
        self.brains.get(&boss).map(Brain::snapshot)
    }

    /// Number of delayed callbacks waiting on the tick clock.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.timeline.len()
    }

    fn split<'a>(
        &'a mut self,
        dt: f32,
        out: &'a mut Vec<Command>,
    ) -> (&'a mut BTreeMap<BossId, Brain>, Ctx<'a>) {
        let ctx = Ctx {
            now: self.now,
            dt,
            player: self.player,
            bounds: self.bounds,
            barrier_line: self.barrier_line,
            tuning: &self.tuning,
            rng: &mut self.rng,
            timeline: &mut self.timeline,
            out,
        };
        (&mut self.brains, ctx)
    }

    fn retire(&mut self, boss: BossId) {
        if let Some(brain) = self.brains.get_mut(&boss) {
            if !brain.is_dead {
                tracing::debug!(boss = boss.get(), "boss brain retired");
            }
            brain.is_dead = true;
            brain.follower = None;
        }
        self.timeline.retain(|deferred| deferred.boss != boss);
    }

    fn sync(&mut self, bosses: &BossView, out: &mut Vec<Command>) {
        let vanished: Vec<BossId> = self
            .brains
            .keys()
            .copied()
            .filter(|id| bosses.get(*id).is_none())
            .collect();
        for id in vanished {
            self.retire(id);
            let _ = self.brains.remove(&id);
        }

        for snapshot in bosses.iter() {
            if snapshot.is_dead {
                self.retire(snapshot.id);
                continue;
            }
            if let Some(brain) = self.brains.get_mut(&snapshot.id) {
                brain.position = snapshot.position;
                brain.in_rage = snapshot.in_rage();
                continue;
            }

            let (brains, mut ctx) = self.split(0.0, out);
            let mut brain = Brain::new(snapshot);
            let initial = initial_state(brain.kind);
            change_state(&mut brain, Next::To(initial), &mut ctx);
            if brain.kind == BossKind::Reaper && !brain.is_clone {
                reaper::schedule_clone(&brain, &mut ctx);
            }
            let _ = brains.insert(snapshot.id, brain);
        }
    }

    fn run_due(&mut self, out: &mut Vec<Command>) {
        let mut due = Vec::new();
        self.timeline.drain_due(self.now, &mut due);
        for deferred in due {
            let (brains, mut ctx) = self.split(0.0, out);
            let Some(brain) = brains.get_mut(&deferred.boss) else {
                continue;
            };
            if brain.is_dead {
                continue;
            }
            if deferred.epoch.is_some_and(|epoch| epoch != brain.epoch) {
                tracing::trace!(boss = brain.id.get(), "stale delayed transition dropped");
                continue;
            }
            match deferred.action {
                Action::Enter(state) => change_state(brain, Next::To(state), &mut ctx),
                Action::Clone => reaper::clone_now(brain, &mut ctx),
            }
        }
    }
}

impl Default for BossAi {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(kind: BossKind) -> BossSnapshot {
        BossSnapshot {
            id: BossId::new(0),
            kind,
            position: Vec2::new(400.0, 80.0),
            hp: 40,
            max_hp: 40,
            rage_hp: 20,
            is_dead: false,
            is_clone: false,
            state: None,
        }
    }

    #[test]
    #[should_panic(expected = "read its target before any state set one")]
    fn reading_unset_target_is_a_programmer_error() {
        let brain = Brain::new(&snapshot(BossKind::Lupa));
        let _ = brain.target();
    }

    #[test]
    fn dead_brains_never_transition() {
        let mut ai = BossAi::default();
        let mut out = Vec::new();
        let (_, mut ctx) = ai.split(0.0, &mut out);
        let mut brain = Brain::new(&snapshot(BossKind::Reaper));
        brain.is_dead = true;
        change_state(
            &mut brain,
            Next::To(BossState::Reaper(ReaperState::Chasing)),
            &mut ctx,
        );
        assert_eq!(brain.state, None);
        assert_eq!(brain.epoch, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn transitions_clear_the_path_and_bump_the_epoch() {
        let mut ai = BossAi::default();
        let mut out = Vec::new();
        let (_, mut ctx) = ai.split(0.0, &mut out);
        let mut brain = Brain::new(&snapshot(BossKind::Reaper));
        change_state(
            &mut brain,
            Next::To(BossState::Reaper(ReaperState::ShootEllipse)),
            &mut ctx,
        );
        assert!(brain.follower.is_some());
        brain.shots_fired = 4;

        change_state(
            &mut brain,
            Next::To(BossState::Reaper(ReaperState::Chasing)),
            &mut ctx,
        );
        assert!(brain.follower.is_none());
        assert_eq!(brain.shots_fired, 0);
        assert_eq!(brain.epoch, 2);
        assert_eq!(
            out,
            vec![
                Command::SetBossState {
                    boss: BossId::new(0),
                    state: BossState::Reaper(ReaperState::ShootEllipse),
                },
                Command::SetBossState {
                    boss: BossId::new(0),
                    state: BossState::Reaper(ReaperState::Chasing),
                },
            ],
        );
    }

    #[test]
    fn weighted_transitions_only_pick_positive_weights() {
        let mut ai = BossAi::default();
        let mut out = Vec::new();
        let (_, mut ctx) = ai.split(0.0, &mut out);
        let mut brain = Brain::new(&snapshot(BossKind::Lupa));
        let options = [
            (BossState::Lupa(LupaState::Roaming), 0),
            (BossState::Lupa(LupaState::ShootInPlace), 1),
        ];
        for _ in 0..16 {
            change_state(&mut brain, Next::Weighted(&options), &mut ctx);
            assert_eq!(brain.state, Some(BossState::Lupa(LupaState::ShootInPlace)));
        }
    }
}
