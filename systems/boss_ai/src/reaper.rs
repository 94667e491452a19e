use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use shmup_core::{BossState, Command, ReaperState, Vec2};

use crate::{
    change_state,
    path::{Path, Repeat},
    Action, Brain, Ctx, Deferred, Next,
};

const SHOOT_STATES: [BossState; 3] = [
    BossState::Reaper(ReaperState::ShootEllipse),
    BossState::Reaper(ReaperState::ShootBezier),
    BossState::Reaper(ReaperState::ShootLemniscate),
];

/// Reaper behaviour constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperTuning {
    /// Horizontal pursuit speed while chasing.
    pub chase_speed: f32,
    /// Horizontal distance to the player that ends the chase.
    pub chase_tolerance: f32,
    /// Aimed shots fired by each shoot state.
    pub volley_shots: u32,
    /// Delay between shots.
    pub fire_cooldown_ms: u64,
    /// Delay between shots of a clone.
    pub clone_fire_cooldown_ms: u64,
    /// Time to reach a roaming target.
    pub roam_seconds: f32,
    /// Time for one pass of a shooting pattern.
    pub pattern_seconds: f32,
    /// Lower bound of the self-clone delay.
    pub clone_delay_min_ms: u64,
    /// Upper bound of the self-clone delay.
    pub clone_delay_max_ms: u64,
}

impl Default for ReaperTuning {
    fn default() -> Self {
        Self {
            chase_speed: 220.0,
            chase_tolerance: 10.0,
            volley_shots: 10,
            fire_cooldown_ms: 160,
            clone_fire_cooldown_ms: 320,
            roam_seconds: 2.0,
            pattern_seconds: 2.4,
            clone_delay_min_ms: 6_000,
            clone_delay_max_ms: 11_000,
        }
    }
}

pub(crate) fn enter(brain: &mut Brain, state: ReaperState, ctx: &mut Ctx<'_>) {
    let pattern_seconds = ctx.tuning.reaper.pattern_seconds;
    let origin = brain.position;
    match state {
        ReaperState::Roaming => {
            let target = ctx.random_point();
            brain.target = Some(target);
            brain.follow(
                Path::Line {
                    from: origin,
                    to: target,
                },
                ctx.tuning.reaper.roam_seconds,
                Repeat::Once,
            );
        }
        ReaperState::Chasing => brain.target = Some(Vec2::new(ctx.player.x, origin.y)),
        ReaperState::ShootEllipse => brain.follow(
            Path::ellipse_through(origin, Vec2::new(90.0, 45.0)),
            pattern_seconds,
            Repeat::Loop,
        ),
        ReaperState::ShootBezier => {
            let toward_centre = if origin.x < ctx.bounds.center().x {
                1.0
            } else {
                -1.0
            };
            let reach = 240.0 * toward_centre;
            brain.follow(
                Path::CubicBezier {
                    p0: origin,
                    p1: origin + Vec2::new(reach * 0.25, 120.0),
                    p2: origin + Vec2::new(reach * 0.75, 120.0),
                    p3: origin + Vec2::new(reach, 0.0),
                },
                pattern_seconds,
                Repeat::PingPong,
            );
        }
        ReaperState::ShootLemniscate => brain.follow(
            Path::lemniscate_through(origin, Vec2::new(110.0, 55.0)),
            pattern_seconds,
            Repeat::Loop,
        ),
    }
}

pub(crate) fn path_finished(brain: &mut Brain, state: ReaperState, ctx: &mut Ctx<'_>) {
    if state == ReaperState::Roaming {
        change_state(
            brain,
            Next::To(BossState::Reaper(ReaperState::Chasing)),
            ctx,
        );
    }
}

pub(crate) fn update(brain: &mut Brain, state: ReaperState, ctx: &mut Ctx<'_>) {
    match state {
        ReaperState::Roaming => {}
        ReaperState::Chasing => {
            brain.target = Some(Vec2::new(ctx.player.x, brain.position.y));
            let dx = brain.target().x - brain.position.x;
            if dx.abs() < ctx.tuning.reaper.chase_tolerance {
                change_state(brain, Next::AnyOf(&SHOOT_STATES), ctx);
                return;
            }
            let step = (ctx.tuning.reaper.chase_speed * ctx.dt).min(dx.abs());
            let position = brain.position + Vec2::new(step.copysign(dx), 0.0);
            ctx.move_boss(brain, position);
        }
        ReaperState::ShootEllipse | ReaperState::ShootBezier | ReaperState::ShootLemniscate => {
            brain.aim_at(ctx.player);
            let tuning = &ctx.tuning.reaper;
            let cooldown = Duration::from_millis(if brain.is_clone {
                tuning.clone_fire_cooldown_ms
            } else {
                tuning.fire_cooldown_ms
            });
            let volley = tuning.volley_shots;
            let _ = ctx.fire(brain, cooldown);
            if brain.shots_fired >= volley {
                change_state(
                    brain,
                    Next::To(BossState::Reaper(ReaperState::Chasing)),
                    ctx,
                );
            }
        }
    }
}

/// Arms the next self-clone; survives state transitions.
pub(crate) fn schedule_clone(brain: &Brain, ctx: &mut Ctx<'_>) {
    let tuning = &ctx.tuning.reaper;
    let low = tuning.clone_delay_min_ms.min(tuning.clone_delay_max_ms);
    let high = tuning.clone_delay_min_ms.max(tuning.clone_delay_max_ms);
    let delay = Duration::from_millis(ctx.rng.gen_range(low..=high));
    let _ = ctx.timeline.schedule(
        ctx.now + delay,
        Deferred {
            boss: brain.id,
            epoch: None,
            action: Action::Clone,
        },
    );
}

pub(crate) fn clone_now(brain: &Brain, ctx: &mut Ctx<'_>) {
    if brain.is_clone {
        return;
    }
    tracing::debug!(boss = brain.id.get(), "reaper cloning itself");
    ctx.out.push(Command::CloneBoss { boss: brain.id });
    schedule_clone(brain, ctx);
}
