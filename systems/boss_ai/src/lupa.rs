use std::{f32::consts::FRAC_PI_2, time::Duration};

use serde::{Deserialize, Serialize};
use shmup_core::{BossState, LupaState, Vec2};

use crate::{
    change_state,
    path::{Path, Repeat},
    Brain, Ctx, Next,
};

/// Lupa behaviour constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LupaTuning {
    /// Time for the entry sweep along the barrier line.
    pub sweep_seconds: f32,
    /// Time to reach a roaming target.
    pub travel_seconds: f32,
    /// Time for one pass of a shooting pattern.
    pub pattern_seconds: f32,
    /// Shots fired before a shoot state hands over to the random walk.
    pub shots_per_state: u32,
    /// Delay between spiral shots.
    pub spiral_cooldown_ms: u64,
    /// Delay between aimed shots.
    pub aimed_cooldown_ms: u64,
    /// Delay between shots fired in place.
    pub in_place_cooldown_ms: u64,
    /// Rotation of the spiral per shot.
    pub spiral_step_degrees: f32,
    /// Rotation of the in-place stream per shot.
    pub in_place_step_degrees: f32,
    /// Random walk weight of roaming.
    pub roaming_weight: u32,
    /// Random walk weight of the spiral.
    pub spiral_weight: u32,
    /// Random walk weight of aimed fire.
    pub aimed_weight: u32,
    /// Random walk weight of firing in place.
    pub in_place_weight: u32,
}

impl Default for LupaTuning {
    fn default() -> Self {
        Self {
            sweep_seconds: 4.0,
            travel_seconds: 1.6,
            pattern_seconds: 3.0,
            shots_per_state: 25,
            spiral_cooldown_ms: 70,
            aimed_cooldown_ms: 200,
            in_place_cooldown_ms: 45,
            spiral_step_degrees: 17.0,
            in_place_step_degrees: 23.0,
            roaming_weight: 2,
            spiral_weight: 3,
            aimed_weight: 3,
            in_place_weight: 2,
        }
    }
}

impl LupaTuning {
    fn walk(&self) -> [(BossState, u32); 4] {
        [
            (BossState::Lupa(LupaState::Roaming), self.roaming_weight),
            (BossState::Lupa(LupaState::ShootSpiral), self.spiral_weight),
            (BossState::Lupa(LupaState::ShootAimed), self.aimed_weight),
            (BossState::Lupa(LupaState::ShootInPlace), self.in_place_weight),
        ]
    }
}

fn random_walk(brain: &mut Brain, ctx: &mut Ctx<'_>) {
    let options = ctx.tuning.lupa.walk();
    change_state(brain, Next::Weighted(&options), ctx);
}

pub(crate) fn enter(brain: &mut Brain, state: LupaState, ctx: &mut Ctx<'_>) {
    let tuning = ctx.tuning;
    let origin = brain.position;
    match state {
        LupaState::BarrierSweep => {
            let margin = tuning.roam_margin;
            let line = ctx.barrier_line;
            let left = Vec2::new(ctx.bounds.min().x + margin, line);
            let right = Vec2::new(ctx.bounds.max().x - margin, line);
            let (first, last) = if origin.x <= ctx.bounds.center().x {
                (left, right)
            } else {
                (right, left)
            };
            brain.target = Some(last);
            brain.follow(
                Path::Polyline {
                    points: vec![origin, first, last],
                },
                tuning.lupa.sweep_seconds,
                Repeat::Once,
            );
        }
        LupaState::RoamCenter | LupaState::Roaming => {
            let target = if state == LupaState::RoamCenter {
                ctx.top_centre()
            } else {
                ctx.random_point()
            };
            brain.target = Some(target);
            brain.follow(
                Path::Line {
                    from: origin,
                    to: target,
                },
                tuning.lupa.travel_seconds,
                Repeat::Once,
            );
        }
        LupaState::ShootSpiral => {
            brain.facing = FRAC_PI_2;
            brain.follow(
                Path::ellipse_through(origin, Vec2::new(120.0, 50.0)),
                tuning.lupa.pattern_seconds,
                Repeat::Loop,
            );
        }
        LupaState::ShootAimed => {
            let sweep = if origin.x < ctx.bounds.center().x {
                200.0
            } else {
                -200.0
            };
            brain.follow(
                Path::CubicBezier {
                    p0: origin,
                    p1: origin + Vec2::new(sweep * 0.3, -60.0),
                    p2: origin + Vec2::new(sweep * 0.7, 90.0),
                    p3: origin + Vec2::new(sweep, 0.0),
                },
                tuning.lupa.pattern_seconds,
                Repeat::PingPong,
            );
        }
        LupaState::ShootInPlace => {
            brain.facing = FRAC_PI_2;
            brain.target = Some(origin);
        }
    }
}

pub(crate) fn path_finished(brain: &mut Brain, state: LupaState, ctx: &mut Ctx<'_>) {
    match state {
        LupaState::BarrierSweep => change_state(
            brain,
            Next::To(BossState::Lupa(LupaState::RoamCenter)),
            ctx,
        ),
        LupaState::RoamCenter | LupaState::Roaming => random_walk(brain, ctx),
        LupaState::ShootSpiral | LupaState::ShootAimed | LupaState::ShootInPlace => {}
    }
}

pub(crate) fn update(brain: &mut Brain, state: LupaState, ctx: &mut Ctx<'_>) {
    let tuning = &ctx.tuning.lupa;
    let (cooldown, step) = match state {
        LupaState::BarrierSweep | LupaState::RoamCenter | LupaState::Roaming => return,
        LupaState::ShootSpiral => (tuning.spiral_cooldown_ms, tuning.spiral_step_degrees),
        LupaState::ShootAimed => {
            brain.aim_at(ctx.player);
            (tuning.aimed_cooldown_ms, 0.0)
        }
        LupaState::ShootInPlace => (tuning.in_place_cooldown_ms, tuning.in_place_step_degrees),
    };
    let shots = tuning.shots_per_state;
    if ctx.fire(brain, Duration::from_millis(cooldown)) {
        brain.facing += step.to_radians();
    }
    if brain.shots_fired >= shots {
        random_walk(brain, ctx);
    }
}
