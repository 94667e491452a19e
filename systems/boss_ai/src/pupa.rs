use std::{f32::consts::FRAC_PI_2, time::Duration};

use rand::Rng;
use serde::{Deserialize, Serialize};
use shmup_core::{BossState, PupaState, Vec2};

use crate::{
    change_state,
    path::{Path, Repeat},
    Brain, Ctx, Next, Triangle,
};

/// Vertex angles of the illumination triangle, apex first.
const VERTEX_DEGREES: [f32; 3] = [-90.0, 30.0, 150.0];

/// Pupa behaviour constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PupaTuning {
    /// Time for one lap of the roaming figure eight.
    pub lap_seconds: f32,
    /// Time spent roaming before the triangle traversal starts.
    pub roam_ms: u64,
    /// Time to travel between two vertices.
    pub travel_seconds: f32,
    /// Time held at each vertex.
    pub pause_ms: u64,
    /// Delay between shots of the stream fired at a vertex.
    pub stream_cooldown_ms: u64,
    /// Delay between shots fired while traversing in rage.
    pub rage_cooldown_ms: u64,
    /// Magnitude of the stream rotation per shot.
    pub angular_step_degrees: f32,
    /// Distance of each vertex from the triangle centre.
    pub triangle_radius: f32,
}

impl Default for PupaTuning {
    fn default() -> Self {
        Self {
            lap_seconds: 5.0,
            roam_ms: 7_000,
            travel_seconds: 0.9,
            pause_ms: 1_400,
            stream_cooldown_ms: 60,
            rage_cooldown_ms: 110,
            angular_step_degrees: 12.0,
            triangle_radius: 150.0,
        }
    }
}

fn vertices(ctx: &Ctx<'_>) -> [Vec2; 3] {
    let centre = Vec2::new(
        ctx.bounds.center().x,
        ctx.bounds.min().y + ctx.bounds.height() * 0.3,
    );
    let radius = ctx.tuning.pupa.triangle_radius;
    VERTEX_DEGREES.map(|degrees| {
        let (sin, cos) = degrees.to_radians().sin_cos();
        centre + Vec2::new(cos, sin) * radius
    })
}

fn travel(brain: &mut Brain, ctx: &Ctx<'_>) {
    let target = brain.triangle.vertices[brain.triangle.next];
    brain.target = Some(target);
    brain.follow(
        Path::Line {
            from: brain.position,
            to: target,
        },
        ctx.tuning.pupa.travel_seconds,
        Repeat::Once,
    );
}

pub(crate) fn enter(brain: &mut Brain, state: PupaState, ctx: &mut Ctx<'_>) {
    let tuning = ctx.tuning;
    match state {
        PupaState::Roaming => {
            let lap = Path::lemniscate_through(brain.position, Vec2::new(140.0, 70.0));
            brain.follow(lap, tuning.pupa.lap_seconds, Repeat::Loop);
            let roam = Duration::from_millis(tuning.pupa.roam_ms);
            ctx.defer_transition(brain, roam, BossState::Pupa(PupaState::IllumStart));
        }
        PupaState::IllumStart => {
            let vertices = vertices(ctx);
            let position = brain.position;
            let nearest = (0..vertices.len())
                .min_by(|a, b| {
                    vertices[*a]
                        .distance_squared(position)
                        .total_cmp(&vertices[*b].distance_squared(position))
                })
                .unwrap_or(0);
            brain.triangle = Triangle {
                vertices,
                next: nearest,
                visited: 0,
            };
            let sign = if brain.in_rage && ctx.rng.gen_bool(0.5) {
                -1.0
            } else {
                1.0
            };
            brain.angular_velocity = sign * tuning.pupa.angular_step_degrees.to_radians();
            brain.facing = FRAC_PI_2;
            travel(brain, ctx);
        }
        PupaState::IllumNext => travel(brain, ctx),
        PupaState::IllumPause => {
            let pause = Duration::from_millis(tuning.pupa.pause_ms);
            brain.target = Some(brain.position);
            brain.triangle.visited += 1;
            brain.triangle.next = (brain.triangle.next + 1) % brain.triangle.vertices.len();
            let next = if brain.triangle.visited >= 3 {
                PupaState::Roaming
            } else {
                PupaState::IllumNext
            };
            ctx.defer_transition(brain, pause, BossState::Pupa(next));
        }
    }
}

pub(crate) fn path_finished(brain: &mut Brain, state: PupaState, ctx: &mut Ctx<'_>) {
    if matches!(state, PupaState::IllumStart | PupaState::IllumNext) {
        change_state(
            brain,
            Next::To(BossState::Pupa(PupaState::IllumPause)),
            ctx,
        );
    }
}

pub(crate) fn update(brain: &mut Brain, state: PupaState, ctx: &mut Ctx<'_>) {
    let tuning = &ctx.tuning.pupa;
    let cooldown = match state {
        PupaState::Roaming => return,
        PupaState::IllumPause => tuning.stream_cooldown_ms,
        PupaState::IllumStart | PupaState::IllumNext if brain.in_rage => tuning.rage_cooldown_ms,
        PupaState::IllumStart | PupaState::IllumNext => return,
    };
    if ctx.fire(brain, Duration::from_millis(cooldown)) {
        brain.facing += brain.angular_velocity;
    }
}
