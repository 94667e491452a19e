//! Parametric movement curves and the followers that walk them.

use std::f32::consts::TAU;

use shmup_core::Vec2;

/// Value-owned curve descriptor, rebuilt on every state transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Path {
    /// Straight segment.
    Line {
        /// Start point.
        from: Vec2,
        /// End point.
        to: Vec2,
    },
    /// Closed ellipse starting and ending at `center + (radii.x, 0)`.
    Ellipse {
        /// Centre of the ellipse.
        center: Vec2,
        /// Horizontal and vertical radii.
        radii: Vec2,
    },
    /// Cubic bezier curve through four control points.
    CubicBezier {
        /// Start point.
        p0: Vec2,
        /// First control point.
        p1: Vec2,
        /// Second control point.
        p2: Vec2,
        /// End point.
        p3: Vec2,
    },
    /// Lemniscate of Bernoulli starting and ending at `center + (scale.x, 0)`.
    Lemniscate {
        /// Crossing point of the figure eight.
        center: Vec2,
        /// Horizontal half-width and vertical stretch.
        scale: Vec2,
    },
    /// Chain of straight segments with equal time per segment.
    Polyline {
        /// Points visited in order; at least one.
        points: Vec<Vec2>,
    },
}

impl Path {
    /// Ellipse that passes through `start` at `t = 0`.
    #[must_use]
    pub fn ellipse_through(start: Vec2, radii: Vec2) -> Self {
        Self::Ellipse {
            center: start - Vec2::new(radii.x, 0.0),
            radii,
        }
    }

    /// Lemniscate that passes through `start` at `t = 0`.
    #[must_use]
    pub fn lemniscate_through(start: Vec2, scale: Vec2) -> Self {
        Self::Lemniscate {
            center: start - Vec2::new(scale.x, 0.0),
            scale,
        }
    }

    /// Point at normalized progress `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Line { from, to } => from.lerp(*to, t),
            Self::Ellipse { center, radii } => {
                let angle = t * TAU;
                *center + Vec2::new(radii.x * angle.cos(), radii.y * angle.sin())
            }
            Self::CubicBezier { p0, p1, p2, p3 } => {
                let u = 1.0 - t;
                *p0 * (u * u * u)
                    + *p1 * (3.0 * u * u * t)
                    + *p2 * (3.0 * u * t * t)
                    + *p3 * (t * t * t)
            }
            Self::Lemniscate { center, scale } => {
                let angle = t * TAU;
                let (sin, cos) = angle.sin_cos();
                let denominator = 1.0 + sin * sin;
                *center + Vec2::new(scale.x * cos / denominator, scale.y * sin * cos / denominator)
            }
            Self::Polyline { points } => match points.as_slice() {
                [] => Vec2::ZERO,
                [only] => *only,
                _ => {
                    let segments = (points.len() - 1) as f32;
                    let scaled = t * segments;
                    let index = (scaled.floor() as usize).min(points.len() - 2);
                    let local = scaled - index as f32;
                    points[index].lerp(points[index + 1], local)
                }
            },
        }
    }
}

/// How a follower behaves once it reaches the end of its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Stops at the end and reports completion.
    Once,
    /// Wraps back to the start; meant for closed curves.
    Loop,
    /// Reverses direction at either end.
    PingPong,
}

/// Walks a path with progress `t` in `[0, 1]` over a fixed duration.
#[derive(Clone, Debug, PartialEq)]
pub struct Follower {
    path: Path,
    t: f32,
    seconds: f32,
    repeat: Repeat,
    reversed: bool,
}

impl Follower {
    /// Creates a follower at the start of the path.
    #[must_use]
    pub fn new(path: Path, seconds: f32, repeat: Repeat) -> Self {
        Self {
            path,
            t: 0.0,
            seconds: seconds.max(f32::EPSILON),
            repeat,
            reversed: false,
        }
    }

    /// Progress along the path.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.t
    }

    /// Path being followed.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Reports whether a one-shot follower reached the end of its path.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.repeat == Repeat::Once && self.t >= 1.0
    }

    /// Current point on the path.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.path.point_at(self.t)
    }

    /// Advances progress by `dt` seconds and returns the new point.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        let step = dt.max(0.0) / self.seconds;
        match self.repeat {
            Repeat::Once => self.t = (self.t + step).min(1.0),
            Repeat::Loop => self.t = (self.t + step).fract(),
            Repeat::PingPong => {
                let mut t = if self.reversed { self.t - step } else { self.t + step };
                while !(0.0..=1.0).contains(&t) {
                    if t > 1.0 {
                        t = 2.0 - t;
                    } else {
                        t = -t;
                    }
                    self.reversed = !self.reversed;
                }
                self.t = t;
            }
        }
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn closed_curves_start_where_they_were_anchored() {
        let start = Vec2::new(300.0, 120.0);
        let ellipse = Path::ellipse_through(start, Vec2::new(80.0, 40.0));
        let lemniscate = Path::lemniscate_through(start, Vec2::new(120.0, 60.0));
        for path in [ellipse, lemniscate] {
            assert!(close(path.point_at(0.0), start));
            assert!(close(path.point_at(1.0), start));
        }
    }

    #[test]
    fn lemniscate_crosses_its_centre_halfway_through_each_lobe() {
        let path = Path::Lemniscate {
            center: Vec2::ZERO,
            scale: Vec2::new(100.0, 100.0),
        };
        assert!(close(path.point_at(0.25), Vec2::ZERO));
        assert!(close(path.point_at(0.5), Vec2::new(-100.0, 0.0)));
    }

    #[test]
    fn bezier_hits_its_end_points() {
        let path = Path::CubicBezier {
            p0: Vec2::new(0.0, 0.0),
            p1: Vec2::new(10.0, 50.0),
            p2: Vec2::new(90.0, 50.0),
            p3: Vec2::new(100.0, 0.0),
        };
        assert!(close(path.point_at(0.0), Vec2::ZERO));
        assert!(close(path.point_at(1.0), Vec2::new(100.0, 0.0)));
        assert!(close(path.point_at(0.5), Vec2::new(50.0, 37.5)));
    }

    #[test]
    fn polyline_spends_equal_time_per_segment() {
        let path = Path::Polyline {
            points: vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 30.0)],
        };
        assert!(close(path.point_at(0.25), Vec2::new(5.0, 0.0)));
        assert!(close(path.point_at(0.75), Vec2::new(10.0, 15.0)));
        assert!(close(path.point_at(1.0), Vec2::new(10.0, 30.0)));
    }

    #[test]
    fn one_shot_follower_finishes_and_holds_the_end() {
        let mut follower = Follower::new(
            Path::Line {
                from: Vec2::ZERO,
                to: Vec2::new(10.0, 0.0),
            },
            2.0,
            Repeat::Once,
        );
        assert!(close(follower.advance(1.0), Vec2::new(5.0, 0.0)));
        assert!(!follower.is_finished());
        assert!(close(follower.advance(5.0), Vec2::new(10.0, 0.0)));
        assert!(follower.is_finished());
    }

    #[test]
    fn ping_pong_follower_turns_around() {
        let mut follower = Follower::new(
            Path::Line {
                from: Vec2::ZERO,
                to: Vec2::new(10.0, 0.0),
            },
            1.0,
            Repeat::PingPong,
        );
        let _ = follower.advance(0.75);
        assert!(close(follower.advance(0.5), Vec2::new(7.5, 0.0)));
        assert!(!follower.is_finished());
    }

    #[test]
    fn looping_follower_wraps() {
        let mut follower = Follower::new(
            Path::ellipse_through(Vec2::ZERO, Vec2::new(10.0, 10.0)),
            1.0,
            Repeat::Loop,
        );
        let _ = follower.advance(1.25);
        assert!((follower.progress() - 0.25).abs() < 1e-5);
    }
}
