use std::collections::BTreeMap;

use shmup_core::{EffectId, Vec2};

/// Receives the rewards earned by kills.
pub trait Scoring {
    /// Adds points to the score.
    fn add_score(&mut self, points: u32);

    /// Adds currency to the wallet.
    fn add_money(&mut self, amount: u32);
}

/// Plays effect animations and reports the ones that finished.
pub trait Animator {
    /// Starts the animation of `effect`.
    fn play(&mut self, effect: EffectId, animation: &str, position: Vec2);

    /// Moves the effects whose animation finished since the last call into `out`.
    fn drain_finished(&mut self, out: &mut Vec<EffectId>);
}

/// Running score and money totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Accumulated points.
    pub score: u64,
    /// Accumulated currency.
    pub money: u64,
}

impl Scoring for Tally {
    fn add_score(&mut self, points: u32) {
        self.score += u64::from(points);
    }

    fn add_money(&mut self, amount: u32) {
        self.money += u64::from(amount);
    }
}

/// Animator that finishes every animation after a fixed number of frames.
#[derive(Clone, Debug, Default)]
pub struct FrameAnimator {
    frames: u32,
    playing: BTreeMap<EffectId, u32>,
}

impl FrameAnimator {
    /// Creates an animator whose animations last `frames` calls to
    /// [`Animator::drain_finished`].
    #[must_use]
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            playing: BTreeMap::new(),
        }
    }

    /// Number of animations still playing.
    #[must_use]
    pub fn playing(&self) -> usize {
        self.playing.len()
    }
}

impl Animator for FrameAnimator {
    fn play(&mut self, effect: EffectId, animation: &str, position: Vec2) {
        tracing::trace!(effect = effect.get(), animation, ?position, "animation started");
        let _ = self.playing.insert(effect, self.frames);
    }

    fn drain_finished(&mut self, out: &mut Vec<EffectId>) {
        self.playing.retain(|effect, frames| {
            if *frames == 0 {
                out.push(*effect);
                false
            } else {
                *frames -= 1;
                true
            }
        });
    }
}

/// Animator that never finishes; effects expire on the world's fallback timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAnimator;

impl Animator for NullAnimator {
    fn play(&mut self, _effect: EffectId, _animation: &str, _position: Vec2) {}

    fn drain_finished(&mut self, _out: &mut Vec<EffectId>) {}
}
