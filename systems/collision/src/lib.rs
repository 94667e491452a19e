#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that maps overlap pairs onto gameplay commands.
//!
//! Every overlap names two bodies in either order. The resolver normalises
//! the pair, checks that the bodies are still in play according to the views
//! captured for the batch and emits exactly one effect. A bullet consumed by
//! one overlap is ignored by every later overlap of the same batch.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shmup_core::{
    BarrierView, Body, BossId, BossView, ChunkId, Command, EnemyId, FormationView, Overlap,
    PlayerSnapshot, PoolHandle, PoolKind, PoolView, SlotId, Vec2,
};

/// Configuration parameters required to construct the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed of the blast radius stream.
    pub rng_seed: u64,
    /// Smallest splash radius of a bullet hitting a barrier.
    pub min_blast_radius: f32,
    /// Largest splash radius of a bullet hitting a barrier.
    pub max_blast_radius: f32,
    /// Damage dealt at the centre of the splash.
    pub blast_damage: f32,
}

impl Config {
    /// Creates a configuration with the provided seed and default blast.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            min_blast_radius: 10.0,
            max_blast_radius: 20.0,
            blast_damage: 3.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0x0c01_115e)
    }
}

/// Immutable views the resolver reads for one overlap batch.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Player bullet pool.
    pub player_bullets: &'a PoolView,
    /// Enemy bullet pool.
    pub enemy_bullets: &'a PoolView,
    /// Powerup pool.
    pub powerups: &'a PoolView,
    /// Formation members.
    pub formation: &'a FormationView,
    /// Bosses in play.
    pub bosses: &'a BossView,
    /// The player.
    pub player: &'a PlayerSnapshot,
    /// Standing barrier chunks.
    pub barriers: &'a BarrierView,
}

impl Scene<'_> {
    fn pool(&self, kind: PoolKind) -> Option<&PoolView> {
        match kind {
            PoolKind::PlayerBullet => Some(self.player_bullets),
            PoolKind::EnemyBullet => Some(self.enemy_bullets),
            PoolKind::Powerup => Some(self.powerups),
            PoolKind::Explosion => None,
        }
    }

    fn position(&self, handle: PoolHandle) -> Option<Vec2> {
        self.pool(handle.kind)?
            .get(handle.slot)
            .filter(|snapshot| snapshot.active)
            .map(|snapshot| snapshot.position)
    }
}

/// Gameplay meaning of a normalised overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Contact {
    BulletHitsEnemy(SlotId, EnemyId),
    BulletHitsBoss(SlotId, BossId),
    BulletHitsPlayer(SlotId),
    BulletsClash { player: SlotId, enemy: SlotId },
    BulletHitsBarrier(PoolHandle, ChunkId),
    BodyCrushesBarrier(ChunkId),
    PlayerCollects(SlotId),
}

fn classify(overlap: Overlap) -> Option<Contact> {
    let contact = |a: Body, b: Body| match (a, b) {
        (Body::PlayerBullet(bullet), Body::GridEnemy(enemy)) => {
            Some(Contact::BulletHitsEnemy(bullet, enemy))
        }
        (Body::PlayerBullet(bullet), Body::Boss(boss)) => Some(Contact::BulletHitsBoss(bullet, boss)),
        (Body::EnemyBullet(bullet), Body::Player) => Some(Contact::BulletHitsPlayer(bullet)),
        (Body::PlayerBullet(player), Body::EnemyBullet(enemy)) => {
            Some(Contact::BulletsClash { player, enemy })
        }
        (Body::PlayerBullet(slot), Body::BarrierChunk(chunk)) => Some(Contact::BulletHitsBarrier(
            PoolHandle::new(PoolKind::PlayerBullet, slot),
            chunk,
        )),
        (Body::EnemyBullet(slot), Body::BarrierChunk(chunk)) => Some(Contact::BulletHitsBarrier(
            PoolHandle::new(PoolKind::EnemyBullet, slot),
            chunk,
        )),
        (Body::GridEnemy(_) | Body::Boss(_), Body::BarrierChunk(chunk)) => {
            Some(Contact::BodyCrushesBarrier(chunk))
        }
        (Body::Player, Body::Powerup(slot)) => Some(Contact::PlayerCollects(slot)),
        _ => None,
    };
    contact(overlap.a, overlap.b).or_else(|| contact(overlap.b, overlap.a))
}

/// Bodies already used up by earlier overlaps of the batch.
#[derive(Debug, Default)]
struct Consumed {
    handles: HashSet<PoolHandle>,
    enemies: HashSet<EnemyId>,
    chunks: HashSet<ChunkId>,
}

impl Consumed {
    fn clear(&mut self) {
        self.handles.clear();
        self.enemies.clear();
        self.chunks.clear();
    }
}

/// Collision resolver turning overlap batches into commands.
#[derive(Debug)]
pub struct CollisionResolver {
    config: Config,
    rng: ChaCha8Rng,
    consumed: Consumed,
}

impl CollisionResolver {
    /// Creates the resolver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            consumed: Consumed::default(),
        }
    }

    /// Resolves one physics batch against the views captured before it.
    pub fn handle(&mut self, overlaps: &[Overlap], scene: Scene<'_>, out: &mut Vec<Command>) {
        self.consumed.clear();
        for overlap in overlaps {
            match classify(*overlap) {
                Some(contact) => self.resolve(contact, &scene, out),
                None => tracing::trace!(?overlap, "overlap without gameplay effect"),
            }
        }
    }

    fn resolve(&mut self, contact: Contact, scene: &Scene<'_>, out: &mut Vec<Command>) {
        match contact {
            Contact::BulletHitsEnemy(slot, enemy) => {
                let bullet = PoolHandle::new(PoolKind::PlayerBullet, slot);
                if !self.consume(bullet, scene, out) {
                    return;
                }
                let Some(member) = scene.formation.get(enemy) else {
                    return;
                };
                if self.consumed.enemies.insert(enemy) {
                    out.push(Command::ExplodeAt {
                        position: member.position,
                    });
                    out.push(Command::KillGridEnemy { enemy });
                }
            }
            Contact::BulletHitsBoss(slot, boss) => {
                let bullet = PoolHandle::new(PoolKind::PlayerBullet, slot);
                if !self.consume(bullet, scene, out) {
                    return;
                }
                if let Some(target) = scene.bosses.get(boss).filter(|target| !target.is_dead) {
                    out.push(Command::ExplodeAt {
                        position: target.position,
                    });
                    out.push(Command::DamageBoss { boss });
                }
            }
            Contact::BulletHitsPlayer(slot) => {
                let bullet = PoolHandle::new(PoolKind::EnemyBullet, slot);
                if !self.consume(bullet, scene, out) {
                    return;
                }
                out.push(Command::ExplodeAt {
                    position: scene.player.position,
                });
                out.push(Command::HitPlayer);
            }
            Contact::BulletsClash { player, enemy } => {
                let player = PoolHandle::new(PoolKind::PlayerBullet, player);
                let enemy = PoolHandle::new(PoolKind::EnemyBullet, enemy);
                let (Some(position), Some(_)) = (self.live(player, scene), self.live(enemy, scene)) else {
                    tracing::trace!("bullet clash with a spent bullet ignored");
                    return;
                };
                let _ = self.consume(player, scene, out);
                let _ = self.consume(enemy, scene, out);
                out.push(Command::ExplodeAt { position });
            }
            Contact::BulletHitsBarrier(bullet, chunk) => {
                if !self.consume(bullet, scene, out) {
                    return;
                }
                let Some(centre) = scene.barriers.get(chunk).map(|struck| struck.position) else {
                    return;
                };
                self.splash(centre, scene, out);
            }
            Contact::BodyCrushesBarrier(chunk) => {
                if scene.barriers.get(chunk).is_some() && self.consumed.chunks.insert(chunk) {
                    out.push(Command::DestroyBarrier { chunk });
                }
            }
            Contact::PlayerCollects(slot) => {
                let powerup = PoolHandle::new(PoolKind::Powerup, slot);
                if self.live(powerup, scene).is_some() && self.consumed.handles.insert(powerup) {
                    out.push(Command::CollectPowerup { slot });
                }
            }
        }
    }

    /// Position of a pooled body that is active and not yet consumed.
    fn live(&self, handle: PoolHandle, scene: &Scene<'_>) -> Option<Vec2> {
        if self.consumed.handles.contains(&handle) {
            return None;
        }
        scene.position(handle)
    }

    /// Deactivates a live bullet; reports whether it was still live.
    fn consume(&mut self, bullet: PoolHandle, scene: &Scene<'_>, out: &mut Vec<Command>) -> bool {
        if self.live(bullet, scene).is_none() {
            tracing::trace!(kind = ?bullet.kind, slot = bullet.slot.get(), "spent bullet ignored");
            return false;
        }
        let _ = self.consumed.handles.insert(bullet);
        out.push(Command::DeactivateProjectile { handle: bullet });
        true
    }

    /// Damages every standing chunk within a random radius with linear falloff.
    fn splash(&mut self, centre: Vec2, scene: &Scene<'_>, out: &mut Vec<Command>) {
        let low = self.config.min_blast_radius.min(self.config.max_blast_radius);
        let high = self.config.min_blast_radius.max(self.config.max_blast_radius);
        let radius = if high > low {
            self.rng.gen_range(low..=high)
        } else {
            low
        };
        if radius <= 0.0 {
            return;
        }
        for chunk in scene.barriers.iter() {
            if self.consumed.chunks.contains(&chunk.id) {
                continue;
            }
            let distance = chunk.position.distance(centre);
            let amount = self.config.blast_damage * (1.0 - distance / radius);
            if amount <= 0.0 {
                continue;
            }
            if amount >= chunk.health {
                let _ = self.consumed.chunks.insert(chunk.id);
            }
            out.push(Command::DamageBarrier {
                chunk: chunk.id,
                amount,
            });
        }
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
