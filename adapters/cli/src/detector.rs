use shmup_core::{Body, Overlap, PoolKind, SlotId, Vec2};
use shmup_world::{query, World};

/// Collision radius of every body kind.
#[derive(Clone, Copy, Debug)]
struct Radii {
    player: f32,
    player_bullet: f32,
    enemy_bullet: f32,
    powerup: f32,
    grid_enemy: f32,
    boss: f32,
}

impl Default for Radii {
    fn default() -> Self {
        Self {
            player: 14.0,
            player_bullet: 3.0,
            enemy_bullet: 4.0,
            powerup: 8.0,
            grid_enemy: 14.0,
            boss: 40.0,
        }
    }
}

/// Circle overlap detector standing in for a physics engine.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Detector {
    radii: Radii,
}

struct Circle {
    body: Body,
    centre: Vec2,
    radius: f32,
}

impl Circle {
    fn touches(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.centre.distance_squared(other.centre) <= reach * reach
    }
}

impl Detector {
    /// Reports every overlap the collision layer reacts to.
    pub(crate) fn detect(&self, world: &World) -> Vec<Overlap> {
        let radii = self.radii;
        let chunk_radius = query::config(world).barriers.chunk_size * 0.5;
        let pooled = |kind: PoolKind, radius: f32, body: fn(SlotId) -> Body| -> Vec<Circle> {
            query::pool_view(world, kind)
                .active()
                .map(|entity| Circle {
                    body: body(entity.handle.slot),
                    centre: entity.position,
                    radius,
                })
                .collect()
        };

        let player_bullets = pooled(PoolKind::PlayerBullet, radii.player_bullet, Body::PlayerBullet);
        let enemy_bullets = pooled(PoolKind::EnemyBullet, radii.enemy_bullet, Body::EnemyBullet);
        let powerups = pooled(PoolKind::Powerup, radii.powerup, Body::Powerup);
        let player = [Circle {
            body: Body::Player,
            centre: query::player(world).position,
            radius: radii.player,
        }];
        let mut hulls: Vec<Circle> = query::formation_view(world)
            .iter()
            .map(|member| Circle {
                body: Body::GridEnemy(member.id),
                centre: member.position,
                radius: radii.grid_enemy,
            })
            .collect();
        hulls.extend(
            query::boss_view(world)
                .iter()
                .filter(|boss| !boss.is_dead)
                .map(|boss| Circle {
                    body: Body::Boss(boss.id),
                    centre: boss.position,
                    radius: radii.boss,
                }),
        );
        let chunks: Vec<Circle> = query::barrier_view(world)
            .iter()
            .map(|chunk| Circle {
                body: Body::BarrierChunk(chunk.id),
                centre: chunk.position,
                radius: chunk_radius,
            })
            .collect();

        let mut overlaps = Vec::new();
        pairs(&player_bullets, &hulls, &mut overlaps);
        pairs(&player_bullets, &enemy_bullets, &mut overlaps);
        pairs(&player_bullets, &chunks, &mut overlaps);
        pairs(&enemy_bullets, &player, &mut overlaps);
        pairs(&enemy_bullets, &chunks, &mut overlaps);
        pairs(&player, &powerups, &mut overlaps);
        pairs(&hulls, &chunks, &mut overlaps);
        overlaps
    }
}

fn pairs(left: &[Circle], right: &[Circle], out: &mut Vec<Overlap>) {
    for a in left {
        out.extend(
            right
                .iter()
                .filter(|b| a.touches(b))
                .map(|b| Overlap::new(a.body, b.body)),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shmup_core::Command;
    use shmup_world::{self as world, GameConfig};

    use super::*;

    #[test]
    fn fresh_level_has_no_contacts() {
        let mut world = World::new(GameConfig::default()).expect("valid config");
        let mut events = Vec::new();
        world::apply(&mut world, Command::StartLevel { level: 1 }, &mut events);

        assert!(Detector::default().detect(&world).is_empty());
    }

    #[test]
    fn player_bullet_reaches_the_barrier_above_the_ship() {
        let mut world = World::new(GameConfig::default()).expect("valid config");
        let mut events = Vec::new();
        world::apply(&mut world, Command::StartLevel { level: 1 }, &mut events);
        let column = query::barrier_view(&world)
            .iter()
            .map(|chunk| chunk.position.x)
            .next()
            .expect("barriers built");
        world::apply(&mut world, Command::MovePlayer { x: column }, &mut events);
        world::apply(&mut world, Command::FirePlayerBullet, &mut events);

        let detector = Detector::default();
        let mut hit = false;
        for _ in 0..60 {
            world::apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(10),
                },
                &mut events,
            );
            hit |= detector.detect(&world).iter().any(|overlap| {
                matches!(
                    (overlap.a, overlap.b),
                    (Body::PlayerBullet(_), Body::BarrierChunk(_))
                )
            });
        }
        assert!(hit);
    }
}
