use shmup_core::{PoolKind, Vec2};
use shmup_system_session::PlayerInput;
use shmup_world::{query, World};

/// Horizontal reach inside which an incoming bullet triggers a sidestep.
const DODGE_REACH: f32 = 28.0;
/// Vertical window above the ship in which bullets are considered incoming.
const DODGE_WINDOW: f32 = 140.0;
/// Distance of a sidestep.
const SIDESTEP: f32 = 60.0;

/// Stand-in player that tracks the nearest threat and keeps firing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Autopilot;

impl Autopilot {
    /// Samples the input for the next frame from the current world state.
    pub(crate) fn input(&self, world: &World) -> PlayerInput {
        let player = query::player(world).position;
        let bounds = query::bounds(world);

        let threat = query::pool_view(world, PoolKind::EnemyBullet)
            .active()
            .map(|bullet| bullet.position)
            .filter(|bullet| {
                (bullet.x - player.x).abs() < DODGE_REACH
                    && bullet.y < player.y
                    && player.y - bullet.y < DODGE_WINDOW
            })
            .max_by(|a, b| a.y.total_cmp(&b.y));
        let move_to = match threat {
            Some(bullet) if bullet.x >= player.x => player.x - SIDESTEP,
            Some(_) => player.x + SIDESTEP,
            None => target(world, player).map_or(player.x, |target| target.x),
        };

        PlayerInput {
            move_to: Some(move_to.clamp(bounds.min().x, bounds.max().x)),
            fire: true,
        }
    }
}

fn target(world: &World, player: Vec2) -> Option<Vec2> {
    let bosses = query::boss_view(world);
    let boss = bosses
        .iter()
        .filter(|boss| !boss.is_dead)
        .map(|boss| boss.position)
        .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)));
    boss.or_else(|| {
        query::formation_view(world)
            .nearest_to(player)
            .map(|member| member.position)
    })
    .or_else(|| {
        query::pool_view(world, PoolKind::Powerup)
            .active()
            .map(|powerup| powerup.position)
            .next()
    })
}

#[cfg(test)]
mod tests {
    use shmup_core::{BossKind, Command};
    use shmup_world::{self as world, GameConfig};

    use super::*;

    fn started() -> World {
        let mut world = World::new(GameConfig::default()).expect("valid config");
        let mut events = Vec::new();
        world::apply(&mut world, Command::StartLevel { level: 1 }, &mut events);
        world
    }

    #[test]
    fn tracks_the_nearest_formation_member() {
        let world = started();
        let player = query::player(&world).position;
        let nearest = query::formation_view(&world)
            .nearest_to(player)
            .map(|member| member.position.x)
            .expect("formation present");

        let input = Autopilot.input(&world);
        assert_eq!(input.move_to, Some(nearest));
        assert!(input.fire);
    }

    #[test]
    fn prefers_a_living_boss_over_the_formation() {
        let mut world = started();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::EnqueueBosses {
                kinds: vec![BossKind::Lupa],
            },
            &mut events,
        );
        world::apply(&mut world, Command::SpawnNextBoss, &mut events);
        let boss = query::boss_view(&world)
            .iter()
            .next()
            .map(|boss| boss.position.x)
            .expect("boss spawned");

        assert_eq!(Autopilot.input(&world).move_to, Some(boss));
    }
}
