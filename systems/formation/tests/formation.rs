use std::time::Duration;

use shmup_core::{Command, EnemyId, Event, HorizontalDirection, Vec2};
use shmup_system_formation::{Config, FormationAi};
use shmup_world::{self as world, query, GameConfig, World};

fn started_world(config: GameConfig) -> World {
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartLevel { level: 1 }, &mut events);
    world
}

fn step(world: &mut World, ai: &mut FormationAi, dt: Duration) -> (Vec<Command>, Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);

    let mut moves = Vec::new();
    ai.handle(&events, &query::formation_view(world), &mut moves);
    let mut follow_up = Vec::new();
    for command in moves.clone() {
        world::apply(world, command, &mut follow_up);
    }

    let mut shots = Vec::new();
    ai.shoot(
        &query::formation_view(world),
        &query::player(world),
        &mut shots,
    );
    for command in shots.clone() {
        world::apply(world, command, &mut follow_up);
    }

    moves.extend(shots);
    (moves, follow_up)
}

#[test]
fn out_of_bounds_member_triggers_exactly_one_descent() {
    let mut world = started_world(GameConfig::default());
    let mut events = Vec::new();
    while !query::formation_view(&world).any_out_of_horizontal_bounds() {
        world::apply(&mut world, Command::ShiftFormation, &mut events);
    }
    let before: Vec<f32> = query::formation_view(&world)
        .iter()
        .map(|member| member.position.y)
        .collect();

    let mut ai = FormationAi::new(Config::new(7));
    let (commands, follow_up) = step(&mut world, &mut ai, Duration::ZERO);
    assert_eq!(commands, vec![Command::DescendFormation]);
    let descents: Vec<&Event> = follow_up
        .iter()
        .filter(|event| matches!(event, Event::FormationDescended { .. }))
        .collect();
    assert_eq!(
        descents,
        vec![&Event::FormationDescended {
            direction: HorizontalDirection::Left
        }],
    );

    let view = query::formation_view(&world);
    let gap = query::config(&world).formation.gap.y;
    for (member, y) in view.iter().zip(before) {
        assert_eq!(member.position.y, y + gap);
    }
    assert!(!view.any_out_of_horizontal_bounds());

    let (commands, _) = step(&mut world, &mut ai, Duration::ZERO);
    assert!(commands.is_empty(), "descent must not repeat: {commands:?}");
}

#[test]
fn nearest_policy_picks_member_closest_to_player() {
    let mut world = started_world(GameConfig::default());
    let mut ai = FormationAi::new(Config {
        rng_seed: 3,
        nearest_shooter_chance: 1.0,
    });

    let cadence = query::formation_view(&world).shoot_cadence();
    let (commands, follow_up) = step(&mut world, &mut ai, cadence);
    assert_eq!(
        commands,
        vec![
            Command::ShiftFormation,
            Command::FireFromGridEnemy {
                enemy: EnemyId::new(51)
            },
        ],
    );

    let shooter = query::formation_view(&world)
        .get(EnemyId::new(51))
        .expect("alive")
        .position;
    let spawned = follow_up.iter().find_map(|event| match event {
        Event::ProjectileSpawned { position, .. } => Some(*position),
        _ => None,
    });
    assert_eq!(spawned, Some(shooter), "bullet leaves from the post-move position");
}

#[test]
fn nearest_shooter_is_ranked_after_the_shift() {
    let mut config = GameConfig::default();
    config.formation.rows.truncate(1);
    config.formation.columns = 2;
    config.formation.origin = Vec2::new(80.0, 60.0);
    config.formation.step = 20.0;
    config.formation.base_move_ms = 500;
    config.formation.base_shoot_ms = 500;
    let mut world = started_world(config);
    let mut events = Vec::new();
    world::apply(&mut world, Command::MovePlayer { x: 106.0 }, &mut events);
    let mut ai = FormationAi::new(Config {
        rng_seed: 5,
        nearest_shooter_chance: 1.0,
    });

    // Before the shift the right member (124) is nearer; after it the left one (100) is.
    let (commands, _) = step(&mut world, &mut ai, Duration::from_millis(500));
    assert_eq!(
        commands,
        vec![
            Command::ShiftFormation,
            Command::FireFromGridEnemy {
                enemy: EnemyId::new(0)
            },
        ],
    );
    let positions: Vec<f32> = query::formation_view(&world)
        .iter()
        .map(|member| member.position.x)
        .collect();
    assert_eq!(positions, vec![100.0, 144.0]);
}

#[test]
fn random_policy_only_picks_living_members() {
    let mut world = started_world(GameConfig::default());
    let mut ai = FormationAi::new(Config {
        rng_seed: 11,
        nearest_shooter_chance: 0.0,
    });
    let cadence = query::formation_view(&world).shoot_cadence();

    for _ in 0..20 {
        let living = query::formation_view(&world);
        let (commands, _) = step(&mut world, &mut ai, cadence);
        for command in commands {
            if let Command::FireFromGridEnemy { enemy } = command {
                assert!(living.get(enemy).is_some());
                let mut events = Vec::new();
                world::apply(&mut world, Command::KillGridEnemy { enemy }, &mut events);
            }
        }
    }
    assert!(query::formation_view(&world).len() < 55);
}

#[test]
fn identical_seeds_replay_identically() {
    fn replay() -> Vec<Command> {
        let mut world = started_world(GameConfig::default());
        let mut ai = FormationAi::new(Config::new(0xdead_beef));
        let mut log = Vec::new();
        for _ in 0..240 {
            let (commands, _) = step(&mut world, &mut ai, Duration::from_millis(16));
            log.extend(commands);
        }
        log
    }

    let first = replay();
    assert!(first
        .iter()
        .any(|command| matches!(command, Command::FireFromGridEnemy { .. })));
    assert_eq!(first, replay());
}

#[test]
fn empty_formation_stays_silent() {
    let mut world = World::default();
    let mut ai = FormationAi::default();
    let (commands, _) = step(&mut world, &mut ai, Duration::from_secs(5));
    assert!(commands.is_empty());
}
