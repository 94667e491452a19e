use std::{cell::RefCell, rc::Rc, time::Duration};

use shmup_core::{Body, Event, GameMode, Overlap, PoolKind, SceneSignal};
use shmup_system_director::RunOutcome;
use shmup_system_session::{
    FrameAnimator, NullAnimator, PlayerInput, Session, SessionConfig, Tally,
};
use shmup_world::query;

const FRAME: Duration = Duration::from_millis(16);

fn campaign(seed: u64) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.reseed(seed);
    config
}

fn autopilot(frame: u32) -> PlayerInput {
    PlayerInput {
        move_to: Some(if frame % 120 < 60 { 200.0 } else { 600.0 }),
        fire: frame % 3 == 0,
    }
}

#[test]
fn identical_seeds_replay_identical_event_logs() {
    let run = || {
        let mut session =
            Session::new(campaign(7), NullAnimator, Tally::default()).expect("valid config");
        let mut log = Vec::new();
        for frame in 0..400 {
            log.extend(session.step(FRAME, autopilot(frame), &[]));
        }
        log
    };
    let first = run();
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::ProjectileSpawned { .. })));
    assert_eq!(first, run());
}

#[test]
fn scene_signals_reach_live_subscribers_only() {
    let mut config = campaign(11);
    config.world.formation.breach_margin = 580.0;
    let mut session = Session::new(config, NullAnimator, Tally::default()).expect("valid config");

    let kept = Rc::new(RefCell::new(Vec::new()));
    let dropped = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kept);
    let _subscription = session.subscribe(move |signal| sink.borrow_mut().push(*signal));
    let sink = Rc::clone(&dropped);
    drop(session.subscribe(move |signal| sink.borrow_mut().push(*signal)));

    for _ in 0..120 {
        let _ = session.step(FRAME, PlayerInput::default(), &[]);
    }

    assert_eq!(*kept.borrow(), vec![SceneSignal::FormationBreached]);
    assert!(dropped.borrow().is_empty());
    assert_eq!(session.outcome(), Some(RunOutcome::Lost));
    let frozen = session.elapsed();
    let _ = session.step(FRAME, PlayerInput::default(), &[]);
    assert_eq!(session.elapsed(), frozen);
}

#[test]
fn kills_reward_scoring_and_effects_finish_through_the_animator() {
    let mut session =
        Session::new(campaign(3), FrameAnimator::new(2), Tally::default()).expect("valid config");
    let fired = session.step(
        FRAME,
        PlayerInput {
            move_to: None,
            fire: true,
        },
        &[],
    );
    let bullet = fired
        .iter()
        .find_map(|event| match event {
            Event::ProjectileSpawned { handle, .. } if handle.kind == PoolKind::PlayerBullet => {
                Some(handle.slot)
            }
            _ => None,
        })
        .expect("player bullet fired");
    let target = query::formation_view(session.world())
        .iter()
        .next()
        .cloned()
        .expect("formation present");

    let hit = session.step(
        FRAME,
        PlayerInput::default(),
        &[Overlap::new(
            Body::PlayerBullet(bullet),
            Body::GridEnemy(target.id),
        )],
    );
    assert!(hit
        .iter()
        .any(|event| matches!(event, Event::GridEnemyKilled { enemy, .. } if *enemy == target.id)));
    assert_eq!(session.scoring().score, u64::from(target.reward.score));
    assert_eq!(session.animator().playing(), 1);
    assert_eq!(
        query::pool_view(session.world(), PoolKind::Explosion).active_count(),
        1
    );

    let mut parked = false;
    for _ in 0..3 {
        let events = session.step(FRAME, PlayerInput::default(), &[]);
        parked |= events.iter().any(|event| {
            matches!(event, Event::EntityParked { handle } if handle.kind == PoolKind::Explosion)
        });
    }
    assert!(parked);
    assert_eq!(session.animator().playing(), 0);
    assert_eq!(
        query::pool_view(session.world(), PoolKind::Explosion).active_count(),
        0
    );
}

#[test]
fn boss_rush_opens_with_a_boss_and_accepts_state_requests() {
    let mut config = campaign(5);
    config.mode = GameMode::BossRush;
    let mut session = Session::new(config, NullAnimator, Tally::default()).expect("valid config");

    let mut spawned = None;
    for _ in 0..200 {
        let events = session.step(FRAME, PlayerInput::default(), &[]);
        spawned = spawned.or_else(|| {
            events.iter().find_map(|event| match event {
                Event::BossSpawned { boss, .. } => Some(*boss),
                _ => None,
            })
        });
        if spawned.is_some() {
            break;
        }
    }
    let boss = spawned.expect("boss rush spawns its first boss");
    let _ = session.step(FRAME, PlayerInput::default(), &[]);
    assert!(session.boss_ai().brain(boss).is_some());
    assert!(!session.request_boss_state(boss, "DANCING"));
}

#[test]
fn partial_toml_overrides_keep_the_remaining_defaults() {
    let config: SessionConfig = toml::from_str(
        r#"
        mode = "boss-rush"

        [world]
        powerup_drop_odds = 5

        [director]
        boss_delay_ms = 250
        "#,
    )
    .expect("valid toml");

    assert_eq!(config.mode, GameMode::BossRush);
    assert_eq!(config.world.powerup_drop_odds, 5);
    assert_eq!(config.director.boss_delay_ms, 250);
    assert_eq!(
        config.director.boss_every,
        SessionConfig::default().director.boss_every
    );
    assert_eq!(config.bosses, SessionConfig::default().bosses);
}
