use std::time::Duration;

use shmup_core::{BossKind, Command, Event, GameMode, SceneSignal};
use shmup_system_director::{Config, Director, RunOutcome};
use shmup_world::{self as world, query, GameConfig, World};

struct Harness {
    world: World,
    director: Director,
    carried: Vec<Event>,
}

impl Harness {
    fn new(mode: GameMode, config: Config) -> Self {
        let mut harness = Self {
            world: World::new(GameConfig::default()).expect("valid config"),
            director: Director::new(mode, config),
            carried: Vec::new(),
        };
        let mut commands = Vec::new();
        harness.director.begin(&mut commands);
        harness.apply(commands);
        harness
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.carried);
        }
    }

    fn step(&mut self, dt: Duration) -> Vec<Command> {
        let mut events = std::mem::take(&mut self.carried);
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        let mut commands = Vec::new();
        self.director.handle(
            &events,
            &query::boss_view(&self.world),
            query::boss_queue(&self.world).len(),
            &mut commands,
        );
        self.apply(commands.clone());
        commands
    }

    fn clear_formation(&mut self) {
        let members: Vec<_> = query::formation_view(&self.world)
            .iter()
            .map(|member| member.id)
            .collect();
        self.apply(
            members
                .into_iter()
                .map(|enemy| Command::KillGridEnemy { enemy })
                .collect(),
        );
    }

    fn kill_living_bosses(&mut self) {
        let living: Vec<_> = query::boss_view(&self.world)
            .iter()
            .filter(|boss| !boss.is_dead)
            .map(|boss| (boss.id, boss.hp))
            .collect();
        for (boss, hp) in living {
            for _ in 0..hp {
                self.apply(vec![Command::DamageBoss { boss }]);
            }
        }
    }
}

#[test]
fn campaign_advances_after_the_formation_is_cleared() {
    let config = Config::default();
    let mut harness = Harness::new(GameMode::Campaign, config);
    assert_eq!(query::level(&harness.world), 1);
    assert_eq!(query::formation_view(&harness.world).len(), 55);

    harness.clear_formation();
    assert!(harness
        .carried
        .contains(&Event::Signal { signal: SceneSignal::FormationCleared }));
    assert!(harness.step(Duration::from_millis(16)).is_empty());

    let commands = harness.step(Duration::from_millis(config.level_delay_ms));
    assert_eq!(commands, vec![Command::StartLevel { level: 2 }]);
    assert_eq!(harness.director.level(), 2);
    assert_eq!(query::formation_view(&harness.world).len(), 55);
}

#[test]
fn boss_levels_queue_a_boss_and_release_it_after_a_breather() {
    let config = Config {
        boss_every: 2,
        level_delay_ms: 0,
        boss_delay_ms: 500,
    };
    let mut harness = Harness::new(GameMode::Campaign, config);
    harness.clear_formation();

    let commands = harness.step(Duration::from_millis(16));
    assert_eq!(
        commands,
        vec![
            Command::StartLevel { level: 2 },
            Command::EnqueueBosses {
                kinds: vec![BossKind::Reaper]
            },
        ],
    );
    assert_eq!(query::boss_queue(&harness.world), vec![BossKind::Reaper]);

    assert!(harness.step(Duration::from_millis(16)).is_empty());
    assert!(harness.step(Duration::from_millis(400)).is_empty());
    let commands = harness.step(Duration::from_millis(100));
    assert_eq!(commands, vec![Command::SpawnNextBoss]);
    assert_eq!(query::boss_view(&harness.world).living_count(), 1);
    assert!(query::boss_queue(&harness.world).is_empty());

    for _ in 0..100 {
        assert!(harness.step(Duration::from_millis(100)).is_empty());
    }
}

#[test]
fn boss_rush_is_won_when_the_queue_is_exhausted() {
    let mut harness = Harness::new(GameMode::BossRush, Config::default());
    assert_eq!(query::boss_queue(&harness.world), BossKind::ALL.to_vec());
    assert_eq!(query::formation_view(&harness.world).len(), 0);

    let mut spawned = Vec::new();
    for _ in 0..200 {
        let _ = harness.step(Duration::from_millis(100));
        for boss in query::boss_view(&harness.world).iter() {
            if !spawned.contains(&boss.kind) {
                spawned.push(boss.kind);
            }
        }
        harness.kill_living_bosses();
        if harness.director.outcome().is_some() {
            break;
        }
    }
    let _ = harness.step(Duration::from_millis(100));
    assert_eq!(spawned, BossKind::ALL.to_vec());
    assert_eq!(harness.director.outcome(), Some(RunOutcome::Won));
}

#[test]
fn running_out_of_lives_ends_the_run() {
    let mut harness = Harness::new(GameMode::Campaign, Config::default());
    let lives = query::player(&harness.world).lives;
    for _ in 0..lives {
        harness.apply(vec![Command::HitPlayer]);
        let _ = harness.step(Duration::from_secs(2));
    }
    assert_eq!(harness.director.outcome(), Some(RunOutcome::Lost));

    harness.clear_formation();
    for _ in 0..10 {
        assert!(harness.step(Duration::from_secs(1)).is_empty());
    }
}
