use std::time::Duration;

use glam::Vec2;
use myth_forge_core::{
    config::EnemyStats, CombatConfig, Command, DamageSource, EffectTag, Element, EnemyId,
    EnemyKind, Event, GameOutcome, Level, PlacementError, PlotIndex, Rect, StatusEffect,
    TowerCommandError, TowerId, TowerKind, UpgradeError,
};
use myth_forge_world::{self as world, query, World};

fn level() -> Level {
    Level {
        name: String::from("Test Range"),
        path: vec![Vec2::new(100.0, 300.0), Vec2::new(900.0, 300.0)],
        plots: vec![
            Rect::from_origin_and_size(Vec2::new(0.0, 275.0), Vec2::splat(50.0)),
            Rect::from_origin_and_size(Vec2::new(400.0, 100.0), Vec2::splat(50.0)),
        ],
    }
}

fn set_speed(stats: &mut Option<EnemyStats>, speed: f32) {
    if let Some(stats) = stats.as_mut() {
        stats.speed = speed;
    }
}

/// Basic enemies stand still at the spawn, fast and tank enemies spread out.
fn config() -> CombatConfig {
    let mut config = CombatConfig::default();
    set_speed(&mut config.enemies.basic, 0.0);
    set_speed(&mut config.enemies.fast, 100.0);
    set_speed(&mut config.enemies.tank, 200.0);
    config
}

fn world_with(config: CombatConfig) -> World {
    World::new(config, level()).expect("valid world")
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn spawn(world: &mut World, kind: EnemyKind) -> EnemyId {
    let events = run(world, Command::SpawnEnemy { kind });
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn place(world: &mut World, kind: TowerKind, plot: u32) -> TowerId {
    let events = run(
        world,
        Command::PlaceTower {
            kind,
            plot: PlotIndex::new(plot),
        },
    );
    match events.as_slice() {
        [Event::TowerPlaced { tower, .. }] => *tower,
        other => panic!("unexpected placement events: {other:?}"),
    }
}

fn health(world: &World, enemy: EnemyId) -> Option<f32> {
    query::enemy_view(world).get(enemy).map(|snapshot| snapshot.health)
}

fn damage_events(events: &[Event]) -> Vec<(EnemyId, f32, DamageSource)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged {
                enemy,
                amount,
                source,
            } => Some((*enemy, *amount, *source)),
            _ => None,
        })
        .collect()
}

/// Lines up a slow enemy at the spawn with a fast one 50 units further along.
fn stationary_pair(world: &mut World) -> (EnemyId, EnemyId) {
    let struck = spawn(world, EnemyKind::Basic);
    let bystander = spawn(world, EnemyKind::Fast);
    let _ = run(
        world,
        Command::AdvanceEnemies {
            dt: Duration::from_millis(500),
        },
    );
    let view = query::enemy_view(world);
    assert_eq!(view.get(struck).map(|s| s.position), Some(Vec2::new(100.0, 300.0)));
    assert_eq!(view.get(bystander).map(|s| s.position), Some(Vec2::new(150.0, 300.0)));
    (struck, bystander)
}

fn charge_and_fire(world: &mut World, tower: TowerId, target: EnemyId) -> Vec<Event> {
    let _ = run(
        world,
        Command::Tick {
            dt: Duration::from_secs(2),
        },
    );
    run(world, Command::FireProjectile { tower, target })
}

#[test]
fn shell_splash_deals_full_direct_and_scaled_area_damage() {
    let mut world = world_with(config());
    let (struck, bystander) = stationary_pair(&mut world);
    let cannon = place(&mut world, TowerKind::Cannon, 0);
    assert_eq!(query::money(&world), 20);

    let fired = charge_and_fire(&mut world, cannon, struck);
    assert!(matches!(
        fired.as_slice(),
        [Event::ProjectileFired { kind, .. }] if *kind == myth_forge_core::ProjectileKind::Shell
    ));
    let shell = query::projectile_view(&world)
        .iter()
        .next()
        .copied()
        .expect("shell in flight");
    assert_eq!(shell.position, Vec2::new(25.0, 300.0));
    assert_eq!(shell.direction, Vec2::new(1.0, 0.0));

    let events = run(
        &mut world,
        Command::AdvanceProjectiles {
            dt: Duration::from_millis(250),
        },
    );

    assert_eq!(
        damage_events(&events),
        vec![
            (struck, 20.0, DamageSource::Direct),
            (bystander, 15.0, DamageSource::Splash),
        ]
    );
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ProjectileImpact { direct_hits: 1, position, .. } if *position == Vec2::new(100.0, 300.0)
    )));
    assert!(events.contains(&Event::EnemyKilled {
        enemy: bystander,
        kind: EnemyKind::Fast,
        bounty: 2,
    }));
    assert_eq!(health(&world, struck), Some(5.0));
    assert_eq!(health(&world, bystander), None);
    assert_eq!(query::money(&world), 22);
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn elements_apply_to_direct_hits_only() {
    let mut world = world_with(CombatConfig {
        economy: myth_forge_core::config::EconomyConfig {
            starting_money: 500,
            ..Default::default()
        },
        ..config()
    });
    let (struck, _) = stationary_pair(&mut world);
    let cannon = place(&mut world, TowerKind::Cannon, 0);
    let upgrade = run(
        &mut world,
        Command::UpgradeTower {
            tower: cannon,
            element: Element::Glacier,
        },
    );
    assert_eq!(
        upgrade,
        vec![Event::TowerUpgraded {
            tower: cannon,
            element: Element::Glacier,
            cost: 50,
        }]
    );

    let _ = charge_and_fire(&mut world, cannon, struck);
    let events = run(
        &mut world,
        Command::AdvanceProjectiles {
            dt: Duration::from_millis(250),
        },
    );

    let applied: Vec<EnemyId> = events
        .iter()
        .filter_map(|event| match event {
            Event::EffectApplied { enemy, effect } => {
                assert_eq!(effect.tag(), EffectTag::Slow);
                Some(*enemy)
            }
            _ => None,
        })
        .collect();
    assert_eq!(applied, vec![struck]);

    let snapshot = query::enemy_view(&world)
        .get(struck)
        .cloned()
        .expect("struck enemy survives");
    assert_eq!(
        snapshot.effects,
        vec![StatusEffect::Slow {
            fraction: 0.5,
            remaining: Duration::from_secs(2),
        }]
    );
}

#[test]
fn pyro_burn_kill_pays_bounty() {
    let mut world = world_with(CombatConfig {
        economy: myth_forge_core::config::EconomyConfig {
            starting_money: 500,
            ..Default::default()
        },
        ..config()
    });
    let struck = spawn(&mut world, EnemyKind::Basic);
    let cannon = place(&mut world, TowerKind::Cannon, 0);
    let _ = run(
        &mut world,
        Command::UpgradeTower {
            tower: cannon,
            element: Element::Pyro,
        },
    );
    assert_eq!(query::money(&world), 370);

    let _ = charge_and_fire(&mut world, cannon, struck);
    let hit = run(
        &mut world,
        Command::AdvanceProjectiles {
            dt: Duration::from_millis(250),
        },
    );
    assert_eq!(damage_events(&hit), vec![(struck, 20.0, DamageSource::Direct)]);
    assert!(hit.iter().any(|event| matches!(
        event,
        Event::EffectApplied { enemy, effect } if *enemy == struck && effect.tag() == EffectTag::Burn
    )));
    assert_eq!(health(&world, struck), Some(5.0));

    let burned = run(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(1),
        },
    );

    assert_eq!(damage_events(&burned), vec![(struck, 5.0, DamageSource::Burn)]);
    assert!(burned.contains(&Event::EnemyKilled {
        enemy: struck,
        kind: EnemyKind::Basic,
        bounty: 1,
    }));
    assert_eq!(query::money(&world), 371);
    assert_eq!(health(&world, struck), None);
    assert_eq!(query::live_enemy_count(&world), 0);
}

#[test]
fn storm_chains_to_nearest_neighbours_with_falloff() {
    let mut world = world_with(CombatConfig {
        economy: myth_forge_core::config::EconomyConfig {
            starting_money: 500,
            ..Default::default()
        },
        ..config()
    });
    let origin = spawn(&mut world, EnemyKind::Basic);
    let second = spawn(&mut world, EnemyKind::Fast);
    let third = spawn(&mut world, EnemyKind::Tank);
    let _ = run(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_millis(500),
        },
    );

    let tower = place(&mut world, TowerKind::Basic, 0);
    let _ = run(
        &mut world,
        Command::UpgradeTower {
            tower,
            element: Element::Storm,
        },
    );
    let _ = charge_and_fire(&mut world, tower, origin);
    let events = run(
        &mut world,
        Command::AdvanceProjectiles {
            dt: Duration::from_millis(200),
        },
    );

    let damage = damage_events(&events);
    assert_eq!(damage.len(), 3);
    assert_eq!(damage[0], (origin, 20.0, DamageSource::Direct));
    assert_eq!((damage[1].0, damage[1].2), (second, DamageSource::Chain));
    assert!((damage[1].1 - 14.0).abs() < 1e-3);
    assert_eq!((damage[2].0, damage[2].2), (third, DamageSource::Chain));
    assert!((damage[2].1 - 9.8).abs() < 1e-3);
    assert!(events
        .iter()
        .all(|event| !matches!(event, Event::EffectApplied { .. })));
}

#[test]
fn selling_refunds_half_the_cost_and_frees_the_plot() {
    let mut world = world_with(config());
    let sniper = place(&mut world, TowerKind::Sniper, 1);
    assert_eq!(query::money(&world), 0);

    let events = run(&mut world, Command::SellTower { tower: sniper });

    assert_eq!(
        events,
        vec![Event::TowerSold {
            tower: sniper,
            plot: PlotIndex::new(1),
            refund: 50,
        }]
    );
    assert_eq!(query::money(&world), 50);
    assert!(query::tower_view(&world).into_vec().is_empty());
    assert_eq!(query::tower_at_plot(&world, PlotIndex::new(1)), None);

    let again = run(&mut world, Command::SellTower { tower: sniper });
    assert_eq!(
        again,
        vec![Event::TowerCommandRejected {
            tower: sniper,
            reason: TowerCommandError::MissingTower,
        }]
    );
    assert_eq!(query::money(&world), 50);
}

#[test]
fn placement_rejections_leave_state_untouched() {
    let mut world = world_with(config());
    let rejected = |events: Vec<Event>| match events.as_slice() {
        [Event::TowerPlacementRejected { reason, .. }] => *reason,
        other => panic!("expected a rejection, got {other:?}"),
    };

    assert_eq!(
        rejected(run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                plot: PlotIndex::new(7),
            },
        )),
        PlacementError::InvalidPlot
    );

    let _ = place(&mut world, TowerKind::Basic, 0);
    assert_eq!(
        rejected(run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Rapid,
                plot: PlotIndex::new(0),
            },
        )),
        PlacementError::Occupied
    );
    assert_eq!(
        rejected(run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Sniper,
                plot: PlotIndex::new(1),
            },
        )),
        PlacementError::InsufficientFunds {
            cost: 100,
            available: 60,
        }
    );

    assert_eq!(query::money(&world), 60);
    assert_eq!(query::tower_view(&world).into_vec().len(), 1);
}

#[test]
fn upgrade_rejections_follow_check_order() {
    let mut config = config();
    config.economy.starting_money = 150;
    let mut world = world_with(config);
    let rejected = |events: Vec<Event>| match events.as_slice() {
        [Event::TowerUpgradeRejected { reason, .. }] => *reason,
        other => panic!("expected a rejection, got {other:?}"),
    };

    assert_eq!(
        rejected(run(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(9),
                element: Element::Pyro,
            },
        )),
        UpgradeError::MissingTower
    );

    let upgraded = place(&mut world, TowerKind::Basic, 0);
    let plain = place(&mut world, TowerKind::Basic, 1);
    let _ = run(
        &mut world,
        Command::UpgradeTower {
            tower: upgraded,
            element: Element::Pyro,
        },
    );
    assert_eq!(query::money(&world), 20);

    assert_eq!(
        rejected(run(
            &mut world,
            Command::UpgradeTower {
                tower: upgraded,
                element: Element::Storm,
            },
        )),
        UpgradeError::AlreadyUpgraded(Element::Pyro)
    );
    assert_eq!(
        rejected(run(
            &mut world,
            Command::UpgradeTower {
                tower: plain,
                element: Element::Glacier,
            },
        )),
        UpgradeError::InsufficientFunds {
            cost: 50,
            available: 20,
        }
    );
    assert_eq!(query::money(&world), 20);
    assert_eq!(
        query::tower_view(&world).get(plain).and_then(|tower| tower.element),
        None
    );
}

#[test]
fn targeting_mode_cycles_and_reports_missing_towers() {
    let mut world = world_with(config());
    let tower = place(&mut world, TowerKind::Basic, 0);

    let events = run(&mut world, Command::CycleTargetingMode { tower });
    assert_eq!(
        events,
        vec![Event::TargetingModeChanged {
            tower,
            mode: myth_forge_core::TargetingMode::Last,
        }]
    );

    let missing = run(
        &mut world,
        Command::CycleTargetingMode {
            tower: TowerId::new(42),
        },
    );
    assert!(matches!(
        missing.as_slice(),
        [Event::TowerCommandRejected {
            reason: TowerCommandError::MissingTower,
            ..
        }]
    ));
}

#[test]
fn escaping_enemy_costs_a_life_and_can_end_the_game() {
    let mut config = config();
    config.economy.starting_lives = 1;
    let mut world = world_with(config);
    let runner = spawn(&mut world, EnemyKind::Tank);

    let events = run(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(5),
        },
    );

    assert_eq!(
        events,
        vec![
            Event::EnemyReachedGoal {
                enemy: runner,
                kind: EnemyKind::Tank,
                lives_remaining: 0,
            },
            Event::GameOver {
                outcome: GameOutcome::Defeat,
            },
        ]
    );
    assert_eq!(query::lives(&world), 0);
    assert_eq!(query::live_enemy_count(&world), 0);
    assert_eq!(query::outcome(&world), Some(GameOutcome::Defeat));

    let _ = run(&mut world, Command::ConcludeCampaign);
    assert_eq!(query::outcome(&world), Some(GameOutcome::Defeat));
}

#[test]
fn dangling_target_is_cleared_instead_of_fired_upon() {
    let mut world = world_with(config());
    let runner = spawn(&mut world, EnemyKind::Tank);
    let tower = place(&mut world, TowerKind::Basic, 1);
    let _ = run(
        &mut world,
        Command::SetTowerTarget {
            tower,
            target: Some(runner),
        },
    );
    let _ = run(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(5),
        },
    );
    assert_eq!(query::live_enemy_count(&world), 0);

    let events = charge_and_fire(&mut world, tower, runner);

    assert_eq!(
        events,
        vec![Event::TowerTargetChanged {
            tower,
            target: None,
        }]
    );
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn unready_or_out_of_range_towers_do_not_fire() {
    let mut world = world_with(config());
    let target = spawn(&mut world, EnemyKind::Basic);
    let near = place(&mut world, TowerKind::Basic, 0);

    assert!(run(&mut world, Command::FireProjectile { tower: near, target }).is_empty());

    let _ = run(&mut world, Command::SellTower { tower: near });
    let far = place(&mut world, TowerKind::Basic, 1);
    assert!(charge_and_fire(&mut world, far, target).is_empty());
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn projectiles_leaving_the_playfield_expire() {
    let mut world = world_with(config());
    let target = spawn(&mut world, EnemyKind::Fast);
    let tower = place(&mut world, TowerKind::Basic, 0);
    let _ = charge_and_fire(&mut world, tower, target);

    // The target walks out of the line of fire before the shot lands.
    let _ = run(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(3),
        },
    );
    let events = run(
        &mut world,
        Command::AdvanceProjectiles {
            dt: Duration::from_secs(3),
        },
    );

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileExpired { .. })));
    assert!(damage_events(&events).is_empty());
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn speed_and_pause_settings_are_recorded() {
    let mut world = world_with(config());

    let events = run(&mut world, Command::SetSpeedMultiplier { multiplier: -3.0 });
    assert_eq!(events, vec![Event::SpeedChanged { multiplier: 0.0 }]);
    assert!(run(&mut world, Command::SetSpeedMultiplier { multiplier: f32::NAN }).is_empty());
    assert_eq!(query::speed_multiplier(&world), 0.0);

    let _ = run(&mut world, Command::SetPaused { paused: true });
    assert!(query::is_paused(&world));
    assert!(run(&mut world, Command::SetPaused { paused: true }).is_empty());
}

#[test]
fn reset_restores_initial_counters_and_clears_entities() {
    let mut world = world_with(config());
    let _ = spawn(&mut world, EnemyKind::Basic);
    let first = place(&mut world, TowerKind::Basic, 0);
    let _ = run(&mut world, Command::SetSpeedMultiplier { multiplier: 3.0 });

    let events = run(&mut world, Command::Reset);

    assert_eq!(events, vec![Event::WorldReset]);
    assert_eq!(query::money(&world), 100);
    assert_eq!(query::lives(&world), 20);
    assert_eq!(query::speed_multiplier(&world), 1.0);
    assert_eq!(query::live_enemy_count(&world), 0);
    assert!(query::tower_view(&world).into_vec().is_empty());
    assert_eq!(place(&mut world, TowerKind::Basic, 0), first);
}

#[test]
fn invalid_configuration_aborts_construction() {
    let mut config = config();
    config.waves.waves.clear();
    assert!(World::new(config, level()).is_err());

    let degenerate = Level {
        path: vec![Vec2::ZERO],
        ..level()
    };
    assert!(World::new(CombatConfig::default(), degenerate).is_err());
}
