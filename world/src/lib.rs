#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Myth-Forge Defence.
//!
//! The world owns the path, the live enemy arena, placed towers, projectiles
//! in flight and the economy. It changes only through [`apply`] and is read
//! through the [`query`] module.

pub mod ballistics;
mod collision;
mod enemies;
mod projectiles;
mod towers;

use std::time::Duration;

use myth_forge_core::{
    within_reach, CombatConfig, Command, ConfigError, Element, EnemyId, EnemyKind, Event,
    GameOutcome, Level, PathModel, PlacementError, PlotIndex, Rect, TowerCommandError, TowerId,
    TowerKind, UpgradeError,
};
use tracing::{debug, error, info};

use crate::{
    enemies::{Enemy, EnemyArena},
    projectiles::{Projectile, ProjectileRegistry},
    towers::{TowerRegistry, TowerState},
};

/// Represents the authoritative Myth-Forge Defence world state.
#[derive(Debug)]
pub struct World {
    config: CombatConfig,
    level: Level,
    path: PathModel,
    bounds: Rect,
    enemies: EnemyArena,
    towers: TowerRegistry,
    projectiles: ProjectileRegistry,
    money: u32,
    lives: u32,
    speed_multiplier: f32,
    paused: bool,
    outcome: Option<GameOutcome>,
}

impl World {
    /// Creates a world for the level, validating the configuration first.
    pub fn new(config: CombatConfig, level: Level) -> Result<Self, ConfigError> {
        config.validate()?;
        let path = level.path_model()?;
        let bounds = config.playfield.bounds();
        let money = config.economy.starting_money;
        let lives = config.economy.starting_lives;

        Ok(Self {
            config,
            level,
            path,
            bounds,
            enemies: EnemyArena::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectileRegistry::new(),
            money,
            lives,
            speed_multiplier: 1.0,
            paused: false,
            outcome: None,
        })
    }

    fn reset(&mut self) {
        self.enemies.clear();
        self.towers = TowerRegistry::new();
        self.projectiles = ProjectileRegistry::new();
        self.money = self.config.economy.starting_money;
        self.lives = self.config.economy.starting_lives;
        self.speed_multiplier = 1.0;
        self.paused = false;
        self.outcome = None;
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let Some(stats) = self.config.enemies.get(kind).copied() else {
            error!(%kind, "no stats configured for enemy type; spawn aborted");
            return;
        };

        let enemy = Enemy::spawn(kind, stats, &self.path);
        let position = enemy.position();
        let id = self.enemies.insert(enemy);
        debug!(?id, %kind, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            position,
        });
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let path = &self.path;
        self.enemies
            .for_each_mut(|id, enemy| enemy.advance(id, dt, path, out_events));

        for id in self.enemies.collect_ids(Enemy::reached_goal) {
            let Some(enemy) = self.enemies.remove(id) else {
                continue;
            };
            self.lives = self.lives.saturating_sub(1);
            debug!(?id, kind = %enemy.kind(), lives = self.lives, "enemy reached the goal");
            out_events.push(Event::EnemyReachedGoal {
                enemy: id,
                kind: enemy.kind(),
                lives_remaining: self.lives,
            });
            if self.lives == 0 {
                self.conclude(GameOutcome::Defeat, out_events);
            }
        }

        self.reap_dead(out_events);
    }

    /// Removes every enemy with no health left and pays out its bounty.
    fn reap_dead(&mut self, out_events: &mut Vec<Event>) {
        for id in self.enemies.collect_ids(|enemy| !enemy.is_alive()) {
            let Some(enemy) = self.enemies.remove(id) else {
                continue;
            };
            let bounty = enemy.bounty();
            self.money = self.money.saturating_add(bounty);
            debug!(?id, kind = %enemy.kind(), bounty, "enemy killed");
            out_events.push(Event::EnemyKilled {
                enemy: id,
                kind: enemy.kind(),
                bounty,
            });
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut in_flight = self.projectiles.take_all();
        in_flight.retain_mut(|projectile| {
            projectile.advance(dt);
            if self.bounds.contains(projectile.position) {
                return true;
            }
            debug!(projectile = projectile.id.get(), "projectile left the playfield");
            out_events.push(Event::ProjectileExpired {
                projectile: projectile.id,
            });
            false
        });
        self.projectiles.restore(in_flight);

        self.resolve_collisions(out_events);
        self.reap_dead(out_events);
    }

    fn conclude(&mut self, outcome: GameOutcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        info!(?outcome, money = self.money, lives = self.lives, "game over");
        out_events.push(Event::GameOver { outcome });
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        plot: PlotIndex,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlacementError> {
        let rect = usize::try_from(plot.get())
            .ok()
            .and_then(|index| self.level.plots.get(index))
            .copied()
            .ok_or(PlacementError::InvalidPlot)?;
        if self.towers.occupant(plot).is_some() {
            return Err(PlacementError::Occupied);
        }
        let stats = self
            .config
            .towers
            .get(kind)
            .copied()
            .ok_or(PlacementError::UnknownTowerKind)?;
        if self.money < stats.cost {
            return Err(PlacementError::InsufficientFunds {
                cost: stats.cost,
                available: self.money,
            });
        }

        self.money -= stats.cost;
        let id = self.towers.allocate();
        self.towers
            .insert(TowerState::new(id, kind, plot, rect.center(), stats));
        info!(tower = id.get(), %kind, plot = plot.get(), cost = stats.cost, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            plot,
            cost: stats.cost,
        });
        Ok(())
    }

    fn sell_tower(
        &mut self,
        tower: TowerId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), TowerCommandError> {
        let state = self
            .towers
            .remove(tower)
            .ok_or(TowerCommandError::MissingTower)?;
        let refund = sell_value(state.stats.cost, self.config.economy.sell_fraction);
        self.money = self.money.saturating_add(refund);
        info!(tower = tower.get(), kind = %state.kind, refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower,
            plot: state.plot,
            refund,
        });
        Ok(())
    }

    fn upgrade_tower(
        &mut self,
        tower: TowerId,
        element: Element,
        out_events: &mut Vec<Event>,
    ) -> Result<(), UpgradeError> {
        let current = self
            .towers
            .get(tower)
            .ok_or(UpgradeError::MissingTower)?
            .element;
        let cost = self
            .config
            .elements
            .get(element)
            .ok_or(UpgradeError::UnknownUpgrade)?
            .cost;
        if let Some(existing) = current {
            return Err(UpgradeError::AlreadyUpgraded(existing));
        }
        if self.money < cost {
            return Err(UpgradeError::InsufficientFunds {
                cost,
                available: self.money,
            });
        }

        let state = self.towers.get_mut(tower).ok_or(UpgradeError::MissingTower)?;
        state.element = Some(element);
        self.money -= cost;
        info!(tower = tower.get(), %element, cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded {
            tower,
            element,
            cost,
        });
        Ok(())
    }

    fn fire(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if !state.is_ready() {
            return;
        }

        let Some(enemy) = self.enemies.get(target).filter(|enemy| enemy.is_alive()) else {
            if state.target == Some(target) {
                state.target = None;
                out_events.push(Event::TowerTargetChanged {
                    tower,
                    target: None,
                });
            }
            return;
        };
        if !within_reach(state.position, state.stats.range, enemy.position(), enemy.radius()) {
            return;
        }

        let kind = state.stats.projectile;
        let Some(stats) = self.config.projectiles.get(kind).copied() else {
            error!(%kind, "no stats configured for projectile type; shot aborted");
            return;
        };

        let direction = ballistics::lead_direction(
            state.position,
            enemy.position(),
            enemy.velocity(),
            stats.speed,
        );
        state.discharge();
        let projectile = Projectile {
            id: self.projectiles.allocate(),
            kind,
            tower,
            position: state.position,
            direction,
            stats,
            element: state.element,
        };
        let id = projectile.id;
        self.projectiles.launch(projectile);
        out_events.push(Event::ProjectileFired {
            projectile: id,
            tower,
            kind,
        });
    }
}

/// Refund credited for selling a tower; elemental upgrades are not refunded.
fn sell_value(cost: u32, fraction: f32) -> u32 {
    (cost as f32 * fraction).floor().max(0.0) as u32
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            for tower in world.towers.iter_mut() {
                tower.recharge(dt);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AdvanceEnemies { dt } => world.advance_enemies(dt, out_events),
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::SpawnEnemy { kind } => world.spawn_enemy(kind, out_events),
        Command::AwardWaveBonus { wave, amount } => {
            world.money = world.money.saturating_add(amount);
            info!(wave, amount, money = world.money, "wave completed");
            out_events.push(Event::WaveBonusAwarded { wave, amount });
        }
        Command::ConcludeCampaign => {
            if world.lives > 0 {
                world.conclude(GameOutcome::Victory, out_events);
            }
        }
        Command::PlaceTower { kind, plot } => {
            if let Err(reason) = world.place_tower(kind, plot, out_events) {
                debug!(%kind, plot = plot.get(), %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, plot, reason });
            }
        }
        Command::SellTower { tower } => {
            if let Err(reason) = world.sell_tower(tower, out_events) {
                debug!(tower = tower.get(), %reason, "tower sale rejected");
                out_events.push(Event::TowerCommandRejected { tower, reason });
            }
        }
        Command::UpgradeTower { tower, element } => {
            if let Err(reason) = world.upgrade_tower(tower, element, out_events) {
                debug!(tower = tower.get(), %element, %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    element,
                    reason,
                });
            }
        }
        Command::CycleTargetingMode { tower } => match world.towers.get_mut(tower) {
            Some(state) => {
                state.mode = state.mode.next();
                debug!(tower = tower.get(), mode = %state.mode, "targeting mode changed");
                out_events.push(Event::TargetingModeChanged {
                    tower,
                    mode: state.mode,
                });
            }
            None => {
                let reason = TowerCommandError::MissingTower;
                debug!(tower = tower.get(), %reason, "targeting mode change rejected");
                out_events.push(Event::TowerCommandRejected { tower, reason });
            }
        },
        Command::SetTowerTarget { tower, target } => {
            if let Some(state) = world.towers.get_mut(tower) {
                if state.target != target {
                    state.target = target;
                    out_events.push(Event::TowerTargetChanged { tower, target });
                }
            }
        }
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::SetSpeedMultiplier { multiplier } => {
            if !multiplier.is_finite() {
                debug!(multiplier, "non-finite speed multiplier ignored");
                return;
            }
            world.speed_multiplier = multiplier.max(0.0);
            out_events.push(Event::SpeedChanged {
                multiplier: world.speed_multiplier,
            });
        }
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::Reset => {
            world.reset();
            info!(level = %world.level.name, "world reset");
            out_events.push(Event::WorldReset);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use myth_forge_core::{
        CombatConfig, EnemyView, GameOutcome, PathModel, PlotIndex, ProjectileView, Rect,
        TowerCooldownView, TowerId, TowerView,
    };

    use super::World;

    /// Money currently available to spend.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.money
    }

    /// Lives left before defeat.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Factor applied to frame time by the combat loop.
    #[must_use]
    pub fn speed_multiplier(world: &World) -> f32 {
        world.speed_multiplier
    }

    /// Reports whether simulation time is frozen.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Final outcome, once the game has been decided.
    #[must_use]
    pub fn outcome(world: &World) -> Option<GameOutcome> {
        world.outcome
    }

    /// Number of enemies in the live set.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of the live enemies in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|(id, enemy)| enemy.snapshot(id))
                .collect(),
        )
    }

    /// Captures a read-only view of every placed tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the cooldown of every placed tower.
    #[must_use]
    pub fn tower_cooldown_view(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown_snapshot())
                .collect(),
        )
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| projectile.snapshot())
                .collect(),
        )
    }

    /// Path enemies follow.
    #[must_use]
    pub fn path(world: &World) -> &PathModel {
        &world.path
    }

    /// Buildable plot rectangles, indexed by [`PlotIndex`].
    #[must_use]
    pub fn plots(world: &World) -> &[Rect] {
        &world.level.plots
    }

    /// Tower standing on the plot, if any.
    #[must_use]
    pub fn tower_at_plot(world: &World, plot: PlotIndex) -> Option<TowerId> {
        world.towers.occupant(plot)
    }

    /// Display name of the active level.
    #[must_use]
    pub fn level_name(world: &World) -> &str {
        &world.level.name
    }

    /// Bounds outside which projectiles are discarded.
    #[must_use]
    pub fn playfield(world: &World) -> Rect {
        world.bounds
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &CombatConfig {
        &world.config
    }
}
