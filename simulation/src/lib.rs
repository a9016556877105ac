#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestrator that drives the world and its systems.
//!
//! [`CombatLoop`] owns the authoritative [`World`] together with the pure
//! systems and sequences one frame as: wave scheduling, enemy movement and
//! effects, target acquisition, firing, projectile flight and collision.
//! Player input enters through [`CombatLoop::submit`], which either applies a
//! command atomically or reports why it was rejected.

use std::time::Duration;

use myth_forge_core::{
    CombatConfig, Command, ConfigError, Element, EnemyView, Event, GameOutcome, Level,
    PlacementError, PlotIndex, ProjectileView, TowerCommandError, TowerId, TowerKind, TowerTarget,
    TowerView, UpgradeError, WaveProgress,
};
use myth_forge_system_spawning::WaveManager;
use myth_forge_system_tower_combat::TowerCombat;
use myth_forge_system_tower_targeting::TowerTargeting;
use myth_forge_world::{self as world, query, World};
use tracing::{debug, info};

/// Discrete input issued by a player or script.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Builds a tower of the given kind on a plot.
    PlaceTower {
        /// Tower type to construct.
        kind: TowerKind,
        /// Plot to build on.
        plot: PlotIndex,
    },
    /// Sells a tower for part of its construction cost.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Attaches an elemental upgrade to a tower.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
        /// Element to attach.
        element: Element,
    },
    /// Advances a tower to its next targeting mode.
    CycleTargeting {
        /// Tower whose mode changes.
        tower: TowerId,
    },
    /// Sets the fast-forward multiplier applied to frame time.
    SetSpeed {
        /// New multiplier; negative values clamp to zero.
        multiplier: f32,
    },
    /// Flips the paused flag.
    TogglePause,
    /// Restores the level to its initial state.
    Reset,
}

/// Reasons a submitted command did not change the world.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// Placement failed.
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    /// Upgrade failed.
    #[error("upgrade rejected: {0}")]
    Upgrade(#[from] UpgradeError),
    /// A sale or targeting change addressed an unusable tower.
    #[error("tower command rejected: {0}")]
    Tower(#[from] TowerCommandError),
    /// The speed multiplier was not a finite number.
    #[error("speed multiplier {0} is not finite")]
    InvalidSpeed(f32),
}

/// Read-only heads-up summary of the running game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hud {
    /// Money available for construction.
    pub money: u32,
    /// Lives left before defeat.
    pub lives: u32,
    /// Wave schedule progress.
    pub waves: WaveProgress,
    /// Current fast-forward multiplier.
    pub speed_multiplier: f32,
    /// Whether the simulation is frozen.
    pub paused: bool,
    /// Final result once decided.
    pub outcome: Option<GameOutcome>,
}

/// Owns the world and systems, advancing them one frame at a time.
#[derive(Debug)]
pub struct CombatLoop {
    world: World,
    waves: WaveManager,
    targeting: TowerTargeting,
    combat: TowerCombat,
    elapsed: Duration,
    frame_events: Vec<Event>,
    pending_events: Vec<Event>,
    scratch_events: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<TowerTarget>,
}

impl CombatLoop {
    /// Builds the world for the level and wires the systems to its schedule.
    pub fn new(config: CombatConfig, level: Level) -> Result<Self, ConfigError> {
        let schedule = config.waves.clone();
        let world = World::new(config, level)?;
        info!(level = query::level_name(&world), "combat loop ready");
        Ok(Self {
            world,
            waves: WaveManager::new(schedule),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            elapsed: Duration::ZERO,
            frame_events: Vec::new(),
            pending_events: Vec::new(),
            scratch_events: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
        })
    }

    /// Applies a player command immediately.
    ///
    /// Accepted and rejected commands alike leave their events in the log
    /// returned by the next [`CombatLoop::step`].
    pub fn submit(&mut self, command: PlayerCommand) -> Result<(), Rejection> {
        let command = match command {
            PlayerCommand::PlaceTower { kind, plot } => Command::PlaceTower { kind, plot },
            PlayerCommand::SellTower { tower } => Command::SellTower { tower },
            PlayerCommand::UpgradeTower { tower, element } => {
                Command::UpgradeTower { tower, element }
            }
            PlayerCommand::CycleTargeting { tower } => Command::CycleTargetingMode { tower },
            PlayerCommand::SetSpeed { multiplier } => {
                if !multiplier.is_finite() {
                    return Err(Rejection::InvalidSpeed(multiplier));
                }
                Command::SetSpeedMultiplier { multiplier }
            }
            PlayerCommand::TogglePause => Command::SetPaused {
                paused: !query::is_paused(&self.world),
            },
            PlayerCommand::Reset => {
                self.waves.reset();
                self.targets.clear();
                self.elapsed = Duration::ZERO;
                Command::Reset
            }
        };

        let start = self.pending_events.len();
        world::apply(&mut self.world, command, &mut self.pending_events);
        let rejection = self.pending_events[start..]
            .iter()
            .find_map(rejection_of);
        match rejection {
            Some(rejection) => {
                debug!(%rejection, "player command rejected");
                Err(rejection)
            }
            None => Ok(()),
        }
    }

    /// Advances the simulation by one frame and returns the frame's events.
    ///
    /// The frame duration is scaled by the speed multiplier. Nothing advances
    /// while paused or once the game is decided, but events produced by
    /// commands submitted since the previous frame are still reported.
    pub fn step(&mut self, frame_dt: Duration) -> &[Event] {
        self.frame_events.clear();
        self.frame_events.append(&mut self.pending_events);

        if query::is_paused(&self.world) || query::outcome(&self.world).is_some() {
            return &self.frame_events;
        }

        let dt = scaled(frame_dt, query::speed_multiplier(&self.world));
        if dt.is_zero() {
            return &self.frame_events;
        }
        self.elapsed = self.elapsed.saturating_add(dt);

        self.scratch_events.clear();
        world::apply(
            &mut self.world,
            Command::Tick { dt },
            &mut self.scratch_events,
        );
        self.waves.handle(
            &self.scratch_events,
            query::live_enemy_count(&self.world),
            &mut self.commands,
        );
        self.frame_events.append(&mut self.scratch_events);
        self.flush_commands();

        self.run(Command::AdvanceEnemies { dt });

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        for decision in &self.targets {
            world::apply(
                &mut self.world,
                Command::SetTowerTarget {
                    tower: decision.tower,
                    target: decision.target,
                },
                &mut self.frame_events,
            );
        }

        self.combat.handle(
            query::outcome(&self.world),
            query::tower_cooldown_view(&self.world),
            &self.targets,
            &mut self.commands,
        );
        self.flush_commands();

        self.run(Command::AdvanceProjectiles { dt });

        &self.frame_events
    }

    fn run(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.frame_events);
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.frame_events);
        }
    }

    /// Simulated time since the start or the last reset.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Display name of the level being played.
    #[must_use]
    pub fn level_name(&self) -> &str {
        query::level_name(&self.world)
    }

    /// Read access to the world for the `query` functions.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of live enemies in spawn order.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Snapshot of placed towers.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Snapshot of projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> ProjectileView {
        query::projectile_view(&self.world)
    }

    /// Wave schedule progress.
    #[must_use]
    pub fn wave_progress(&self) -> WaveProgress {
        self.waves.progress()
    }

    /// Money available.
    #[must_use]
    pub fn money(&self) -> u32 {
        query::money(&self.world)
    }

    /// Lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Final outcome, if decided.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        query::outcome(&self.world)
    }

    /// Counters for a heads-up display.
    #[must_use]
    pub fn hud(&self) -> Hud {
        Hud {
            money: self.money(),
            lives: self.lives(),
            waves: self.wave_progress(),
            speed_multiplier: query::speed_multiplier(&self.world),
            paused: query::is_paused(&self.world),
            outcome: self.outcome(),
        }
    }
}

fn rejection_of(event: &Event) -> Option<Rejection> {
    match event {
        Event::TowerPlacementRejected { reason, .. } => Some(Rejection::Placement(*reason)),
        Event::TowerUpgradeRejected { reason, .. } => Some(Rejection::Upgrade(*reason)),
        Event::TowerCommandRejected { reason, .. } => Some(Rejection::Tower(*reason)),
        _ => None,
    }
}

/// Frame time scaled by the multiplier; unrepresentable results freeze the frame.
fn scaled(frame_dt: Duration, multiplier: f32) -> Duration {
    Duration::try_from_secs_f32(frame_dt.as_secs_f32() * multiplier).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_multiplies_frame_time() {
        let frame = Duration::from_millis(100);
        assert_eq!(scaled(frame, 0.0), Duration::ZERO);
        assert!((scaled(frame, 2.0).as_secs_f32() - 0.2).abs() < 1e-6);
        assert_eq!(scaled(frame, f32::MAX), Duration::ZERO);
    }

    #[test]
    fn rejection_events_map_to_rejections() {
        let event = Event::TowerCommandRejected {
            tower: TowerId::new(3),
            reason: TowerCommandError::MissingTower,
        };
        assert_eq!(
            rejection_of(&event),
            Some(Rejection::Tower(TowerCommandError::MissingTower))
        );
        assert_eq!(rejection_of(&Event::WorldReset), None);
    }

    #[test]
    fn rejection_messages_name_the_cause() {
        let rejection = Rejection::from(PlacementError::Occupied);
        assert!(rejection.to_string().starts_with("placement rejected"));
    }
}
