//! Configuration model consumed when the world constructs entities.
//!
//! Every stat table is keyed by one of the closed kind enums. Tables are plain
//! structs with one optional slot per variant, so a configuration file can
//! leave a kind out entirely; requesting such a kind later is a configuration
//! fault, never something the engine papers over with defaults.
//! [`CombatConfig::validate`] catches the faults that can be detected up
//! front.

use std::time::Duration;

use glam::Vec2;
use serde::Deserialize;

use crate::{EnemyKind, Element, ProjectileKind, Rect, StatusEffect, TowerKind};

/// Errors raised by invalid configuration or level data.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The wave schedule is empty.
    #[error("wave schedule contains no waves")]
    NoWaves,
    /// A wave has no spawn groups.
    #[error("wave {wave} contains no spawn groups")]
    EmptyWave {
        /// One-based wave number.
        wave: usize,
    },
    /// A wave spawns an enemy kind that has no stats.
    #[error("wave {wave} spawns {kind} enemies but no stats are configured for them")]
    MissingEnemyStats {
        /// One-based wave number.
        wave: usize,
        /// Enemy kind lacking stats.
        kind: EnemyKind,
    },
    /// A tower fires a projectile kind that has no stats.
    #[error("{tower} towers fire {projectile} projectiles but no stats are configured for them")]
    MissingProjectileStats {
        /// Tower kind referencing the projectile.
        tower: TowerKind,
        /// Projectile kind lacking stats.
        projectile: ProjectileKind,
    },
    /// A tower's fire rate is zero, negative or not finite.
    #[error("{tower} towers must have a positive fire rate")]
    InvalidFireRate {
        /// Offending tower kind.
        tower: TowerKind,
    },
    /// A projectile's speed is zero, negative or not finite.
    #[error("{projectile} projectiles must have a positive speed")]
    InvalidProjectileSpeed {
        /// Offending projectile kind.
        projectile: ProjectileKind,
    },
    /// An enemy stat is negative or not finite.
    #[error("{kind} enemy {field} must be finite and non-negative")]
    InvalidEnemyStat {
        /// Offending enemy kind.
        kind: EnemyKind,
        /// Name of the offending stat.
        field: &'static str,
    },
    /// A projectile stat is negative or not finite.
    #[error("{projectile} projectile {field} must be finite and non-negative")]
    InvalidProjectileStat {
        /// Offending projectile kind.
        projectile: ProjectileKind,
        /// Name of the offending stat.
        field: &'static str,
    },
    /// A duration expressed in seconds is negative or not finite.
    #[error("{field} must be a finite, non-negative number of seconds")]
    InvalidDuration {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// A fraction lies outside `0.0..=1.0`.
    #[error("{field} must lie within 0.0..=1.0")]
    InvalidFraction {
        /// Name of the offending setting.
        field: &'static str,
    },
    /// The path has fewer than two waypoints.
    #[error("path must contain at least two waypoints, found {found}")]
    DegeneratePath {
        /// Number of waypoints supplied.
        found: usize,
    },
}

/// Complete set of tunables for one combat session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Starting resources and refund policy.
    pub economy: EconomyConfig,
    /// Rectangle outside which projectiles are discarded.
    pub playfield: Playfield,
    /// Per-kind enemy stats.
    pub enemies: EnemyTable,
    /// Per-kind tower stats.
    pub towers: TowerTable,
    /// Per-kind projectile stats.
    pub projectiles: ProjectileTable,
    /// Elemental upgrade prices and effect parameters.
    pub elements: ElementTable,
    /// Waves, groups and completion bonus.
    pub waves: WaveSchedule,
}

impl CombatConfig {
    /// Checks the configuration for faults that would surface mid-game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.economy.sell_fraction.is_finite() || !(0.0..=1.0).contains(&self.economy.sell_fraction)
        {
            return Err(ConfigError::InvalidFraction {
                field: "economy.sell_fraction",
            });
        }

        for &tower in TowerKind::ALL {
            let Some(stats) = self.towers.get(tower) else {
                continue;
            };
            if !(stats.fire_rate.is_finite() && stats.fire_rate > 0.0) {
                return Err(ConfigError::InvalidFireRate { tower });
            }
            if self.projectiles.get(stats.projectile).is_none() {
                return Err(ConfigError::MissingProjectileStats {
                    tower,
                    projectile: stats.projectile,
                });
            }
        }

        for &kind in EnemyKind::ALL {
            if let Some(stats) = self.enemies.get(kind) {
                stats.validate(kind)?;
            }
        }

        for &projectile in ProjectileKind::ALL {
            if let Some(stats) = self.projectiles.get(projectile) {
                stats.validate(projectile)?;
            }
        }

        for &element in Element::ALL {
            if let Some(stats) = self.elements.get(element) {
                stats.effect.validate()?;
            }
        }

        self.waves.validate(&self.enemies)
    }
}

/// Starting resources and refund policy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Money available when a game starts or resets.
    pub starting_money: u32,
    /// Lives available when a game starts or resets.
    pub starting_lives: u32,
    /// Portion of a tower's construction cost refunded on sale.
    pub sell_fraction: f32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_money: 100,
            starting_lives: 20,
            sell_fraction: 0.5,
        }
    }
}

/// Rectangle outside which projectiles are discarded.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Playfield {
    /// Width of the playfield in world units.
    pub width: f32,
    /// Height of the playfield in world units.
    pub height: f32,
}

impl Playfield {
    /// Bounds of the playfield anchored at the origin.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_and_size(Vec2::ZERO, Vec2::new(self.width, self.height))
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// Stats shared by every enemy of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct EnemyStats {
    /// Base speed in world units per second.
    pub speed: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Money credited when the enemy dies.
    pub bounty: u32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Whether the enemy flies.
    #[serde(default)]
    pub flying: bool,
}

impl EnemyStats {
    fn validate(&self, kind: EnemyKind) -> Result<(), ConfigError> {
        for (value, field) in [
            (self.speed, "speed"),
            (self.max_health, "max_health"),
            (self.radius, "radius"),
        ] {
            if !non_negative(value) {
                return Err(ConfigError::InvalidEnemyStat { kind, field });
            }
        }
        Ok(())
    }
}

/// Enemy stats keyed by [`EnemyKind`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    /// Stats for [`EnemyKind::Basic`].
    pub basic: Option<EnemyStats>,
    /// Stats for [`EnemyKind::Fast`].
    pub fast: Option<EnemyStats>,
    /// Stats for [`EnemyKind::Tank`].
    pub tank: Option<EnemyStats>,
    /// Stats for [`EnemyKind::Flying`].
    pub flying: Option<EnemyStats>,
}

impl EnemyTable {
    /// Stats configured for the kind, if any.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> Option<&EnemyStats> {
        match kind {
            EnemyKind::Basic => self.basic.as_ref(),
            EnemyKind::Fast => self.fast.as_ref(),
            EnemyKind::Tank => self.tank.as_ref(),
            EnemyKind::Flying => self.flying.as_ref(),
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            basic: Some(EnemyStats {
                speed: 100.0,
                max_health: 25.0,
                bounty: 1,
                radius: 14.0,
                flying: false,
            }),
            fast: Some(EnemyStats {
                speed: 250.0,
                max_health: 15.0,
                bounty: 2,
                radius: 10.0,
                flying: false,
            }),
            tank: Some(EnemyStats {
                speed: 70.0,
                max_health: 100.0,
                bounty: 5,
                radius: 20.0,
                flying: false,
            }),
            flying: Some(EnemyStats {
                speed: 120.0,
                max_health: 30.0,
                bounty: 3,
                radius: 12.0,
                flying: true,
            }),
        }
    }
}

/// Stats shared by every tower of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct TowerStats {
    /// Construction price.
    pub cost: u32,
    /// Engagement radius in world units.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Projectile launched on each shot.
    pub projectile: ProjectileKind,
    /// Whether the tower may engage flying enemies.
    #[serde(default)]
    pub can_target_flying: bool,
}

impl TowerStats {
    /// Minimum time between two shots.
    #[must_use]
    pub fn fire_interval(&self) -> Duration {
        seconds(1.0 / self.fire_rate)
    }
}

/// Tower stats keyed by [`TowerKind`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    /// Stats for [`TowerKind::Basic`].
    pub basic: Option<TowerStats>,
    /// Stats for [`TowerKind::Rapid`].
    pub rapid: Option<TowerStats>,
    /// Stats for [`TowerKind::Sniper`].
    pub sniper: Option<TowerStats>,
    /// Stats for [`TowerKind::Cannon`].
    pub cannon: Option<TowerStats>,
}

impl TowerTable {
    /// Stats configured for the kind, if any.
    #[must_use]
    pub fn get(&self, kind: TowerKind) -> Option<&TowerStats> {
        match kind {
            TowerKind::Basic => self.basic.as_ref(),
            TowerKind::Rapid => self.rapid.as_ref(),
            TowerKind::Sniper => self.sniper.as_ref(),
            TowerKind::Cannon => self.cannon.as_ref(),
        }
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            basic: Some(TowerStats {
                cost: 40,
                range: 150.0,
                fire_rate: 1.0,
                projectile: ProjectileKind::Regular,
                can_target_flying: false,
            }),
            rapid: Some(TowerStats {
                cost: 60,
                range: 120.0,
                fire_rate: 3.0,
                projectile: ProjectileKind::Rapid,
                can_target_flying: false,
            }),
            sniper: Some(TowerStats {
                cost: 100,
                range: 300.0,
                fire_rate: 0.5,
                projectile: ProjectileKind::Sniper,
                can_target_flying: true,
            }),
            cannon: Some(TowerStats {
                cost: 80,
                range: 180.0,
                fire_rate: 0.8,
                projectile: ProjectileKind::Shell,
                can_target_flying: false,
            }),
        }
    }
}

/// Stats shared by every projectile of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ProjectileStats {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Damage dealt to each directly struck enemy.
    pub damage: f32,
    /// Edge length of the projectile's square body.
    pub size: f32,
    /// Area-of-effect radius; values of one unit or less disable splash.
    pub splash_radius: f32,
}

impl ProjectileStats {
    fn validate(&self, projectile: ProjectileKind) -> Result<(), ConfigError> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::InvalidProjectileSpeed { projectile });
        }
        for (value, field) in [
            (self.damage, "damage"),
            (self.size, "size"),
            (self.splash_radius, "splash_radius"),
        ] {
            if !non_negative(value) {
                return Err(ConfigError::InvalidProjectileStat { projectile, field });
            }
        }
        Ok(())
    }
}

/// Projectile stats keyed by [`ProjectileKind`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectileTable {
    /// Stats for [`ProjectileKind::Regular`].
    pub regular: Option<ProjectileStats>,
    /// Stats for [`ProjectileKind::Rapid`].
    pub rapid: Option<ProjectileStats>,
    /// Stats for [`ProjectileKind::Sniper`].
    pub sniper: Option<ProjectileStats>,
    /// Stats for [`ProjectileKind::Shell`].
    pub shell: Option<ProjectileStats>,
}

impl ProjectileTable {
    /// Stats configured for the kind, if any.
    #[must_use]
    pub fn get(&self, kind: ProjectileKind) -> Option<&ProjectileStats> {
        match kind {
            ProjectileKind::Regular => self.regular.as_ref(),
            ProjectileKind::Rapid => self.rapid.as_ref(),
            ProjectileKind::Sniper => self.sniper.as_ref(),
            ProjectileKind::Shell => self.shell.as_ref(),
        }
    }
}

impl Default for ProjectileTable {
    fn default() -> Self {
        Self {
            regular: Some(ProjectileStats {
                speed: 400.0,
                damage: 20.0,
                size: 6.0,
                splash_radius: 1.0,
            }),
            rapid: Some(ProjectileStats {
                speed: 600.0,
                damage: 7.0,
                size: 5.0,
                splash_radius: 1.0,
            }),
            sniper: Some(ProjectileStats {
                speed: 700.0,
                damage: 50.0,
                size: 7.0,
                splash_radius: 1.0,
            }),
            shell: Some(ProjectileStats {
                speed: 300.0,
                damage: 20.0,
                size: 8.0,
                splash_radius: 100.0,
            }),
        }
    }
}

/// Effect attached to direct hits by an upgraded tower.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ElementEffect {
    /// Applies a [`StatusEffect::Burn`].
    Burn {
        /// Damage dealt per whole second.
        damage_per_second: f32,
        /// Lifetime of the effect in seconds.
        duration_secs: f32,
    },
    /// Applies a [`StatusEffect::Slow`].
    Slow {
        /// Portion of base speed removed.
        fraction: f32,
        /// Lifetime of the effect in seconds.
        duration_secs: f32,
    },
    /// Arcs damage from the struck enemy to its neighbours.
    ChainLightning {
        /// Maximum distance covered by one jump.
        range: f32,
        /// Maximum number of jumps after the direct hit.
        max_jumps: u32,
        /// Portion of damage lost on every jump.
        damage_reduction: f32,
    },
}

impl ElementEffect {
    /// Status effect applied to a directly struck enemy, if the element has one.
    #[must_use]
    pub fn status_effect(&self) -> Option<StatusEffect> {
        match *self {
            Self::Burn {
                damage_per_second,
                duration_secs,
            } => Some(StatusEffect::Burn {
                damage_per_second,
                remaining: seconds(duration_secs),
            }),
            Self::Slow {
                fraction,
                duration_secs,
            } => Some(StatusEffect::Slow {
                fraction,
                remaining: seconds(duration_secs),
            }),
            Self::ChainLightning { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Burn { duration_secs, .. } => check_seconds(duration_secs, "burn duration"),
            Self::Slow {
                fraction,
                duration_secs,
            } => {
                check_fraction(fraction, "slow fraction")?;
                check_seconds(duration_secs, "slow duration")
            }
            Self::ChainLightning {
                damage_reduction, ..
            } => check_fraction(damage_reduction, "chain damage reduction"),
        }
    }
}

/// Price and effect of one elemental upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ElementStats {
    /// Upgrade price.
    pub cost: u32,
    /// Effect attached to direct hits.
    #[serde(flatten)]
    pub effect: ElementEffect,
}

/// Upgrade stats keyed by [`Element`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementTable {
    /// Stats for [`Element::Pyro`].
    pub pyro: Option<ElementStats>,
    /// Stats for [`Element::Glacier`].
    pub glacier: Option<ElementStats>,
    /// Stats for [`Element::Storm`].
    pub storm: Option<ElementStats>,
}

impl ElementTable {
    /// Stats configured for the element, if any.
    #[must_use]
    pub fn get(&self, element: Element) -> Option<&ElementStats> {
        match element {
            Element::Pyro => self.pyro.as_ref(),
            Element::Glacier => self.glacier.as_ref(),
            Element::Storm => self.storm.as_ref(),
        }
    }
}

impl Default for ElementTable {
    fn default() -> Self {
        Self {
            pyro: Some(ElementStats {
                cost: 50,
                effect: ElementEffect::Burn {
                    damage_per_second: 5.0,
                    duration_secs: 3.0,
                },
            }),
            glacier: Some(ElementStats {
                cost: 50,
                effect: ElementEffect::Slow {
                    fraction: 0.5,
                    duration_secs: 2.0,
                },
            }),
            storm: Some(ElementStats {
                cost: 50,
                effect: ElementEffect::ChainLightning {
                    range: 120.0,
                    max_jumps: 3,
                    damage_reduction: 0.3,
                },
            }),
        }
    }
}

/// Bonus credited when a wave is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct CompletionBonus {
    /// Bonus for the first wave.
    pub base: u32,
    /// Extra bonus per zero-based wave index.
    pub increment: u32,
}

impl CompletionBonus {
    /// Bonus for the wave at the zero-based index.
    #[must_use]
    pub fn for_wave_index(&self, index: u32) -> u32 {
        self.base
            .saturating_add(self.increment.saturating_mul(index))
    }
}

/// Run of same-type enemies spawned at a fixed cadence.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpawnGroup {
    /// Type of enemy spawned.
    pub kind: EnemyKind,
    /// Number of enemies in the group.
    pub count: u32,
    /// Seconds between spawns.
    pub interval_secs: f32,
}

impl SpawnGroup {
    /// Creates a group description.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32, interval_secs: f32) -> Self {
        Self {
            kind,
            count,
            interval_secs,
        }
    }

    /// Time between spawns.
    #[must_use]
    pub fn interval(&self) -> Duration {
        seconds(self.interval_secs)
    }
}

/// Ordered spawn groups completed as a unit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WaveDefinition {
    /// Groups spawned one after another.
    pub groups: Vec<SpawnGroup>,
}

/// Complete wave schedule.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveSchedule {
    /// Seconds of break before each wave.
    pub interval_secs: f32,
    /// Bonus credited when a wave is completed.
    pub completion_bonus: CompletionBonus,
    /// Waves in play order.
    pub waves: Vec<WaveDefinition>,
}

impl WaveSchedule {
    /// Length of the break before each wave.
    #[must_use]
    pub fn interval(&self) -> Duration {
        seconds(self.interval_secs)
    }

    fn validate(&self, enemies: &EnemyTable) -> Result<(), ConfigError> {
        check_seconds(self.interval_secs, "waves.interval_secs")?;
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }

        for (index, wave) in self.waves.iter().enumerate() {
            let number = index + 1;
            if wave.groups.is_empty() {
                return Err(ConfigError::EmptyWave { wave: number });
            }
            for group in &wave.groups {
                check_seconds(group.interval_secs, "spawn group interval_secs")?;
                if enemies.get(group.kind).is_none() {
                    return Err(ConfigError::MissingEnemyStats {
                        wave: number,
                        kind: group.kind,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for WaveSchedule {
    fn default() -> Self {
        use EnemyKind::{Basic, Fast, Flying, Tank};

        let wave = |groups: &[SpawnGroup]| WaveDefinition {
            groups: groups.to_vec(),
        };

        Self {
            interval_secs: 5.0,
            completion_bonus: CompletionBonus {
                base: 20,
                increment: 10,
            },
            waves: vec![
                wave(&[
                    SpawnGroup::new(Basic, 5, 1.5),
                    SpawnGroup::new(Basic, 8, 1.2),
                    SpawnGroup::new(Basic, 10, 1.0),
                ]),
                wave(&[
                    SpawnGroup::new(Basic, 10, 1.0),
                    SpawnGroup::new(Fast, 12, 1.0),
                    SpawnGroup::new(Basic, 15, 1.0),
                ]),
                wave(&[
                    SpawnGroup::new(Basic, 15, 0.8),
                    SpawnGroup::new(Fast, 15, 0.6),
                    SpawnGroup::new(Tank, 10, 1.2),
                ]),
                wave(&[
                    SpawnGroup::new(Fast, 15, 0.8),
                    SpawnGroup::new(Basic, 30, 0.3),
                    SpawnGroup::new(Tank, 10, 1.2),
                    SpawnGroup::new(Fast, 20, 0.8),
                    SpawnGroup::new(Flying, 15, 1.0),
                ]),
            ],
        }
    }
}

/// Map data: the path enemies follow and the plots towers may occupy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Level {
    /// Display name of the level.
    pub name: String,
    /// Waypoints from spawn to goal.
    pub path: Vec<Vec2>,
    /// Buildable plot rectangles.
    pub plots: Vec<Rect>,
}

impl Level {
    /// Builds the immutable path model for the level.
    pub fn path_model(&self) -> Result<PathModel, ConfigError> {
        PathModel::new(self.path.clone())
    }
}

/// Immutable polyline enemies follow from spawn to goal.
#[derive(Clone, Debug, PartialEq)]
pub struct PathModel {
    waypoints: Vec<Vec2>,
}

impl PathModel {
    /// Creates a path model from at least two waypoints.
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, ConfigError> {
        if waypoints.len() < 2 {
            return Err(ConfigError::DegeneratePath {
                found: waypoints.len(),
            });
        }
        Ok(Self { waypoints })
    }

    /// All waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Waypoint at the index, if it exists.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    /// Point where enemies enter.
    #[must_use]
    pub fn spawn(&self) -> Vec2 {
        self.waypoints[0]
    }

    /// Point where enemies leave and cost a life.
    #[must_use]
    pub fn goal(&self) -> Vec2 {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Index of the final waypoint.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn check_seconds(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if non_negative(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDuration { field })
    }
}

fn check_fraction(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFraction { field })
    }
}
