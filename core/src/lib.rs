#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Myth-Forge Defence combat engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and the combat loop submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, str::FromStr, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod config;
mod views;

pub use config::{CombatConfig, ConfigError, Level, PathModel};
pub use views::{
    EnemySnapshot, EnemyView, ProjectileSnapshot, ProjectileView, TowerCooldownSnapshot,
    TowerCooldownView, TowerSnapshot, TowerTarget, TowerView, WaveProgress,
};

slotmap::new_key_type! {
    /// Generational handle to a live enemy.
    ///
    /// Towers and projectiles hold these as non-owning references. A handle
    /// outlives the enemy it names, so every lookup must go through the
    /// owning arena, which reports `None` once the enemy is gone.
    pub struct EnemyId;
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and tower cooldowns by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves every live enemy along the path and decays its status effects.
    AdvanceEnemies {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Moves every live projectile, culls escaped ones and resolves impacts.
    AdvanceProjectiles {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Requests that a new enemy enter the path at its first waypoint.
    SpawnEnemy {
        /// Type of enemy to construct from the configured stat table.
        kind: EnemyKind,
    },
    /// Credits the completion bonus for a finished wave.
    AwardWaveBonus {
        /// One-based number of the wave that was completed.
        wave: u32,
        /// Money credited to the economy.
        amount: u32,
    },
    /// Declares that the wave schedule is exhausted.
    ConcludeCampaign,
    /// Requests placement of a tower on a buildable plot.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Plot that should host the tower.
        plot: PlotIndex,
    },
    /// Requests that an existing tower be sold for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests an irrevocable elemental upgrade for a tower.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
        /// Element to attach to the tower's projectiles.
        element: Element,
    },
    /// Advances a tower to the next targeting mode in the cycle.
    CycleTargetingMode {
        /// Identifier of the tower whose mode should change.
        tower: TowerId,
    },
    /// Records the target a tower should engage.
    SetTowerTarget {
        /// Identifier of the tower receiving the assignment.
        tower: TowerId,
        /// Enemy to engage, or `None` to clear the current target.
        target: Option<EnemyId>,
    },
    /// Requests that a tower launch a projectile at its target.
    FireProjectile {
        /// Identifier of the firing tower.
        tower: TowerId,
        /// Enemy used for lead prediction.
        target: EnemyId,
    },
    /// Changes the global simulation speed multiplier.
    SetSpeedMultiplier {
        /// Factor applied to every frame's delta time.
        multiplier: f32,
    },
    /// Freezes or resumes the simulation clock.
    SetPaused {
        /// Whether the simulation should be paused.
        paused: bool,
    },
    /// Restores every counter and collection to its initial state.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Handle assigned to the enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Spawn location, always the path's first waypoint.
        position: Vec2,
    },
    /// Reports damage applied to an enemy.
    EnemyDamaged {
        /// Enemy that took the damage.
        enemy: EnemyId,
        /// Health actually removed after clamping at zero.
        amount: f32,
        /// Mechanism that dealt the damage.
        source: DamageSource,
    },
    /// Announces that an enemy died and its bounty was paid.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Money credited for the kill.
        bounty: u32,
    },
    /// Announces that an enemy reached the end of the path.
    EnemyReachedGoal {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Lives left after the deduction.
        lives_remaining: u32,
    },
    /// Confirms that a status effect became active on an enemy.
    EffectApplied {
        /// Enemy carrying the effect.
        enemy: EnemyId,
        /// Effect that was applied.
        effect: StatusEffect,
    },
    /// Reports that a status effect ran out and its modifier was reverted.
    EffectExpired {
        /// Enemy that carried the effect.
        enemy: EnemyId,
        /// Tag of the expired effect.
        tag: EffectTag,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Plot occupied by the tower.
        plot: PlotIndex,
        /// Money debited for construction.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Plot provided in the placement request.
        plot: PlotIndex,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Plot released by the sale.
        plot: PlotIndex,
        /// Money credited for the sale.
        refund: u32,
    },
    /// Confirms that a tower received an elemental upgrade.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Element attached to the tower.
        element: Element,
        /// Money debited for the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Element requested.
        element: Element,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that a sale or mode change referenced an unusable tower.
    TowerCommandRejected {
        /// Identifier supplied with the command.
        tower: TowerId,
        /// Specific reason the command failed.
        reason: TowerCommandError,
    },
    /// Confirms that a tower switched targeting policy.
    TargetingModeChanged {
        /// Identifier of the tower.
        tower: TowerId,
        /// Newly active targeting mode.
        mode: TargetingMode,
    },
    /// Reports that a tower acquired, switched or dropped its target.
    TowerTargetChanged {
        /// Identifier of the tower.
        tower: TowerId,
        /// Target now held by the tower.
        target: Option<EnemyId>,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Type of projectile launched.
        kind: ProjectileKind,
    },
    /// Reports that a projectile left the playfield without hitting anything.
    ProjectileExpired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports that a projectile struck at least one enemy and was consumed.
    ProjectileImpact {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Location of the projectile at impact.
        position: Vec2,
        /// Number of enemies overlapped by the projectile.
        direct_hits: u32,
    },
    /// Confirms that a wave completion bonus was credited.
    WaveBonusAwarded {
        /// One-based number of the completed wave.
        wave: u32,
        /// Money credited.
        amount: u32,
    },
    /// Announces that the game has been decided.
    GameOver {
        /// Final outcome.
        outcome: GameOutcome,
    },
    /// Confirms a change of the speed multiplier.
    SpeedChanged {
        /// Multiplier now in effect.
        multiplier: f32,
    },
    /// Confirms that the simulation was paused or resumed.
    PauseChanged {
        /// Whether the simulation is now paused.
        paused: bool,
    },
    /// Announces that the world returned to its initial state.
    WorldReset,
}

/// Mechanism that dealt a portion of damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// Projectile overlapped the enemy.
    Direct,
    /// Enemy was inside a projectile's area of effect.
    Splash,
    /// Enemy was struck by a chain lightning jump.
    Chain,
    /// Enemy took periodic burn damage.
    Burn,
}

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Every wave was survived with lives remaining.
    Victory,
    /// Lives were exhausted.
    Defeat,
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a buildable plot within the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlotIndex(u32);

impl PlotIndex {
    /// Creates a new plot index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying plot index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    origin: Vec2,
    size: Vec2,
}

impl Rect {
    /// Constructs a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Upper-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Geometric center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }
}

/// Reports whether an enemy lies within a tower's engagement radius.
///
/// The enemy's collision radius extends the reach, so large enemies are
/// engaged slightly earlier than small ones. The comparison is strict.
#[must_use]
pub fn within_reach(tower: Vec2, range: f32, enemy: Vec2, enemy_radius: f32) -> bool {
    tower.distance(enemy) < range + enemy_radius
}

/// Error returned when a textual kind name does not match any variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {category} '{value}'")]
pub struct UnknownKindError {
    category: &'static str,
    value: String,
}

impl UnknownKindError {
    fn new(category: &'static str, value: &str) -> Self {
        Self {
            category,
            value: value.to_owned(),
        }
    }
}

macro_rules! named_kind {
    ($kind:ident, $category:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $kind {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical lowercase name used in configuration and scripts.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $kind {
            type Err = UnknownKindError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(UnknownKindError::new($category, value)),
                }
            }
        }
    };
}

/// Types of enemies that travel the path.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Balanced walker.
    Basic,
    /// Fragile but quick.
    Fast,
    /// Slow and heavily armoured.
    Tank,
    /// Airborne unit that only some towers can engage.
    Flying,
}

named_kind!(EnemyKind, "enemy type", {
    Basic => "basic",
    Fast => "fast",
    Tank => "tank",
    Flying => "flying",
});

/// Types of towers that can be constructed on plots.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Inexpensive all-rounder.
    Basic,
    /// High rate of fire, low damage.
    Rapid,
    /// Long range, slow, heavy hits.
    Sniper,
    /// Fires splash-damage shells.
    Cannon,
}

named_kind!(TowerKind, "tower type", {
    Basic => "basic",
    Rapid => "rapid",
    Sniper => "sniper",
    Cannon => "cannon",
});

/// Types of projectiles launched by towers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Standard bolt.
    Regular,
    /// Light, fast bolt.
    Rapid,
    /// Heavy, very fast round.
    Sniper,
    /// Explosive shell with an area of effect.
    Shell,
}

named_kind!(ProjectileKind, "projectile type", {
    Regular => "regular",
    Rapid => "rapid",
    Sniper => "sniper",
    Shell => "shell",
});

/// Elemental upgrades that attach an effect to a tower's direct hits.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Sets enemies on fire.
    Pyro,
    /// Slows enemies down.
    Glacier,
    /// Arcs lightning between nearby enemies.
    Storm,
}

named_kind!(Element, "element", {
    Pyro => "pyro",
    Glacier => "glacier",
    Storm => "storm",
});

/// Policy a tower uses to choose among in-range candidates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    /// Earliest spawned enemy in range.
    #[default]
    First,
    /// Latest spawned enemy in range.
    Last,
    /// Enemy with the most remaining health.
    Strongest,
    /// Enemy with the least remaining health.
    Weakest,
    /// Enemy nearest to the tower.
    Closest,
}

named_kind!(TargetingMode, "targeting mode", {
    First => "first",
    Last => "last",
    Strongest => "strongest",
    Weakest => "weakest",
    Closest => "closest",
});

impl TargetingMode {
    /// Mode that follows this one when a player cycles the tower's policy.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::First => Self::Last,
            Self::Last => Self::Strongest,
            Self::Strongest => Self::Weakest,
            Self::Weakest => Self::Closest,
            Self::Closest => Self::First,
        }
    }
}

/// Discriminant of a [`StatusEffect`], used to enforce one instance per tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectTag {
    /// Damage over time.
    Burn,
    /// Movement speed reduction.
    Slow,
}

/// Timed modifier attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatusEffect {
    /// Deals `damage_per_second` once per full elapsed second.
    Burn {
        /// Damage dealt on each whole second of exposure.
        damage_per_second: f32,
        /// Time left before the effect expires.
        remaining: Duration,
    },
    /// Scales effective speed by `1 - fraction` while active.
    Slow {
        /// Portion of base speed removed, within `0.0..=1.0`.
        fraction: f32,
        /// Time left before the effect expires.
        remaining: Duration,
    },
}

impl StatusEffect {
    /// Tag identifying the effect variant.
    #[must_use]
    pub const fn tag(&self) -> EffectTag {
        match self {
            Self::Burn { .. } => EffectTag::Burn,
            Self::Slow { .. } => EffectTag::Slow,
        }
    }

    /// Time left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        match self {
            Self::Burn { remaining, .. } | Self::Slow { remaining, .. } => *remaining,
        }
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum PlacementError {
    /// The plot index does not exist on the active level.
    #[error("plot index is outside the level's plot list")]
    InvalidPlot,
    /// Another tower already stands on the plot.
    #[error("plot is already occupied")]
    Occupied,
    /// The configuration offers no stats for the requested tower type.
    #[error("tower type is not available in the current configuration")]
    UnknownTowerKind,
    /// The player cannot afford the tower.
    #[error("insufficient funds: need {cost}, have {available}")]
    InsufficientFunds {
        /// Price of the tower.
        cost: u32,
        /// Money held at the time of the request.
        available: u32,
    },
}

/// Reasons an elemental upgrade may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("tower not found")]
    MissingTower,
    /// The configuration offers no upgrade for the requested element.
    #[error("upgrade type is not available in the current configuration")]
    UnknownUpgrade,
    /// The tower already carries an element.
    #[error("tower already upgraded with {0}")]
    AlreadyUpgraded(Element),
    /// The player cannot afford the upgrade.
    #[error("insufficient funds: need {cost}, have {available}")]
    InsufficientFunds {
        /// Price of the upgrade.
        cost: u32,
        /// Money held at the time of the request.
        available: u32,
    },
}

/// Reasons a sale or targeting change may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TowerCommandError {
    /// No tower with the provided identifier exists.
    #[error("tower not found")]
    MissingTower,
}
