//! Read-only snapshots handed to systems and presentation layers.

use std::time::Duration;

use glam::Vec2;

use crate::{
    Element, EnemyId, EnemyKind, PlotIndex, ProjectileId, ProjectileKind, StatusEffect, TargetingMode,
    TowerId, TowerKind,
};

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Handle of the enemy within the live arena.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Current location in world units.
    pub position: Vec2,
    /// Unit vector of the last movement, zero before the first step.
    pub direction: Vec2,
    /// Speed after status effects, in world units per second.
    pub effective_speed: f32,
    /// Remaining health, never negative.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Whether only anti-air capable towers may engage the enemy.
    pub flying: bool,
    /// Status effects currently active.
    pub effects: Vec<StatusEffect>,
}

impl EnemySnapshot {
    /// Remaining health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from snapshots already in spawn order.
    ///
    /// Unlike towers, enemies are not re-sorted: spawn order is what the
    /// `first` and `last` targeting modes walk.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Plot occupied by the tower.
    pub plot: PlotIndex,
    /// Center of the tower, which is also the launch point of its projectiles.
    pub position: Vec2,
    /// Engagement radius in world units.
    pub range: f32,
    /// Whether the tower may engage flying enemies.
    pub can_target_flying: bool,
    /// Active targeting policy.
    pub mode: TargetingMode,
    /// Elemental upgrade, if one was purchased.
    pub element: Option<Element>,
    /// Target currently held by the tower. May refer to an enemy that is gone.
    pub target: Option<EnemyId>,
}

/// Read-only snapshot describing all towers placed on the level.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific tower.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Identifier of the tower.
    pub tower: TowerId,
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Time until the tower may fire again; zero when ready.
    pub ready_in: Duration,
}

/// Read-only snapshot of every tower's cooldown, sorted by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured cooldowns in tower order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Target selected for a tower by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower the decision applies to.
    pub tower: TowerId,
    /// Enemy the tower should engage, if any candidate qualified.
    pub target: Option<EnemyId>,
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Type of the projectile.
    pub kind: ProjectileKind,
    /// Current location in world units.
    pub position: Vec2,
    /// Fixed unit direction of travel.
    pub direction: Vec2,
    /// Edge length of the projectile's square body.
    pub size: f32,
    /// Element inherited from the firing tower.
    pub element: Option<Element>,
}

/// Read-only snapshot of all projectiles in flight, in launch order.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from snapshots in launch order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<ProjectileSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured projectiles.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no projectile is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Wave schedule progress for external reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// One-based number of the current wave; `1` before the first wave starts.
    pub current_wave: u32,
    /// Number of waves in the schedule.
    pub total_waves: u32,
    /// Time left in the current break; zero while a wave is in progress.
    pub break_remaining: Duration,
    /// Whether a wave is currently spawning or awaiting its last enemy.
    pub wave_in_progress: bool,
}
