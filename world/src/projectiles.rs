//! Projectiles in flight.

use std::time::Duration;

use glam::Vec2;
use myth_forge_core::{
    config::ProjectileStats, Element, ProjectileId, ProjectileKind, ProjectileSnapshot, TowerId,
};

use crate::ballistics::PROJECTILE_MARGIN;

/// Projectile travelling along the direction fixed at launch.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) kind: ProjectileKind,
    pub(crate) tower: TowerId,
    pub(crate) position: Vec2,
    pub(crate) direction: Vec2,
    pub(crate) stats: ProjectileStats,
    pub(crate) element: Option<Element>,
}

impl Projectile {
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.position += self.direction * self.stats.speed * dt.as_secs_f32();
    }

    /// Half the edge length of the collision square.
    pub(crate) fn half_extent(&self) -> f32 {
        self.stats.size * 0.5 + PROJECTILE_MARGIN
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            direction: self.direction,
            size: self.stats.size,
            element: self.element,
        }
    }
}

/// Projectiles in launch order together with the identifier counter.
#[derive(Debug)]
pub(crate) struct ProjectileRegistry {
    live: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileRegistry {
    pub(crate) fn new() -> Self {
        Self {
            live: Vec::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn allocate(&mut self) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn launch(&mut self, projectile: Projectile) {
        self.live.push(projectile);
    }

    /// Takes every projectile out of the registry, preserving launch order.
    pub(crate) fn take_all(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.live)
    }

    /// Returns survivors taken out by [`Self::take_all`].
    pub(crate) fn restore(&mut self, survivors: Vec<Projectile>) {
        debug_assert!(self.live.is_empty());
        self.live = survivors;
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.live.iter()
    }
}
