//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use myth_forge_core::{
    config::TowerStats, Element, EnemyId, PlotIndex, TargetingMode, TowerCooldownSnapshot,
    TowerId, TowerKind, TowerSnapshot,
};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Plot occupied by the tower.
    pub(crate) plot: PlotIndex,
    /// Center of the plot; projectiles launch from here.
    pub(crate) position: Vec2,
    /// Stats copied from the configuration at placement time.
    pub(crate) stats: TowerStats,
    /// Active targeting policy.
    pub(crate) mode: TargetingMode,
    /// Elemental upgrade, once purchased.
    pub(crate) element: Option<Element>,
    /// Enemy currently engaged; may dangle until revalidated.
    pub(crate) target: Option<EnemyId>,
    charge: Duration,
}

impl TowerState {
    pub(crate) fn new(
        id: TowerId,
        kind: TowerKind,
        plot: PlotIndex,
        position: Vec2,
        stats: TowerStats,
    ) -> Self {
        Self {
            id,
            kind,
            plot,
            position,
            stats,
            mode: TargetingMode::default(),
            element: None,
            target: None,
            charge: Duration::ZERO,
        }
    }

    /// Accumulates cooldown progress, never banking more than one shot.
    pub(crate) fn recharge(&mut self, dt: Duration) {
        self.charge = self
            .charge
            .saturating_add(dt)
            .min(self.stats.fire_interval());
    }

    pub(crate) fn ready_in(&self) -> Duration {
        self.stats.fire_interval().saturating_sub(self.charge)
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready_in().is_zero()
    }

    pub(crate) fn discharge(&mut self) {
        self.charge = Duration::ZERO;
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            plot: self.plot,
            position: self.position,
            range: self.stats.range,
            can_target_flying: self.stats.can_target_flying,
            mode: self.mode,
            element: self.element,
            target: self.target,
        }
    }

    pub(crate) fn cooldown_snapshot(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            kind: self.kind,
            ready_in: self.ready_in(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Hands out the next unused identifier.
    pub(crate) fn allocate(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, state: TowerState) {
        let _ = self.entries.insert(state.id, state);
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    /// Tower standing on the plot, if any.
    pub(crate) fn occupant(&self, plot: PlotIndex) -> Option<TowerId> {
        self.entries
            .values()
            .find(|state| state.plot == plot)
            .map(|state| state.id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myth_forge_core::ProjectileKind;

    fn stats(fire_rate: f32) -> TowerStats {
        TowerStats {
            cost: 40,
            range: 150.0,
            fire_rate,
            projectile: ProjectileKind::Regular,
            can_target_flying: false,
        }
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        assert_eq!(registry.allocate(), TowerId::new(0));
        assert_eq!(registry.allocate(), TowerId::new(1));
    }

    #[test]
    fn occupant_tracks_plot_until_removal() {
        let mut registry = TowerRegistry::new();
        let id = registry.allocate();
        registry.insert(TowerState::new(
            id,
            TowerKind::Basic,
            PlotIndex::new(4),
            Vec2::new(175.0, 175.0),
            stats(1.0),
        ));

        assert_eq!(registry.occupant(PlotIndex::new(4)), Some(id));
        assert_eq!(registry.occupant(PlotIndex::new(5)), None);
        assert!(registry.remove(id).is_some());
        assert_eq!(registry.occupant(PlotIndex::new(4)), None);
    }

    #[test]
    fn cooldown_caps_at_one_shot() {
        let mut tower = TowerState::new(
            TowerId::new(0),
            TowerKind::Rapid,
            PlotIndex::new(0),
            Vec2::ZERO,
            stats(2.0),
        );
        assert_eq!(tower.ready_in(), Duration::from_millis(500));

        tower.recharge(Duration::from_millis(200));
        assert!(!tower.is_ready());
        assert_eq!(tower.ready_in(), Duration::from_millis(300));

        tower.recharge(Duration::from_secs(10));
        assert!(tower.is_ready());

        tower.discharge();
        assert_eq!(tower.ready_in(), Duration::from_millis(500));
    }

    #[test]
    fn new_towers_start_in_first_mode_without_element() {
        let tower = TowerState::new(
            TowerId::new(3),
            TowerKind::Sniper,
            PlotIndex::new(1),
            Vec2::ZERO,
            stats(0.5),
        );
        let snapshot = tower.snapshot();
        assert_eq!(snapshot.mode, TargetingMode::First);
        assert_eq!(snapshot.element, None);
        assert_eq!(snapshot.target, None);
    }
}
