#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects tower targets from world snapshots.
//!
//! Every tower first revalidates the enemy it holds: a target that died,
//! left range, or vanished from the live set is dropped. The tower's
//! [`TargetingMode`] then decides among the remaining candidates. `first` and
//! `last` keep a still-valid target instead of re-acquiring every tick, while
//! `strongest`, `weakest` and `closest` rescan on every call.

use myth_forge_core::{
    within_reach, EnemyId, EnemySnapshot, EnemyView, TargetingMode, TowerSnapshot, TowerTarget,
    TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes one target decision per tower, in tower order.
    ///
    /// The output buffer is cleared before populating it. A decision of
    /// `None` means the tower should hold no target.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        for tower in towers.iter() {
            self.collect_candidates(tower, enemies);
            let target = self.select(tower);
            out.push(TowerTarget {
                tower: tower.id,
                target,
            });
        }
    }

    fn collect_candidates(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) {
        self.candidates.clear();
        self.candidates.extend(
            enemies
                .iter()
                .filter(|enemy| is_candidate(tower, enemy))
                .map(|enemy| Candidate {
                    id: enemy.id,
                    health: enemy.health,
                    distance: tower.position.distance(enemy.position),
                }),
        );
    }

    fn select(&self, tower: &TowerSnapshot) -> Option<EnemyId> {
        let held = tower
            .target
            .filter(|id| self.candidates.iter().any(|candidate| candidate.id == *id));

        match tower.mode {
            TargetingMode::First => held.or_else(|| self.candidates.first().map(|c| c.id)),
            TargetingMode::Last => held.or_else(|| self.candidates.last().map(|c| c.id)),
            TargetingMode::Strongest => best_by(&self.candidates, |c| c.health, |a, b| a > b),
            TargetingMode::Weakest => best_by(&self.candidates, |c| c.health, |a, b| a < b),
            TargetingMode::Closest => best_by(&self.candidates, |c| c.distance, |a, b| a < b),
        }
    }
}

/// Alive, reachable and, for ground-only towers, not airborne.
fn is_candidate(tower: &TowerSnapshot, enemy: &EnemySnapshot) -> bool {
    if enemy.health <= 0.0 {
        return false;
    }
    if enemy.flying && !tower.can_target_flying {
        return false;
    }
    within_reach(tower.position, tower.range, enemy.position, enemy.radius)
}

/// Scans in spawn order; the first candidate wins ties.
fn best_by(
    candidates: &[Candidate],
    key: impl Fn(&Candidate) -> f32,
    better: impl Fn(f32, f32) -> bool,
) -> Option<EnemyId> {
    let mut best: Option<(EnemyId, f32)> = None;
    for candidate in candidates {
        let value = key(candidate);
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((candidate.id, value)),
        }
    }
    best.map(|(id, _)| id)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: EnemyId,
    health: f32,
    distance: f32,
}
