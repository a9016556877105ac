#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turns target assignments into shots for towers whose cooldown has elapsed.

use std::collections::BTreeSet;

use myth_forge_core::{Command, GameOutcome, TowerCooldownView, TowerId, TowerTarget};

/// Pairs ready towers with their held targets.
#[derive(Debug, Default)]
pub struct TowerCombat {
    ready: BTreeSet<TowerId>,
}

impl TowerCombat {
    /// Creates the system with an empty readiness set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `Command::FireProjectile` for every ready tower holding a target.
    ///
    /// Commands follow the order of `tower_targets`. Nothing fires once the
    /// campaign has an outcome.
    pub fn handle(
        &mut self,
        outcome: Option<GameOutcome>,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if outcome.is_some() {
            return;
        }

        self.ready.clear();
        self.ready.extend(
            tower_cooldowns
                .iter()
                .filter(|snapshot| snapshot.ready_in.is_zero())
                .map(|snapshot| snapshot.tower),
        );

        let ready = &self.ready;
        out.extend(tower_targets.iter().filter_map(|decision| {
            let target = decision.target?;
            ready
                .contains(&decision.tower)
                .then_some(Command::FireProjectile {
                    tower: decision.tower,
                    target,
                })
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myth_forge_core::{EnemyId, TowerCooldownSnapshot, TowerKind};
    use slotmap::SlotMap;
    use std::time::Duration;

    fn enemies(count: usize) -> Vec<EnemyId> {
        let mut arena: SlotMap<EnemyId, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn decided_campaign_is_silent() {
        let ids = enemies(1);
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![snapshot(1, Duration::ZERO)]);
        let targets = vec![target(1, Some(ids[0]))];
        let mut out = Vec::new();

        system.handle(Some(GameOutcome::Defeat), cooldowns, &targets, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let ids = enemies(2);
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(2, Duration::ZERO),
            snapshot(5, Duration::ZERO),
        ]);
        let targets = vec![target(2, Some(ids[1])), target(5, Some(ids[0]))];
        let mut out = Vec::new();

        system.handle(None, cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: ids[1],
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: ids[0],
                },
            ],
        );
    }

    #[test]
    fn non_ready_idle_or_missing_towers_are_skipped() {
        let ids = enemies(3);
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(3, Duration::from_millis(250)),
            snapshot(4, Duration::ZERO),
            snapshot(8, Duration::ZERO),
        ]);
        let targets = vec![
            target(3, Some(ids[0])),
            target(4, None),
            target(8, Some(ids[1])),
            target(42, Some(ids[2])),
        ];
        let mut out = Vec::new();

        system.handle(None, cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireProjectile {
                tower: TowerId::new(8),
                target: ids[1],
            }],
        );
    }

    #[test]
    fn shots_are_appended_after_queued_commands() {
        let ids = enemies(1);
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![snapshot(7, Duration::ZERO)]);
        let mut out = vec![Command::ConcludeCampaign];

        system.handle(None, cooldowns, &[target(7, Some(ids[0]))], &mut out);

        assert_eq!(
            out,
            vec![
                Command::ConcludeCampaign,
                Command::FireProjectile {
                    tower: TowerId::new(7),
                    target: ids[0],
                },
            ],
        );
    }

    fn snapshot(tower: u32, ready_in: Duration) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: TowerId::new(tower),
            kind: TowerKind::Basic,
            ready_in,
        }
    }

    fn target(tower: u32, target: Option<EnemyId>) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            target,
        }
    }
}
