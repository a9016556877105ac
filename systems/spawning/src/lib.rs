#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling system responsible for emitting enemy spawn commands.
//!
//! The manager alternates between a timed break and a wave. A wave walks its
//! spawn groups in order, emitting one [`Command::SpawnEnemy`] per elapsed
//! group interval, and is only considered complete once every enemy it
//! spawned has died or escaped. Completing a wave emits
//! [`Command::AwardWaveBonus`]; running out of waves emits
//! [`Command::ConcludeCampaign`] exactly once.

use std::time::Duration;

use myth_forge_core::{
    config::{SpawnGroup, WaveSchedule},
    Command, Event, WaveProgress,
};
use tracing::info;

/// Phase of the wave schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WavePhase {
    /// Counting down to the next wave.
    Break { elapsed: Duration },
    /// Emitting the groups of the current wave.
    Spawning {
        group: usize,
        remaining: u32,
        timer: Duration,
    },
    /// Every group is spent; waiting for the live set to empty.
    Clearing,
}

/// Pure system that turns elapsed time into wave spawns and bonuses.
#[derive(Debug)]
pub struct WaveManager {
    schedule: WaveSchedule,
    phase: WavePhase,
    current_wave: Option<usize>,
    exhausted: bool,
}

impl WaveManager {
    /// Creates a wave manager in its initial break before the first wave.
    #[must_use]
    pub fn new(schedule: WaveSchedule) -> Self {
        Self {
            schedule,
            phase: WavePhase::Break {
                elapsed: Duration::ZERO,
            },
            current_wave: None,
            exhausted: false,
        }
    }

    /// Returns the manager to its initial state.
    pub fn reset(&mut self) {
        self.phase = WavePhase::Break {
            elapsed: Duration::ZERO,
        };
        self.current_wave = None;
        self.exhausted = false;
    }

    /// Reports whether the schedule ran out of waves.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Current progress through the schedule.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        let break_remaining = match self.phase {
            WavePhase::Break { elapsed } if !self.exhausted => {
                self.schedule.interval().saturating_sub(elapsed)
            }
            _ => Duration::ZERO,
        };

        WaveProgress {
            current_wave: self.current_wave.map_or(1, to_wave_number),
            total_waves: u32::try_from(self.schedule.waves.len()).unwrap_or(u32::MAX),
            break_remaining,
            wave_in_progress: !matches!(self.phase, WavePhase::Break { .. }),
        }
    }

    /// Consumes events and the live enemy count to emit wave commands.
    ///
    /// `live_enemies` must be the size of the live set before any command
    /// emitted by this call is applied.
    pub fn handle(&mut self, events: &[Event], live_enemies: usize, out: &mut Vec<Command>) {
        if self.exhausted {
            return;
        }

        let mut budget = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                budget = budget.saturating_add(*dt);
            }
        }

        let mut spawned = 0;
        loop {
            match self.phase {
                WavePhase::Break { elapsed } => {
                    let elapsed = elapsed.saturating_add(budget);
                    let interval = self.schedule.interval();
                    if elapsed < interval {
                        self.phase = WavePhase::Break { elapsed };
                        return;
                    }
                    budget = elapsed - interval;
                    if !self.start_next_wave() {
                        self.phase = WavePhase::Break { elapsed: interval };
                        self.exhausted = true;
                        info!(waves = self.schedule.waves.len(), "wave schedule exhausted");
                        out.push(Command::ConcludeCampaign);
                        return;
                    }
                }
                WavePhase::Spawning {
                    group,
                    mut remaining,
                    timer,
                } => {
                    let Some(current) = self.group(group) else {
                        self.phase = WavePhase::Clearing;
                        continue;
                    };
                    let interval = current.interval();
                    let mut timer = timer.saturating_add(budget);
                    budget = Duration::ZERO;

                    while remaining > 0 && timer >= interval {
                        timer -= interval;
                        remaining -= 1;
                        spawned += 1;
                        out.push(Command::SpawnEnemy { kind: current.kind });
                    }

                    if remaining > 0 {
                        self.phase = WavePhase::Spawning {
                            group,
                            remaining,
                            timer,
                        };
                        return;
                    }

                    // Leftover time carries into the next group's first interval.
                    self.phase = match self.group(group + 1) {
                        Some(next) => WavePhase::Spawning {
                            group: group + 1,
                            remaining: next.count,
                            timer,
                        },
                        None => WavePhase::Clearing,
                    };
                }
                WavePhase::Clearing => {
                    if live_enemies + spawned > 0 {
                        return;
                    }
                    self.complete_wave(out);
                    return;
                }
            }
        }
    }

    fn group(&self, index: usize) -> Option<SpawnGroup> {
        let wave = self.current_wave?;
        self.schedule.waves.get(wave)?.groups.get(index).copied()
    }

    fn start_next_wave(&mut self) -> bool {
        let next = self.current_wave.map_or(0, |index| index + 1);
        let Some(wave) = self.schedule.waves.get(next) else {
            return false;
        };

        let remaining = wave.groups.first().map_or(0, |group| group.count);
        self.current_wave = Some(next);
        self.phase = WavePhase::Spawning {
            group: 0,
            remaining,
            timer: Duration::ZERO,
        };
        info!(wave = to_wave_number(next), groups = wave.groups.len(), "wave started");
        true
    }

    fn complete_wave(&mut self, out: &mut Vec<Command>) {
        let index = self.current_wave.unwrap_or_default();
        let amount = self
            .schedule
            .completion_bonus
            .for_wave_index(u32::try_from(index).unwrap_or(u32::MAX));
        self.phase = WavePhase::Break {
            elapsed: Duration::ZERO,
        };
        out.push(Command::AwardWaveBonus {
            wave: to_wave_number(index),
            amount,
        });
    }
}

fn to_wave_number(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |index| index.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use myth_forge_core::{
        config::{CompletionBonus, WaveDefinition},
        EnemyKind,
    };

    fn schedule(waves: Vec<Vec<SpawnGroup>>) -> WaveSchedule {
        WaveSchedule {
            interval_secs: 5.0,
            completion_bonus: CompletionBonus {
                base: 20,
                increment: 10,
            },
            waves: waves
                .into_iter()
                .map(|groups| WaveDefinition { groups })
                .collect(),
        }
    }

    fn tick(manager: &mut WaveManager, dt: Duration, live: usize) -> Vec<Command> {
        let mut out = Vec::new();
        manager.handle(&[Event::TimeAdvanced { dt }], live, &mut out);
        out
    }

    #[test]
    fn initial_progress_reports_first_wave_and_full_break() {
        let manager = WaveManager::new(schedule(vec![vec![SpawnGroup::new(
            EnemyKind::Basic,
            1,
            1.0,
        )]]));
        assert_eq!(
            manager.progress(),
            WaveProgress {
                current_wave: 1,
                total_waves: 1,
                break_remaining: Duration::from_secs(5),
                wave_in_progress: false,
            }
        );
    }

    #[test]
    fn progress_query_does_not_advance_state() {
        let mut manager = WaveManager::new(schedule(vec![vec![SpawnGroup::new(
            EnemyKind::Basic,
            1,
            1.0,
        )]]));
        let _ = tick(&mut manager, Duration::from_secs(2), 0);
        let first = manager.progress();
        let second = manager.progress();
        assert_eq!(first, second);
        assert_eq!(first.break_remaining, Duration::from_secs(3));
    }

    #[test]
    fn bonus_scales_with_wave_index() {
        let group = SpawnGroup::new(EnemyKind::Basic, 1, 0.0);
        let mut manager = WaveManager::new(schedule(vec![vec![group], vec![group]]));

        let first = tick(&mut manager, Duration::from_secs(5), 0);
        assert_eq!(first, vec![Command::SpawnEnemy { kind: EnemyKind::Basic }]);
        assert_eq!(
            tick(&mut manager, Duration::ZERO, 0),
            vec![Command::AwardWaveBonus {
                wave: 1,
                amount: 20,
            }]
        );

        let second = tick(&mut manager, Duration::from_secs(5), 0);
        assert_eq!(second, vec![Command::SpawnEnemy { kind: EnemyKind::Basic }]);
        assert_eq!(
            tick(&mut manager, Duration::ZERO, 0),
            vec![Command::AwardWaveBonus {
                wave: 2,
                amount: 30,
            }]
        );
    }

    #[test]
    fn wave_with_empty_groups_completes_without_spawning() {
        let mut manager = WaveManager::new(schedule(vec![vec![SpawnGroup::new(
            EnemyKind::Tank,
            0,
            1.0,
        )]]));
        assert_eq!(
            tick(&mut manager, Duration::from_secs(5), 0),
            vec![Command::AwardWaveBonus {
                wave: 1,
                amount: 20,
            }]
        );
    }

    #[test]
    fn leftover_group_time_counts_toward_the_next_group() {
        let mut manager = WaveManager::new(schedule(vec![vec![
            SpawnGroup::new(EnemyKind::Basic, 1, 1.0),
            SpawnGroup::new(EnemyKind::Fast, 1, 1.0),
        ]]));

        assert_eq!(
            tick(&mut manager, Duration::from_millis(6500), 0),
            vec![Command::SpawnEnemy { kind: EnemyKind::Basic }]
        );
        assert_eq!(
            tick(&mut manager, Duration::from_millis(500), 1),
            vec![Command::SpawnEnemy { kind: EnemyKind::Fast }]
        );
    }

    #[test]
    fn reset_restores_initial_break() {
        let mut manager = WaveManager::new(schedule(vec![vec![SpawnGroup::new(
            EnemyKind::Basic,
            2,
            1.0,
        )]]));
        let _ = tick(&mut manager, Duration::from_secs(7), 0);
        assert!(manager.progress().wave_in_progress);

        manager.reset();
        assert_eq!(manager.progress().break_remaining, Duration::from_secs(5));
        assert!(!manager.progress().wave_in_progress);
        assert!(!manager.is_exhausted());
    }
}
