//! Live enemy arena plus per-enemy movement and status effect handling.

use std::time::Duration;

use glam::Vec2;
use myth_forge_core::{
    config::EnemyStats, DamageSource, EffectTag, EnemyId, EnemyKind, EnemySnapshot, Event,
    PathModel, StatusEffect,
};
use slotmap::SlotMap;

/// Burn damage is dealt in whole-second pulses.
const BURN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
struct ActiveEffect {
    effect: StatusEffect,
    burn_clock: Duration,
}

/// Authoritative state of a single enemy.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    kind: EnemyKind,
    stats: EnemyStats,
    position: Vec2,
    direction: Vec2,
    next_waypoint: usize,
    health: f32,
    effective_speed: f32,
    effects: Vec<ActiveEffect>,
    reached_goal: bool,
}

impl Enemy {
    /// Creates an enemy standing on the path's spawn point.
    pub(crate) fn spawn(kind: EnemyKind, stats: EnemyStats, path: &PathModel) -> Self {
        Self {
            kind,
            stats,
            position: path.spawn(),
            direction: Vec2::ZERO,
            next_waypoint: 1,
            health: stats.max_health.max(0.0),
            effective_speed: stats.speed,
            effects: Vec::new(),
            reached_goal: false,
        }
    }

    pub(crate) fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub(crate) fn bounty(&self) -> u32 {
        self.stats.bounty
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn radius(&self) -> f32 {
        self.stats.radius
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub(crate) fn reached_goal(&self) -> bool {
        self.reached_goal
    }

    /// Displacement per second along the current heading.
    pub(crate) fn velocity(&self) -> Vec2 {
        self.direction * self.effective_speed
    }

    /// Removes health, clamping at zero, and reports how much was removed.
    pub(crate) fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.health);
        self.health -= applied;
        applied
    }

    /// Attaches an effect unless one with the same tag is already active.
    pub(crate) fn apply_effect(&mut self, effect: StatusEffect) -> bool {
        if self.has_effect(effect.tag()) {
            return false;
        }
        self.effects.push(ActiveEffect {
            effect,
            burn_clock: Duration::ZERO,
        });
        self.recompute_speed();
        true
    }

    fn has_effect(&self, tag: EffectTag) -> bool {
        self.effects.iter().any(|active| active.effect.tag() == tag)
    }

    /// Runs one tick: effect decay and burn pulses first, then movement.
    pub(crate) fn advance(
        &mut self,
        id: EnemyId,
        dt: Duration,
        path: &PathModel,
        out_events: &mut Vec<Event>,
    ) {
        if self.reached_goal {
            return;
        }

        self.update_effects(id, dt, out_events);
        if !self.is_alive() {
            return;
        }

        self.travel(path, dt);
    }

    fn update_effects(&mut self, id: EnemyId, dt: Duration, out_events: &mut Vec<Event>) {
        if self.effects.is_empty() {
            return;
        }

        let mut burn_damage = 0.0;
        for active in &mut self.effects {
            let elapsed = dt.min(active.effect.remaining());
            match &mut active.effect {
                StatusEffect::Burn {
                    damage_per_second,
                    remaining,
                } => {
                    active.burn_clock += elapsed;
                    while active.burn_clock >= BURN_PERIOD {
                        active.burn_clock -= BURN_PERIOD;
                        burn_damage += *damage_per_second;
                    }
                    *remaining -= elapsed;
                }
                StatusEffect::Slow { remaining, .. } => *remaining -= elapsed,
            }
        }

        if burn_damage > 0.0 {
            let amount = self.take_damage(burn_damage);
            if amount > 0.0 {
                out_events.push(Event::EnemyDamaged {
                    enemy: id,
                    amount,
                    source: DamageSource::Burn,
                });
            }
        }

        let before = self.effects.len();
        self.effects.retain(|active| {
            if active.effect.remaining().is_zero() {
                out_events.push(Event::EffectExpired {
                    enemy: id,
                    tag: active.effect.tag(),
                });
                false
            } else {
                true
            }
        });
        if self.effects.len() != before {
            self.recompute_speed();
        }
    }

    // Derived from the base speed every time so expiry restores it exactly.
    fn recompute_speed(&mut self) {
        self.effective_speed = self
            .effects
            .iter()
            .fold(self.stats.speed, |speed, active| match active.effect {
                StatusEffect::Slow { fraction, .. } => speed * (1.0 - fraction),
                StatusEffect::Burn { .. } => speed,
            });
    }

    fn travel(&mut self, path: &PathModel, dt: Duration) {
        let Some(target) = path.waypoint(self.next_waypoint) else {
            self.reached_goal = true;
            return;
        };

        let step = self.effective_speed * dt.as_secs_f32();
        let delta = target - self.position;
        let heading = delta.normalize_or_zero();
        if heading != Vec2::ZERO {
            self.direction = heading;
        }

        if delta.length() < step {
            self.position = target;
            if self.next_waypoint >= path.last_index() {
                self.reached_goal = true;
            } else {
                self.next_waypoint += 1;
            }
        } else {
            self.position += heading * step;
        }
    }

    pub(crate) fn snapshot(&self, id: EnemyId) -> EnemySnapshot {
        EnemySnapshot {
            id,
            kind: self.kind,
            position: self.position,
            direction: self.direction,
            effective_speed: self.effective_speed,
            health: self.health,
            max_health: self.stats.max_health,
            radius: self.stats.radius,
            flying: self.stats.flying,
            effects: self.effects.iter().map(|active| active.effect).collect(),
        }
    }
}

/// Generational arena that owns every live enemy and remembers spawn order.
#[derive(Debug, Default)]
pub(crate) struct EnemyArena {
    slots: SlotMap<EnemyId, Enemy>,
    order: Vec<EnemyId>,
}

impl EnemyArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) -> EnemyId {
        let id = self.slots.insert(enemy);
        self.order.push(id);
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.slots.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.slots.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        let enemy = self.slots.remove(id)?;
        self.order.retain(|candidate| *candidate != id);
        Some(enemy)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    /// Iterates live enemies in spawn order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(*id).map(|enemy| (*id, enemy)))
    }

    /// Visits every enemy mutably in spawn order.
    pub(crate) fn for_each_mut(&mut self, mut visit: impl FnMut(EnemyId, &mut Enemy)) {
        let Self { slots, order } = self;
        for id in order.iter() {
            if let Some(enemy) = slots.get_mut(*id) {
                visit(*id, enemy);
            }
        }
    }

    /// Identifiers of enemies matching the predicate, in spawn order.
    pub(crate) fn collect_ids(&self, mut predicate: impl FnMut(&Enemy) -> bool) -> Vec<EnemyId> {
        self.iter()
            .filter(|(_, enemy)| predicate(enemy))
            .map(|(id, _)| id)
            .collect()
    }
}
