//! Projectile impact resolution: direct hits, elements, chain lightning and splash.

use glam::Vec2;
use myth_forge_core::{config::ElementEffect, DamageSource, EnemyId, Event};
use tracing::{debug, error};

use crate::{
    ballistics::{splash_damage, squares_overlap, SPLASH_THRESHOLD},
    projectiles::Projectile,
    World,
};

impl World {
    /// Consumes every projectile overlapping at least one live enemy.
    ///
    /// Projectiles are processed in launch order. Enemies killed by an earlier
    /// projectile keep their slot until the caller reaps them, but no longer
    /// count as live and cannot absorb later projectiles.
    pub(crate) fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        let in_flight = self.projectiles.take_all();
        let mut survivors = Vec::with_capacity(in_flight.len());

        for projectile in in_flight {
            let direct = self.direct_hits(&projectile);
            if direct.is_empty() {
                survivors.push(projectile);
                continue;
            }
            self.strike(&projectile, &direct, out_events);
        }

        self.projectiles.restore(survivors);
    }

    fn direct_hits(&self, projectile: &Projectile) -> Vec<EnemyId> {
        let half_extent = projectile.half_extent();
        self.enemies.collect_ids(|enemy| {
            enemy.is_alive()
                && squares_overlap(
                    projectile.position,
                    half_extent,
                    enemy.position(),
                    enemy.radius(),
                )
        })
    }

    fn strike(&mut self, projectile: &Projectile, direct: &[EnemyId], out_events: &mut Vec<Event>) {
        let damage = projectile.stats.damage;
        for &enemy in direct {
            self.damage_enemy(enemy, damage, DamageSource::Direct, out_events);
        }

        if let Some(element) = projectile.element {
            match self.config.elements.get(element).map(|stats| stats.effect) {
                Some(ElementEffect::ChainLightning {
                    range,
                    max_jumps,
                    damage_reduction,
                }) => {
                    if let Some(&origin) = direct.first() {
                        let chain = Chain {
                            range,
                            max_jumps,
                            damage_reduction,
                        };
                        self.chain_lightning(origin, damage, chain, direct, out_events);
                    }
                }
                Some(effect) => {
                    if let Some(status) = effect.status_effect() {
                        for &id in direct {
                            let Some(enemy) = self.enemies.get_mut(id) else {
                                continue;
                            };
                            if enemy.is_alive() && enemy.apply_effect(status) {
                                out_events.push(Event::EffectApplied {
                                    enemy: id,
                                    effect: status,
                                });
                            }
                        }
                    }
                }
                None => error!(%element, "no stats configured for element; effect skipped"),
            }
        }

        if projectile.stats.splash_radius > SPLASH_THRESHOLD {
            let radius = projectile.stats.splash_radius;
            let impact = projectile.position;
            let splashed = self.enemies.collect_ids(|enemy| {
                enemy.is_alive() && enemy.position().distance(impact) <= radius
            });
            for id in splashed {
                if direct.contains(&id) {
                    continue;
                }
                let Some(distance) = self
                    .enemies
                    .get(id)
                    .map(|enemy| enemy.position().distance(impact))
                else {
                    continue;
                };
                let amount = splash_damage(damage, distance, radius);
                self.damage_enemy(id, amount, DamageSource::Splash, out_events);
            }
        }

        debug!(
            projectile = projectile.id.get(),
            tower = projectile.tower.get(),
            hits = direct.len(),
            "projectile impact"
        );
        out_events.push(Event::ProjectileImpact {
            projectile: projectile.id,
            position: projectile.position,
            direct_hits: u32::try_from(direct.len()).unwrap_or(u32::MAX),
        });
    }

    /// Arcs from the struck enemy to its nearest unstruck neighbour, repeatedly.
    fn chain_lightning(
        &mut self,
        origin: EnemyId,
        damage: f32,
        chain: Chain,
        direct: &[EnemyId],
        out_events: &mut Vec<Event>,
    ) {
        let Some(mut from) = self.enemies.get(origin).map(|enemy| enemy.position()) else {
            return;
        };
        let mut struck: Vec<EnemyId> = direct.to_vec();
        let mut jump_damage = damage;

        for _ in 0..chain.max_jumps {
            jump_damage *= 1.0 - chain.damage_reduction;
            let Some((next, position)) = self.nearest_unstruck(from, chain.range, &struck) else {
                break;
            };
            self.damage_enemy(next, jump_damage, DamageSource::Chain, out_events);
            struck.push(next);
            from = position;
        }
    }

    fn nearest_unstruck(&self, from: Vec2, range: f32, struck: &[EnemyId]) -> Option<(EnemyId, Vec2)> {
        let mut best: Option<(EnemyId, Vec2, f32)> = None;
        for (id, enemy) in self.enemies.iter() {
            if !enemy.is_alive() || struck.contains(&id) {
                continue;
            }
            let distance = enemy.position().distance(from);
            if distance > range {
                continue;
            }
            if best.map_or(true, |(_, _, closest)| distance < closest) {
                best = Some((id, enemy.position(), distance));
            }
        }
        best.map(|(id, position, _)| (id, position))
    }

    fn damage_enemy(
        &mut self,
        id: EnemyId,
        amount: f32,
        source: DamageSource,
        out_events: &mut Vec<Event>,
    ) {
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };
        let applied = enemy.take_damage(amount);
        if applied > 0.0 {
            out_events.push(Event::EnemyDamaged {
                enemy: id,
                amount: applied,
                source,
            });
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Chain {
    range: f32,
    max_jumps: u32,
    damage_reduction: f32,
}
