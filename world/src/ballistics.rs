//! Geometry used when launching projectiles and resolving their impacts.

use glam::Vec2;

/// Splash radii at or below this value are treated as point impacts.
pub const SPLASH_THRESHOLD: f32 = 1.0;

/// Extra margin added to each side of a projectile's square body.
pub const PROJECTILE_MARGIN: f32 = 1.0;

/// Launch direction toward where the target is predicted to be.
///
/// Time to target is estimated once from the current separation and the
/// target is extrapolated along its velocity for that long. No iterative
/// intercept solve is attempted, so targets that turn or change speed in
/// flight can be missed. Degenerate geometry yields a zero vector.
#[must_use]
pub fn lead_direction(
    launch: Vec2,
    target: Vec2,
    target_velocity: Vec2,
    projectile_speed: f32,
) -> Vec2 {
    if projectile_speed <= 0.0 {
        return (target - launch).normalize_or_zero();
    }

    let time_to_target = launch.distance(target) / projectile_speed;
    let predicted = target + target_velocity * time_to_target;
    (predicted - launch).normalize_or_zero()
}

/// Damage dealt by an explosion to an enemy `distance` units from impact.
///
/// Falls off linearly from full damage at the impact point to half damage at
/// the radius edge, and is zero beyond it.
#[must_use]
pub fn splash_damage(damage: f32, distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance > radius {
        return 0.0;
    }
    damage * (1.0 - 0.5 * distance / radius)
}

/// Reports whether two axis-aligned squares overlap. Touching edges do not.
#[must_use]
pub fn squares_overlap(a: Vec2, a_half_extent: f32, b: Vec2, b_half_extent: f32) -> bool {
    let reach = a_half_extent + b_half_extent;
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}
