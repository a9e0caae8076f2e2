//! Closed-form ballistics for thrown weapons and their preview.

use std::time::Duration;

use ashfall_core::GRAVITY;
use glam::{Vec2, Vec3};

use crate::TRAJECTORY_POINTS;

/// Normalised hold duration, clamped to `[0, 1]`.
#[must_use]
pub fn charge_ratio(started: Duration, now: Duration, max_charge: Duration) -> f32 {
    if max_charge.is_zero() {
        return 1.0;
    }
    let held = now.saturating_sub(started).as_secs_f32();
    (held / max_charge.as_secs_f32()).clamp(0.0, 1.0)
}

/// Distance reached with the provided charge ratio.
#[must_use]
pub fn throw_distance(min_distance: f32, max_distance: f32, ratio: f32) -> f32 {
    let ratio = ratio.clamp(0.0, 1.0);
    min_distance + (max_distance - min_distance) * ratio
}

/// Initial velocity of a 45° throw released `height` above the ground that
/// touches down `distance` away from the release point.
#[must_use]
pub fn launch_velocity(direction: Vec2, distance: f32, height: f32) -> Vec3 {
    let direction = direction.try_normalize().unwrap_or(Vec2::Y);
    let distance = distance.max(0.0);
    let drop = (distance + height.max(0.0)).max(f32::EPSILON);
    let component = (GRAVITY * distance * distance / (2.0 * drop)).sqrt();
    Vec3::new(direction.x * component, component, direction.y * component)
}

/// Time until a body launched from `height` with vertical speed `vertical` reaches the ground.
#[must_use]
pub fn flight_time(vertical: f32, height: f32) -> f32 {
    let height = height.max(0.0);
    (vertical + (vertical * vertical + 2.0 * GRAVITY * height).sqrt()) / GRAVITY
}

/// Position of a ballistic body `t` seconds after launch.
#[must_use]
pub fn position_at(origin: Vec3, velocity: Vec3, t: f32) -> Vec3 {
    origin + velocity * t - Vec3::Y * (0.5 * GRAVITY * t * t)
}

/// Replaces `out` with evenly timed samples from launch to touchdown.
pub fn sample_trajectory(origin: Vec3, velocity: Vec3, out: &mut Vec<Vec3>) {
    out.clear();
    let total = flight_time(velocity.y, origin.y);
    if !total.is_finite() || !origin.is_finite() || !velocity.is_finite() {
        return;
    }
    let last = (TRAJECTORY_POINTS - 1) as f32;
    out.extend((0..TRAJECTORY_POINTS).map(|index| {
        position_at(origin, velocity, total * index as f32 / last)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn charge_ratio_saturates() {
        let max = Duration::from_millis(1_200);
        assert_relative_eq!(charge_ratio(Duration::ZERO, Duration::from_millis(600), max), 0.5);
        assert_relative_eq!(charge_ratio(Duration::ZERO, Duration::from_secs(5), max), 1.0);
        assert_relative_eq!(charge_ratio(Duration::from_secs(2), Duration::from_secs(1), max), 0.0);
    }

    #[test]
    fn level_throw_lands_at_requested_distance() {
        let velocity = launch_velocity(Vec2::X, 12.0, 0.0);
        let total = flight_time(velocity.y, 0.0);
        let landing = position_at(Vec3::ZERO, velocity, total);

        assert_relative_eq!(landing.x, 12.0, epsilon = 1e-3);
        assert_relative_eq!(landing.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(landing.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn preview_starts_at_origin_and_ends_on_the_ground() {
        let origin = Vec3::new(1.0, 1.2, -2.0);
        let velocity = launch_velocity(Vec2::Y, 8.0, origin.y);
        let mut samples = Vec::new();

        sample_trajectory(origin, velocity, &mut samples);

        assert_eq!(samples.len(), TRAJECTORY_POINTS);
        assert_eq!(samples[0], origin);
        let last = samples[TRAJECTORY_POINTS - 1];
        assert_relative_eq!(last.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(last.z, origin.z + 8.0, epsilon = 1e-3);
    }

    #[test]
    fn raised_throw_lands_at_requested_distance() {
        let origin = Vec3::new(0.0, 1.2, 0.0);
        for distance in [4.0, 11.0, 18.0] {
            let velocity = launch_velocity(Vec2::new(1.0, 1.0), distance, origin.y);
            let total = flight_time(velocity.y, origin.y);
            let landing = position_at(origin, velocity, total);

            assert_relative_eq!(Vec2::new(landing.x, landing.z).length(), distance, epsilon = 1e-3);
            assert_relative_eq!(landing.y, 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn zero_distance_drops_straight_down() {
        let velocity = launch_velocity(Vec2::X, 0.0, 1.2);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn distance_interpolates_with_charge() {
        assert_relative_eq!(throw_distance(4.0, 18.0, 0.0), 4.0);
        assert_relative_eq!(throw_distance(4.0, 18.0, 0.5), 11.0);
        assert_relative_eq!(throw_distance(4.0, 18.0, 3.0), 18.0);
    }
}
