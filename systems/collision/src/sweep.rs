//! Swept segment tests used for fast-moving projectiles.

use ashfall_core::{Obstacle, ObstacleShape};
use glam::Vec2;

/// First contact of a swept circle with an obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    /// Fraction of the segment travelled before contact, in `[0, 1]`.
    pub t: f32,
    /// Obstacle that was touched.
    pub obstacle: Obstacle,
}

/// Fraction of the segment `start..end` at which it first enters the circle.
///
/// A segment starting inside the circle reports `0.0`.
#[must_use]
pub fn segment_circle(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let offset = start - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let direction = end - start;
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }

    let b = offset.dot(direction);
    if b >= 0.0 {
        return None;
    }

    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / a;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Fraction of the segment at which a circle of `radius` sweeping along it touches the obstacle.
///
/// Boxes are expanded by the radius on every side, which slightly overestimates
/// the rounded corners of the true swept shape.
#[must_use]
pub fn sweep_obstacle(start: Vec2, end: Vec2, radius: f32, obstacle: &Obstacle) -> Option<f32> {
    let radius = radius.max(0.0);
    match obstacle.shape {
        ObstacleShape::Circle {
            radius: obstacle_radius,
        } => segment_circle(start, end, obstacle.position, obstacle_radius + radius),
        ObstacleShape::Box { half_extents } => segment_box(
            start - obstacle.position,
            end - obstacle.position,
            half_extents + Vec2::splat(radius),
        ),
    }
}

fn segment_box(start: Vec2, end: Vec2, half_extents: Vec2) -> Option<f32> {
    let direction = end - start;
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;

    for axis in 0..2 {
        let origin = start[axis];
        let delta = direction[axis];
        let low = -half_extents[axis];
        let high = half_extents[axis];

        if delta.abs() <= f32::EPSILON {
            if origin < low || origin > high {
                return None;
            }
            continue;
        }

        let first = (low - origin) / delta;
        let second = (high - origin) / delta;
        let (near, far) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ashfall_core::{ObstacleId, SurfaceMaterial};

    #[test]
    fn segment_enters_circle_at_expected_fraction() {
        let t = segment_circle(Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(3.0, 0.0), 1.0)
            .expect("hit");
        assert_relative_eq!(t, 0.5);
    }

    #[test]
    fn segment_pointing_away_misses() {
        let hit = segment_circle(Vec2::ZERO, Vec2::new(-4.0, 0.0), Vec2::new(3.0, 0.0), 1.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn short_segment_stops_before_circle() {
        let hit = segment_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(3.0, 0.0), 1.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn start_inside_reports_zero() {
        let hit = segment_circle(Vec2::new(2.9, 0.0), Vec2::new(9.0, 0.0), Vec2::new(3.0, 0.0), 1.0);
        assert_eq!(hit, Some(0.0));
    }

    #[test]
    fn swept_radius_expands_box() {
        let wall = Obstacle {
            id: ObstacleId::new(3),
            position: Vec2::new(5.0, 0.0),
            shape: ObstacleShape::Box {
                half_extents: Vec2::new(1.0, 1.0),
            },
            material: SurfaceMaterial::Wood,
            durability: Some(10.0),
        };

        let t = sweep_obstacle(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.5, &wall).expect("hit");
        assert_relative_eq!(t, 0.35);

        let miss = sweep_obstacle(Vec2::new(0.0, 3.0), Vec2::new(10.0, 3.0), 0.5, &wall);
        assert_eq!(miss, None);
    }
}
