//! Iterative penetration resolution of circular movers against obstacles.

use ashfall_core::{Obstacle, ObstacleShape};
use glam::Vec2;

/// Penetration shallower than this is ignored.
pub const RESOLVE_EPSILON: f32 = 1e-4;

/// Resolution passes applied per sub-step when several obstacles overlap.
pub const DEFAULT_PASSES: usize = 4;

/// Pushes a circle of `radius` at `position` out of a single obstacle.
///
/// After a call that returns `true`, the distance between the circle centre
/// and the obstacle surface is at least `radius`. Returns whether the
/// position was adjusted.
pub fn resolve(position: &mut Vec2, radius: f32, obstacle: &Obstacle) -> bool {
    match obstacle.shape {
        ObstacleShape::Circle {
            radius: obstacle_radius,
        } => push_out_of_circle(position, radius, obstacle.position, obstacle_radius),
        ObstacleShape::Box { half_extents } => {
            push_out_of_box(position, radius, obstacle.position, half_extents)
        }
    }
}

/// Pushes a circle out of another circle along the line joining their centres.
///
/// Coincident centres push toward `+x` so the outcome stays reproducible.
pub fn push_out_of_circle(
    position: &mut Vec2,
    radius: f32,
    center: Vec2,
    other_radius: f32,
) -> bool {
    let offset = *position - center;
    let minimum = radius + other_radius;
    let distance = offset.length();
    if distance >= minimum - RESOLVE_EPSILON {
        return false;
    }

    let normal = if distance > f32::EPSILON {
        offset / distance
    } else {
        Vec2::X
    };
    *position = center + normal * minimum;
    true
}

/// Pushes a circle out of an axis-aligned box.
///
/// A centre outside the box moves along the line from the closest point on
/// the box; a centre inside the box leaves through the nearest face.
pub fn push_out_of_box(
    position: &mut Vec2,
    radius: f32,
    center: Vec2,
    half_extents: Vec2,
) -> bool {
    let local = *position - center;
    let closest = local.clamp(-half_extents, half_extents);

    if closest == local {
        let depth_x = half_extents.x - local.x.abs();
        let depth_y = half_extents.y - local.y.abs();
        if depth_x <= depth_y {
            position.x = center.x + sign(local.x) * (half_extents.x + radius);
        } else {
            position.y = center.y + sign(local.y) * (half_extents.y + radius);
        }
        return true;
    }

    let offset = local - closest;
    let distance = offset.length();
    if distance >= radius - RESOLVE_EPSILON {
        return false;
    }

    *position = center + closest + offset / distance * radius;
    true
}

/// Resolves a circle against a set of obstacles for up to `passes` passes.
///
/// Resolution stops early once a pass makes no adjustment. Returns whether
/// any adjustment was made.
pub fn resolve_all(position: &mut Vec2, radius: f32, obstacles: &[Obstacle], passes: usize) -> bool {
    let mut adjusted = false;
    for _ in 0..passes {
        let mut pass_adjusted = false;
        for obstacle in obstacles {
            pass_adjusted |= resolve(position, radius, obstacle);
        }
        if !pass_adjusted {
            break;
        }
        adjusted = true;
    }
    adjusted
}

/// Distance from `point` to the surface of the obstacle, negative inside it.
#[must_use]
pub fn surface_distance(point: Vec2, obstacle: &Obstacle) -> f32 {
    match obstacle.shape {
        ObstacleShape::Circle { radius } => point.distance(obstacle.position) - radius,
        ObstacleShape::Box { half_extents } => {
            let local = (point - obstacle.position).abs() - half_extents;
            let outside = local.max(Vec2::ZERO).length();
            let inside = local.x.max(local.y).min(0.0);
            outside + inside
        }
    }
}

fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ashfall_core::{ObstacleId, SurfaceMaterial};

    fn obstacle(position: Vec2, shape: ObstacleShape) -> Obstacle {
        Obstacle {
            id: ObstacleId::new(0),
            position,
            shape,
            material: SurfaceMaterial::Stone,
            durability: None,
        }
    }

    #[test]
    fn circle_penetration_is_pushed_to_contact() {
        let rock = obstacle(Vec2::new(1.0, 0.0), ObstacleShape::Circle { radius: 0.5 });
        let mut position = Vec2::new(0.2, 0.0);

        assert!(resolve(&mut position, 0.5, &rock));

        assert!(position.x <= 0.0);
        assert_relative_eq!(position.distance(rock.position), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn separated_circles_are_untouched() {
        let rock = obstacle(Vec2::new(3.0, 0.0), ObstacleShape::Circle { radius: 0.5 });
        let mut position = Vec2::ZERO;

        assert!(!resolve(&mut position, 0.5, &rock));
        assert_eq!(position, Vec2::ZERO);
    }

    #[test]
    fn coincident_centres_push_along_x() {
        let rock = obstacle(Vec2::ZERO, ObstacleShape::Circle { radius: 1.0 });
        let mut position = Vec2::ZERO;

        assert!(resolve(&mut position, 0.5, &rock));
        assert_relative_eq!(position.x, 1.5);
        assert_relative_eq!(position.y, 0.0);
    }

    #[test]
    fn box_corner_contact_pushes_diagonally() {
        let crate_box = obstacle(
            Vec2::ZERO,
            ObstacleShape::Box {
                half_extents: Vec2::ONE,
            },
        );
        let mut position = Vec2::new(1.2, 1.2);

        assert!(resolve(&mut position, 0.5, &crate_box));
        assert_relative_eq!(surface_distance(position, &crate_box), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn centre_inside_box_exits_through_nearest_face() {
        let wall = obstacle(
            Vec2::ZERO,
            ObstacleShape::Box {
                half_extents: Vec2::new(2.0, 0.5),
            },
        );
        let mut position = Vec2::new(0.3, -0.2);

        assert!(resolve(&mut position, 0.25, &wall));
        assert_relative_eq!(position.y, -0.75);
        assert_relative_eq!(position.x, 0.3);
    }

    #[test]
    fn resolution_stops_early_without_contact() {
        let obstacles = [obstacle(Vec2::new(10.0, 0.0), ObstacleShape::Circle { radius: 1.0 })];
        let mut position = Vec2::ZERO;

        assert!(!resolve_all(&mut position, 0.5, &obstacles, DEFAULT_PASSES));
    }

    #[test]
    fn resolved_positions_clear_every_surface() {
        let mut state: u32 = 0x1234_5678;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32
        };

        for _ in 0..200 {
            let shape = if next() < 0.5 {
                ObstacleShape::Circle {
                    radius: 0.2 + next() * 2.0,
                }
            } else {
                ObstacleShape::Box {
                    half_extents: Vec2::new(0.2 + next() * 2.0, 0.2 + next() * 2.0),
                }
            };
            let target = obstacle(Vec2::new(next() * 4.0 - 2.0, next() * 4.0 - 2.0), shape);
            let radius = 0.1 + next();
            let mut position = Vec2::new(next() * 6.0 - 3.0, next() * 6.0 - 3.0);

            let _ = resolve(&mut position, radius, &target);

            assert!(
                surface_distance(position, &target) >= radius - 1e-3,
                "penetration remains for {target:?} at {position:?}"
            );
        }
    }
}
