use ashfall_core::{Obstacle, ObstacleId, ObstacleShape, SurfaceMaterial};
use ashfall_system_collision::{resolve_all, SpatialGrid, DEFAULT_PASSES};
use glam::Vec2;

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        (self.0 >> 40) as f32 / (1u64 << 24) as f32
    }
}

fn random_obstacle(rng: &mut Lcg, id: u32) -> Obstacle {
    let position = Vec2::new(rng.next() * 60.0 - 30.0, rng.next() * 60.0 - 30.0);
    let shape = if rng.next() < 0.5 {
        ObstacleShape::Circle {
            radius: 0.2 + rng.next() * 3.0,
        }
    } else {
        ObstacleShape::Box {
            half_extents: Vec2::new(0.2 + rng.next() * 3.0, 0.2 + rng.next() * 3.0),
        }
    };
    Obstacle {
        id: ObstacleId::new(id),
        position,
        shape,
        material: SurfaceMaterial::Stone,
        durability: None,
    }
}

#[test]
fn queries_match_brute_force_after_insertions_and_removals() {
    let mut rng = Lcg(0x9e37_79b9_7f4a_7c15);
    let mut grid = SpatialGrid::new(3.0);
    let mut live: Vec<Obstacle> = Vec::new();

    for id in 0..150 {
        let obstacle = random_obstacle(&mut rng, id);
        assert!(grid.insert(obstacle));
        live.push(obstacle);
    }

    for _ in 0..50 {
        let index = (rng.next() * live.len() as f32) as usize % live.len();
        let removed = live.swap_remove(index);
        assert_eq!(grid.remove(removed.id), Some(removed));
    }

    let mut found = Vec::new();
    for _ in 0..100 {
        let point = Vec2::new(rng.next() * 70.0 - 35.0, rng.next() * 70.0 - 35.0);
        let radius = rng.next() * 6.0;
        grid.query_near(point, radius, &mut found);

        let mut expected: Vec<ObstacleId> = live
            .iter()
            .filter(|obstacle| {
                let min = obstacle.min();
                let max = obstacle.max();
                min.x <= point.x + radius
                    && max.x >= point.x - radius
                    && min.y <= point.y + radius
                    && max.y >= point.y - radius
            })
            .map(|obstacle| obstacle.id)
            .collect();
        expected.sort();

        let mut actual: Vec<ObstacleId> = found.iter().map(|obstacle| obstacle.id).collect();
        actual.sort();
        assert_eq!(actual, expected, "query at {point:?} radius {radius}");
    }
}

#[test]
fn removed_obstacles_never_block() {
    let mut grid = SpatialGrid::default();
    let pillar = Obstacle {
        id: ObstacleId::new(1),
        position: Vec2::new(2.0, 2.0),
        shape: ObstacleShape::Circle { radius: 1.0 },
        material: SurfaceMaterial::Wood,
        durability: Some(20.0),
    };
    assert!(grid.insert(pillar));
    let mut scratch = Vec::new();
    assert!(grid.is_blocked(Vec2::new(2.0, 2.0), 0.5, &mut scratch));

    let _ = grid.remove(pillar.id);

    assert!(!grid.is_blocked(Vec2::new(2.0, 2.0), 0.5, &mut scratch));
}

#[test]
fn multi_pass_resolution_escapes_a_corridor() {
    let wall = |id: u32, y: f32| Obstacle {
        id: ObstacleId::new(id),
        position: Vec2::new(0.0, y),
        shape: ObstacleShape::Box {
            half_extents: Vec2::new(5.0, 0.5),
        },
        material: SurfaceMaterial::Stone,
        durability: None,
    };
    let mut grid = SpatialGrid::default();
    grid.rebuild([wall(1, 1.5), wall(2, -1.5)]);

    let mut position = Vec2::new(0.0, 0.8);
    let mut nearby = Vec::new();
    grid.query_near(position, 0.5, &mut nearby);

    assert!(resolve_all(&mut position, 0.5, &nearby, DEFAULT_PASSES));
    assert!(position.y <= 0.5 + 1e-4);
    assert!(position.y >= -0.5 - 1e-4);
}
