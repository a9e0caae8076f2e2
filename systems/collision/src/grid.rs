//! Bucket-indexed lookup of static obstacles by position.

use std::collections::{BTreeMap, HashMap};

use ashfall_core::{is_finite_vec2, Obstacle, ObstacleId};
use glam::Vec2;

use crate::sweep::{sweep_obstacle, SweepHit};

/// Edge length of a grid cell used when the configuration does not override it.
pub const DEFAULT_CELL_SIZE: f32 = 4.0;

/// Queries spanning more cells than this scan every obstacle instead.
const MAX_QUERY_CELLS: i64 = 4_096;

/// Coarse integer coordinate of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Cell index along `x`.
    pub column: i32,
    /// Cell index along `y`.
    pub row: i32,
}

impl CellKey {
    /// Creates a new cell key.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }
}

/// Uniform grid mapping cells to the obstacles that overlap them.
///
/// Every obstacle is listed in every cell its bounds overlap; removing an
/// obstacle removes it from all of them.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<ObstacleId>>,
    obstacles: BTreeMap<ObstacleId, Obstacle>,
}

impl SpatialGrid {
    /// Creates an empty grid. Invalid cell sizes fall back to [`DEFAULT_CELL_SIZE`].
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            obstacles: BTreeMap::new(),
        }
    }

    /// Edge length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Discards every obstacle and rebuilds the grid from the provided set.
    pub fn rebuild<I>(&mut self, obstacles: I)
    where
        I: IntoIterator<Item = Obstacle>,
    {
        self.clear();
        for obstacle in obstacles {
            let _ = self.insert(obstacle);
        }
        log::debug!(
            "collision grid rebuilt with {} obstacles across {} cells",
            self.obstacles.len(),
            self.cells.len()
        );
    }

    /// Removes every obstacle.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.obstacles.clear();
    }

    /// Registers an obstacle in every cell it overlaps.
    ///
    /// An obstacle with the same identifier is replaced. Obstacles with
    /// non-finite geometry are rejected and `false` is returned.
    pub fn insert(&mut self, obstacle: Obstacle) -> bool {
        let extents = obstacle.shape.bounding_half_extents();
        if !is_finite_vec2(obstacle.position) || !is_finite_vec2(extents) {
            log::warn!("rejecting obstacle {:?} with non-finite geometry", obstacle.id);
            return false;
        }

        let _ = self.remove(obstacle.id);
        let (low, high) = self.key_range(obstacle.min(), obstacle.max());
        for row in low.row..=high.row {
            for column in low.column..=high.column {
                self.cells
                    .entry(CellKey::new(column, row))
                    .or_default()
                    .push(obstacle.id);
            }
        }
        let _ = self.obstacles.insert(obstacle.id, obstacle);
        true
    }

    /// Removes an obstacle from every cell it occupied.
    pub fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let obstacle = self.obstacles.remove(&id)?;
        let (low, high) = self.key_range(obstacle.min(), obstacle.max());
        for row in low.row..=high.row {
            for column in low.column..=high.column {
                let key = CellKey::new(column, row);
                let now_empty = match self.cells.get_mut(&key) {
                    Some(ids) => {
                        ids.retain(|candidate| *candidate != id);
                        ids.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    let _ = self.cells.remove(&key);
                }
            }
        }
        Some(obstacle)
    }

    /// Looks up an obstacle by identifier.
    #[must_use]
    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// Number of registered obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Reports whether the grid holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Iterator over every registered obstacle in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// Cell containing the provided point.
    #[must_use]
    pub fn cell_of(&self, point: Vec2) -> CellKey {
        CellKey::new(
            to_cell_index(point.x / self.cell_size),
            to_cell_index(point.y / self.cell_size),
        )
    }

    /// Obstacles registered in a single cell.
    #[must_use]
    pub fn cell(&self, key: CellKey) -> &[ObstacleId] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Collects the obstacles whose bounds come within `radius` of `point`.
    ///
    /// Only the cells overlapping the search square are visited. The output
    /// buffer is cleared first; an empty or sparse grid simply yields nothing.
    /// Results carry no ordering guarantee.
    pub fn query_near(&self, point: Vec2, radius: f32, out: &mut Vec<Obstacle>) {
        out.clear();
        if self.obstacles.is_empty() || !is_finite_vec2(point) || !radius.is_finite() {
            return;
        }

        let reach = Vec2::splat(radius.max(0.0));
        let low_corner = point - reach;
        let high_corner = point + reach;
        let (low, high) = self.key_range(low_corner, high_corner);
        let span = (i64::from(high.column) - i64::from(low.column) + 1)
            * (i64::from(high.row) - i64::from(low.row) + 1);

        if span > MAX_QUERY_CELLS {
            out.extend(
                self.obstacles
                    .values()
                    .filter(|obstacle| overlaps(obstacle, low_corner, high_corner))
                    .copied(),
            );
            return;
        }

        for row in low.row..=high.row {
            for column in low.column..=high.column {
                for id in self.cell(CellKey::new(column, row)) {
                    if let Some(obstacle) = self.obstacles.get(id) {
                        if overlaps(obstacle, low_corner, high_corner) {
                            out.push(*obstacle);
                        }
                    }
                }
            }
        }

        out.sort_unstable_by_key(|obstacle| obstacle.id);
        out.dedup_by_key(|obstacle| obstacle.id);
    }

    /// Reports whether a circle of `radius` at `point` penetrates any obstacle.
    #[must_use]
    pub fn is_blocked(&self, point: Vec2, radius: f32, scratch: &mut Vec<Obstacle>) -> bool {
        self.query_near(point, radius, scratch);
        scratch.iter().any(|obstacle| {
            let mut probe = point;
            crate::resolve::resolve(&mut probe, radius, obstacle)
        })
    }

    /// Finds the first obstacle a circle of `radius` touches travelling from `start` to `end`.
    #[must_use]
    pub fn first_hit(
        &self,
        start: Vec2,
        end: Vec2,
        radius: f32,
        scratch: &mut Vec<Obstacle>,
    ) -> Option<SweepHit> {
        let midpoint = (start + end) * 0.5;
        let reach = start.distance(end) * 0.5 + radius.max(0.0);
        self.query_near(midpoint, reach, scratch);

        let mut best: Option<SweepHit> = None;
        for obstacle in scratch.iter() {
            if let Some(t) = sweep_obstacle(start, end, radius, obstacle) {
                if best.map_or(true, |current| t < current.t) {
                    best = Some(SweepHit {
                        t,
                        obstacle: *obstacle,
                    });
                }
            }
        }
        best
    }

    fn key_range(&self, low: Vec2, high: Vec2) -> (CellKey, CellKey) {
        (self.cell_of(low), self.cell_of(high))
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

fn to_cell_index(scaled: f32) -> i32 {
    let floored = scaled.floor();
    if floored >= i32::MAX as f32 {
        i32::MAX
    } else if floored <= i32::MIN as f32 {
        i32::MIN
    } else {
        floored as i32
    }
}

fn overlaps(obstacle: &Obstacle, low: Vec2, high: Vec2) -> bool {
    let min = obstacle.min();
    let max = obstacle.max();
    min.x <= high.x && max.x >= low.x && min.y <= high.y && max.y >= low.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_core::{ObstacleShape, SurfaceMaterial};

    fn circle(id: u32, x: f32, y: f32, radius: f32) -> Obstacle {
        Obstacle {
            id: ObstacleId::new(id),
            position: Vec2::new(x, y),
            shape: ObstacleShape::Circle { radius },
            material: SurfaceMaterial::Stone,
            durability: None,
        }
    }

    #[test]
    fn obstacle_is_listed_in_every_overlapped_cell() {
        let mut grid = SpatialGrid::new(2.0);
        assert!(grid.insert(circle(1, 2.0, 2.0, 0.5)));

        for key in [
            CellKey::new(0, 0),
            CellKey::new(1, 0),
            CellKey::new(0, 1),
            CellKey::new(1, 1),
        ] {
            assert_eq!(grid.cell(key), &[ObstacleId::new(1)], "missing from {key:?}");
        }
        assert!(grid.cell(CellKey::new(2, 2)).is_empty());
    }

    #[test]
    fn removal_clears_every_cell() {
        let mut grid = SpatialGrid::new(2.0);
        assert!(grid.insert(circle(1, 2.0, 2.0, 0.5)));
        assert!(grid.remove(ObstacleId::new(1)).is_some());

        assert!(grid.cells.is_empty());
        assert!(grid.is_empty());
        assert!(grid.remove(ObstacleId::new(1)).is_none());
    }

    #[test]
    fn reinserting_an_identifier_replaces_the_old_footprint() {
        let mut grid = SpatialGrid::new(2.0);
        assert!(grid.insert(circle(4, 0.5, 0.5, 0.2)));
        assert!(grid.insert(circle(4, 9.0, 9.0, 0.2)));

        assert!(grid.cell(CellKey::new(0, 0)).is_empty());
        assert_eq!(grid.cell(CellKey::new(4, 4)), &[ObstacleId::new(4)]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn query_deduplicates_multi_cell_obstacles() {
        let mut grid = SpatialGrid::new(1.0);
        assert!(grid.insert(circle(7, 0.0, 0.0, 1.5)));
        let mut out = Vec::new();

        grid.query_near(Vec2::ZERO, 2.0, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, ObstacleId::new(7));
    }

    #[test]
    fn query_on_empty_grid_is_empty() {
        let grid = SpatialGrid::default();
        let mut out = vec![circle(1, 0.0, 0.0, 1.0)];

        grid.query_near(Vec2::new(3.0, 3.0), 10.0, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn query_skips_distant_obstacles() {
        let mut grid = SpatialGrid::new(4.0);
        grid.rebuild([circle(1, 1.0, 1.0, 0.5), circle(2, 30.0, 30.0, 0.5)]);
        let mut out = Vec::new();

        grid.query_near(Vec2::ZERO, 3.0, &mut out);

        assert_eq!(out.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ObstacleId::new(1)]);
    }

    #[test]
    fn huge_queries_fall_back_to_a_scan() {
        let mut grid = SpatialGrid::new(0.5);
        grid.rebuild([circle(1, 500.0, 500.0, 0.5), circle(2, -500.0, 0.0, 0.5)]);
        let mut out = Vec::new();

        grid.query_near(Vec2::ZERO, 1_000.0, &mut out);

        assert_eq!(out.len(), 2);
    }

    #[test]
    fn non_finite_obstacles_are_rejected() {
        let mut grid = SpatialGrid::default();
        assert!(!grid.insert(circle(1, f32::NAN, 0.0, 1.0)));
        assert!(grid.is_empty());
    }

    #[test]
    fn invalid_cell_size_falls_back_to_default() {
        assert_eq!(SpatialGrid::new(0.0).cell_size(), DEFAULT_CELL_SIZE);
        assert_eq!(SpatialGrid::new(f32::INFINITY).cell_size(), DEFAULT_CELL_SIZE);
    }

    #[test]
    fn blocked_points_are_detected() {
        let mut grid = SpatialGrid::default();
        grid.rebuild([circle(1, 5.0, 5.0, 1.0)]);
        let mut scratch = Vec::new();

        assert!(grid.is_blocked(Vec2::new(5.5, 5.0), 0.25, &mut scratch));
        assert!(!grid.is_blocked(Vec2::new(8.0, 5.0), 0.25, &mut scratch));
    }

    #[test]
    fn first_hit_returns_the_nearest_obstacle() {
        let mut grid = SpatialGrid::default();
        grid.rebuild([circle(1, 6.0, 0.0, 0.5), circle(2, 3.0, 0.0, 0.5)]);
        let mut scratch = Vec::new();

        let hit = grid
            .first_hit(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.0, &mut scratch)
            .expect("hit");

        assert_eq!(hit.obstacle.id, ObstacleId::new(2));
        assert!((hit.t - 0.25).abs() < 1e-4);
    }
}
