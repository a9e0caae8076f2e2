//! Read-only views handed to systems and presentation layers.

use glam::Vec2;

use crate::{BossId, EnemyId, EnemyKind, WeaponKind};

/// Decision state of an enemy's AI.
///
/// Stun and blindness are a gating overlay rather than a state: a tackled or
/// staggered enemy is forced to [`AiState::Idle`] and skips decision logic
/// until its blind timestamp passes, while knockback keeps integrating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AiState {
    /// Unaware of the player, or recovering from a stun.
    #[default]
    Idle,
    /// Moving toward the player.
    Chasing,
    /// Winding up or delivering a bite.
    Attacking,
    /// Dead and awaiting removal.
    Dead,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Position on the ground plane.
    pub position: Vec2,
    /// Collision radius after scaling.
    pub radius: f32,
    /// Mass derived from the spawn scale.
    pub mass: f32,
    /// Current AI state.
    pub state: AiState,
    /// Whether decision logic is currently suppressed by a stun.
    pub blinded: bool,
    /// Remaining health.
    pub health: f32,
    /// Boss identity, when the enemy is a boss.
    pub boss: Option<BossId>,
}

/// Read-only snapshot describing all enemies within the sector.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Finds the snapshot for the provided enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Finds the living enemy closest to `point`. Ties resolve to the lower identifier.
    #[must_use]
    pub fn nearest(&self, point: Vec2) -> Option<&EnemySnapshot> {
        let mut best: Option<(&EnemySnapshot, f32)> = None;
        for snapshot in self.snapshots.iter().filter(|s| s.state != AiState::Dead) {
            let distance_sq = snapshot.position.distance_squared(point);
            match best {
                Some((_, best_sq)) if best_sq <= distance_sq => {}
                _ => best = Some((snapshot, distance_sq)),
            }
        }
        best.map(|(snapshot, _)| snapshot)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Data pushed to the HUD collaborator once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudSnapshot {
    /// Current player health.
    pub health: f32,
    /// Upper bound of player health.
    pub max_health: f32,
    /// Current player stamina.
    pub stamina: f32,
    /// Upper bound of player stamina.
    pub max_stamina: f32,
    /// Weapon held by the player.
    pub weapon: WeaponKind,
    /// Rounds or charges left in the held weapon.
    pub ammo: u32,
    /// Capacity of the held weapon.
    pub magazine: u32,
    /// Whether a reload is in progress.
    pub reloading: bool,
    /// Charge ratio of a throwable being held, if any.
    pub charge: Option<f32>,
    /// Number of living enemies.
    pub enemies: usize,
    /// Boss identity and remaining health ratio while a boss is alive.
    pub boss: Option<(BossId, f32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u32, x: f32, state: AiState) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Walker,
            position: Vec2::new(x, 0.0),
            radius: 0.5,
            mass: 70.0,
            state,
            blinded: false,
            health: 10.0,
            boss: None,
        }
    }

    #[test]
    fn nearest_ignores_dead_enemies() {
        let view = EnemyView::from_snapshots(vec![
            snapshot(1, 1.0, AiState::Dead),
            snapshot(2, 3.0, AiState::Chasing),
            snapshot(3, -5.0, AiState::Idle),
        ]);

        let nearest = view.nearest(Vec2::ZERO).expect("living enemy");
        assert_eq!(nearest.id, EnemyId::new(2));
    }

    #[test]
    fn nearest_breaks_ties_by_identifier() {
        let view = EnemyView::from_snapshots(vec![
            snapshot(9, 2.0, AiState::Idle),
            snapshot(4, -2.0, AiState::Idle),
        ]);

        assert_eq!(view.nearest(Vec2::ZERO).map(|s| s.id), Some(EnemyId::new(4)));
    }

    #[test]
    fn lookup_uses_sorted_order() {
        let view = EnemyView::from_snapshots(vec![
            snapshot(5, 0.0, AiState::Idle),
            snapshot(2, 0.0, AiState::Idle),
        ]);
        assert!(view.get(EnemyId::new(5)).is_some());
        assert!(view.get(EnemyId::new(3)).is_none());
        assert_eq!(view.len(), 2);
    }
}
