//! Loot dropped by killed enemies and collected by walking over it.

use ashfall_core::{EnemyKind, Event, PickupId, PickupKind, VisualNode};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pickup lying on the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pickup {
    /// Identifier of the pickup.
    pub id: PickupId,
    /// What the pickup grants.
    pub kind: PickupKind,
    /// Ground position of the pickup.
    pub position: Vec2,
}

#[derive(Debug)]
pub(crate) struct Loot {
    pickups: Vec<Pickup>,
    next_id: u32,
    rng: ChaCha8Rng,
}

impl Loot {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            pickups: Vec::new(),
            next_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub(crate) fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Rolls the kind's loot chance and drops a pickup where the enemy died.
    pub(crate) fn roll(&mut self, kind: EnemyKind, position: Vec2, out: &mut Vec<Event>) {
        if !position.is_finite() || self.rng.gen::<f32>() >= kind.profile().loot_chance {
            return;
        }
        let kind = if self.rng.gen_bool(0.5) {
            PickupKind::Health
        } else {
            PickupKind::ThrowableCharge
        };
        let id = PickupId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pickups.push(Pickup { id, kind, position });
        out.push(Event::PickupDropped {
            pickup: id,
            kind,
            position,
        });
        out.push(Event::NodeAttached {
            node: VisualNode::Pickup(id),
        });
    }

    /// Offers every pickup within `reach` of `point` to `apply`.
    ///
    /// Pickups `apply` declines, e.g. health at full health, stay on the ground.
    pub(crate) fn collect<F>(&mut self, point: Vec2, reach: f32, mut apply: F, out: &mut Vec<Event>)
    where
        F: FnMut(PickupKind) -> bool,
    {
        let reach_sq = reach * reach;
        self.pickups.retain(|pickup| {
            if pickup.position.distance_squared(point) > reach_sq || !apply(pickup.kind) {
                return true;
            }
            out.push(Event::PickupCollected {
                pickup: pickup.id,
                kind: pickup.kind,
            });
            out.push(Event::NodeDetached {
                node: VisualNode::Pickup(pickup.id),
            });
            false
        });
    }

    pub(crate) fn clear(&mut self, out: &mut Vec<Event>) {
        for pickup in self.pickups.drain(..) {
            out.push(Event::NodeDetached {
                node: VisualNode::Pickup(pickup.id),
            });
        }
        self.next_id = 0;
    }
}
