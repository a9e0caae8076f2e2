#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Index-based pool of transient visual effects.
//!
//! Slots are acquired and released rather than allocated and freed: the pool
//! only ever grows, so steady-state frames never touch the allocator. Other
//! systems queue [`EffectRequest`] values; the pool materialises at most a
//! fixed number of particles per tick, ages every slot in use, and rebuilds
//! the instanced draw batches for the high-count effect kinds.

use ashfall_core::EffectKind;
use glam::Vec3;

mod pool;

pub use pool::{ParticlePool, DEFAULT_SPAWN_BUDGET, GROUND_LEVEL};

/// Handle naming a pool slot. Stable for the lifetime of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle(u32);

impl SlotHandle {
    /// Creates a handle for the provided slot index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the slot inside the pool.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.0
    }
}

/// Handle naming a material instance inside one effect kind's material list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle {
    /// Effect kind owning the material list.
    pub kind: EffectKind,
    /// Index inside that list.
    pub index: u32,
}

/// Independently fading and tinted material state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialInstance {
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Linear RGB tint.
    pub tint: [f32; 3],
}

impl MaterialInstance {
    fn fresh(kind: EffectKind) -> Self {
        let tint = match kind {
            EffectKind::BloodPool => [0.35, 0.02, 0.02],
            EffectKind::Scorch => [0.05, 0.04, 0.03],
            EffectKind::Smoke => [0.4, 0.4, 0.42],
            EffectKind::MuzzleFlash => [1.0, 0.85, 0.5],
            _ => [1.0, 1.0, 1.0],
        };
        Self { opacity: 1.0, tint }
    }
}

/// State of a single pooled particle or decal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Effect kind rendered by the slot.
    pub kind: EffectKind,
    /// World position. `y` is height above the ground.
    pub position: Vec3,
    /// Linear velocity in units per second.
    pub velocity: Vec3,
    /// Rotation about the vertical axis in radians.
    pub rotation: f32,
    /// Rotational velocity in radians per second.
    pub spin: f32,
    /// Uniform scale.
    pub scale: f32,
    /// Remaining life. The slot is released once it reaches zero.
    pub life: f32,
    /// Life the slot started with.
    pub max_life: f32,
    /// Whether a physically settling particle came to rest.
    pub landed: bool,
    /// Material instance owned while the slot is in use.
    pub material: Option<MaterialHandle>,
    in_use: bool,
    active_index: usize,
}

impl Particle {
    fn vacant(kind: EffectKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            spin: 0.0,
            scale: 1.0,
            life: 0.0,
            max_life: 0.0,
            landed: false,
            material: None,
            in_use: false,
            active_index: 0,
        }
    }

    /// Whether the slot is currently acquired.
    #[must_use]
    pub const fn in_use(&self) -> bool {
        self.in_use
    }
}

/// Queued request to materialise effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectRequest {
    /// Effect kind to spawn.
    pub kind: EffectKind,
    /// Spawn origin.
    pub position: Vec3,
    /// Base velocity shared by every spawned particle.
    pub velocity: Vec3,
    /// Number of particles to spawn.
    pub count: u16,
    /// Random velocity added per particle, bounded by this magnitude.
    pub scatter: f32,
}

impl EffectRequest {
    /// Requests a single stationary effect.
    #[must_use]
    pub const fn single(kind: EffectKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            velocity: Vec3::ZERO,
            count: 1,
            scatter: 0.0,
        }
    }

    /// Requests a burst of `count` particles thrown outward with the given scatter.
    #[must_use]
    pub const fn burst(kind: EffectKind, position: Vec3, count: u16, scatter: f32) -> Self {
        Self {
            kind,
            position,
            velocity: Vec3::ZERO,
            count,
            scatter,
        }
    }
}
