#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile and weapon system.
//!
//! Turns fire, reload and weapon-selection input into shots, beam pulses and
//! thrown explosives, then advances every projectile in flight and resolves
//! its hits against enemies and obstacles. Damage goes through the enemy
//! roster, impact visuals are queued on the particle pool, and breakable
//! props are reported back to the world as [`ashfall_core::Event::PropHit`].

use std::time::Duration;

use ashfall_core::{EffectKind, ProjectileId, WeaponKind};
use ashfall_system_collision::SpatialGrid;
use ashfall_system_enemy_ai::EnemyRoster;
use ashfall_system_particles::ParticlePool;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub mod ballistics;
mod flight;
mod weapons;

pub use weapons::WeaponSystem;

/// Number of points sampled for the throw preview.
pub const TRAJECTORY_POINTS: usize = 24;

/// Tuning values of the weapon system that are not part of a weapon's entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Height above the ground at which shots and throws leave the player.
    pub muzzle_height: f32,
    /// Collision radius of bullets and pellets.
    pub projectile_radius: f32,
    /// Collision radius of thrown explosives.
    pub throwable_radius: f32,
    /// Knockback impulse at the centre of a blast, divided by the enemy's mass.
    pub explosion_force: f32,
    /// Locomotion stun applied by a blast.
    #[serde(with = "ashfall_core::seconds")]
    pub explosion_stun: Duration,
    /// Decision blind applied by a blast.
    #[serde(with = "ashfall_core::seconds")]
    pub explosion_blind: Duration,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            muzzle_height: 1.2,
            projectile_radius: 0.05,
            throwable_radius: 0.15,
            explosion_force: 700.0,
            explosion_stun: Duration::from_millis(600),
            explosion_blind: Duration::from_millis(1_000),
        }
    }
}

/// What a projectile does when it connects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    /// Damages the first enemy or obstacle it touches.
    Bullet {
        /// Damage dealt to a struck enemy or prop.
        damage: f32,
        /// Stun applied to a struck enemy.
        stagger: Option<Duration>,
    },
    /// Detonates on contact with the ground or an obstacle, or when the fuse runs out.
    Explosive {
        /// Damage at the centre of the blast.
        damage: f32,
        /// Radius of the blast.
        blast_radius: f32,
        /// Timestamp at which the fuse detonates the charge.
        fuse_end: Duration,
    },
}

/// Projectile or thrown weapon in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Weapon that launched the projectile.
    pub weapon: WeaponKind,
    /// World position. `y` is height above the ground.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Timestamp at which an unspent projectile disappears.
    pub expires_at: Duration,
    /// Charge ratio the projectile was thrown with.
    pub charge: Option<f32>,
    /// Effect of a connecting hit.
    pub payload: Payload,
    /// Effect spawned where the projectile hits.
    pub impact: EffectKind,
}

/// Mutable world state the weapon system acts on.
#[derive(Debug)]
pub struct Battlefield<'a> {
    /// Static obstacles of the sector.
    pub grid: &'a SpatialGrid,
    /// Enemies that can be struck.
    pub roster: &'a mut EnemyRoster,
    /// Pool receiving impact effect requests.
    pub pool: &'a mut ParticlePool,
}

/// Ground-plane part of a world position.
#[must_use]
pub fn ground(position: Vec3) -> Vec2 {
    Vec2::new(position.x, position.z)
}

/// Lifts a ground-plane position to the provided height.
#[must_use]
pub fn lift(position: Vec2, height: f32) -> Vec3 {
    Vec3::new(position.x, height, position.y)
}
