#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy roster and the per-tick AI pass that drives it.
//!
//! [`EnemyRoster`] owns every enemy of the sector and is the only writer of
//! their state: spawning, damage, stuns and removal all go through it.
//! [`EnemyAi`] runs once per tick after the player has moved, applying
//! tackles, integrating knockback and stepping each enemy's state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod brain;
mod roster;

pub use brain::{EnemyAi, Target};
pub use roster::{Enemy, EnemyRoster};

/// Tuning values shared by spawning and the AI pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Maximum number of enemies alive in a sector.
    pub max_enemies: usize,
    /// Closest distance to the origin at which a random spawn is placed.
    pub spawn_min_distance: f32,
    /// Furthest distance to the origin at which a random spawn is placed.
    pub spawn_max_distance: f32,
    /// Random placements tried before a spawn is rejected as blocked.
    pub spawn_attempts: u32,
    /// Exponential decay rate of knockback velocity per second.
    pub knockback_damping: f32,
    /// Knockback slower than this snaps to zero.
    pub knockback_rest: f32,
    /// Locomotion is suppressed for this long after a tackle.
    #[serde(with = "ashfall_core::seconds")]
    pub tackle_stun: Duration,
    /// Decision logic is suppressed for this long after a tackle.
    #[serde(with = "ashfall_core::seconds")]
    pub tackle_blind: Duration,
    /// Factor of the aggro range beyond which a chase is abandoned.
    pub leash: f32,
    /// Gap enemies try to keep between their collision circles.
    pub separation: f32,
    /// Strength of the separation steering.
    pub separation_strength: f32,
    /// Distance probed ahead for obstacles while chasing.
    pub avoidance_lookahead: f32,
    /// Distance at which a boss counts as sighted by the player.
    pub sighting_range: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            max_enemies: 48,
            spawn_min_distance: 6.0,
            spawn_max_distance: 14.0,
            spawn_attempts: 8,
            knockback_damping: 5.0,
            knockback_rest: 0.05,
            tackle_stun: Duration::from_millis(800),
            tackle_blind: Duration::from_millis(1_200),
            leash: 1.5,
            separation: 0.2,
            separation_strength: 2.5,
            avoidance_lookahead: 1.5,
            sighting_range: 30.0,
        }
    }
}
