//! Static content describing a sector, read once when the sector loads.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BossId, EnemyKind, Loadout, ObstacleShape, SurfaceMaterial};

/// Obstacle entry as authored in sector content. Identifiers are assigned on load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Centre of the obstacle on the ground plane.
    pub position: Vec2,
    /// Extent of the obstacle.
    pub shape: ObstacleShape,
    /// Material used for impact cues.
    #[serde(default)]
    pub material: SurfaceMaterial,
    /// Damage the obstacle absorbs before it breaks.
    #[serde(default)]
    pub durability: Option<f32>,
}

/// Horde scheduled to appear at a fixed time after the sector loads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HordeSpec {
    /// Index into the sector's spawn points the horde gathers around.
    pub spawn_point: usize,
    /// Number of enemies requested.
    pub count: u32,
    /// Forces every member of the horde to the provided kind.
    #[serde(default)]
    pub kind: Option<EnemyKind>,
    /// Sector time at which the horde appears.
    #[serde(with = "crate::seconds")]
    pub at: Duration,
}

/// Boss encounter scheduled for the sector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossSpec {
    /// Stable identity of the boss.
    pub id: BossId,
    /// Kind of the boss.
    pub kind: EnemyKind,
    /// Spawn position of the boss.
    pub position: Vec2,
    /// Sector time at which the boss appears.
    #[serde(with = "crate::seconds")]
    pub at: Duration,
}

/// Everything the simulation reads from a sector. Immutable while the sector is active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorContent {
    /// Human-readable name used in logs.
    pub name: String,
    /// Surface the player walks on.
    #[serde(default)]
    pub ground: SurfaceMaterial,
    /// Position at which the player enters the sector.
    pub player_spawn: Vec2,
    /// Static geometry.
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    /// Points hordes gather around.
    #[serde(default)]
    pub spawn_points: Vec<Vec2>,
    /// Scheduled hordes.
    #[serde(default)]
    pub hordes: Vec<HordeSpec>,
    /// Scheduled boss encounter.
    #[serde(default)]
    pub boss: Option<BossSpec>,
    /// Weapon loadout and tuning table.
    #[serde(default)]
    pub loadout: Loadout,
}

impl SectorContent {
    /// Creates an empty sector with the standard loadout.
    #[must_use]
    pub fn empty(name: impl Into<String>, player_spawn: Vec2) -> Self {
        Self {
            name: name.into(),
            ground: SurfaceMaterial::Dirt,
            player_spawn,
            obstacles: Vec::new(),
            spawn_points: Vec::new(),
            hordes: Vec::new(),
            boss: None,
            loadout: Loadout::standard(),
        }
    }
}
