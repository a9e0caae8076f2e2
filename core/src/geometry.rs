//! Static world geometry consumed by the collision grid and resolver.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ObstacleId;

/// Material an obstacle or the ground is made of. Selects footstep and impact cues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMaterial {
    /// Packed earth and gravel.
    #[default]
    Dirt,
    /// Rock, concrete and brick.
    Stone,
    /// Crates, fences and timber.
    Wood,
    /// Vehicles, containers and scrap.
    Metal,
    /// Living tissue. Used for enemy impacts.
    Flesh,
}

/// Shape descriptor of a static obstacle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleShape {
    /// Circle centred on the obstacle position.
    Circle {
        /// Radius of the circle in world units.
        radius: f32,
    },
    /// Axis-aligned box centred on the obstacle position.
    Box {
        /// Half of the box width and depth in world units.
        half_extents: Vec2,
    },
}

impl ObstacleShape {
    /// Half extents of the axis-aligned bounds enclosing the shape.
    #[must_use]
    pub fn bounding_half_extents(&self) -> Vec2 {
        match *self {
            Self::Circle { radius } => Vec2::splat(radius.max(0.0)),
            Self::Box { half_extents } => half_extents.max(Vec2::ZERO),
        }
    }
}

/// Static world geometry. Immutable for the lifetime of a sector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Identifier allocated when the sector loaded.
    pub id: ObstacleId,
    /// Centre of the obstacle on the ground plane.
    pub position: Vec2,
    /// Extent of the obstacle.
    pub shape: ObstacleShape,
    /// Material used for impact cues.
    pub material: SurfaceMaterial,
    /// Damage the obstacle absorbs before it breaks. `None` marks indestructible geometry.
    pub durability: Option<f32>,
}

impl Obstacle {
    /// Lower corner of the obstacle's axis-aligned bounds.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.position - self.shape.bounding_half_extents()
    }

    /// Upper corner of the obstacle's axis-aligned bounds.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.position + self.shape.bounding_half_extents()
    }

    /// Reports whether the obstacle can be destroyed at runtime.
    #[must_use]
    pub fn is_breakable(&self) -> bool {
        self.durability.is_some()
    }
}
