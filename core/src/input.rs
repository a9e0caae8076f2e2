//! Input snapshot sampled once at the start of every tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::WeaponKind;

/// Device-independent view of the player's intent for a single tick.
///
/// The ground plane uses `+y` as "forward" and `+x` as "right".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Move toward `+y`.
    pub forward: bool,
    /// Move toward `-y`.
    pub backward: bool,
    /// Move toward `-x`.
    pub left: bool,
    /// Move toward `+x`.
    pub right: bool,
    /// Explicit aim direction. Takes priority over movement when orienting the player.
    pub aim: Option<Vec2>,
    /// Fire button held.
    pub fire: bool,
    /// Reload button held.
    pub reload: bool,
    /// Dash button held. A roll triggers on the press edge only.
    pub dash: bool,
    /// Rush (sprint) button held.
    pub rush: bool,
    /// Weapon the player asked to switch to this tick.
    pub select_weapon: Option<WeaponKind>,
}

impl InputSnapshot {
    /// Normalised movement direction derived from the held directional flags.
    ///
    /// Returns `None` when no flag is held or opposing flags cancel out.
    #[must_use]
    pub fn movement(&self) -> Option<Vec2> {
        let mut direction = Vec2::ZERO;
        if self.forward {
            direction.y += 1.0;
        }
        if self.backward {
            direction.y -= 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }
        direction.try_normalize()
    }

    /// Aim direction, ignoring degenerate or non-finite vectors.
    #[must_use]
    pub fn aim_direction(&self) -> Option<Vec2> {
        self.aim.and_then(Vec2::try_normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_movement_is_normalised() {
        let input = InputSnapshot {
            forward: true,
            right: true,
            ..InputSnapshot::default()
        };
        let direction = input.movement().expect("direction");
        assert!((direction.length() - 1.0).abs() < 1e-6);
        assert!(direction.x > 0.0 && direction.y > 0.0);
    }

    #[test]
    fn opposing_flags_cancel() {
        let input = InputSnapshot {
            left: true,
            right: true,
            ..InputSnapshot::default()
        };
        assert_eq!(input.movement(), None);
    }

    #[test]
    fn zero_aim_is_ignored() {
        let input = InputSnapshot {
            aim: Some(Vec2::ZERO),
            ..InputSnapshot::default()
        };
        assert_eq!(input.aim_direction(), None);
    }
}
