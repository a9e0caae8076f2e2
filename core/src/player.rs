//! Player state shared by the movement controller and the weapon system.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;

use crate::{Loadout, WeaponKind};

/// Health the player spawns with.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
/// Stamina the player spawns with.
pub const PLAYER_MAX_STAMINA: f32 = 100.0;
/// Collision radius of the player.
pub const PLAYER_RADIUS: f32 = 0.5;

/// Locomotion modifier layered on top of directional movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Locomotion {
    /// Standing still.
    #[default]
    Idle,
    /// Walking in the held direction.
    Moving,
    /// Sprinting while draining stamina.
    Rushing,
    /// Performing a fixed-duration dash.
    Rolling,
}

/// A roll in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roll {
    /// Normalised direction of travel, fixed when the roll started.
    pub direction: Vec2,
    /// Timestamp at which the roll started.
    pub started_at: Duration,
}

/// Weapon-related part of the player state.
#[derive(Clone, Debug, PartialEq)]
pub struct Arsenal {
    /// Weapon currently held.
    pub active: WeaponKind,
    /// Rounds in the magazine, or carried charges, per weapon.
    pub ammo: BTreeMap<WeaponKind, u32>,
    /// Whether a reload is in progress.
    pub reloading: bool,
    /// Timestamp after which the reload completes.
    pub reload_end: Duration,
    /// Timestamp of the last shot or beam pulse.
    pub last_shot: Option<Duration>,
    /// Timestamp at which the current throwable charge started.
    pub charge_started: Option<Duration>,
}

impl Arsenal {
    /// Creates an arsenal with full magazines for every weapon in the loadout.
    #[must_use]
    pub fn from_loadout(loadout: &Loadout) -> Self {
        let ammo = loadout
            .weapons
            .iter()
            .map(|tuning| (tuning.kind, tuning.magazine))
            .collect();
        Self {
            active: loadout.primary().unwrap_or(WeaponKind::Pistol),
            ammo,
            reloading: false,
            reload_end: Duration::ZERO,
            last_shot: None,
            charge_started: None,
        }
    }

    /// Rounds left in the active weapon.
    #[must_use]
    pub fn active_ammo(&self) -> u32 {
        self.ammo_for(self.active)
    }

    /// Rounds left in the provided weapon. Weapons the player lacks hold zero.
    #[must_use]
    pub fn ammo_for(&self, weapon: WeaponKind) -> u32 {
        self.ammo.get(&weapon).copied().unwrap_or(0)
    }
}

/// Authoritative state of the player.
///
/// Mutated exclusively by the movement controller (transform, locomotion,
/// health, stamina) and the weapon system (arsenal).
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Position on the ground plane.
    pub position: Vec2,
    /// Yaw in radians. Zero faces `+y`, positive angles turn toward `+x`.
    pub facing: f32,
    /// Displacement per second achieved during the last tick, after collisions.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Current health, always within `[0, max_health]`.
    pub health: f32,
    /// Upper bound of health.
    pub max_health: f32,
    /// Current stamina, always within `[0, max_stamina]`.
    pub stamina: f32,
    /// Upper bound of stamina.
    pub max_stamina: f32,
    /// Active locomotion modifier.
    pub locomotion: Locomotion,
    /// Roll in progress, if any.
    pub roll: Option<Roll>,
    /// Set when rushing emptied stamina; rushing stays unavailable until the rush input is released.
    pub rush_exhausted: bool,
    /// Damage is ignored while `now < invulnerable_until`.
    pub invulnerable_until: Duration,
    /// Timestamp at which stamina was last spent.
    pub last_stamina_use: Option<Duration>,
    /// Timestamp at which damage was last taken.
    pub last_damage: Option<Duration>,
    /// Weapons and ammunition.
    pub arsenal: Arsenal,
}

impl PlayerState {
    /// Creates a fresh player at the provided spawn point.
    #[must_use]
    pub fn spawn(position: Vec2, loadout: &Loadout) -> Self {
        Self {
            position,
            facing: 0.0,
            velocity: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            stamina: PLAYER_MAX_STAMINA,
            max_stamina: PLAYER_MAX_STAMINA,
            locomotion: Locomotion::Idle,
            roll: None,
            rush_exhausted: false,
            invulnerable_until: Duration::ZERO,
            last_stamina_use: None,
            last_damage: None,
            arsenal: Arsenal::from_loadout(loadout),
        }
    }

    /// Unit vector the player is facing on the ground plane.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.facing.sin(), self.facing.cos())
    }

    /// Reports whether the player still has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Reports whether the player is rushing or rolling, the two tackle-capable modes.
    #[must_use]
    pub fn is_charging(&self) -> bool {
        matches!(self.locomotion, Locomotion::Rushing | Locomotion::Rolling)
    }
}
