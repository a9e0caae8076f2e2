#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ashfall simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the per-frame systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and every observable side effect of a tick is
//! reported as an [`Event`]. Presentation layers consume the event stream
//! through the typed collaborator traits in [`collaborators`]; they never feed
//! back into the tick that produced the events.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod collaborators;
pub mod geometry;
pub mod input;
pub mod player;
pub mod sector;
pub mod seconds;
pub mod view;

pub use catalog::{
    EffectKind, EnemyKind, EnemyProfile, Landing, Loadout, PickupKind, WeaponBehavior, WeaponKind,
    WeaponTuning,
};
pub use geometry::{Obstacle, ObstacleShape, SurfaceMaterial};
pub use input::InputSnapshot;
pub use player::{Arsenal, Locomotion, PlayerState, Roll};
pub use sector::{BossSpec, HordeSpec, ObstacleSpec, SectorContent};
pub use view::{AiState, EnemySnapshot, EnemyView, HudSnapshot};

/// Vertical acceleration applied to ballistic projectiles and falling debris.
pub const GRAVITY: f32 = 9.81;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to an enemy for the lifetime of a sector.
    EnemyId
);
identifier!(
    /// Unique identifier assigned to a static obstacle when a sector loads.
    ObstacleId
);
identifier!(
    /// Unique identifier assigned to an in-flight projectile or thrown weapon.
    ProjectileId
);
identifier!(
    /// Stable identity of a boss used for "seen" and "defeated" tracking.
    BossId
);
identifier!(
    /// Unique identifier assigned to a dropped pickup.
    PickupId
);

/// Stable handle naming a visual node owned by the presentation layer.
///
/// Visual nodes never point back at simulation state; the presentation layer
/// maps the id to the entity data it reads from the query surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualNode {
    /// Model of a living enemy. Released permanently when the enemy is removed.
    Enemy(EnemyId),
    /// Mesh of a projectile or thrown weapon.
    Projectile(ProjectileId),
    /// Pooled particle or decal slot. Attached once when the pool grows.
    Particle(u32),
    /// Mesh of a pickup lying on the ground.
    Pickup(PickupId),
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Tears down any active sector and loads the provided content.
    LoadSector {
        /// Static content describing the sector. Immutable while it is active.
        content: Box<SectorContent>,
    },
    /// Hard-resets every projectile, pooled effect and enemy.
    TeardownSector,
    /// Advances every component by one frame.
    Tick {
        /// Wall-clock time that elapsed since the previous frame. Clamped by the world.
        delta: Duration,
        /// Simulation timestamp at the start of the frame.
        now: Duration,
        /// Input sampled once at the start of the frame.
        input: InputSnapshot,
    },
    /// Requests a single enemy spawn.
    SpawnEnemy(SpawnRequest),
    /// Requests a group of enemies scattered around an origin.
    SpawnHorde {
        /// Point the horde gathers around.
        origin: Vec2,
        /// Number of enemies requested before budgeting.
        count: u32,
        /// Forces every member of the horde to the provided kind.
        kind: Option<EnemyKind>,
    },
    /// Toggles the debug mode in which firing never consumes ammo.
    SetUnlimitedAmmo {
        /// Whether unlimited ammo should be active.
        enabled: bool,
    },
    /// Removes a destroyed obstacle from the sector.
    RemoveObstacle {
        /// Identifier of the obstacle to remove.
        obstacle: ObstacleId,
    },
}

/// Describes a request to bring a single enemy into the sector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Point the enemy should appear around, usually the player or a spawn point.
    pub origin: Vec2,
    /// Forces the spawned enemy to the provided kind.
    pub kind: Option<EnemyKind>,
    /// Forces the spawned enemy to the provided position.
    pub position: Option<Vec2>,
    /// Marks the spawned enemy as the boss with the provided identity.
    pub boss: Option<BossId>,
}

impl SpawnRequest {
    /// Creates a request for a randomly chosen enemy near `origin`.
    #[must_use]
    pub const fn near(origin: Vec2) -> Self {
        Self {
            origin,
            kind: None,
            position: None,
            boss: None,
        }
    }
}

/// Reasons a spawn request may be rejected by the enemy roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// The sector already holds the maximum number of enemies.
    Budget,
    /// A boss is already alive in the sector.
    BossAlreadyPresent,
    /// The boss with the requested identity was already defeated in this sector.
    BossDefeated,
    /// No unobstructed position could be found near the origin.
    Blocked,
    /// No sector is loaded.
    NoSector,
}

/// Audio cues the simulation asks the audio engine to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// The player completed a stride on the provided surface.
    Footstep {
        /// Surface under the player's feet.
        surface: SurfaceMaterial,
    },
    /// A projectile struck something made of the provided material.
    Impact {
        /// Material that was struck.
        material: SurfaceMaterial,
    },
    /// A weapon discharged.
    WeaponFire {
        /// Weapon that fired.
        weapon: WeaponKind,
    },
    /// The trigger was pulled on an empty weapon.
    EmptyClick {
        /// Weapon that could not fire.
        weapon: WeaponKind,
    },
    /// A reload began.
    ReloadStart {
        /// Weapon being reloaded.
        weapon: WeaponKind,
    },
    /// A reload completed.
    ReloadEnd {
        /// Weapon that finished reloading.
        weapon: WeaponKind,
    },
    /// The player started a roll.
    Roll,
    /// A thrown weapon detonated.
    Explosion,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A sector finished loading.
    SectorLoaded {
        /// Number of obstacles registered in the collision grid.
        obstacles: usize,
        /// Number of spawn points available to hordes.
        spawn_points: usize,
    },
    /// The active sector was torn down.
    SectorTornDown,
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Clamped frame delta that was actually simulated.
        delta: Duration,
        /// Timestamp of the tick.
        now: Duration,
    },
    /// A cue the audio collaborator should play.
    Cue(AudioCue),
    /// A visual node must be attached to the scene.
    NodeAttached {
        /// Node to attach.
        node: VisualNode,
    },
    /// A visual node must be detached from the scene and released.
    NodeDetached {
        /// Node to detach.
        node: VisualNode,
    },
    /// An enemy lost health.
    DamageDealt {
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Health removed from the enemy.
        amount: f32,
        /// Weapon responsible for the damage.
        weapon: Option<WeaponKind>,
    },
    /// An enemy bite connected and awaits absorption by the player controller.
    PlayerHit {
        /// Enemy that bit the player.
        enemy: EnemyId,
        /// Raw damage before invulnerability is considered.
        damage: f32,
    },
    /// The player lost health.
    DamageTaken {
        /// Health removed from the player.
        amount: f32,
        /// Player health after the damage was applied.
        health: f32,
    },
    /// Player health reached zero.
    PlayerDied,
    /// Rushing drained the stamina pool and was cancelled.
    StaminaDepleted,
    /// A roll began.
    RollStarted {
        /// Normalised direction of the roll on the ground plane.
        direction: Vec2,
    },
    /// A rushing or rolling player interrupted an attacking enemy.
    EnemyTackled {
        /// Enemy that was interrupted.
        enemy: EnemyId,
        /// Knockback velocity injected into the enemy.
        impulse: Vec2,
    },
    /// An enemy entered the sector.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Initial position of the enemy.
        position: Vec2,
        /// Boss identity, when the enemy is a boss.
        boss: Option<BossId>,
    },
    /// A spawn request was rejected.
    SpawnRejected {
        /// Specific reason the spawn failed.
        reason: SpawnRejection,
    },
    /// An enemy died.
    EnemyKilled {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Weapon that dealt the killing blow, if any.
        weapon: Option<WeaponKind>,
        /// Position at which the enemy died.
        position: Vec2,
    },
    /// An enemy was removed without dying, e.g. after its transform became corrupt.
    EnemyDespawned {
        /// Identifier of the enemy.
        enemy: EnemyId,
    },
    /// A boss came within sighting range of the player for the first time.
    BossSighted {
        /// Identity of the boss.
        boss: BossId,
    },
    /// A boss was killed.
    BossDefeated {
        /// Identity of the boss.
        boss: BossId,
    },
    /// Score awarded to the player.
    ScoreDelta {
        /// Points awarded.
        points: u32,
    },
    /// A weapon discharged.
    WeaponFired {
        /// Weapon that fired.
        weapon: WeaponKind,
    },
    /// The active weapon changed.
    WeaponSwitched {
        /// Newly active weapon.
        weapon: WeaponKind,
    },
    /// A reload began.
    ReloadStarted {
        /// Weapon being reloaded.
        weapon: WeaponKind,
        /// Timestamp after which the reload completes.
        ready_at: Duration,
    },
    /// A reload completed and refilled the magazine.
    ReloadFinished {
        /// Weapon that was reloaded.
        weapon: WeaponKind,
    },
    /// A projectile or blast damaged a breakable obstacle.
    PropHit {
        /// Obstacle that was struck.
        obstacle: ObstacleId,
        /// Durability removed from the obstacle.
        damage: f32,
    },
    /// An obstacle was removed from the sector.
    ObstacleDestroyed {
        /// Identifier of the removed obstacle.
        obstacle: ObstacleId,
    },
    /// A pickup was dropped into the sector.
    PickupDropped {
        /// Identifier of the pickup.
        pickup: PickupId,
        /// Kind of pickup.
        kind: PickupKind,
        /// Ground position of the pickup.
        position: Vec2,
    },
    /// The player collected a pickup.
    PickupCollected {
        /// Identifier of the pickup.
        pickup: PickupId,
        /// Kind of pickup.
        kind: PickupKind,
    },
}

/// Reports whether every component of the vector is finite.
#[must_use]
pub fn is_finite_vec2(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::{BossId, EnemyId, EnemyKind, SpawnRejection, SpawnRequest};
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&EnemyId::new(42));
        assert_round_trip(&BossId::new(7));
    }

    #[test]
    fn spawn_request_round_trips_through_bincode() {
        let request = SpawnRequest {
            origin: Vec2::new(3.0, -2.0),
            kind: Some(EnemyKind::Brute),
            position: None,
            boss: Some(BossId::new(1)),
        };
        assert_round_trip(&request);
    }

    #[test]
    fn spawn_rejection_round_trips_through_bincode() {
        assert_round_trip(&SpawnRejection::BossAlreadyPresent);
    }

    #[test]
    fn spawn_request_near_leaves_everything_unforced() {
        let request = SpawnRequest::near(Vec2::ONE);
        assert_eq!(request.origin, Vec2::ONE);
        assert!(request.kind.is_none());
        assert!(request.position.is_none());
        assert!(request.boss.is_none());
    }
}
