//! Static catalogues describing enemies, weapons, effects and pickups.
//!
//! Enemy and effect parameters are compiled in. Weapon tuning arrives with the
//! sector content as a [`Loadout`] so designers can rebalance a sector without
//! touching the simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kinds of enemies that roam a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Slow, common infected.
    Walker,
    /// Fast, fragile infected.
    Runner,
    /// Heavy infected that shrugs off knockback.
    Brute,
    /// Boss-class infected. Only ever spawned through boss requests.
    Matriarch,
}

/// Tuning parameters shared by every enemy of a kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Health at spawn, before scaling.
    pub health: f32,
    /// Locomotion speed while chasing, in units per second.
    pub speed: f32,
    /// Collision radius at scale `1.0`.
    pub radius: f32,
    /// Mass at scale `1.0`. Mass grows with the cube of the scale.
    pub base_mass: f32,
    /// Smallest and largest scale rolled at spawn.
    pub scale_range: (f32, f32),
    /// Distance at which the enemy notices the player.
    pub aggro_range: f32,
    /// Distance, measured between collision surfaces, at which the enemy may bite.
    pub strike_range: f32,
    /// Damage dealt by a connecting bite.
    pub bite_damage: f32,
    /// Time between entering the attack and the bite connecting.
    pub bite_windup: Duration,
    /// Minimum time between two bites.
    pub bite_cooldown: Duration,
    /// Points awarded when the enemy dies.
    pub score: u32,
    /// Probability in `[0, 1]` that the enemy drops a pickup on death.
    pub loot_chance: f32,
}

impl EnemyKind {
    /// Kinds that may be chosen when a spawn request does not force one.
    pub const RANDOM_POOL: [Self; 3] = [Self::Walker, Self::Runner, Self::Brute];

    /// Returns the compiled tuning for the enemy kind.
    #[must_use]
    pub const fn profile(self) -> EnemyProfile {
        match self {
            Self::Walker => EnemyProfile {
                health: 60.0,
                speed: 1.6,
                radius: 0.45,
                base_mass: 70.0,
                scale_range: (0.9, 1.1),
                aggro_range: 18.0,
                strike_range: 0.6,
                bite_damage: 12.0,
                bite_windup: Duration::from_millis(450),
                bite_cooldown: Duration::from_millis(1_200),
                score: 10,
                loot_chance: 0.2,
            },
            Self::Runner => EnemyProfile {
                health: 35.0,
                speed: 4.2,
                radius: 0.4,
                base_mass: 55.0,
                scale_range: (0.85, 1.0),
                aggro_range: 24.0,
                strike_range: 0.5,
                bite_damage: 8.0,
                bite_windup: Duration::from_millis(250),
                bite_cooldown: Duration::from_millis(800),
                score: 15,
                loot_chance: 0.15,
            },
            Self::Brute => EnemyProfile {
                health: 220.0,
                speed: 1.2,
                radius: 0.7,
                base_mass: 160.0,
                scale_range: (1.0, 1.25),
                aggro_range: 16.0,
                strike_range: 0.8,
                bite_damage: 25.0,
                bite_windup: Duration::from_millis(700),
                bite_cooldown: Duration::from_millis(1_600),
                score: 40,
                loot_chance: 0.5,
            },
            Self::Matriarch => EnemyProfile {
                health: 1_500.0,
                speed: 2.0,
                radius: 1.2,
                base_mass: 600.0,
                scale_range: (1.0, 1.0),
                aggro_range: 40.0,
                strike_range: 1.2,
                bite_damage: 40.0,
                bite_windup: Duration::from_millis(800),
                bite_cooldown: Duration::from_millis(1_400),
                score: 500,
                loot_chance: 1.0,
            },
        }
    }
}

/// Kinds of weapons the player may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Semi-automatic sidearm.
    Pistol,
    /// Pump shotgun firing a spread of pellets.
    Shotgun,
    /// Automatic rifle.
    Rifle,
    /// Continuous stream of fire consuming fuel while held.
    Flamethrower,
    /// Thrown explosive charged by holding fire.
    Grenade,
}

/// Behaviour variant selecting how a weapon turns input into damage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponBehavior {
    /// Discrete, fire-rate-limited shots of travelling projectiles.
    Projectile {
        /// Projectiles launched per shot.
        pellets: u8,
        /// Total cone angle, in radians, the pellets scatter over.
        spread: f32,
        /// Projectile speed in units per second.
        speed: f32,
        /// Lifetime after which an unspent projectile disappears.
        #[serde(with = "crate::seconds")]
        lifetime: Duration,
        /// Stun applied to a struck enemy, if any.
        #[serde(default, with = "optional_seconds")]
        stagger: Option<Duration>,
    },
    /// Beam or stream that consumes one unit of ammo per `fire_rate` while held.
    Continuous {
        /// Reach of the beam.
        range: f32,
        /// Half-width of the beam used when testing enemies.
        half_width: f32,
    },
    /// Charge-on-hold, commit-on-release explosive.
    Throwable {
        /// Throw distance at zero charge.
        min_distance: f32,
        /// Throw distance at full charge.
        max_distance: f32,
        /// Hold duration that reaches full charge.
        #[serde(with = "crate::seconds")]
        max_charge: Duration,
        /// Radius of the explosion.
        blast_radius: f32,
        /// Time after release at which the charge detonates regardless of contact.
        #[serde(with = "crate::seconds")]
        fuse: Duration,
    },
}

mod optional_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(|duration| duration.as_secs_f64()).serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<f64>::deserialize(deserializer)?;
        raw.map(|seconds| {
            Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// Tuning entry for a single weapon in a loadout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponTuning {
    /// Weapon the entry describes.
    pub kind: WeaponKind,
    /// How the weapon fires.
    pub behavior: WeaponBehavior,
    /// Damage per projectile, per beam pulse, or at the centre of a blast.
    pub damage: f32,
    /// Minimum time between two shots or beam pulses.
    #[serde(with = "crate::seconds")]
    pub fire_rate: Duration,
    /// Magazine size, or carried charges for throwables.
    pub magazine: u32,
    /// Time a reload takes. Ignored by throwables, which never reload.
    #[serde(with = "crate::seconds")]
    pub reload_time: Duration,
    /// Effect spawned where the weapon hits.
    pub impact: EffectKind,
}

impl WeaponTuning {
    /// Reports whether the weapon refills through reloading.
    #[must_use]
    pub const fn reloads(&self) -> bool {
        !matches!(self.behavior, WeaponBehavior::Throwable { .. })
    }

    /// Compiled default tuning for the weapon kind.
    #[must_use]
    pub const fn standard(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Pistol => Self {
                kind,
                behavior: WeaponBehavior::Projectile {
                    pellets: 1,
                    spread: 0.02,
                    speed: 60.0,
                    lifetime: Duration::from_millis(800),
                    stagger: None,
                },
                damage: 18.0,
                fire_rate: Duration::from_millis(250),
                magazine: 12,
                reload_time: Duration::from_millis(1_200),
                impact: EffectKind::Spark,
            },
            WeaponKind::Shotgun => Self {
                kind,
                behavior: WeaponBehavior::Projectile {
                    pellets: 8,
                    spread: 0.35,
                    speed: 45.0,
                    lifetime: Duration::from_millis(400),
                    stagger: Some(Duration::from_millis(350)),
                },
                damage: 9.0,
                fire_rate: Duration::from_millis(800),
                magazine: 6,
                reload_time: Duration::from_millis(2_000),
                impact: EffectKind::Spark,
            },
            WeaponKind::Rifle => Self {
                kind,
                behavior: WeaponBehavior::Projectile {
                    pellets: 1,
                    spread: 0.05,
                    speed: 80.0,
                    lifetime: Duration::from_millis(900),
                    stagger: None,
                },
                damage: 14.0,
                fire_rate: Duration::from_millis(100),
                magazine: 30,
                reload_time: Duration::from_millis(1_800),
                impact: EffectKind::Spark,
            },
            WeaponKind::Flamethrower => Self {
                kind,
                behavior: WeaponBehavior::Continuous {
                    range: 6.0,
                    half_width: 0.6,
                },
                damage: 4.0,
                fire_rate: Duration::from_millis(50),
                magazine: 100,
                reload_time: Duration::from_millis(2_500),
                impact: EffectKind::Ember,
            },
            WeaponKind::Grenade => Self {
                kind,
                behavior: WeaponBehavior::Throwable {
                    min_distance: 4.0,
                    max_distance: 18.0,
                    max_charge: Duration::from_millis(1_200),
                    blast_radius: 4.0,
                    fuse: Duration::from_millis(2_500),
                },
                damage: 120.0,
                fire_rate: Duration::from_millis(600),
                magazine: 3,
                reload_time: Duration::ZERO,
                impact: EffectKind::Debris,
            },
        }
    }
}

/// Weapon tuning table read from the sector content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    /// Weapons the player carries, in selection order. The first entry is equipped at spawn.
    pub weapons: Vec<WeaponTuning>,
}

impl Loadout {
    /// Loadout carrying every weapon with compiled tuning.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            weapons: [
                WeaponKind::Pistol,
                WeaponKind::Shotgun,
                WeaponKind::Rifle,
                WeaponKind::Flamethrower,
                WeaponKind::Grenade,
            ]
            .into_iter()
            .map(WeaponTuning::standard)
            .collect(),
        }
    }

    /// Looks up the tuning for a weapon the loadout carries.
    #[must_use]
    pub fn get(&self, kind: WeaponKind) -> Option<&WeaponTuning> {
        self.weapons.iter().find(|tuning| tuning.kind == kind)
    }

    /// Weapon equipped when the player spawns.
    #[must_use]
    pub fn primary(&self) -> Option<WeaponKind> {
        self.weapons.first().map(|tuning| tuning.kind)
    }
}

impl Default for Loadout {
    fn default() -> Self {
        Self::standard()
    }
}

/// What a falling particle does once it reaches the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landing {
    /// The slot returns to the pool immediately.
    Release,
    /// The particle stops integrating and rests until its life runs out.
    Settle,
    /// The particle turns into a decal of the provided kind.
    Decal(EffectKind),
}

/// Transient visual effect types managed by the particle pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Bright fragment thrown off by bullet impacts.
    Spark,
    /// Droplet that leaves a blood pool where it lands.
    Blood,
    /// Physical chunk that settles on the ground.
    Debris,
    /// Burning fragment that leaves a scorch mark.
    Ember,
    /// Short-lived flash at a weapon's muzzle.
    MuzzleFlash,
    /// Rising, fading smoke puff.
    Smoke,
    /// Fading blood decal on the ground.
    BloodPool,
    /// Fading scorch decal on the ground.
    Scorch,
}

impl EffectKind {
    /// Every effect kind, ordered by [`EffectKind::index`].
    pub const ALL: [Self; 8] = [
        Self::Spark,
        Self::Blood,
        Self::Debris,
        Self::Ember,
        Self::MuzzleFlash,
        Self::Smoke,
        Self::BloodPool,
        Self::Scorch,
    ];

    /// Number of effect kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used for per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Spark => 0,
            Self::Blood => 1,
            Self::Debris => 2,
            Self::Ember => 3,
            Self::MuzzleFlash => 4,
            Self::Smoke => 5,
            Self::BloodPool => 6,
            Self::Scorch => 7,
        }
    }

    /// Life, in seconds, a freshly spawned effect starts with.
    #[must_use]
    pub const fn max_life(self) -> f32 {
        match self {
            Self::Spark => 0.4,
            Self::Blood => 1.5,
            Self::Debris => 4.0,
            Self::Ember => 1.2,
            Self::MuzzleFlash => 0.06,
            Self::Smoke => 1.6,
            Self::BloodPool => 12.0,
            Self::Scorch => 15.0,
        }
    }

    /// Life removed per simulated second.
    #[must_use]
    pub const fn decay_rate(self) -> f32 {
        match self {
            Self::Smoke | Self::Ember => 1.2,
            _ => 1.0,
        }
    }

    /// Reports whether the effect integrates gravity until it lands.
    #[must_use]
    pub const fn falls(self) -> bool {
        matches!(self, Self::Spark | Self::Blood | Self::Debris | Self::Ember)
    }

    /// What the effect does when it reaches the ground.
    #[must_use]
    pub const fn landing(self) -> Landing {
        match self {
            Self::Blood => Landing::Decal(Self::BloodPool),
            Self::Ember => Landing::Decal(Self::Scorch),
            Self::Debris => Landing::Settle,
            _ => Landing::Release,
        }
    }

    /// Reports whether the effect is drawn through the instanced path.
    #[must_use]
    pub const fn instanced(self) -> bool {
        matches!(self, Self::Spark | Self::Blood | Self::Debris | Self::Ember)
    }

    /// Reports whether each effect needs its own fading or tinted material instance.
    #[must_use]
    pub const fn needs_material(self) -> bool {
        matches!(
            self,
            Self::MuzzleFlash | Self::Smoke | Self::BloodPool | Self::Scorch
        )
    }
}

/// Kinds of pickups dropped by enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    /// Restores a fixed amount of health.
    Health,
    /// Adds a charge to the throwable weapon.
    ThrowableCharge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_indices_are_dense() {
        for (position, kind) in EffectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn falling_effects_either_release_settle_or_become_decals() {
        assert_eq!(EffectKind::Blood.landing(), Landing::Decal(EffectKind::BloodPool));
        assert_eq!(EffectKind::Ember.landing(), Landing::Decal(EffectKind::Scorch));
        assert_eq!(EffectKind::Debris.landing(), Landing::Settle);
        assert_eq!(EffectKind::Spark.landing(), Landing::Release);
    }

    #[test]
    fn decals_own_material_instances() {
        assert!(EffectKind::BloodPool.needs_material());
        assert!(EffectKind::Scorch.needs_material());
        assert!(!EffectKind::Spark.needs_material());
    }

    #[test]
    fn throwables_never_reload() {
        assert!(!WeaponTuning::standard(WeaponKind::Grenade).reloads());
        assert!(WeaponTuning::standard(WeaponKind::Pistol).reloads());
    }

    #[test]
    fn standard_loadout_equips_pistol_first() {
        let loadout = Loadout::standard();
        assert_eq!(loadout.primary(), Some(WeaponKind::Pistol));
        assert!(loadout.get(WeaponKind::Grenade).is_some());
    }

    #[test]
    fn matriarch_is_not_rolled_randomly() {
        assert!(!EnemyKind::RANDOM_POOL.contains(&EnemyKind::Matriarch));
    }

    #[test]
    fn weapon_tuning_parses_from_toml() {
        let tuning: WeaponTuning = toml::from_str(
            r#"
            kind = "shotgun"
            damage = 9.0
            fire_rate = 0.75
            magazine = 6
            reload_time = 2.0
            impact = "spark"

            [behavior.projectile]
            pellets = 8
            spread = 0.35
            speed = 45.0
            lifetime = 0.4
            stagger = 0.25
            "#,
        )
        .expect("tuning parses");

        assert_eq!(tuning.kind, WeaponKind::Shotgun);
        assert_eq!(tuning.fire_rate, Duration::from_millis(750));
        match tuning.behavior {
            WeaponBehavior::Projectile { pellets, stagger, .. } => {
                assert_eq!(pellets, 8);
                assert_eq!(stagger, Some(Duration::from_millis(250)));
            }
            other => panic!("unexpected behavior {other:?}"),
        }
    }
}
