//! Simulation settings and sector manifests loaded from TOML.

use std::time::Duration;

use ashfall_core::{SectorContent, WeaponBehavior};
use ashfall_system_combat::CombatTuning;
use ashfall_system_enemy_ai::AiTuning;
use ashfall_system_movement::MovementTuning;
use ashfall_system_particles::DEFAULT_SPAWN_BUDGET;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while reading configuration or sector content.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the expected shape.
    #[error("malformed document: {0}")]
    Parse(#[from] toml::de::Error),
    /// A horde refers to a spawn point the sector does not define.
    #[error("horde {horde} refers to spawn point {spawn_point}, but the sector defines {available}")]
    UnknownSpawnPoint {
        /// Index of the horde in the sector's schedule.
        horde: usize,
        /// Spawn point the horde asked for.
        spawn_point: usize,
        /// Number of spawn points the sector defines.
        available: usize,
    },
    /// A position, extent or tuning value is NaN or infinite.
    #[error("{0} is not a finite value")]
    NonFinite(&'static str),
    /// The loadout carries no weapons or carries the same weapon twice.
    #[error("invalid loadout: {0}")]
    Loadout(&'static str),
}

/// Settings that apply to every sector of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound applied to each frame delta before any system sees it.
    #[serde(with = "ashfall_core::seconds")]
    pub max_delta: Duration,
    /// Edge length of a collision grid cell.
    pub cell_size: f32,
    /// Resolver passes per movement sub-step.
    pub resolver_passes: usize,
    /// Interval of the pickup and boss sighting pass.
    #[serde(with = "ashfall_core::seconds")]
    pub interaction_interval: Duration,
    /// Distance at which the player collects a pickup.
    pub pickup_radius: f32,
    /// Health restored by a health pickup.
    pub health_pickup: f32,
    /// Maximum particles materialised per tick.
    pub particle_budget: usize,
    /// Particle slots allocated when the world is created.
    pub particle_prewarm: usize,
    /// Seed of every random stream in the simulation.
    pub seed: u64,
    /// Player movement tuning.
    pub movement: MovementTuning,
    /// Enemy spawning and AI tuning. Carries the enemy budget.
    pub ai: AiTuning,
    /// Weapon system tuning.
    pub combat: CombatTuning,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_delta: Duration::from_millis(100),
            cell_size: 4.0,
            resolver_passes: 4,
            interaction_interval: Duration::from_millis(100),
            pickup_radius: 1.2,
            health_pickup: 25.0,
            particle_budget: DEFAULT_SPAWN_BUDGET,
            particle_prewarm: 64,
            seed: 0x5eed_a5f1,
            movement: MovementTuning::default(),
            ai: AiTuning::default(),
            combat: CombatTuning::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses settings from a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        if !config.cell_size.is_finite() || !config.pickup_radius.is_finite() {
            return Err(ConfigError::NonFinite("grid or pickup radius"));
        }
        Ok(config)
    }
}

/// Parses and validates a sector manifest.
pub fn sector_from_toml_str(source: &str) -> Result<SectorContent, ConfigError> {
    let content: SectorContent = toml::from_str(source)?;
    validate_sector(&content)?;
    Ok(content)
}

/// Checks the invariants a sector must hold before it can load.
pub fn validate_sector(content: &SectorContent) -> Result<(), ConfigError> {
    if !content.player_spawn.is_finite() {
        return Err(ConfigError::NonFinite("player spawn"));
    }
    if content.spawn_points.iter().any(|point| !point.is_finite()) {
        return Err(ConfigError::NonFinite("spawn point"));
    }
    for obstacle in &content.obstacles {
        let extent = obstacle.shape.bounding_half_extents();
        if !obstacle.position.is_finite() || !extent.is_finite() {
            return Err(ConfigError::NonFinite("obstacle"));
        }
    }
    if let Some(boss) = &content.boss {
        if !boss.position.is_finite() {
            return Err(ConfigError::NonFinite("boss position"));
        }
    }

    let available = content.spawn_points.len();
    for (horde, spec) in content.hordes.iter().enumerate() {
        if spec.spawn_point >= available {
            return Err(ConfigError::UnknownSpawnPoint {
                horde,
                spawn_point: spec.spawn_point,
                available,
            });
        }
    }

    let weapons = &content.loadout.weapons;
    if weapons.is_empty() {
        return Err(ConfigError::Loadout("no weapons"));
    }
    for (index, weapon) in weapons.iter().enumerate() {
        if weapons[..index].iter().any(|other| other.kind == weapon.kind) {
            return Err(ConfigError::Loadout("duplicate weapon"));
        }
        let finite = match weapon.behavior {
            WeaponBehavior::Projectile { spread, speed, .. } => spread.is_finite() && speed.is_finite(),
            WeaponBehavior::Continuous { range, half_width } => {
                range.is_finite() && half_width.is_finite()
            }
            WeaponBehavior::Throwable {
                min_distance,
                max_distance,
                blast_radius,
                ..
            } => min_distance.is_finite() && max_distance.is_finite() && blast_radius.is_finite(),
        };
        if !finite || !weapon.damage.is_finite() {
            return Err(ConfigError::NonFinite("weapon tuning"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn nested_tuning_overrides_merge_with_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            max_delta = 0.05
            seed = 7

            [ai]
            max_enemies = 12

            [movement]
            walk_speed = 6.0
            "#,
        )
        .expect("config parses");

        assert_eq!(config.max_delta, Duration::from_millis(50));
        assert_eq!(config.seed, 7);
        assert_eq!(config.ai.max_enemies, 12);
        assert_eq!(config.movement.walk_speed, 6.0);
        assert_eq!(config.movement.roll_cost, MovementTuning::default().roll_cost);
        assert_eq!(config.resolver_passes, 4);
    }

    #[test]
    fn hordes_must_target_existing_spawn_points() {
        let error = sector_from_toml_str(
            r#"
            name = "yard"
            player_spawn = [0.0, 0.0]
            spawn_points = [[5.0, 5.0]]

            [[hordes]]
            spawn_point = 3
            count = 4
            at = 1.0
            "#,
        )
        .expect_err("horde points past the spawn list");

        assert!(matches!(
            error,
            ConfigError::UnknownSpawnPoint {
                horde: 0,
                spawn_point: 3,
                available: 1,
            }
        ));
    }

    #[test]
    fn malformed_documents_are_reported() {
        let error = sector_from_toml_str("name = ").expect_err("broken toml");
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().starts_with("malformed document"));
    }

    #[test]
    fn empty_loadouts_are_rejected() {
        let error = sector_from_toml_str(
            r#"
            name = "bare"
            player_spawn = [0.0, 0.0]

            [loadout]
            weapons = []
            "#,
        )
        .expect_err("no weapons");
        assert!(matches!(error, ConfigError::Loadout(_)));
    }
}
