#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver for the Ashfall simulation.
//!
//! Loads a sector description from TOML, plays it with a scripted
//! [`Autopilot`] at a fixed frame rate, and reports the outcome.

use std::{fmt, fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use ashfall_core::{Command, Event, SectorContent};
use ashfall_world::{apply, config, dispatch, push_hud, query, SimulationConfig, World};

mod autopilot;
pub mod logging;
mod tally;

pub use autopilot::Autopilot;
pub use tally::{CueCount, SceneCount, Stats, Tally};

/// Parameters of a headless run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of frames to simulate.
    pub ticks: u32,
    /// Wall time of one frame.
    pub frame: Duration,
    /// Skips ammunition accounting.
    pub unlimited_ammo: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            frame: Duration::from_millis(16),
            unlimited_ammo: false,
        }
    }
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Sector that was played.
    pub sector: String,
    /// Frames simulated.
    pub ticks: u32,
    /// Simulated time inside the sector.
    pub elapsed: Duration,
    /// Player health at the end of the run.
    pub health: f32,
    /// Score accumulated by the world.
    pub score: u64,
    /// Enemies still on the field.
    pub enemies_left: usize,
    /// Collaborator-side tally.
    pub tally: Tally,
}

impl Summary {
    /// Whether the player survived the run.
    #[must_use]
    pub fn survived(&self) -> bool {
        self.health > 0.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.tally.stats;
        writeln!(
            f,
            "{}: {} ticks, {:.1}s",
            self.sector,
            self.ticks,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(
            f,
            "  health {:.0} ({})",
            self.health,
            if self.survived() { "alive" } else { "down" }
        )?;
        writeln!(f, "  score {}", self.score)?;
        writeln!(
            f,
            "  kills {} (enemies left {})",
            stats.total_kills(),
            self.enemies_left
        )?;
        for (kind, count) in &stats.kills {
            writeln!(f, "    {kind:?}: {count}")?;
        }
        writeln!(
            f,
            "  damage dealt {:.0}, taken {:.0}",
            stats.damage_dealt, stats.damage_taken
        )?;
        writeln!(
            f,
            "  shots {}, reloads {}, rolls {}, explosions {}",
            self.tally.cues.shots,
            self.tally.cues.reloads,
            self.tally.cues.rolls,
            self.tally.cues.explosions
        )?;
        writeln!(
            f,
            "  pickups {}, bosses sighted {}, defeated {}",
            stats.pickups,
            stats.bosses_sighted.len(),
            stats.bosses_defeated.len()
        )?;
        write!(f, "  peak scene nodes {}", self.tally.scene.peak)
    }
}

/// Reads and validates a sector description.
pub fn load_sector(path: &Path) -> Result<SectorContent> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read sector {}", path.display()))?;
    config::sector_from_toml_str(&source)
        .with_context(|| format!("invalid sector {}", path.display()))
}

/// Reads the simulation configuration, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SimulationConfig::from_toml_str(&source)
        .with_context(|| format!("invalid config {}", path.display()))
}

/// Plays `content` headless with the autopilot and returns the outcome.
pub fn run(config: SimulationConfig, content: SectorContent, options: RunOptions) -> Summary {
    let sector = content.name.clone();
    let mut world = World::new(config);
    let mut tally = Tally::default();
    let mut autopilot = Autopilot::new();
    let mut events: Vec<Event> = Vec::new();

    apply(
        &mut world,
        Command::LoadSector {
            content: Box::new(content),
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SetUnlimitedAmmo {
            enabled: options.unlimited_ammo,
        },
        &mut events,
    );
    dispatch(&events, &mut tally.collaborators());
    log::info!("playing {sector} for {} ticks", options.ticks);

    let mut now = Duration::ZERO;
    let mut ticks = 0;
    while ticks < options.ticks {
        now += options.frame;
        let input = autopilot.input_for(&world);
        events.clear();
        apply(
            &mut world,
            Command::Tick {
                delta: options.frame,
                now,
                input,
            },
            &mut events,
        );
        dispatch(&events, &mut tally.collaborators());
        push_hud(&world, &mut tally);
        ticks += 1;

        if query::player(&world).health <= 0.0 {
            log::warn!("player went down after {ticks} ticks");
            break;
        }
    }

    Summary {
        sector,
        ticks,
        elapsed: query::sector_elapsed(&world),
        health: query::player(&world).health,
        score: query::score(&world),
        enemies_left: query::enemy_view(&world).len(),
        tally,
    }
}
