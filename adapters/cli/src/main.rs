#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line entry point that plays an Ashfall sector headless.

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use ashfall_cli::{load_config, load_sector, logging, run, RunOptions};
use clap::Parser;

/// Plays a sector with the scripted autopilot and prints a summary.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sector description in TOML.
    sector: PathBuf,
    /// Simulation configuration in TOML.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    ticks: u32,
    /// Frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Never run out of ammunition.
    #[arg(long)]
    unlimited_ammo: bool,
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    ensure!(args.frame_ms > 0, "frame length must be positive");

    let config = load_config(args.config.as_deref())?;
    let content = load_sector(&args.sector)?;
    let summary = run(
        config,
        content,
        RunOptions {
            ticks: args.ticks,
            frame: Duration::from_millis(args.frame_ms),
            unlimited_ammo: args.unlimited_ammo,
        },
    );
    println!("{summary}");
    Ok(())
}
