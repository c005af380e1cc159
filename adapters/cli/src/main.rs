//! Command-line entry point for headless Horde runs.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use horde_cli::{ScenarioConfig, Session};
use tracing_subscriber::EnvFilter;

/// Runs a Horde scenario headlessly and prints a JSON report.
#[derive(Debug, Parser)]
#[command(name = "horde", author, version, about, long_about = None)]
struct Args {
    /// Scenario file in TOML. The built-in scenario is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the number of ticks to simulate.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Overrides the random seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Writes the report to this file instead of stdout.
    #[arg(short, long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    let ticks = config.simulation.ticks;
    let report = Session::new(&config)?.run(ticks);
    let json = report.to_json().context("failed to serialise run report")?;

    match &args.report {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
