use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use rts_docking::{load_scenario, logger};

/// Runs a docking scenario headless and prints its report.
#[derive(Debug, Parser)]
#[command(name = "rts-docking", version, about)]
struct Cli {
    /// Scenario JSON file.
    #[arg(short, long, default_value = "data/scenario.json")]
    scenario: PathBuf,

    /// Overrides the tick limit of the scenario.
    #[arg(short, long)]
    ticks: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init();
    log::info!("Logger initialized. Starting scenario run.");

    let mut world = load_scenario(&cli.scenario).with_context(|| format!("failed to load scenario {}", cli.scenario.display()))?;
    let ticks = cli.ticks.unwrap_or(world.default_ticks());

    let report = world.run(ticks);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.consistent {
        anyhow::bail!("scheduler invariants were violated during the run");
    }
    Ok(())
}
