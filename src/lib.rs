use std::path::Path;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::simulator::world::SimulationWorld;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads a scenario file and builds the simulation world it describes.
pub fn load_scenario(file_path: impl AsRef<Path>) -> Result<SimulationWorld> {
    let file_path = file_path.as_ref();
    log::info!("Loading scenario from '{}'.", file_path.display());

    let scenario_dto: ScenarioDto = parse_json_file(file_path)?;
    log::info!("Scenario JSON parsed successfully.");

    SimulationWorld::try_from(scenario_dto)
}
