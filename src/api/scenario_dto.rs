use serde::{Deserialize, Serialize};

use crate::api::parking_dto::ParkingDto;

fn default_visits() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    /// Seconds per simulation tick.
    pub tick_length: f32,

    /// Upper bound of ticks, can be overridden on the command line.
    pub ticks: u64,

    pub facilities: Vec<FacilityDto>,
    pub agents: Vec<AgentDto>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDto {
    pub id: String,
    pub position: [f32; 3],

    #[serde(default)]
    pub yaw_degrees: f32,

    pub parking: ParkingDto,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDto {
    pub id: String,
    pub position: [f32; 3],
    pub speed: f32,

    /// Id of the facility the agent docks at.
    pub facility: String,

    /// Seconds the agent stays parked per visit.
    pub dwell_time: f32,

    #[serde(default = "default_visits")]
    pub visits: usize,

    pub rally_point: Option<[f32; 3]>,
}
