use serde::{Deserialize, Serialize};

fn default_entrance_separation_degrees() -> f32 {
    10.0
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalParkingDto {
    pub max_slots: usize,
    pub assignable_slots: usize,
    pub park_distance: f32,
    pub entrance_distance: f32,
    pub waiting_distance: f32,

    #[serde(default = "default_entrance_separation_degrees")]
    pub entrance_separation_degrees: f32,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedWaitParkingDto {
    pub slot_position: [f32; 3],
    pub enter_offset: [f32; 3],
    pub exit_offset: [f32; 3],
    pub wait_direction: [f32; 3],
    pub units_separation: f32,
    pub waiting_distance: f32,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(tag = "typ")]
pub enum ParkingDto {
    Orbital(OrbitalParkingDto),
    QueuedWait(QueuedWaitParkingDto),
}
