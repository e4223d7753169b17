pub mod parking_dto;
pub mod scenario_dto;
