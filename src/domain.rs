pub mod capability;
pub mod command;
pub mod parkable;
pub mod parking;
pub mod schedule;
pub mod simulator;
pub mod utils;
