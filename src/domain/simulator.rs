pub mod kinematic_navigation;
pub mod simulator;
pub mod simulator_mock;
pub mod world;
