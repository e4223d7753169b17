pub mod auto_attack;
pub mod cmd_attack;
pub mod cmd_attack_move;
pub mod cmd_build_structure;
pub mod cmd_extract_resource;
pub mod cmd_move;
pub mod command_runner;
pub mod command_trait;
