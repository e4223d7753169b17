pub mod build_trait;
pub mod combat_trait;
pub mod navigation_trait;
pub mod resource_trait;
