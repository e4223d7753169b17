pub mod job;
pub mod scheduler;
pub mod selection_criteria;
pub mod slot;
