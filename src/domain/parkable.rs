pub mod parkable;
pub mod parking_events;
