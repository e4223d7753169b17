pub mod orbital_parking;
pub mod parking_notifications;
pub mod parking_trait;
pub mod queued_wait_parking;
