use std::rc::Rc;

use crate::domain::parking::parking_trait::Parking;
use crate::domain::utils::id::FacilityId;

/// A structure under construction. Its berth is a parking facility.
pub trait Buildable {
    fn id(&self) -> &FacilityId;

    fn parking(&self) -> Rc<dyn Parking>;

    fn is_completed(&self) -> bool;
}

pub trait MobileBuilder {
    /// Starts contributing to `target`. Called once per docking.
    fn setup_build(&self, target: Rc<dyn Buildable>);
}
