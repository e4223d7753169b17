use glam::Vec3;
use std::rc::Rc;

use crate::domain::parking::parking_trait::Parking;
use crate::domain::utils::id::FacilityId;

/// A facility cargo is loaded from (source) or unloaded into (storage).
pub trait ResourceWarehouse {
    fn id(&self) -> &FacilityId;

    fn parking(&self) -> Rc<dyn Parking>;

    fn position(&self) -> Vec3;

    /// `true` for player storages that accept cargo.
    fn is_storage(&self) -> bool;
}

/// Cargo handling of a harvesting agent. Loading and unloading happen on the
/// carrier's side while it is docked at its assigned warehouse.
pub trait ResourceCarrier {
    /// `strict` additionally requires free cargo space and a non-exhausted source.
    fn is_able_to_load_cargo_from(&self, warehouse: &dyn ResourceWarehouse, strict: bool) -> bool;

    fn has_any_cargo(&self) -> bool;

    fn assign_warehouse(&self, warehouse: Option<Rc<dyn ResourceWarehouse>>);

    fn nearest_storage(&self) -> Option<Rc<dyn ResourceWarehouse>>;
}
