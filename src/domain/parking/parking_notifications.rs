use crate::domain::schedule::slot::SlotId;
use crate::domain::utils::id::{AgentId, FacilityId};
use crate::domain::utils::observers::ObserverList;

/// Payload of the facility side notifications consumed by feedback layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingNotification {
    pub facility: FacilityId,
    pub agent: AgentId,
    pub slot: SlotId,
}

/// Facility side notifications, one observer list each.
#[derive(Debug)]
pub struct ParkingNotifications {
    /// A waiting or requesting agent received a slot.
    pub parking_dock_assigned: ObserverList<ParkingNotification>,

    /// An agent reached its slot.
    pub parkable_docked: ObserverList<ParkingNotification>,

    /// An agent left its slot.
    pub parkable_undocked: ObserverList<ParkingNotification>,
}

impl ParkingNotifications {
    pub fn new() -> Self {
        Self {
            parking_dock_assigned: ObserverList::new("ParkingDockAssigned"),
            parkable_docked: ObserverList::new("ParkableDocked"),
            parkable_undocked: ObserverList::new("ParkableUndocked"),
        }
    }
}

impl Default for ParkingNotifications {
    fn default() -> Self {
        Self::new()
    }
}
