use glam::Vec3;
use slotmap::new_key_type;

use crate::domain::utils::geometry::{FacilityTransform, planar_direction};

new_key_type! {
    pub struct SlotId;
}

/// A positionally fixed docking place of a facility that exactly one agent may occupy.
///
/// All vectors are local to the owning facility. World space positions are derived
/// from the shared [`FacilityTransform`] on every call and never cached.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Transform of the facility this slot belongs to.
    transform: FacilityTransform,

    /// Docking point relative to the facility origin.
    local_position: Vec3,

    /// Point the agent has to pass before it may move onto the slot.
    enter_offset: Vec3,

    /// Point the agent heads to after leaving the slot.
    exit_offset: Vec3,
}

impl Slot {
    pub fn new(transform: FacilityTransform, local_position: Vec3, enter_offset: Vec3, exit_offset: Vec3) -> Self {
        Slot { transform, local_position, enter_offset, exit_offset }
    }

    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    pub fn position(&self) -> Vec3 {
        self.transform.transform_point(self.local_position)
    }

    pub fn enter_position(&self) -> Vec3 {
        self.transform.transform_point(self.enter_offset)
    }

    pub fn exit_position(&self) -> Vec3 {
        self.transform.transform_point(self.exit_offset)
    }

    /// Facing while driving from the entrance onto the slot.
    pub fn enter_direction(&self) -> Vec3 {
        planar_direction(self.enter_position(), self.position())
    }

    /// Facing while driving from the slot to the exit.
    pub fn exit_direction(&self) -> Vec3 {
        planar_direction(self.position(), self.exit_position())
    }
}
