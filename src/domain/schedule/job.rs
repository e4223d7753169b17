use glam::Vec3;
use slotmap::new_key_type;
use std::rc::{Rc, Weak};

use crate::domain::schedule::slot::{Slot, SlotId};
use crate::domain::utils::id::AgentId;

new_key_type! {
    pub struct JobId;
}

/// Lifecycle of a claim on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Known to the scheduler, but neither queued nor holding a slot.
    Idle,

    /// Queued in the FIFO wait queue.
    WaitingForSlot,

    /// Holds exactly one slot.
    HasSlotAssigned,
}

/// Receiver of the notifications a job forwards to the agent that owns it.
///
/// The scheduler never calls these itself. The owning parking delivers them once
/// its scheduler is no longer borrowed, so implementations may call straight back
/// into the parking.
pub trait JobOwner {
    /// Current position of the agent, used by slot selection policies.
    fn current_position(&self) -> Vec3;

    fn on_job_slot_assigned(&self, job: JobId, slot_id: SlotId, slot: Slot, forced: bool);

    /// Queue position changed while the job is waiting.
    fn on_wait_position_changed(&self, job: JobId, position: Vec3, direction: Vec3);

    /// The facility stops serving this job (shutdown or disable).
    fn on_parking_force_stopped(&self, job: JobId);
}

/// One agent's claim on a slot.
#[derive(Debug)]
pub struct Job {
    agent: AgentId,
    owner: Weak<dyn JobOwner>,
    pub(crate) state: JobState,
    pub(crate) slot: Option<SlotId>,
    pub(crate) forced: bool,
}

impl Job {
    pub fn new(agent: AgentId, owner: Weak<dyn JobOwner>) -> Self {
        Job { agent, owner, state: JobState::Idle, slot: None, forced: false }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn owner(&self) -> Option<Rc<dyn JobOwner>> {
        self.owner.upgrade()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    /// `true` if the slot was forced onto the job, bypassing queue and geometry.
    pub fn is_forced(&self) -> bool {
        self.forced
    }
}
