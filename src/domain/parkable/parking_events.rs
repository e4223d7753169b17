use std::fmt;
use std::rc::Rc;

use crate::domain::utils::id::{AgentId, FacilityId};

/// Phase of the docking sequence of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingPhase {
    Idle,

    /// Moving to the waiting point, not yet admitted to the wait queue.
    WaitingAtApproach,

    /// Queued at the facility, possibly moving along the waiting line.
    WaitingForSlot,

    MovingToEnter,
    MovingToSlot,
    Parked,

    /// Leaving the slot. The slot itself is already released.
    MovingToExit,
}

/// Why a docking sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingEndReason {
    /// The agent left its slot through the exit point.
    Completed,

    /// Cancelled before the agent docked, or force cancelled.
    Cancelled,

    /// A movement leg failed.
    MovementFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParkingEventArgs {
    pub agent: AgentId,
    pub facility: FacilityId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParkingEndedArgs {
    pub agent: AgentId,
    pub facility: FacilityId,
    pub reason: ParkingEndReason,
}

/// Structured receiver of one docking sequence, all methods default to no-ops.
pub trait ParkingEvents {
    fn on_parking_enter(&self, _args: &ParkingEventArgs) {}

    fn on_parking_exit(&self, _args: &ParkingEventArgs) {}

    fn on_parking_ended(&self, _args: &ParkingEndedArgs) {}
}

type EventCallback = Rc<dyn Fn(&ParkingEventArgs)>;
type EndedCallback = Rc<dyn Fn(&ParkingEndedArgs)>;

/// Callbacks registered with one parking request. They are dropped when the
/// sequence ends.
#[derive(Clone, Default)]
pub struct ParkingCallbacks {
    pub(crate) on_enter: Option<EventCallback>,
    pub(crate) on_exit: Option<EventCallback>,
    pub(crate) on_ended: Option<EndedCallback>,
    pub(crate) control: Option<Rc<dyn ParkingEvents>>,
}

impl ParkingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(mut self, callback: impl Fn(&ParkingEventArgs) + 'static) -> Self {
        self.on_enter = Some(Rc::new(callback));
        self
    }

    pub fn on_exit(mut self, callback: impl Fn(&ParkingEventArgs) + 'static) -> Self {
        self.on_exit = Some(Rc::new(callback));
        self
    }

    pub fn on_ended(mut self, callback: impl Fn(&ParkingEndedArgs) + 'static) -> Self {
        self.on_ended = Some(Rc::new(callback));
        self
    }

    pub fn with_control(mut self, control: Rc<dyn ParkingEvents>) -> Self {
        self.control = Some(control);
        self
    }
}

impl fmt::Debug for ParkingCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkingCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .field("control", &self.control.is_some())
            .finish()
    }
}
