use glam::Vec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::domain::capability::navigation_trait::Navigation;
use crate::domain::parkable::parking_events::{ParkingCallbacks, ParkingEndReason, ParkingEndedArgs, ParkingEventArgs, ParkingPhase};
use crate::domain::parking::parking_trait::Parking;
use crate::domain::schedule::job::{JobId, JobOwner};
use crate::domain::schedule::slot::{Slot, SlotId};
use crate::domain::utils::id::AgentId;
use crate::domain::utils::observers::{ObserverList, invoke_isolated};

struct ParkableInner {
    phase: ParkingPhase,
    parking: Option<Rc<dyn Parking>>,
    job: Option<JobId>,
    slot: Option<(SlotId, Slot)>,
    callbacks: ParkingCallbacks,

    /// Incremented with every movement this parkable starts or stops. A completion
    /// carrying an older ticket belongs to a superseded movement.
    movement_ticket: u64,
}

/// What a finished sequence leaves behind to be cleaned up outside the borrow.
struct Teardown {
    parking: Option<Rc<dyn Parking>>,
    job: Option<JobId>,
    callbacks: ParkingCallbacks,
}

/// Per-agent docking state machine.
///
/// Drives the agent through wait point, wait queue, enter point, slot and exit point
/// of one [`Parking`] using its [`Navigation`]. Every sequence ends with exactly one
/// `ParkingEnded` notification, whatever phase it is cancelled or fails in.
///
/// The inner state is never borrowed while the parkable calls out to the parking,
/// the navigation or any callback, so all of them may call back in synchronously.
pub struct Parkable {
    agent: AgentId,
    navigation: Rc<dyn Navigation>,
    self_ref: Weak<Parkable>,
    inner: RefCell<ParkableInner>,

    pub parking_slot_enter: ObserverList<ParkingEventArgs>,
    pub parking_slot_exit: ObserverList<ParkingEventArgs>,
    pub parking_ended: ObserverList<ParkingEndedArgs>,
}

impl Parkable {
    pub fn new(agent: AgentId, navigation: Rc<dyn Navigation>) -> Rc<Parkable> {
        Rc::new_cyclic(|self_ref: &Weak<Parkable>| {
            let listener = self_ref.clone();
            navigation.subscribe_destination_changed(Box::new(move || {
                if let Some(parkable) = listener.upgrade() {
                    parkable.on_destination_changed();
                }
            }));

            Parkable {
                agent,
                navigation,
                self_ref: self_ref.clone(),
                inner: RefCell::new(ParkableInner {
                    phase: ParkingPhase::Idle,
                    parking: None,
                    job: None,
                    slot: None,
                    callbacks: ParkingCallbacks::default(),
                    movement_ticket: 0,
                }),
                parking_slot_enter: ObserverList::new("ParkingSlotEnter"),
                parking_slot_exit: ObserverList::new("ParkingSlotExit"),
                parking_ended: ObserverList::new("ParkingEnded"),
            }
        })
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn navigation(&self) -> &Rc<dyn Navigation> {
        &self.navigation
    }

    pub fn phase(&self) -> ParkingPhase {
        self.inner.borrow().phase
    }

    pub fn is_parked(&self) -> bool {
        self.phase() == ParkingPhase::Parked
    }

    pub fn parking(&self) -> Option<Rc<dyn Parking>> {
        self.inner.borrow().parking.clone()
    }

    pub fn job(&self) -> Option<JobId> {
        self.inner.borrow().job
    }

    pub fn assigned_slot(&self) -> Option<(SlotId, Slot)> {
        self.inner.borrow().slot.clone()
    }

    /// Starts a docking sequence at `parking`.
    ///
    /// A sequence still running is force cancelled first. If the agent is too far
    /// away to be admitted it walks to the facility's waiting point before it joins
    /// the wait queue.
    pub fn request_parking_slot(&self, parking: Rc<dyn Parking>, callbacks: ParkingCallbacks) {
        if self.phase() != ParkingPhase::Idle {
            log::debug!("Agent {} requests {} while busy, cancelling the running sequence.", self.agent, parking.id());
            self.force_cancel_parking_request();
        }

        {
            let mut inner = self.inner.borrow_mut();
            inner.parking = Some(parking.clone());
            inner.callbacks = callbacks;
        }

        let position = self.navigation.base_position();
        if parking.can_request_slot(position) {
            self.enter_wait_queue(&parking);
            return;
        }

        let (waiting_point, look_direction) = parking.get_waiting_point(position);
        log::debug!("Agent {} approaches waiting point {} of {}.", self.agent, waiting_point, parking.id());

        self.inner.borrow_mut().phase = ParkingPhase::WaitingAtApproach;
        self.move_to(waiting_point, look_direction);
    }

    /// Docks instantly at the first free slot of `parking`, without any movement.
    ///
    /// # Panics
    /// If `parking` has no free slot.
    pub fn force_parking_slot(&self, parking: Rc<dyn Parking>, callbacks: ParkingCallbacks) {
        if self.phase() != ParkingPhase::Idle {
            self.force_cancel_parking_request();
        }

        let owner: Weak<dyn JobOwner> = self.self_ref.clone();
        let job = parking.create_job(self.agent.clone(), owner);

        {
            let mut inner = self.inner.borrow_mut();
            inner.parking = Some(parking.clone());
            inner.callbacks = callbacks;
            inner.job = Some(job);
            inner.phase = ParkingPhase::WaitingForSlot;
        }

        parking.force_slot(job);
    }

    /// Leaves the facility gracefully.
    ///
    /// A parked agent gives its slot back immediately and ends the sequence once it
    /// reached the exit point. Before docking the sequence ends right away. Calling
    /// this while idle or already leaving does nothing.
    pub fn cancel_parking_request(&self) {
        match self.phase() {
            ParkingPhase::Idle | ParkingPhase::MovingToExit => {
                log::debug!("Agent {} has nothing to cancel.", self.agent);
            }
            ParkingPhase::Parked => self.leave_slot(),
            ParkingPhase::WaitingAtApproach | ParkingPhase::WaitingForSlot | ParkingPhase::MovingToEnter | ParkingPhase::MovingToSlot => {
                self.stop_movement();
                self.finish(ParkingEndReason::Cancelled);
            }
        }
    }

    /// Ends the sequence immediately, without an exit maneuver.
    pub fn force_cancel_parking_request(&self) {
        let phase = self.phase();
        match phase {
            ParkingPhase::Idle => return,
            ParkingPhase::Parked => {
                self.inner.borrow_mut().phase = ParkingPhase::MovingToExit;
                self.notify_exit();
            }
            _ => self.stop_movement(),
        }

        log::debug!("Agent {} force cancels its parking sequence in phase {:?}.", self.agent, phase);
        self.finish(ParkingEndReason::Cancelled);
    }

    fn enter_wait_queue(&self, parking: &Rc<dyn Parking>) {
        let owner: Weak<dyn JobOwner> = self.self_ref.clone();
        let job = parking.create_job(self.agent.clone(), owner);

        {
            let mut inner = self.inner.borrow_mut();
            inner.job = Some(job);
            inner.phase = ParkingPhase::WaitingForSlot;
        }

        parking.request_slot(job);
    }

    fn leave_slot(&self) {
        let exit = {
            let mut inner = self.inner.borrow_mut();
            inner.phase = ParkingPhase::MovingToExit;
            inner.slot.as_ref().map(|(_, slot)| (slot.exit_position(), slot.exit_direction()))
        };

        self.notify_exit();

        match exit {
            Some((position, direction)) => {
                self.move_to(position, direction);
                self.release_job();
            }
            None => {
                log::error!("Agent {} was parked without a slot.", self.agent);
                self.finish(ParkingEndReason::Completed);
            }
        }
    }

    fn dock(&self) {
        let docked = {
            let mut inner = self.inner.borrow_mut();
            inner.phase = ParkingPhase::Parked;
            inner.parking.clone().zip(inner.slot.as_ref().map(|(id, _)| *id))
        };

        if let Some((parking, slot)) = docked {
            log::info!("Agent {} docked at {}.", self.agent, parking.id());
            parking.notify_docked(&self.agent, slot);
        }

        let Some(args) = self.event_args() else {
            return;
        };
        let callbacks = self.inner.borrow().callbacks.clone();

        if let Some(on_enter) = callbacks.on_enter {
            invoke_isolated("ParkingSlotEnter", || on_enter(&args));
        }
        if let Some(control) = callbacks.control {
            invoke_isolated("OnParkingEnter", || control.on_parking_enter(&args));
        }
        self.parking_slot_enter.notify(&args);
    }

    fn notify_exit(&self) {
        let undocked = {
            let inner = self.inner.borrow();
            inner.parking.clone().zip(inner.slot.as_ref().map(|(id, _)| *id))
        };

        let Some(args) = self.event_args() else {
            return;
        };
        let callbacks = self.inner.borrow().callbacks.clone();

        if let Some(on_exit) = callbacks.on_exit {
            invoke_isolated("ParkingSlotExit", || on_exit(&args));
        }
        if let Some(control) = callbacks.control {
            invoke_isolated("OnParkingExit", || control.on_parking_exit(&args));
        }
        self.parking_slot_exit.notify(&args);

        if let Some((parking, slot)) = undocked {
            log::info!("Agent {} undocked from {}.", self.agent, parking.id());
            parking.notify_undocked(&self.agent, slot);
        }
    }

    /// Gives the job back to the scheduler. Safe to call more than once.
    fn release_job(&self) {
        let (parking, job) = {
            let mut inner = self.inner.borrow_mut();
            (inner.parking.clone(), inner.job.take())
        };

        if let (Some(parking), Some(job)) = (parking, job) {
            parking.end_job(job);
        }
    }

    /// Single terminal path of every sequence.
    fn finish(&self, reason: ParkingEndReason) {
        let teardown = {
            let mut inner = self.inner.borrow_mut();
            if inner.parking.is_none() {
                inner.phase = ParkingPhase::Idle;
                return;
            }

            inner.phase = ParkingPhase::Idle;
            inner.slot = None;
            inner.movement_ticket += 1;
            Teardown { parking: inner.parking.take(), job: inner.job.take(), callbacks: std::mem::take(&mut inner.callbacks) }
        };

        let Some(parking) = teardown.parking else {
            return;
        };

        if let Some(job) = teardown.job {
            parking.end_job(job);
        }

        let args = ParkingEndedArgs { agent: self.agent.clone(), facility: parking.id().clone(), reason };
        log::debug!("Agent {} ended parking at {}: {:?}.", self.agent, args.facility, reason);

        if let Some(on_ended) = teardown.callbacks.on_ended {
            invoke_isolated("ParkingEnded", || on_ended(&args));
        }
        if let Some(control) = teardown.callbacks.control {
            invoke_isolated("OnParkingEnded", || control.on_parking_ended(&args));
        }
        self.parking_ended.notify(&args);
    }

    fn event_args(&self) -> Option<ParkingEventArgs> {
        let inner = self.inner.borrow();
        inner.parking.as_ref().map(|parking| ParkingEventArgs { agent: self.agent.clone(), facility: parking.id().clone() })
    }

    fn move_to(&self, position: Vec3, direction: Vec3) {
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            inner.movement_ticket += 1;
            inner.movement_ticket
        };

        self.navigation.prepare_to_move(position, direction);

        let parkable = self.self_ref.clone();
        self.navigation.engage_movement(Box::new(move |successful| {
            if let Some(parkable) = parkable.upgrade() {
                parkable.on_movement_completed(ticket, successful);
            }
        }));
    }

    fn stop_movement(&self) {
        self.inner.borrow_mut().movement_ticket += 1;
        self.navigation.stop_movement();
    }

    fn on_movement_completed(&self, ticket: u64, successful: bool) {
        let (phase, current_ticket) = {
            let inner = self.inner.borrow();
            (inner.phase, inner.movement_ticket)
        };

        if ticket != current_ticket {
            log::trace!("Agent {} ignores completion of a superseded movement.", self.agent);
            return;
        }

        match phase {
            // Repositioning inside the waiting line, the job stays queued either way.
            ParkingPhase::WaitingForSlot => {
                if !successful {
                    log::warn!("Agent {} failed to reach its place in the waiting line.", self.agent);
                }
            }
            ParkingPhase::MovingToExit => self.finish(ParkingEndReason::Completed),
            _ if !successful => {
                log::info!("Agent {} aborts parking, movement failed in phase {:?}.", self.agent, phase);
                self.finish(ParkingEndReason::MovementFailed);
            }
            ParkingPhase::WaitingAtApproach => match self.parking() {
                Some(parking) => self.enter_wait_queue(&parking),
                None => self.finish(ParkingEndReason::Cancelled),
            },
            ParkingPhase::MovingToEnter => {
                let target = self.inner.borrow().slot.as_ref().map(|(_, slot)| (slot.position(), slot.enter_direction()));
                match target {
                    Some((position, direction)) => {
                        self.inner.borrow_mut().phase = ParkingPhase::MovingToSlot;
                        self.move_to(position, direction);
                    }
                    None => self.finish(ParkingEndReason::Cancelled),
                }
            }
            ParkingPhase::MovingToSlot => self.dock(),
            ParkingPhase::Idle | ParkingPhase::Parked => {}
        }
    }

    /// A destination prepared by someone else while parked moves the agent away from its slot.
    ///
    /// Unlike [`Parkable::cancel_parking_request`] this skips the exit leg, so the slot is
    /// released at once and the prepared destination stays untouched.
    fn on_destination_changed(&self) {
        if self.phase() == ParkingPhase::Parked {
            log::info!("Agent {} was ordered away while parked.", self.agent);
            self.force_cancel_parking_request();
        }
    }

    fn owns(&self, job: JobId) -> bool {
        self.inner.borrow().job == Some(job)
    }
}

impl JobOwner for Parkable {
    fn current_position(&self) -> Vec3 {
        self.navigation.base_position()
    }

    fn on_job_slot_assigned(&self, job: JobId, slot_id: SlotId, slot: Slot, forced: bool) {
        if !self.owns(job) || self.phase() != ParkingPhase::WaitingForSlot {
            log::warn!("Agent {} ignores assignment of {:?} to job {:?} in phase {:?}.", self.agent, slot_id, job, self.phase());
            return;
        }

        let enter = (slot.enter_position(), slot.enter_direction());
        self.inner.borrow_mut().slot = Some((slot_id, slot));

        if forced {
            self.dock();
            return;
        }

        self.inner.borrow_mut().phase = ParkingPhase::MovingToEnter;
        self.move_to(enter.0, enter.1);
    }

    fn on_wait_position_changed(&self, job: JobId, position: Vec3, direction: Vec3) {
        if self.owns(job) && self.phase() == ParkingPhase::WaitingForSlot {
            self.move_to(position, direction);
        }
    }

    fn on_parking_force_stopped(&self, job: JobId) {
        if self.owns(job) {
            self.force_cancel_parking_request();
        }
    }
}

impl std::fmt::Debug for Parkable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parkable").field("agent", &self.agent).field("phase", &self.phase()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parking::orbital_parking::{OrbitalParking, OrbitalParkingConfig};
    use crate::domain::simulator::simulator_mock::MockNavigation;
    use crate::domain::utils::geometry::FacilityTransform;
    use crate::domain::utils::id::FacilityId;
    use std::cell::Cell;

    fn orbital(max_slots: usize, assignable_slots: usize) -> Rc<dyn Parking> {
        let config = OrbitalParkingConfig {
            max_slots,
            assignable_slots,
            park_distance: 2.0,
            entrance_distance: 4.0,
            waiting_distance: 8.0,
            entrance_separation_degrees: 10.0,
        };
        Rc::new(OrbitalParking::new(FacilityId::new("Depot"), FacilityTransform::default(), config).expect("valid config"))
    }

    fn agent(name: &str, position: Vec3) -> (Rc<MockNavigation>, Rc<Parkable>) {
        let navigation = MockNavigation::new(position);
        let parkable = Parkable::new(AgentId::new(name), navigation.clone());
        (navigation, parkable)
    }

    fn counting_callbacks(ended: &Rc<Cell<usize>>) -> ParkingCallbacks {
        let ended = ended.clone();
        ParkingCallbacks::new().on_ended(move |_| ended.set(ended.get() + 1))
    }

    #[test]
    fn agent_far_away_walks_to_the_waiting_point_first() {
        let parking = orbital(2, 2);
        let (navigation, parkable) = agent("A", Vec3::new(0.0, 0.0, 40.0));

        parkable.request_parking_slot(parking.clone(), ParkingCallbacks::new());

        assert_eq!(parkable.phase(), ParkingPhase::WaitingAtApproach);
        assert_eq!(parking.base().scheduler().job_count(), 0);
        assert!(navigation.last_destination().is_some_and(|point| point.distance(Vec3::new(0.0, 0.0, 8.0)) < 1e-4));

        navigation.complete(true);

        assert_eq!(parkable.phase(), ParkingPhase::MovingToEnter);
    }

    #[test]
    fn failed_leg_ends_the_sequence_once() {
        let parking = orbital(1, 1);
        let (navigation, parkable) = agent("A", Vec3::new(0.0, 0.0, 6.0));
        let ended = Rc::new(Cell::new(0));

        parkable.request_parking_slot(parking.clone(), counting_callbacks(&ended));
        navigation.complete(false);

        assert_eq!(parkable.phase(), ParkingPhase::Idle);
        assert_eq!(ended.get(), 1);
        assert_eq!(parking.assigned_count(), 0);
        assert!(parkable.parking().is_none());
    }

    #[test]
    fn parked_agent_frees_its_slot_before_it_reached_the_exit() {
        let parking = orbital(1, 1);
        let (navigation, parkable) = agent("A", Vec3::new(0.0, 0.0, 6.0));
        let ended = Rc::new(Cell::new(0));

        parkable.request_parking_slot(parking.clone(), counting_callbacks(&ended));
        navigation.complete(true);
        navigation.complete(true);
        assert!(parkable.is_parked());

        parkable.cancel_parking_request();

        assert_eq!(parkable.phase(), ParkingPhase::MovingToExit);
        assert_eq!(parking.assigned_count(), 0);
        assert_eq!(ended.get(), 0);

        navigation.complete(true);

        assert_eq!(parkable.phase(), ParkingPhase::Idle);
        assert_eq!(ended.get(), 1);
    }

    #[test]
    fn ordering_a_parked_agent_away_force_cancels() {
        let parking = orbital(1, 1);
        let (navigation, parkable) = agent("A", Vec3::new(0.0, 0.0, 6.0));
        let ended = Rc::new(Cell::new(0));
        parkable.force_parking_slot(parking.clone(), counting_callbacks(&ended));

        navigation.prepare_to_move(Vec3::new(30.0, 0.0, 0.0), Vec3::X);

        assert_eq!(parkable.phase(), ParkingPhase::Idle);
        assert_eq!(parking.assigned_count(), 0);
        assert_eq!(ended.get(), 1);
        assert_eq!(navigation.request_count(), 1, "No exit leg is requested");
        assert_eq!(navigation.last_destination(), Some(Vec3::new(30.0, 0.0, 0.0)), "The prepared destination is kept");
    }
}
