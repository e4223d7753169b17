use glam::Vec3;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::domain::parking::parking_notifications::{ParkingNotification, ParkingNotifications};
use crate::domain::schedule::job::{Job, JobId, JobOwner, JobState};
use crate::domain::schedule::scheduler::{Scheduler, SchedulerEvent};
use crate::domain::schedule::selection_criteria::SlotSelectionCriteria;
use crate::domain::schedule::slot::{Slot, SlotId};
use crate::domain::utils::geometry::FacilityTransform;
use crate::domain::utils::id::{AgentId, FacilityId};

/// State shared by every parking facility: identity, transform, the one scheduler
/// and the facility side notifications.
#[derive(Debug)]
pub struct ParkingBase {
    id: FacilityId,
    transform: FacilityTransform,
    scheduler: RefCell<Scheduler>,
    pub notifications: ParkingNotifications,
}

impl ParkingBase {
    pub fn new(id: FacilityId, transform: FacilityTransform) -> Self {
        let scheduler = RefCell::new(Scheduler::new(id.clone()));
        ParkingBase { id, transform, scheduler, notifications: ParkingNotifications::new() }
    }

    pub fn id(&self) -> &FacilityId {
        &self.id
    }

    pub fn transform(&self) -> &FacilityTransform {
        &self.transform
    }

    /// Read access for inspection. Must not be held across calls into the parking.
    pub fn scheduler(&self) -> Ref<'_, Scheduler> {
        self.scheduler.borrow()
    }

    pub(crate) fn scheduler_mut(&self) -> RefMut<'_, Scheduler> {
        self.scheduler.borrow_mut()
    }

    pub(crate) fn setup_slots(&self, slots: Vec<Slot>) {
        self.scheduler.borrow_mut().setup_custom_job_slots(slots);
    }
}

/// A docking facility: slot geometry plus admission policy on top of one scheduler.
///
/// Implementors provide the geometry (`get_waiting_point`), the admission gate
/// (`can_request_slot`) and the [`SlotSelectionCriteria`]; everything that touches
/// the scheduler is provided here. Scheduler notifications are delivered only after
/// the scheduler borrow ended, so job owners may re-enter the parking from inside
/// their callbacks.
pub trait Parking: SlotSelectionCriteria {
    fn base(&self) -> &ParkingBase;

    /// The policy object handed to the scheduler, normally `self`.
    fn criteria(&self) -> &dyn SlotSelectionCriteria;

    /// Where an agent at `from_position` idles before it may request a slot.
    ///
    /// # Returns
    /// `(position, look_direction)`.
    fn get_waiting_point(&self, from_position: Vec3) -> (Vec3, Vec3);

    /// Admission gate checked before an agent is allowed into the wait queue.
    fn can_request_slot(&self, base_position: Vec3) -> bool;

    /// Hook run after the wait queue changed.
    fn on_waiting_jobs_changed(&self) {}

    fn id(&self) -> &FacilityId {
        self.base().id()
    }

    fn origin(&self) -> Vec3 {
        self.base().transform().origin()
    }

    fn create_job(&self, agent: AgentId, owner: Weak<dyn JobOwner>) -> JobId {
        self.base().scheduler_mut().create_job(agent, owner)
    }

    fn request_slot(&self, job: JobId) {
        let events = self.base().scheduler_mut().request_run_slot(job, self.criteria());
        self.deliver_scheduler_events(events);
    }

    /// # Panics
    /// If no slot is free.
    fn force_slot(&self, job: JobId) {
        let events = self.base().scheduler_mut().force_slot(job);
        self.deliver_scheduler_events(events);
    }

    fn release_slot(&self, job: JobId) {
        let events = self.base().scheduler_mut().release_run_request(job, self.criteria());
        self.deliver_scheduler_events(events);
    }

    /// Releases whatever the job holds and forgets it.
    fn end_job(&self, job: JobId) {
        let events = self.base().scheduler_mut().remove_job(job, self.criteria());
        self.deliver_scheduler_events(events);
    }

    /// Force-stops every waiting and docked agent. Safe to call without any.
    fn cancel_all_parking_requests(&self) {
        let jobs: Vec<(JobId, Option<Rc<dyn JobOwner>>)> = {
            let scheduler = self.base().scheduler();
            let mut jobs = scheduler.waiting_jobs();
            jobs.extend(scheduler.assigned_jobs().into_iter().map(|(job, _)| job));
            jobs.into_iter().map(|job| (job, scheduler.job(job).and_then(Job::owner))).collect()
        };

        if !jobs.is_empty() {
            log::info!("Facility {} cancels {} parking request(s).", self.id(), jobs.len());
        }

        for (job, owner) in jobs {
            if let Some(owner) = owner {
                owner.on_parking_force_stopped(job);
            }

            let still_active = self.base().scheduler().job(job).is_some_and(|entry| entry.state() != JobState::Idle);
            if still_active {
                self.end_job(job);
            }
        }
    }

    fn notify_docked(&self, agent: &AgentId, slot: SlotId) {
        let notification = ParkingNotification { facility: self.id().clone(), agent: agent.clone(), slot };
        self.base().notifications.parkable_docked.notify(&notification);
    }

    fn notify_undocked(&self, agent: &AgentId, slot: SlotId) {
        let notification = ParkingNotification { facility: self.id().clone(), agent: agent.clone(), slot };
        self.base().notifications.parkable_undocked.notify(&notification);
    }

    fn assigned_count(&self) -> usize {
        self.base().scheduler().assigned_count()
    }

    fn waiting_count(&self) -> usize {
        self.base().scheduler().waiting_count()
    }

    /// Forwards scheduler notifications to job owners and facility observers.
    ///
    /// An assignment that a re-entrant call already revoked is dropped.
    fn deliver_scheduler_events(&self, events: Vec<SchedulerEvent>) {
        for event in events {
            match event {
                SchedulerEvent::SlotAssigned { job, slot, forced } => {
                    let delivery = {
                        let scheduler = self.base().scheduler();
                        if scheduler.slot_of(job) != Some(slot) {
                            None
                        } else {
                            scheduler
                                .job(job)
                                .zip(scheduler.slot(slot))
                                .map(|(entry, slot_data)| (entry.owner(), entry.agent().clone(), slot_data.clone()))
                        }
                    };

                    let Some((owner, agent, slot_data)) = delivery else {
                        log::debug!("Facility {} dropped stale assignment of {:?} for {:?}.", self.id(), slot, job);
                        continue;
                    };

                    let notification = ParkingNotification { facility: self.id().clone(), agent: agent.clone(), slot };
                    self.base().notifications.parking_dock_assigned.notify(&notification);

                    match owner {
                        Some(owner) => owner.on_job_slot_assigned(job, slot, slot_data, forced),
                        None => {
                            log::warn!("Owner of job {:?} (agent {}) at facility {} is gone, releasing its slot.", job, agent, self.id());
                            self.end_job(job);
                        }
                    }
                }
                SchedulerEvent::WaitingJobsChanged => self.on_waiting_jobs_changed(),
            }
        }
    }
}
