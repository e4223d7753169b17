use bimap::BiMap;
use slotmap::SlotMap;
use std::collections::{HashSet, VecDeque};
use std::rc::Weak;

use crate::domain::schedule::job::{Job, JobId, JobOwner, JobState};
use crate::domain::schedule::selection_criteria::{SchedulerCounts, SlotSelectionCriteria};
use crate::domain::schedule::slot::{Slot, SlotId};
use crate::domain::utils::id::{AgentId, FacilityId};

/// Notification produced by a scheduler entry point.
///
/// The scheduler returns these instead of calling job owners, so the caller can
/// deliver them after it released every borrow of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    SlotAssigned { job: JobId, slot: SlotId, forced: bool },

    /// The wait queue changed; waiting agents may have to be repositioned.
    WaitingJobsChanged,
}

/// Arbitrates a fixed pool of slots among competing jobs.
///
/// Admission is strict FIFO through the wait queue, the pluggable
/// [`SlotSelectionCriteria`] only decides which free slot the next job receives.
/// The assignment map is a bijection, so one slot can never be held by two jobs.
#[derive(Debug)]
pub struct Scheduler {
    facility: FacilityId,

    /// The slot pool.
    slots: SlotMap<SlotId, Slot>,

    /// Pool order, used whenever free slots are listed.
    slot_order: Vec<SlotId>,

    /// Every job created for this facility and not yet removed.
    jobs: SlotMap<JobId, Job>,

    wait_queue: VecDeque<JobId>,

    assigned: BiMap<JobId, SlotId>,
}

impl Scheduler {
    pub fn new(facility: FacilityId) -> Self {
        Scheduler {
            facility,
            slots: SlotMap::with_key(),
            slot_order: Vec::new(),
            jobs: SlotMap::with_key(),
            wait_queue: VecDeque::new(),
            assigned: BiMap::new(),
        }
    }

    pub fn facility(&self) -> &FacilityId {
        &self.facility
    }

    /// Replaces the slot pool. Only valid while no slot is assigned.
    pub fn setup_custom_job_slots(&mut self, slots: Vec<Slot>) {
        assert!(
            self.assigned.is_empty(),
            "Scheduler of facility {} cannot replace its slot pool while {} slot(s) are assigned.",
            self.facility,
            self.assigned.len()
        );

        self.slots.clear();
        self.slot_order.clear();

        for slot in slots {
            let id = self.slots.insert(slot);
            self.slot_order.push(id);
        }

        log::debug!("Facility {} set up {} slot(s).", self.facility, self.slot_order.len());
    }

    pub fn create_job(&mut self, agent: AgentId, owner: Weak<dyn JobOwner>) -> JobId {
        let job = self.jobs.insert(Job::new(agent, owner));
        log::debug!("Facility {} created job {:?}.", self.facility, job);
        job
    }

    /// Releases the job if necessary and forgets it.
    pub fn remove_job(&mut self, job: JobId, criteria: &dyn SlotSelectionCriteria) -> Vec<SchedulerEvent> {
        let events = self.release_run_request(job, criteria);
        self.jobs.remove(job);
        events
    }

    /// Assigns a slot right away if the queue is empty and the policy allows it,
    /// otherwise appends the job to the wait queue.
    ///
    /// Requesting for a job that already waits or holds a slot is a no-op.
    pub fn request_run_slot(&mut self, job: JobId, criteria: &dyn SlotSelectionCriteria) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        match self.jobs.get(job) {
            Some(entry) if entry.state != JobState::Idle => {
                log::debug!("Job {:?} at facility {} already requested a slot ({:?}).", job, self.facility, entry.state);
                return events;
            }
            Some(_) => {}
            None => {
                log::warn!("Slot request of unknown job {:?} at facility {} ignored.", job, self.facility);
                return events;
            }
        }

        if self.wait_queue.is_empty() {
            if let Some(slot) = self.select_slot_for(job, criteria) {
                events.push(self.assign(job, slot, false));
                return events;
            }
        }

        self.wait_queue.push_back(job);
        if let Some(entry) = self.jobs.get_mut(job) {
            entry.state = JobState::WaitingForSlot;
        }

        tracing::debug!(facility = %self.facility, job = ?job, waiting = self.wait_queue.len(), "job queued");
        events.push(SchedulerEvent::WaitingJobsChanged);
        events
    }

    /// Gives the job the first free slot, bypassing queue and slot policy.
    ///
    /// # Panics
    /// If the job is unknown or no slot is free. Both are caller errors.
    pub fn force_slot(&mut self, job: JobId) -> Vec<SchedulerEvent> {
        let state = match self.jobs.get(job) {
            Some(entry) => entry.state,
            None => panic!("Cannot force a slot for unknown job {:?} at facility {}.", job, self.facility),
        };

        let mut events = Vec::new();
        if state == JobState::HasSlotAssigned {
            log::debug!("Job {:?} at facility {} already holds a slot, nothing to force.", job, self.facility);
            return events;
        }

        let slot = match self.free_slots().first() {
            Some(slot) => *slot,
            None => panic!("Forcing a slot at facility {} failed: all {} slot(s) are assigned.", self.facility, self.slots.len()),
        };

        let was_waiting = state == JobState::WaitingForSlot;
        if was_waiting {
            self.wait_queue.retain(|queued| *queued != job);
        }

        events.push(self.assign(job, slot, true));
        if was_waiting {
            events.push(SchedulerEvent::WaitingJobsChanged);
        }
        events
    }

    /// Removes the job from the wait queue or frees its slot, then hands freed
    /// capacity to waiting jobs in FIFO order.
    ///
    /// Releasing an idle job is a no-op and returns no events.
    pub fn release_run_request(&mut self, job: JobId, criteria: &dyn SlotSelectionCriteria) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        let Some(entry) = self.jobs.get_mut(job) else {
            log::warn!("Release of unknown job {:?} at facility {} ignored.", job, self.facility);
            return events;
        };

        match entry.state {
            JobState::Idle => {
                log::debug!("Job {:?} at facility {} holds nothing, release ignored.", job, self.facility);
                return events;
            }
            JobState::WaitingForSlot => {
                entry.state = JobState::Idle;
                self.wait_queue.retain(|queued| *queued != job);
                tracing::debug!(facility = %self.facility, job = ?job, waiting = self.wait_queue.len(), "waiting job released");
            }
            JobState::HasSlotAssigned => {
                let slot = entry.slot.take();
                entry.state = JobState::Idle;
                entry.forced = false;
                self.assigned.remove_by_left(&job);
                tracing::debug!(facility = %self.facility, job = ?job, slot = ?slot, "slot released");
            }
        }

        self.dispatch_waiting_jobs(criteria, &mut events);
        events.push(SchedulerEvent::WaitingJobsChanged);
        events
    }

    fn dispatch_waiting_jobs(&mut self, criteria: &dyn SlotSelectionCriteria, events: &mut Vec<SchedulerEvent>) {
        while let Some(&front) = self.wait_queue.front() {
            if !self.jobs.contains_key(front) {
                log::error!("Wait queue of facility {} contained removed job {:?}.", self.facility, front);
                self.wait_queue.pop_front();
                continue;
            }

            let Some(slot) = self.select_slot_for(front, criteria) else {
                break;
            };

            self.wait_queue.pop_front();
            events.push(self.assign(front, slot, false));
        }
    }

    fn select_slot_for(&self, job: JobId, criteria: &dyn SlotSelectionCriteria) -> Option<SlotId> {
        let entry = self.jobs.get(job)?;
        let free = self.free_slots();

        if free.is_empty() || !criteria.can_job_be_started(entry, self.counts()) {
            return None;
        }

        let candidates: Vec<(SlotId, &Slot)> = free.iter().filter_map(|id| self.slots.get(*id).map(|slot| (*id, slot))).collect();
        let chosen = criteria.get_best_job_slot_for(&candidates, entry)?;

        if !free.contains(&chosen) {
            log::error!("Slot policy of facility {} returned {:?}, which is not a free slot. Job {:?} keeps waiting.", self.facility, chosen, job);
            return None;
        }

        Some(chosen)
    }

    fn assign(&mut self, job: JobId, slot: SlotId, forced: bool) -> SchedulerEvent {
        if let Err((job, slot)) = self.assigned.insert_no_overwrite(job, slot) {
            panic!("Slot exclusivity violated at facility {}: {:?} / {:?} already part of an assignment.", self.facility, job, slot);
        }

        if let Some(entry) = self.jobs.get_mut(job) {
            entry.state = JobState::HasSlotAssigned;
            entry.slot = Some(slot);
            entry.forced = forced;
        }

        tracing::debug!(
            facility = %self.facility,
            job = ?job,
            slot = ?slot,
            forced,
            assigned = self.assigned.len(),
            waiting = self.wait_queue.len(),
            "slot assigned"
        );

        SchedulerEvent::SlotAssigned { job, slot, forced }
    }

    pub fn job(&self, job: JobId) -> Option<&Job> {
        self.jobs.get(job)
    }

    pub fn slot(&self, slot: SlotId) -> Option<&Slot> {
        self.slots.get(slot)
    }

    /// All slots in pool order.
    pub fn slots(&self) -> Vec<(SlotId, &Slot)> {
        self.slot_order.iter().filter_map(|id| self.slots.get(*id).map(|slot| (*id, slot))).collect()
    }

    pub fn slot_of(&self, job: JobId) -> Option<SlotId> {
        self.assigned.get_by_left(&job).copied()
    }

    pub fn job_on(&self, slot: SlotId) -> Option<JobId> {
        self.assigned.get_by_right(&slot).copied()
    }

    /// Waiting jobs, index 0 is the next to be served.
    pub fn waiting_jobs(&self) -> Vec<JobId> {
        self.wait_queue.iter().copied().collect()
    }

    /// Assignments in pool order.
    pub fn assigned_jobs(&self) -> Vec<(JobId, SlotId)> {
        self.slot_order.iter().filter_map(|slot| self.job_on(*slot).map(|job| (job, *slot))).collect()
    }

    pub fn free_slots(&self) -> Vec<SlotId> {
        self.slot_order.iter().copied().filter(|slot| !self.assigned.contains_right(slot)).collect()
    }

    pub fn counts(&self) -> SchedulerCounts {
        SchedulerCounts {
            total: self.slot_order.len(),
            assigned: self.assigned.len(),
            free: self.slot_order.len() - self.assigned.len(),
            waiting: self.wait_queue.len(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_order.len()
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Checks the pool / queue / assignment invariants.
    pub fn is_consistent(&self) -> bool {
        if self.assigned.len() > self.slots.len() {
            return false;
        }

        let mut queued = HashSet::new();
        for job in &self.wait_queue {
            match self.jobs.get(*job) {
                Some(entry) if entry.state == JobState::WaitingForSlot && entry.slot.is_none() => {}
                _ => return false,
            }
            if !queued.insert(*job) {
                return false;
            }
        }

        for (job, slot) in self.assigned.iter() {
            if !self.slots.contains_key(*slot) {
                return false;
            }
            match self.jobs.get(*job) {
                Some(entry) if entry.state == JobState::HasSlotAssigned && entry.slot == Some(*slot) => {}
                _ => return false,
            }
        }

        self.jobs.iter().all(|(id, entry)| match entry.state {
            JobState::Idle => entry.slot.is_none() && !queued.contains(&id) && !self.assigned.contains_left(&id),
            JobState::WaitingForSlot => queued.contains(&id),
            JobState::HasSlotAssigned => self.assigned.contains_left(&id),
        })
    }
}
