use crate::domain::schedule::job::Job;
use crate::domain::schedule::slot::{Slot, SlotId};

/// Snapshot of the scheduler occupancy handed to a selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerCounts {
    pub total: usize,
    pub assigned: usize,
    pub free: usize,
    pub waiting: usize,
}

/// Pluggable policy deciding whether a job may start and which free slot it receives.
///
/// The policy only chooses *which* slot a job gets. Job order is always the FIFO
/// order of the wait queue. Implementations must not access the scheduler that calls
/// them; everything they may rely on is passed in.
pub trait SlotSelectionCriteria {
    fn can_job_be_started(&self, _job: &Job, counts: SchedulerCounts) -> bool {
        counts.free > 0
    }

    /// Picks one of `candidates`, which are all currently free.
    ///
    /// # Returns
    /// `None` only if `candidates` is empty; a slot that is not a candidate is rejected by the scheduler.
    fn get_best_job_slot_for(&self, candidates: &[(SlotId, &Slot)], _job: &Job) -> Option<SlotId> {
        candidates.first().map(|(id, _)| *id)
    }
}

/// Default policy: any free slot, first come first served.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFreeSlot;

impl SlotSelectionCriteria for FirstFreeSlot {}
