use glam::Vec3;
use std::rc::Rc;

use crate::api::parking_dto::QueuedWaitParkingDto;
use crate::domain::parking::parking_trait::{Parking, ParkingBase};
use crate::domain::schedule::job::{Job, JobId, JobOwner};
use crate::domain::schedule::selection_criteria::SlotSelectionCriteria;
use crate::domain::schedule::slot::Slot;
use crate::domain::utils::geometry::{ARRIVAL_TOLERANCE, FacilityTransform, planar_distance};
use crate::domain::utils::id::FacilityId;
use crate::error::Error;

/// Geometry of a single-slot facility with a waiting line.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedWaitParkingConfig {
    pub slot_position: Vec3,
    pub enter_offset: Vec3,
    pub exit_offset: Vec3,

    /// Direction, local to the facility, in which the line grows away from the entrance.
    pub wait_direction: Vec3,

    /// Distance between two consecutive places in the line.
    pub units_separation: f32,

    /// Radius around the entrance inside which an empty line admits agents.
    pub waiting_distance: f32,
}

impl QueuedWaitParkingConfig {
    pub fn validate(&self, facility: &FacilityId) -> Result<(), Error> {
        let reason = if self.units_separation <= 0.0 {
            Some(format!("unitsSeparation must be positive, got {}", self.units_separation))
        } else if self.wait_direction.length_squared() <= f32::EPSILON {
            Some("waitDirection must not be zero".to_string())
        } else if self.waiting_distance <= 0.0 {
            Some(format!("waitingDistance must be positive, got {}", self.waiting_distance))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidParkingConfig { facility: facility.to_string(), reason }),
            None => Ok(()),
        }
    }
}

impl From<QueuedWaitParkingDto> for QueuedWaitParkingConfig {
    fn from(dto: QueuedWaitParkingDto) -> Self {
        QueuedWaitParkingConfig {
            slot_position: Vec3::from_array(dto.slot_position),
            enter_offset: Vec3::from_array(dto.enter_offset),
            exit_offset: Vec3::from_array(dto.exit_offset),
            wait_direction: Vec3::from_array(dto.wait_direction),
            units_separation: dto.units_separation,
            waiting_distance: dto.waiting_distance,
        }
    }
}

/// Exactly one slot and an unbounded line of waiting agents behind its entrance.
///
/// Whenever the wait queue changes every waiting agent is sent to the place that
/// matches its queue index, so the physical line always mirrors the queue.
#[derive(Debug)]
pub struct QueuedWaitParking {
    base: ParkingBase,
    config: QueuedWaitParkingConfig,
}

impl QueuedWaitParking {
    pub fn new(id: FacilityId, transform: FacilityTransform, config: QueuedWaitParkingConfig) -> Result<Self, Error> {
        config.validate(&id)?;

        let base = ParkingBase::new(id, transform);
        let slot = Slot::new(base.transform().clone(), config.slot_position, config.enter_offset, config.exit_offset);
        base.setup_slots(vec![slot]);

        log::info!("Queued wait parking {} ready, line separation {}.", base.id(), config.units_separation);

        Ok(QueuedWaitParking { base, config })
    }

    pub fn config(&self) -> &QueuedWaitParkingConfig {
        &self.config
    }

    /// World position and facing of the place with the given queue index.
    pub fn queue_position(&self, index: usize) -> (Vec3, Vec3) {
        let transform = self.base.transform();
        let entrance = transform.transform_point(self.config.enter_offset);
        let line_direction = transform.transform_direction(self.config.wait_direction.normalize());

        (entrance + line_direction * self.config.units_separation * (index + 1) as f32, -line_direction)
    }

    fn entrance(&self) -> Vec3 {
        self.base.transform().transform_point(self.config.enter_offset)
    }

    /// Sends every waiting agent to the place matching its queue index.
    fn reorder_wait_queue(&self) {
        let waiting: Vec<(JobId, Option<Rc<dyn JobOwner>>)> = {
            let scheduler = self.base.scheduler();
            scheduler.waiting_jobs().into_iter().map(|job| (job, scheduler.job(job).and_then(Job::owner))).collect()
        };

        log::debug!("Facility {} repositions {} waiting agent(s).", self.base.id(), waiting.len());

        for (index, (job, owner)) in waiting.into_iter().enumerate() {
            if let Some(owner) = owner {
                let (position, direction) = self.queue_position(index);
                owner.on_wait_position_changed(job, position, direction);
            }
        }
    }
}

impl TryFrom<(QueuedWaitParkingDto, FacilityId, FacilityTransform)> for QueuedWaitParking {
    type Error = Error;

    fn try_from(args: (QueuedWaitParkingDto, FacilityId, FacilityTransform)) -> Result<Self, Self::Error> {
        let (dto, id, transform) = args;
        QueuedWaitParking::new(id, transform, dto.into())
    }
}

impl SlotSelectionCriteria for QueuedWaitParking {}

impl Parking for QueuedWaitParking {
    fn base(&self) -> &ParkingBase {
        &self.base
    }

    fn criteria(&self) -> &dyn SlotSelectionCriteria {
        self
    }

    /// The end of the current line.
    fn get_waiting_point(&self, _from_position: Vec3) -> (Vec3, Vec3) {
        self.queue_position(self.waiting_count())
    }

    /// Admission radius grows by one place per waiting agent.
    fn can_request_slot(&self, base_position: Vec3) -> bool {
        let radius = self.config.waiting_distance + self.config.units_separation * self.waiting_count() as f32;
        planar_distance(base_position, self.entrance()) <= radius + ARRIVAL_TOLERANCE
    }

    fn on_waiting_jobs_changed(&self) {
        self.reorder_wait_queue();
    }
}
