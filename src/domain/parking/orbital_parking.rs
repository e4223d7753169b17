use glam::Vec3;
use std::f32::consts::TAU;

use crate::api::parking_dto::OrbitalParkingDto;
use crate::domain::parking::parking_trait::{Parking, ParkingBase};
use crate::domain::schedule::job::Job;
use crate::domain::schedule::selection_criteria::{SchedulerCounts, SlotSelectionCriteria};
use crate::domain::schedule::slot::{Slot, SlotId};
use crate::domain::utils::geometry::{ARRIVAL_TOLERANCE, FacilityTransform, ground_direction, planar_direction, planar_distance};
use crate::domain::utils::id::FacilityId;
use crate::error::Error;

/// Geometry and capacity of an orbital facility.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalParkingConfig {
    /// Slots generated on the parking circle.
    pub max_slots: usize,

    /// Slots that may be assigned at the same time (`<= max_slots`).
    pub assignable_slots: usize,

    /// Radius of the circle the slots lie on.
    pub park_distance: f32,

    /// Radius of the circle holding the enter and exit points.
    pub entrance_distance: f32,

    /// Radius of the ring agents wait on before they may request a slot.
    pub waiting_distance: f32,

    /// Angular offset of enter (before) and exit (after) point relative to the slot.
    pub entrance_separation_degrees: f32,
}

impl OrbitalParkingConfig {
    pub fn validate(&self, facility: &FacilityId) -> Result<(), Error> {
        let reason = if self.max_slots == 0 {
            Some("maxSlots must be at least 1".to_string())
        } else if self.assignable_slots == 0 {
            Some("assignableSlots must be at least 1".to_string())
        } else if self.assignable_slots > self.max_slots {
            Some(format!("assignableSlots ({}) exceeds maxSlots ({})", self.assignable_slots, self.max_slots))
        } else if !(0.0 < self.park_distance && self.park_distance < self.entrance_distance && self.entrance_distance < self.waiting_distance) {
            Some(format!(
                "distances must satisfy 0 < parkDistance ({}) < entranceDistance ({}) < waitingDistance ({})",
                self.park_distance, self.entrance_distance, self.waiting_distance
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidParkingConfig { facility: facility.to_string(), reason }),
            None => Ok(()),
        }
    }
}

impl From<OrbitalParkingDto> for OrbitalParkingConfig {
    fn from(dto: OrbitalParkingDto) -> Self {
        OrbitalParkingConfig {
            max_slots: dto.max_slots,
            assignable_slots: dto.assignable_slots,
            park_distance: dto.park_distance,
            entrance_distance: dto.entrance_distance,
            waiting_distance: dto.waiting_distance,
            entrance_separation_degrees: dto.entrance_separation_degrees,
        }
    }
}

/// Slots evenly spaced on a circle around the facility, of which only
/// `assignable_slots` can be used concurrently.
#[derive(Debug)]
pub struct OrbitalParking {
    base: ParkingBase,
    config: OrbitalParkingConfig,
}

impl OrbitalParking {
    pub fn new(id: FacilityId, transform: FacilityTransform, config: OrbitalParkingConfig) -> Result<Self, Error> {
        config.validate(&id)?;

        let base = ParkingBase::new(id, transform);
        base.setup_slots(Self::generate_slots(base.transform(), &config));

        log::info!(
            "Orbital parking {} ready: {} slot(s), {} assignable, park/entrance/waiting distance {}/{}/{}.",
            base.id(),
            config.max_slots,
            config.assignable_slots,
            config.park_distance,
            config.entrance_distance,
            config.waiting_distance
        );

        Ok(OrbitalParking { base, config })
    }

    fn generate_slots(transform: &FacilityTransform, config: &OrbitalParkingConfig) -> Vec<Slot> {
        let separation = config.entrance_separation_degrees.to_radians();

        (0..config.max_slots)
            .map(|index| {
                let angle = TAU * index as f32 / config.max_slots as f32;
                Slot::new(
                    transform.clone(),
                    ground_direction(angle) * config.park_distance,
                    ground_direction(angle - separation) * config.entrance_distance,
                    ground_direction(angle + separation) * config.entrance_distance,
                )
            })
            .collect()
    }

    pub fn config(&self) -> &OrbitalParkingConfig {
        &self.config
    }
}

impl TryFrom<(OrbitalParkingDto, FacilityId, FacilityTransform)> for OrbitalParking {
    type Error = Error;

    fn try_from(args: (OrbitalParkingDto, FacilityId, FacilityTransform)) -> Result<Self, Self::Error> {
        let (dto, id, transform) = args;
        OrbitalParking::new(id, transform, dto.into())
    }
}

impl SlotSelectionCriteria for OrbitalParking {
    fn can_job_be_started(&self, _job: &Job, counts: SchedulerCounts) -> bool {
        counts.free > 0 && counts.assigned < self.config.assignable_slots
    }

    /// The slot whose enter point is closest to the requesting agent.
    fn get_best_job_slot_for(&self, candidates: &[(SlotId, &Slot)], job: &Job) -> Option<SlotId> {
        let Some(owner) = job.owner() else {
            return candidates.first().map(|(id, _)| *id);
        };

        let position = owner.current_position();
        candidates
            .iter()
            .min_by(|(_, a), (_, b)| planar_distance(a.enter_position(), position).total_cmp(&planar_distance(b.enter_position(), position)))
            .map(|(id, _)| *id)
    }
}

impl Parking for OrbitalParking {
    fn base(&self) -> &ParkingBase {
        &self.base
    }

    fn criteria(&self) -> &dyn SlotSelectionCriteria {
        self
    }

    /// Point on the waiting ring on the ray from the facility towards the caller.
    fn get_waiting_point(&self, from_position: Vec3) -> (Vec3, Vec3) {
        let origin = self.origin();
        let mut outward = planar_direction(origin, from_position);
        if outward == Vec3::ZERO {
            outward = self.base.transform().transform_direction(Vec3::X);
        }

        (origin + outward * self.config.waiting_distance, -outward)
    }

    fn can_request_slot(&self, base_position: Vec3) -> bool {
        let in_range = planar_distance(base_position, self.origin()) <= self.config.waiting_distance + ARRIVAL_TOLERANCE;
        in_range && self.assigned_count() < self.config.assignable_slots
    }
}
