use glam::{Quat, Vec3};
use std::cell::Cell;
use std::rc::Rc;

/// Distance at which a mover is considered to have reached its destination.
pub const ARRIVAL_TOLERANCE: f32 = 0.05;

/// Position and orientation of a facility in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub origin: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(origin: Vec3, rotation: Quat) -> Self {
        Self { origin, rotation }
    }

    /// Pose rotated around the vertical axis. Positive yaw turns +X towards -Z.
    pub fn from_yaw_degrees(origin: Vec3, yaw_degrees: f32) -> Self {
        Self { origin, rotation: Quat::from_rotation_y(yaw_degrees.to_radians()) }
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.origin + self.rotation * local
    }

    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self { origin: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

/// Shared, movable transform of a facility.
///
/// Slots keep a handle to it and derive their world positions on every query, so
/// moving the facility moves all of its slots.
#[derive(Debug, Clone, Default)]
pub struct FacilityTransform(Rc<Cell<Pose>>);

impl FacilityTransform {
    pub fn new(pose: Pose) -> Self {
        Self(Rc::new(Cell::new(pose)))
    }

    pub fn pose(&self) -> Pose {
        self.0.get()
    }

    pub fn set_pose(&self, pose: Pose) {
        self.0.set(pose);
    }

    pub fn origin(&self) -> Vec3 {
        self.0.get().origin
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.0.get().transform_point(local)
    }

    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.0.get().transform_direction(local)
    }
}

/// Distance on the ground plane (the y component is ignored).
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Normalized ground-plane direction from `from` to `to`, zero if both coincide.
pub fn planar_direction(from: Vec3, to: Vec3) -> Vec3 {
    flatten(to - from).normalize_or_zero()
}

/// Unit vector on the ground plane for an angle measured from +X towards +Z.
pub fn ground_direction(angle_radians: f32) -> Vec3 {
    Vec3::new(angle_radians.cos(), 0.0, angle_radians.sin())
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_the_transform_moves_derived_points() {
        let transform = FacilityTransform::new(Pose::default());
        let slot_local = Vec3::new(2.0, 0.0, 0.0);
        let alias = transform.clone();

        alias.set_pose(Pose::from_yaw_degrees(Vec3::new(10.0, 0.0, 0.0), 90.0));

        let world = transform.transform_point(slot_local);
        assert!(planar_distance(world, Vec3::new(10.0, 0.0, -2.0)) < 1e-4, "unexpected point {:?}", world);
    }

    #[test]
    fn planar_distance_ignores_height() {
        assert!((planar_distance(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, -2.0, 4.0)) - 5.0).abs() < 1e-5);
        assert_eq!(planar_direction(Vec3::ONE, Vec3::ONE), Vec3::ZERO);
    }
}
