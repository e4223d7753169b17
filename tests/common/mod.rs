#![allow(dead_code)]

use glam::Vec3;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rts_docking::domain::capability::build_trait::{Buildable, MobileBuilder};
use rts_docking::domain::capability::combat_trait::{AttackCapable, AttackType, Damageable, TargetScanner};
use rts_docking::domain::capability::navigation_trait::Navigation;
use rts_docking::domain::capability::resource_trait::{ResourceCarrier, ResourceWarehouse};
use rts_docking::domain::parkable::parkable::Parkable;
use rts_docking::domain::parkable::parking_events::{ParkingEndReason, ParkingEndedArgs, ParkingEventArgs, ParkingEvents};
use rts_docking::domain::parking::orbital_parking::{OrbitalParking, OrbitalParkingConfig};
use rts_docking::domain::parking::parking_trait::Parking;
use rts_docking::domain::parking::queued_wait_parking::{QueuedWaitParking, QueuedWaitParkingConfig};
use rts_docking::domain::simulator::simulator_mock::MockNavigation;
use rts_docking::domain::utils::geometry::{FacilityTransform, Pose, planar_distance};
use rts_docking::domain::utils::id::{AgentId, FacilityId};

pub fn orbital_parking(id: &str, origin: Vec3, max_slots: usize, assignable_slots: usize) -> Rc<dyn Parking> {
    let config = OrbitalParkingConfig {
        max_slots,
        assignable_slots,
        park_distance: 2.0,
        entrance_distance: 4.0,
        waiting_distance: 8.0,
        entrance_separation_degrees: 10.0,
    };
    let transform = FacilityTransform::new(Pose::new(origin, glam::Quat::IDENTITY));
    Rc::new(OrbitalParking::new(FacilityId::new(id), transform, config).expect("valid orbital config"))
}

pub fn queued_wait_parking(id: &str) -> Rc<QueuedWaitParking> {
    let config = QueuedWaitParkingConfig {
        slot_position: Vec3::ZERO,
        enter_offset: Vec3::new(0.0, 0.0, 3.0),
        exit_offset: Vec3::new(3.0, 0.0, 0.0),
        wait_direction: Vec3::new(0.0, 0.0, 1.0),
        units_separation: 1.5,
        waiting_distance: 4.0,
    };
    Rc::new(QueuedWaitParking::new(FacilityId::new(id), FacilityTransform::default(), config).expect("valid queued config"))
}

pub fn agent(name: &str, position: Vec3) -> (Rc<MockNavigation>, Rc<Parkable>) {
    let navigation = MockNavigation::new(position);
    let parkable = Parkable::new(AgentId::new(name), navigation.clone());
    (navigation, parkable)
}

/// Completes movements successfully until the agent is parked.
pub fn drive_until_parked(navigation: &MockNavigation, parkable: &Parkable) -> bool {
    for _ in 0..10 {
        if parkable.is_parked() {
            return true;
        }
        if !navigation.complete(true) {
            return false;
        }
    }
    parkable.is_parked()
}

pub fn close_to(a: Vec3, b: Vec3) -> bool {
    planar_distance(a, b) < 1e-3
}

/// Structured receiver counting every event of a docking sequence.
#[derive(Default)]
pub struct EventRecorder {
    pub enters: Cell<usize>,
    pub exits: Cell<usize>,
    pub ended: RefCell<Vec<ParkingEndReason>>,
}

impl ParkingEvents for EventRecorder {
    fn on_parking_enter(&self, _args: &ParkingEventArgs) {
        self.enters.set(self.enters.get() + 1);
    }

    fn on_parking_exit(&self, _args: &ParkingEventArgs) {
        self.exits.set(self.exits.get() + 1);
    }

    fn on_parking_ended(&self, args: &ParkingEndedArgs) {
        self.ended.borrow_mut().push(args.reason);
    }
}

pub struct MockTarget {
    pub id: AgentId,
    pub position: Cell<Vec3>,
    pub alive: Cell<bool>,
    pub radius: f32,
}

impl MockTarget {
    pub fn new(name: &str, position: Vec3) -> Rc<MockTarget> {
        Rc::new(MockTarget { id: AgentId::new(name), position: Cell::new(position), alive: Cell::new(true), radius: 0.5 })
    }
}

impl Damageable for MockTarget {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn get_radius(&self) -> f32 {
        self.radius
    }

    fn position(&self) -> Vec3 {
        self.position.get()
    }
}

/// Attacker with a single attack type whose range is measured from its navigation.
pub struct MockAttacker {
    pub navigation: Rc<MockNavigation>,
    pub range: f32,
    pub ready: Cell<bool>,
    pub attacked: RefCell<Vec<String>>,
}

impl MockAttacker {
    pub fn new(navigation: Rc<MockNavigation>, range: f32) -> Rc<MockAttacker> {
        Rc::new(MockAttacker { navigation, range, ready: Cell::new(true), attacked: RefCell::new(Vec::new()) })
    }
}

impl AttackCapable for MockAttacker {
    fn is_valid_target(&self, target: &dyn Damageable, _attack_type: AttackType) -> bool {
        target.is_alive()
    }

    fn is_in_attack_range(&self, target: &dyn Damageable, attack_type: AttackType) -> bool {
        planar_distance(self.navigation.base_position(), target.position()) <= self.get_attack_distance(target, attack_type)
    }

    fn can_use_attack(&self, _attack_type: AttackType) -> bool {
        self.ready.get()
    }

    fn attack(&self, target: &Rc<dyn Damageable>, _attack_type: AttackType) {
        self.attacked.borrow_mut().push(target.id().to_string());
    }

    fn get_attack_range(&self, _target: &dyn Damageable, _attack_type: AttackType) -> f32 {
        self.range
    }

    fn get_attack_distance(&self, target: &dyn Damageable, _attack_type: AttackType) -> f32 {
        self.range + target.get_radius()
    }
}

pub struct MockScanner {
    pub targets: RefCell<Vec<Rc<dyn Damageable>>>,
}

impl TargetScanner for MockScanner {
    fn potential_targets(&self) -> Vec<Rc<dyn Damageable>> {
        self.targets.borrow().clone()
    }
}

pub struct MockStructure {
    pub id: FacilityId,
    pub parking: Rc<dyn Parking>,
    pub completed: Cell<bool>,
}

impl Buildable for MockStructure {
    fn id(&self) -> &FacilityId {
        &self.id
    }

    fn parking(&self) -> Rc<dyn Parking> {
        self.parking.clone()
    }

    fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

#[derive(Default)]
pub struct MockBuilder {
    pub setups: RefCell<Vec<String>>,
}

impl MobileBuilder for MockBuilder {
    fn setup_build(&self, target: Rc<dyn Buildable>) {
        self.setups.borrow_mut().push(target.id().to_string());
    }
}

pub struct MockWarehouse {
    pub id: FacilityId,
    pub parking: Rc<dyn Parking>,
    pub storage: bool,
    pub stock: Cell<u32>,
}

impl ResourceWarehouse for MockWarehouse {
    fn id(&self) -> &FacilityId {
        &self.id
    }

    fn parking(&self) -> Rc<dyn Parking> {
        self.parking.clone()
    }

    fn position(&self) -> Vec3 {
        self.parking.origin()
    }

    fn is_storage(&self) -> bool {
        self.storage
    }
}

/// Carrier whose cargo is changed by the test itself.
pub struct MockCarrier {
    pub cargo: Cell<u32>,
    pub capacity: u32,
    pub source: Rc<MockWarehouse>,
    pub storage: Rc<MockWarehouse>,
    pub assigned: RefCell<Option<Rc<dyn ResourceWarehouse>>>,
}

impl ResourceCarrier for MockCarrier {
    fn is_able_to_load_cargo_from(&self, warehouse: &dyn ResourceWarehouse, strict: bool) -> bool {
        if warehouse.is_storage() || warehouse.id() != &self.source.id {
            return false;
        }
        !strict || (self.cargo.get() < self.capacity && self.source.stock.get() > 0)
    }

    fn has_any_cargo(&self) -> bool {
        self.cargo.get() > 0
    }

    fn assign_warehouse(&self, warehouse: Option<Rc<dyn ResourceWarehouse>>) {
        *self.assigned.borrow_mut() = warehouse;
    }

    fn nearest_storage(&self) -> Option<Rc<dyn ResourceWarehouse>> {
        let storage: Rc<dyn ResourceWarehouse> = self.storage.clone();
        Some(storage)
    }
}
