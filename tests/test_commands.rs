mod common;

use glam::Vec3;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use common::{MockAttacker, MockBuilder, MockCarrier, MockScanner, MockStructure, MockTarget, MockWarehouse, agent, drive_until_parked, orbital_parking};
use rts_docking::domain::capability::build_trait::Buildable;
use rts_docking::domain::capability::combat_trait::{AttackCapable, Damageable, TargetScanner};
use rts_docking::domain::capability::resource_trait::{ResourceCarrier, ResourceWarehouse};
use rts_docking::domain::command::cmd_attack::{CmdAttack, MANEUVER_RANGE_FACTOR};
use rts_docking::domain::command::cmd_attack_move::CmdAttackMove;
use rts_docking::domain::command::cmd_build_structure::CmdBuildStructure;
use rts_docking::domain::command::cmd_extract_resource::CmdExtractResource;
use rts_docking::domain::command::cmd_move::CmdMove;
use rts_docking::domain::command::command_runner::CommandRunner;
use rts_docking::domain::command::command_trait::{Command, CommandState};
use rts_docking::domain::parkable::parking_events::ParkingPhase;
use rts_docking::domain::parking::parking_trait::Parking;
use rts_docking::domain::simulator::simulator_mock::MockNavigation;
use rts_docking::domain::utils::geometry::planar_distance;
use rts_docking::domain::utils::id::{AgentId, CommandId, FacilityId};

fn structure(id: &str) -> Rc<MockStructure> {
    Rc::new(MockStructure { id: FacilityId::new(id), parking: orbital_parking(id, Vec3::ZERO, 1, 1), completed: Cell::new(false) })
}

#[test]
fn test_build_structure_docks_builds_and_leaves() {
    let site = structure("Site");
    let target: Rc<dyn Buildable> = site.clone();
    let builder = Rc::new(MockBuilder::default());
    let (navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));

    let mut command = CmdBuildStructure::new(CommandId::new("build-1"), AgentId::new("Builder"), parkable.clone(), builder.clone(), &target);
    command.start();
    assert_eq!(parkable.phase(), ParkingPhase::Idle, "The berth is requested on the first update");

    command.update(0.1);
    assert!(drive_until_parked(&navigation, &parkable));

    command.update(0.2);
    command.update(0.3);
    assert_eq!(*builder.setups.borrow(), vec!["Site".to_string()], "Build set up exactly once");

    site.completed.set(true);
    command.update(0.4);
    assert_eq!(parkable.phase(), ParkingPhase::MovingToExit);
    assert!(command.is_running(), "Command runs until the builder left the berth");

    navigation.complete(true);

    assert_eq!(command.current_state(), CommandState::End);
    assert_eq!(site.parking.assigned_count(), 0);
}

#[test]
fn test_build_structure_cancelled_while_docking() {
    let site = structure("Site");
    let target: Rc<dyn Buildable> = site.clone();
    let builder = Rc::new(MockBuilder::default());
    let (_navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));

    let mut command = CmdBuildStructure::new(CommandId::new("build-1"), AgentId::new("Builder"), parkable.clone(), builder.clone(), &target);
    command.start();
    command.update(0.1);
    assert_eq!(parkable.phase(), ParkingPhase::MovingToEnter);

    command.cancel();

    assert_eq!(command.current_state(), CommandState::Cancel, "Parking end must not turn a cancel into an end");
    assert_eq!(parkable.phase(), ParkingPhase::Idle);
    assert_eq!(site.parking.base().scheduler().job_count(), 0);
    assert!(builder.setups.borrow().is_empty());
}

#[test]
fn test_build_structure_on_completed_target_ends_immediately() {
    let site = structure("Site");
    site.completed.set(true);
    let target: Rc<dyn Buildable> = site.clone();
    let (_navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));

    let mut command = CmdBuildStructure::new(CommandId::new("build-1"), AgentId::new("Builder"), parkable, Rc::new(MockBuilder::default()), &target);
    command.start();

    assert_eq!(command.current_state(), CommandState::End);
}

#[test]
fn test_build_structure_leaves_when_the_structure_is_destroyed() {
    let site = structure("Site");
    let parking = site.parking.clone();
    let target: Rc<dyn Buildable> = site.clone();
    let builder = Rc::new(MockBuilder::default());
    let (navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));

    let mut command = CmdBuildStructure::new(CommandId::new("build-1"), AgentId::new("Builder"), parkable.clone(), builder.clone(), &target);
    command.start();
    command.update(0.1);
    assert!(drive_until_parked(&navigation, &parkable));
    command.update(0.2);
    assert_eq!(builder.setups.borrow().len(), 1);

    drop(target);
    drop(site);
    command.update(0.3);

    assert_eq!(parkable.phase(), ParkingPhase::MovingToExit, "Builder leaves the berth of a destroyed structure");
    assert!(command.is_running());

    navigation.complete(true);

    assert_eq!(command.current_state(), CommandState::End);
    assert_eq!(parking.assigned_count(), 0);
}

#[test]
fn test_build_structure_ends_when_the_structure_is_destroyed_before_docking() {
    let site = structure("Site");
    let parking = site.parking.clone();
    let target: Rc<dyn Buildable> = site.clone();
    let (navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));

    let mut command = CmdBuildStructure::new(CommandId::new("build-1"), AgentId::new("Builder"), parkable.clone(), Rc::new(MockBuilder::default()), &target);
    command.start();
    assert!(command.is_running());

    drop(target);
    drop(site);
    command.update(0.1);

    assert_eq!(command.current_state(), CommandState::End);
    assert_eq!(parkable.phase(), ParkingPhase::Idle);
    assert_eq!(navigation.request_count(), 0, "No berth is requested for a destroyed structure");
    assert_eq!(parking.base().scheduler().job_count(), 0);
}

/// Carrier that never fills up and only keeps a weak handle on its warehouse.
#[derive(Default)]
struct BottomlessCarrier {
    assigned: RefCell<Option<Weak<dyn ResourceWarehouse>>>,
}

impl ResourceCarrier for BottomlessCarrier {
    fn is_able_to_load_cargo_from(&self, warehouse: &dyn ResourceWarehouse, _strict: bool) -> bool {
        !warehouse.is_storage()
    }

    fn has_any_cargo(&self) -> bool {
        false
    }

    fn assign_warehouse(&self, warehouse: Option<Rc<dyn ResourceWarehouse>>) {
        *self.assigned.borrow_mut() = warehouse.map(|warehouse| Rc::downgrade(&warehouse));
    }

    fn nearest_storage(&self) -> Option<Rc<dyn ResourceWarehouse>> {
        None
    }
}

fn field() -> Rc<MockWarehouse> {
    Rc::new(MockWarehouse { id: FacilityId::new("Field"), parking: orbital_parking("Field", Vec3::ZERO, 1, 1), storage: false, stock: Cell::new(1) })
}

#[test]
fn test_extract_resource_ends_when_the_source_is_destroyed_while_docked() {
    let field = field();
    let parking = field.parking.clone();
    let carrier = Rc::new(BottomlessCarrier::default());
    let (navigation, parkable) = agent("Harvester", Vec3::new(0.0, 0.0, 6.0));

    let source: Rc<dyn ResourceWarehouse> = field.clone();
    let mut command = CmdExtractResource::new(CommandId::new("extract-1"), AgentId::new("Harvester"), parkable.clone(), carrier.clone(), &source);
    command.start();
    assert!(drive_until_parked(&navigation, &parkable), "Harvester docks at the field");
    command.update(0.1);
    assert!(parkable.is_parked(), "A bottomless carrier keeps loading");

    drop(source);
    drop(field);
    command.update(0.2);

    assert_eq!(command.current_state(), CommandState::End, "A destroyed source ends the command");
    assert!(carrier.assigned.borrow().is_none());
    assert_eq!(parkable.phase(), ParkingPhase::MovingToExit);
    assert_eq!(parking.assigned_count(), 0);

    navigation.complete(true);

    assert_eq!(parkable.phase(), ParkingPhase::Idle);
    assert_eq!(command.completed_legs(), 0);
}

#[test]
fn test_extract_resource_ends_when_the_source_is_destroyed_on_approach() {
    let field = field();
    let parking = field.parking.clone();
    let (_navigation, parkable) = agent("Harvester", Vec3::new(0.0, 0.0, 6.0));

    let source: Rc<dyn ResourceWarehouse> = field.clone();
    let mut command =
        CmdExtractResource::new(CommandId::new("extract-1"), AgentId::new("Harvester"), parkable.clone(), Rc::new(BottomlessCarrier::default()), &source);
    command.start();
    assert_eq!(parkable.phase(), ParkingPhase::MovingToEnter);

    drop(source);
    drop(field);
    command.update(0.1);

    assert_eq!(command.current_state(), CommandState::End);
    assert_eq!(parkable.phase(), ParkingPhase::Idle);
    assert_eq!(parking.base().scheduler().job_count(), 0);
}

#[test]
fn test_extract_resource_shuttles_between_source_and_storage() {
    let field = Rc::new(MockWarehouse {
        id: FacilityId::new("Field"),
        parking: orbital_parking("Field", Vec3::ZERO, 1, 1),
        storage: false,
        stock: Cell::new(1),
    });
    let depot = Rc::new(MockWarehouse {
        id: FacilityId::new("Depot"),
        parking: orbital_parking("Depot", Vec3::new(20.0, 0.0, 0.0), 1, 1),
        storage: true,
        stock: Cell::new(0),
    });
    let carrier = Rc::new(MockCarrier { cargo: Cell::new(0), capacity: 1, source: field.clone(), storage: depot.clone(), assigned: RefCell::new(None) });
    let (navigation, parkable) = agent("Harvester", Vec3::new(0.0, 0.0, 6.0));

    let source: Rc<dyn ResourceWarehouse> = field.clone();
    let mut command = CmdExtractResource::new(CommandId::new("extract-1"), AgentId::new("Harvester"), parkable.clone(), carrier.clone(), &source);
    command.start();
    assert!(carrier.assigned.borrow().as_ref().is_some_and(|warehouse| warehouse.id().as_str() == "Field"));

    assert!(drive_until_parked(&navigation, &parkable), "Harvester docks at the field");
    command.update(0.1);
    assert!(parkable.is_parked(), "Carrier is not full yet");

    carrier.cargo.set(1);
    field.stock.set(0);
    command.update(0.2);
    assert_eq!(parkable.phase(), ParkingPhase::MovingToExit);
    navigation.complete(true);

    command.update(0.3);
    assert_eq!(command.completed_legs(), 1);
    assert!(carrier.assigned.borrow().as_ref().is_some_and(|warehouse| warehouse.id().as_str() == "Depot"));

    assert!(drive_until_parked(&navigation, &parkable), "Harvester docks at the depot");
    command.update(0.4);
    assert!(parkable.is_parked(), "Cargo is not unloaded yet");

    carrier.cargo.set(0);
    command.update(0.5);
    navigation.complete(true);
    command.update(0.6);

    assert_eq!(command.completed_legs(), 2);
    assert_eq!(command.current_state(), CommandState::End, "Source is empty and nothing is carried");
    assert!(carrier.assigned.borrow().is_none());
}

#[test]
fn test_attack_maneuvers_around_the_target_until_it_dies() {
    let navigation = MockNavigation::new(Vec3::ZERO);
    let attacker = MockAttacker::new(navigation.clone(), 3.0);
    let enemy = MockTarget::new("Enemy", Vec3::new(10.0, 0.0, 0.0));
    let target: Rc<dyn Damageable> = enemy.clone();

    let mut command = CmdAttack::with_seed(CommandId::new("attack-1"), AgentId::new("A"), navigation.clone(), attacker.clone(), &target, 0, 7);
    command.start();
    assert!(navigation.last_destination().is_some_and(|point| planar_distance(point, enemy.position()) < 1e-4), "Pursuit heads to the target");

    command.update(0.1);
    assert!(attacker.attacked.borrow().is_empty(), "Target is out of range");

    navigation.complete(true);
    command.update(0.2);

    assert_eq!(*attacker.attacked.borrow(), vec!["Enemy".to_string()]);
    let maneuver = navigation.last_destination().expect("maneuver point");
    let distance = planar_distance(maneuver, enemy.position());
    let max_distance = attacker.get_attack_range(target.as_ref(), 0) * MANEUVER_RANGE_FACTOR;
    assert!(distance >= enemy.get_radius() - 1e-4 && distance <= max_distance + 1e-4, "Maneuver point {} away from the target", distance);

    enemy.alive.set(false);
    let stops = navigation.stop_count();
    command.update(0.3);

    assert_eq!(command.current_state(), CommandState::End);
    assert_eq!(navigation.stop_count(), stops + 1);
}

#[test]
fn test_attack_move_fires_at_the_nearest_target_in_range() {
    let navigation = MockNavigation::new(Vec3::ZERO);
    let attacker = MockAttacker::new(navigation.clone(), 3.0);

    let dead = MockTarget::new("Dead", Vec3::new(1.0, 0.0, 0.0));
    dead.alive.set(false);
    let targets: Vec<Rc<dyn Damageable>> = vec![
        MockTarget::new("Far", Vec3::new(3.0, 0.0, 0.0)),
        dead,
        MockTarget::new("Near", Vec3::new(2.0, 0.0, 0.0)),
        MockTarget::new("Out", Vec3::new(9.0, 0.0, 0.0)),
    ];
    let scanner: Rc<dyn TargetScanner> = Rc::new(MockScanner { targets: RefCell::new(targets) });

    let mut command = CmdAttackMove::new(
        CommandId::new("attack-move-1"),
        AgentId::new("A"),
        navigation.clone(),
        attacker.clone(),
        scanner,
        0,
        Vec3::new(20.0, 0.0, 0.0),
        Vec3::X,
    );
    command.start();
    command.update(0.1);

    attacker.ready.set(false);
    command.update(0.2);

    assert_eq!(*attacker.attacked.borrow(), vec!["Near".to_string()], "One shot at the nearest living target");

    navigation.complete(true);
    assert_eq!(command.current_state(), CommandState::End);
}

#[test]
fn test_runner_cancels_docking_when_a_move_is_issued() {
    let site = structure("Site");
    let target: Rc<dyn Buildable> = site.clone();
    let (navigation, parkable) = agent("Builder", Vec3::new(0.0, 0.0, 6.0));
    let agent_id = AgentId::new("Builder");
    let mut runner = CommandRunner::new();

    let build = CmdBuildStructure::new(CommandId::new("build-1"), agent_id.clone(), parkable.clone(), Rc::new(MockBuilder::default()), &target);
    assert_eq!(runner.issue(agent_id.clone(), Box::new(build)), CommandState::Running);
    runner.update(0.1);
    assert!(drive_until_parked(&navigation, &parkable));

    let order = CmdMove::new(CommandId::new("move-1"), agent_id.clone(), navigation.clone(), Vec3::new(30.0, 0.0, 0.0), Vec3::X);
    runner.issue(agent_id.clone(), Box::new(order));

    assert_eq!(runner.active_command(&agent_id), Some(&CommandId::new("move-1")));
    assert_eq!(site.parking.assigned_count(), 0, "The berth is released as soon as the build is cancelled");
    assert_ne!(parkable.phase(), ParkingPhase::Parked);
}
