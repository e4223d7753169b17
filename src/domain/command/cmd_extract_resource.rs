use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::domain::capability::resource_trait::{ResourceCarrier, ResourceWarehouse};
use crate::domain::command::command_trait::{Command, CommandBase, ComponentTarget};
use crate::domain::parkable::parkable::Parkable;
use crate::domain::parkable::parking_events::ParkingCallbacks;
use crate::domain::utils::id::{AgentId, CommandId};

/// One docking at a source or a storage.
struct Leg {
    warehouse: Weak<dyn ResourceWarehouse>,
    docked: Rc<Cell<bool>>,
    ended: Rc<Cell<bool>>,
    leaving: bool,
}

/// Shuttles between a resource source and the nearest storage.
///
/// Each leg docks at one warehouse. The carrier loads or unloads on its own while
/// docked; the command leaves once the source cannot fill the carrier any further or
/// the cargo is unloaded, then picks the next leg. It ends when no leg is left, a
/// leg ended without docking or the warehouse of the current leg is gone.
pub struct CmdExtractResource {
    base: CommandBase,
    parkable: Rc<Parkable>,
    carrier: Rc<dyn ResourceCarrier>,
    source: Weak<dyn ResourceWarehouse>,
    leg: Option<Leg>,
    completed_legs: usize,
}

impl CmdExtractResource {
    pub fn new(id: CommandId, agent: AgentId, parkable: Rc<Parkable>, carrier: Rc<dyn ResourceCarrier>, source: &Rc<dyn ResourceWarehouse>) -> Self {
        CmdExtractResource { base: CommandBase::new(id, agent), parkable, carrier, source: Rc::downgrade(source), leg: None, completed_legs: 0 }
    }

    /// Legs that ended after docking.
    pub fn completed_legs(&self) -> usize {
        self.completed_legs
    }

    fn next_warehouse(&self) -> Option<Rc<dyn ResourceWarehouse>> {
        if let Some(source) = self.source.upgrade() {
            if self.carrier.is_able_to_load_cargo_from(source.as_ref(), true) {
                return Some(source);
            }
        }

        if self.carrier.has_any_cargo() {
            return self.carrier.nearest_storage();
        }

        None
    }

    /// Starts the next leg or ends the command if there is none.
    fn start_next_leg(&mut self) {
        let Some(warehouse) = self.next_warehouse() else {
            log::debug!("{} {}: nothing left to extract or unload.", self.name(), self.id());
            self.end();
            return;
        };

        log::debug!("{} {}: next leg to {}.", self.name(), self.id(), warehouse.id());

        let docked = Rc::new(Cell::new(false));
        let ended = Rc::new(Cell::new(false));
        let callbacks = {
            let docked = docked.clone();
            let ended = ended.clone();
            ParkingCallbacks::new().on_enter(move |_| docked.set(true)).on_ended(move |_| ended.set(true))
        };

        self.carrier.assign_warehouse(Some(warehouse.clone()));
        self.leg = Some(Leg { warehouse: Rc::downgrade(&warehouse), docked, ended, leaving: false });
        self.parkable.request_parking_slot(warehouse.parking(), callbacks);
    }

    fn is_leg_done(&self, warehouse: &dyn ResourceWarehouse) -> bool {
        if warehouse.is_storage() {
            !self.carrier.has_any_cargo()
        } else {
            !self.carrier.is_able_to_load_cargo_from(warehouse, true)
        }
    }
}

impl Command for CmdExtractResource {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "CmdExtractResource"
    }

    fn component_target(&self) -> ComponentTarget {
        ComponentTarget::ResourceCarrier
    }

    fn on_start(&mut self) {
        self.start_next_leg();
    }

    fn on_update(&mut self, _time: f32) {
        let Some(leg) = self.leg.as_ref() else {
            return;
        };

        if leg.ended.get() {
            let docked = leg.docked.get();
            self.leg = None;
            self.carrier.assign_warehouse(None);

            if !docked {
                log::debug!("{} {}: leg ended before docking.", self.name(), self.id());
                self.end();
                return;
            }

            self.completed_legs += 1;
            self.start_next_leg();
            return;
        }

        let Some(warehouse) = leg.warehouse.upgrade() else {
            log::debug!("{} {}: warehouse gone during the leg.", self.name(), self.id());
            self.leg = None;
            self.carrier.assign_warehouse(None);
            self.parkable.cancel_parking_request();
            self.end();
            return;
        };

        if leg.docked.get() && !leg.leaving && self.is_leg_done(warehouse.as_ref()) {
            if let Some(leg) = self.leg.as_mut() {
                leg.leaving = true;
            }
            self.parkable.cancel_parking_request();
        }
    }

    fn on_cancel(&mut self) {
        self.parkable.cancel_parking_request();
        self.carrier.assign_warehouse(None);
        self.leg = None;
    }
}
