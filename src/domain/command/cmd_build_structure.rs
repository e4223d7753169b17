use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::domain::capability::build_trait::{Buildable, MobileBuilder};
use crate::domain::command::command_trait::{Command, CommandBase, ComponentTarget};
use crate::domain::parkable::parkable::Parkable;
use crate::domain::parkable::parking_events::ParkingCallbacks;
use crate::domain::utils::id::{AgentId, CommandId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStage {
    /// Started, berth not requested yet. A freshly placed structure gets one tick to set up.
    AwaitingSetup,
    Docking,
    Building,
    Leaving,
}

/// Docks the builder at the construction berth of a structure and builds it.
///
/// The command ends when the docking sequence ends, which happens after the builder
/// left the berth of the completed structure or when docking failed.
pub struct CmdBuildStructure {
    base: CommandBase,
    parkable: Rc<Parkable>,
    builder: Rc<dyn MobileBuilder>,
    target: Weak<dyn Buildable>,
    stage: BuildStage,
    docked: Rc<Cell<bool>>,
}

impl CmdBuildStructure {
    pub fn new(id: CommandId, agent: AgentId, parkable: Rc<Parkable>, builder: Rc<dyn MobileBuilder>, target: &Rc<dyn Buildable>) -> Self {
        CmdBuildStructure {
            base: CommandBase::new(id, agent),
            parkable,
            builder,
            target: Rc::downgrade(target),
            stage: BuildStage::AwaitingSetup,
            docked: Rc::new(Cell::new(false)),
        }
    }

    fn request_berth(&mut self, target: &Rc<dyn Buildable>) {
        let docked = self.docked.clone();
        let status = self.base.status().clone();
        let callbacks = ParkingCallbacks::new().on_enter(move |_| docked.set(true)).on_ended(move |_| {
            status.end();
        });

        self.stage = BuildStage::Docking;
        self.parkable.request_parking_slot(target.parking(), callbacks);
    }

    fn leave(&mut self) {
        self.stage = BuildStage::Leaving;
        self.parkable.cancel_parking_request();
    }
}

impl Command for CmdBuildStructure {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "CmdBuildStructure"
    }

    fn component_target(&self) -> ComponentTarget {
        ComponentTarget::MobileBuilder
    }

    fn on_start(&mut self) {
        if self.target.upgrade().is_none_or(|target| target.is_completed()) {
            self.end();
        }
    }

    fn on_update(&mut self, _time: f32) {
        let Some(target) = self.target.upgrade() else {
            log::debug!("{} {}: structure gone.", self.name(), self.id());
            match self.stage {
                BuildStage::AwaitingSetup => self.end(),
                BuildStage::Leaving => {}
                BuildStage::Docking | BuildStage::Building => self.leave(),
            }
            return;
        };

        match self.stage {
            BuildStage::AwaitingSetup => self.request_berth(&target),
            BuildStage::Docking if self.docked.get() => {
                if target.is_completed() {
                    self.leave();
                } else {
                    self.stage = BuildStage::Building;
                    self.builder.setup_build(target);
                }
            }
            BuildStage::Building if target.is_completed() => self.leave(),
            BuildStage::Docking | BuildStage::Building | BuildStage::Leaving => {}
        }
    }

    fn on_cancel(&mut self) {
        if self.stage != BuildStage::AwaitingSetup {
            self.parkable.cancel_parking_request();
        }
    }
}
