use glam::Vec3;
use std::rc::Rc;

use crate::domain::capability::navigation_trait::Navigation;
use crate::domain::command::command_trait::{Command, CommandBase, ComponentTarget};
use crate::domain::utils::id::{AgentId, CommandId};

/// Moves the agent to a point and ends on arrival, successful or not.
pub struct CmdMove {
    base: CommandBase,
    navigation: Rc<dyn Navigation>,
    position: Vec3,
    direction: Vec3,
}

impl CmdMove {
    pub fn new(id: CommandId, agent: AgentId, navigation: Rc<dyn Navigation>, position: Vec3, direction: Vec3) -> Self {
        CmdMove { base: CommandBase::new(id, agent), navigation, position, direction }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

impl Command for CmdMove {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "CmdMove"
    }

    fn component_target(&self) -> ComponentTarget {
        ComponentTarget::Navigation
    }

    fn on_start(&mut self) {
        self.navigation.prepare_to_move(self.position, self.direction);

        let status = self.base.status().clone();
        self.navigation.engage_movement(Box::new(move |_successful| {
            status.end();
        }));
    }

    fn on_cancel(&mut self) {
        self.navigation.stop_movement();
    }
}
