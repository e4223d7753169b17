use glam::Vec3;
use std::rc::Rc;

use crate::domain::capability::combat_trait::{AttackCapable, AttackType, TargetScanner};
use crate::domain::capability::navigation_trait::Navigation;
use crate::domain::command::auto_attack::attack_nearest_valid_target_in_range;
use crate::domain::command::command_trait::{Command, CommandBase, ComponentTarget};
use crate::domain::utils::id::{AgentId, CommandId};

/// Moves to a point and fires at whatever valid target comes into range on the way.
pub struct CmdAttackMove {
    base: CommandBase,
    navigation: Rc<dyn Navigation>,
    attacker: Rc<dyn AttackCapable>,
    scanner: Rc<dyn TargetScanner>,
    attack_type: AttackType,
    position: Vec3,
    direction: Vec3,
}

impl CmdAttackMove {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CommandId,
        agent: AgentId,
        navigation: Rc<dyn Navigation>,
        attacker: Rc<dyn AttackCapable>,
        scanner: Rc<dyn TargetScanner>,
        attack_type: AttackType,
        position: Vec3,
        direction: Vec3,
    ) -> Self {
        CmdAttackMove { base: CommandBase::new(id, agent), navigation, attacker, scanner, attack_type, position, direction }
    }
}

impl Command for CmdAttackMove {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "CmdAttackMove"
    }

    fn component_target(&self) -> ComponentTarget {
        ComponentTarget::AttackCapable
    }

    fn on_start(&mut self) {
        self.navigation.prepare_to_move(self.position, self.direction);

        let status = self.base.status().clone();
        self.navigation.engage_movement(Box::new(move |_successful| {
            status.end();
        }));
    }

    fn on_update(&mut self, _time: f32) {
        attack_nearest_valid_target_in_range(self.attacker.as_ref(), self.scanner.as_ref(), self.attack_type, self.navigation.base_position());
    }

    fn on_cancel(&mut self) {
        self.navigation.stop_movement();
    }
}
