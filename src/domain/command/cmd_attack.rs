use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::{Rc, Weak};

use crate::domain::capability::combat_trait::{AttackCapable, AttackType, Damageable};
use crate::domain::capability::navigation_trait::Navigation;
use crate::domain::command::command_trait::{Command, CommandBase, ComponentTarget};
use crate::domain::utils::geometry::ground_direction;
use crate::domain::utils::id::{AgentId, CommandId};

/// Seconds a maneuver may take before a new one is picked.
pub const MANEUVER_STUCK_TIMEOUT: f32 = 3.0;

/// Share of the attack range maneuver points may lie away from the target.
pub const MANEUVER_RANGE_FACTOR: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackPhase {
    Pursuing,
    Maneuvering,
}

/// Attacks one target until it is dead or no longer valid.
///
/// The agent pursues the target until it is in range, then keeps repositioning to
/// random points around it while firing whenever the attack is ready.
pub struct CmdAttack {
    base: CommandBase,
    navigation: Rc<dyn Navigation>,
    attacker: Rc<dyn AttackCapable>,
    target: Weak<dyn Damageable>,
    attack_type: AttackType,
    rng: StdRng,
    phase: AttackPhase,
    maneuver_started_at: f32,

    /// Arrival flag of the current movement. Replaced for every movement, so a
    /// superseded movement cannot mark the new one as arrived.
    arrived: Rc<Cell<bool>>,
}

impl CmdAttack {
    pub fn new(
        id: CommandId,
        agent: AgentId,
        navigation: Rc<dyn Navigation>,
        attacker: Rc<dyn AttackCapable>,
        target: &Rc<dyn Damageable>,
        attack_type: AttackType,
    ) -> Self {
        Self::with_rng(id, agent, navigation, attacker, target, attack_type, StdRng::from_os_rng())
    }

    /// Same as [`CmdAttack::new`] with reproducible maneuvers.
    pub fn with_seed(
        id: CommandId,
        agent: AgentId,
        navigation: Rc<dyn Navigation>,
        attacker: Rc<dyn AttackCapable>,
        target: &Rc<dyn Damageable>,
        attack_type: AttackType,
        seed: u64,
    ) -> Self {
        Self::with_rng(id, agent, navigation, attacker, target, attack_type, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        id: CommandId,
        agent: AgentId,
        navigation: Rc<dyn Navigation>,
        attacker: Rc<dyn AttackCapable>,
        target: &Rc<dyn Damageable>,
        attack_type: AttackType,
        rng: StdRng,
    ) -> Self {
        CmdAttack {
            base: CommandBase::new(id, agent),
            navigation,
            attacker,
            target: Rc::downgrade(target),
            attack_type,
            rng,
            phase: AttackPhase::Pursuing,
            maneuver_started_at: 0.0,
            arrived: Rc::new(Cell::new(false)),
        }
    }

    fn valid_target(&self) -> Option<Rc<dyn Damageable>> {
        let target = self.target.upgrade()?;
        (target.is_alive() && self.attacker.is_valid_target(target.as_ref(), self.attack_type)).then_some(target)
    }

    fn engage(&mut self) {
        let arrived = Rc::new(Cell::new(false));
        self.arrived = arrived.clone();
        self.navigation.engage_movement(Box::new(move |successful| arrived.set(successful)));
    }

    fn pursue(&mut self, target: Rc<dyn Damageable>) {
        self.phase = AttackPhase::Pursuing;
        self.navigation.prepare_to_pursuit(target, Vec3::ZERO, 0.0);
        self.engage();
    }

    fn start_maneuver(&mut self, target: &Rc<dyn Damageable>, time: f32) {
        let inner = target.get_radius();
        let outer = (self.attacker.get_attack_range(target.as_ref(), self.attack_type) * MANEUVER_RANGE_FACTOR).max(inner);
        let distance = if outer > inner { self.rng.random_range(inner..outer) } else { inner };
        let angle = self.rng.random_range(0.0..TAU);

        let point = target.position() + ground_direction(angle) * distance;
        let facing = (target.position() - point).normalize_or_zero();

        self.phase = AttackPhase::Maneuvering;
        self.maneuver_started_at = time;
        self.navigation.prepare_to_move(point, facing);
        self.engage();
    }
}

impl Command for CmdAttack {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "CmdAttack"
    }

    fn component_target(&self) -> ComponentTarget {
        ComponentTarget::AttackCapable
    }

    fn on_start(&mut self) {
        match self.valid_target() {
            Some(target) => self.pursue(target),
            None => self.end(),
        }
    }

    fn on_update(&mut self, time: f32) {
        let Some(target) = self.valid_target() else {
            log::debug!("{} {}: target gone.", self.name(), self.id());
            self.navigation.stop_movement();
            self.end();
            return;
        };

        let in_range = self.attacker.is_in_attack_range(target.as_ref(), self.attack_type);
        if in_range && self.attacker.can_use_attack(self.attack_type) {
            self.attacker.attack(&target, self.attack_type);
        }

        match self.phase {
            AttackPhase::Pursuing => {
                if in_range {
                    self.start_maneuver(&target, time);
                } else if self.arrived.get() {
                    // Pursuit reached the target without getting in range, keep following.
                    self.pursue(target);
                }
            }
            AttackPhase::Maneuvering => {
                let stuck = time - self.maneuver_started_at > MANEUVER_STUCK_TIMEOUT;
                if !self.arrived.get() && !stuck {
                    return;
                }
                if in_range {
                    self.start_maneuver(&target, time);
                } else {
                    self.pursue(target);
                }
            }
        }
    }

    fn on_cancel(&mut self) {
        self.navigation.stop_movement();
    }
}
