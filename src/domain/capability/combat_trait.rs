use glam::Vec3;
use std::rc::Rc;

use crate::domain::utils::id::AgentId;

/// Index into the attack types of an [`AttackCapable`].
pub type AttackType = usize;

pub trait Damageable {
    fn id(&self) -> &AgentId;

    fn is_alive(&self) -> bool;

    fn get_radius(&self) -> f32;

    fn position(&self) -> Vec3;
}

pub trait AttackCapable {
    fn is_valid_target(&self, target: &dyn Damageable, attack_type: AttackType) -> bool;

    fn is_in_attack_range(&self, target: &dyn Damageable, attack_type: AttackType) -> bool;

    /// `false` while the attack is cooling down.
    fn can_use_attack(&self, attack_type: AttackType) -> bool;

    fn attack(&self, target: &Rc<dyn Damageable>, attack_type: AttackType);

    fn get_attack_range(&self, target: &dyn Damageable, attack_type: AttackType) -> f32;

    /// Center distance at which `target` is exactly at attack range.
    fn get_attack_distance(&self, target: &dyn Damageable, attack_type: AttackType) -> f32;
}

/// Source of attack candidates around an agent.
pub trait TargetScanner {
    fn potential_targets(&self) -> Vec<Rc<dyn Damageable>>;
}
