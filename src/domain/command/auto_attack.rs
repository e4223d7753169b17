use glam::Vec3;
use std::rc::Rc;

use crate::domain::capability::combat_trait::{AttackCapable, AttackType, Damageable, TargetScanner};
use crate::domain::utils::geometry::planar_distance;

/// Attacks the nearest living, valid target that is already in range.
///
/// # Returns
/// The attacked target, `None` if the attack is cooling down or nothing is in range.
pub fn attack_nearest_valid_target_in_range(
    attacker: &dyn AttackCapable,
    scanner: &dyn TargetScanner,
    attack_type: AttackType,
    from: Vec3,
) -> Option<Rc<dyn Damageable>> {
    if !attacker.can_use_attack(attack_type) {
        return None;
    }

    let target = scanner
        .potential_targets()
        .into_iter()
        .filter(|target| target.is_alive())
        .filter(|target| attacker.is_valid_target(target.as_ref(), attack_type) && attacker.is_in_attack_range(target.as_ref(), attack_type))
        .min_by(|a, b| planar_distance(from, a.position()).total_cmp(&planar_distance(from, b.position())))?;

    log::trace!("Auto attack on {} with attack type {}.", target.id(), attack_type);
    attacker.attack(&target, attack_type);
    Some(target)
}
