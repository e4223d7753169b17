use glam::Vec3;
use std::rc::Rc;

use crate::domain::capability::combat_trait::Damageable;

/// Completion callback of one engaged movement, `true` if the destination was reached.
pub type MovementCallback = Box<dyn FnOnce(bool)>;

/// Movement capability of an agent.
///
/// A movement is configured with `prepare_to_move` or `prepare_to_pursuit` and started
/// with `engage_movement`. Implementations must not hold internal borrows while they
/// run a callback or a destination listener, because both may call straight back into
/// the navigation.
pub trait Navigation {
    fn prepare_to_move(&self, position: Vec3, direction: Vec3);

    /// Follows `target` at `offset`, `velocity_hint` is the expected target speed.
    fn prepare_to_pursuit(&self, target: Rc<dyn Damageable>, offset: Vec3, velocity_hint: f32);

    /// Starts the prepared movement. A still running movement is superseded and its
    /// callback completes with `false`.
    fn engage_movement(&self, on_complete: MovementCallback);

    /// Stops without completing the pending callback.
    fn stop_movement(&self);

    /// Called whenever a new destination is prepared.
    fn subscribe_destination_changed(&self, listener: Box<dyn Fn()>);

    fn base_position(&self) -> Vec3;

    fn speed(&self) -> f32;
}
