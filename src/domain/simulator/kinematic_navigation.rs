use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::capability::combat_trait::Damageable;
use crate::domain::capability::navigation_trait::{MovementCallback, Navigation};
use crate::domain::utils::geometry::{ARRIVAL_TOLERANCE, planar_direction, planar_distance};
use crate::domain::utils::id::AgentId;
use crate::domain::utils::observers::ObserverList;

enum Destination {
    Point { position: Vec3, direction: Vec3 },
    Pursuit { target: Rc<dyn Damageable>, offset: Vec3 },
}

impl Destination {
    fn goal(&self) -> Vec3 {
        match self {
            Destination::Point { position, .. } => *position,
            Destination::Pursuit { target, offset } => target.position() + *offset,
        }
    }
}

struct KinematicState {
    position: Vec3,
    facing: Vec3,
    speed: f32,
    prepared: Option<Destination>,
    active: Option<(Destination, MovementCallback)>,
}

/// Straight-line mover for headless runs: no obstacles, constant speed, instant turns.
pub struct KinematicNavigation {
    agent: AgentId,
    state: RefCell<KinematicState>,
    destination_changed: ObserverList<()>,
}

impl KinematicNavigation {
    pub fn new(agent: AgentId, position: Vec3, speed: f32) -> Rc<KinematicNavigation> {
        Rc::new(KinematicNavigation {
            agent,
            state: RefCell::new(KinematicState { position, facing: Vec3::X, speed, prepared: None, active: None }),
            destination_changed: ObserverList::new("DestinationChanged"),
        })
    }

    pub fn facing(&self) -> Vec3 {
        self.state.borrow().facing
    }

    pub fn is_moving(&self) -> bool {
        self.state.borrow().active.is_some()
    }

    /// Moves the agent `delta_time` seconds along its active movement and runs the
    /// completion callback on arrival, or with `false` if a pursued target died.
    pub fn advance(&self, delta_time: f32) {
        let finished = {
            let mut state = self.state.borrow_mut();
            let target_lost = match state.active.as_ref() {
                None => return,
                Some((Destination::Pursuit { target, .. }, _)) => !target.is_alive(),
                Some(_) => false,
            };

            if target_lost {
                log::debug!("Agent {} lost its pursuit target.", self.agent);
                state.active.take().map(|(_, callback)| (callback, false))
            } else {
                Self::step(&mut state, delta_time)
            }
        };

        if let Some((callback, successful)) = finished {
            callback(successful);
        }
    }

    fn step(state: &mut KinematicState, delta_time: f32) -> Option<(MovementCallback, bool)> {
        let (goal, final_direction) = match state.active.as_ref() {
            Some((Destination::Point { position, direction }, _)) => (*position, *direction),
            Some((destination, _)) => (destination.goal(), Vec3::ZERO),
            None => return None,
        };

        let remaining = planar_distance(state.position, goal);
        let reach = state.speed * delta_time;

        if remaining > reach + ARRIVAL_TOLERANCE {
            let heading = planar_direction(state.position, goal);
            state.position += heading * reach;
            state.facing = heading;
            return None;
        }

        state.position = Vec3::new(goal.x, state.position.y, goal.z);
        if final_direction != Vec3::ZERO {
            state.facing = final_direction.normalize();
        }
        state.active.take().map(|(_, callback)| (callback, true))
    }

    fn prepare(&self, destination: Destination) {
        self.state.borrow_mut().prepared = Some(destination);
        self.destination_changed.notify(&());
    }
}

impl Navigation for KinematicNavigation {
    fn prepare_to_move(&self, position: Vec3, direction: Vec3) {
        self.prepare(Destination::Point { position, direction });
    }

    fn prepare_to_pursuit(&self, target: Rc<dyn Damageable>, offset: Vec3, _velocity_hint: f32) {
        self.prepare(Destination::Pursuit { target, offset });
    }

    fn engage_movement(&self, on_complete: MovementCallback) {
        let superseded = {
            let mut state = self.state.borrow_mut();
            let prepared = state.prepared.take();
            match prepared {
                Some(destination) => state.active.replace((destination, on_complete)).map(|(_, callback)| callback),
                None => {
                    log::warn!("Agent {} engaged movement without a destination.", self.agent);
                    drop(state);
                    on_complete(false);
                    return;
                }
            }
        };

        if let Some(superseded) = superseded {
            superseded(false);
        }
    }

    fn stop_movement(&self) {
        let stopped = self.state.borrow_mut().active.take();
        drop(stopped);
    }

    fn subscribe_destination_changed(&self, listener: Box<dyn Fn()>) {
        self.destination_changed.subscribe(move |_| listener());
    }

    fn base_position(&self) -> Vec3 {
        self.state.borrow().position
    }

    fn speed(&self) -> f32 {
        self.state.borrow().speed
    }
}
