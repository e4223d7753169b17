use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::capability::combat_trait::Damageable;
use crate::domain::capability::navigation_trait::{MovementCallback, Navigation};
use crate::domain::utils::observers::ObserverList;

#[derive(Default)]
struct MockNavigationState {
    position: Vec3,
    speed: f32,
    destination: Option<(Vec3, Vec3)>,
    pending: Option<MovementCallback>,
    requests: Vec<(Vec3, Vec3)>,
    stop_count: usize,
}

/// Navigation whose movements only complete when a test calls [`MockNavigation::complete`].
pub struct MockNavigation {
    state: RefCell<MockNavigationState>,
    destination_changed: ObserverList<()>,
}

impl MockNavigation {
    pub fn new(position: Vec3) -> Rc<MockNavigation> {
        Rc::new(MockNavigation {
            state: RefCell::new(MockNavigationState { position, speed: 1.0, ..Default::default() }),
            destination_changed: ObserverList::new("DestinationChanged"),
        })
    }

    /// Every prepared destination, oldest first.
    pub fn requests(&self) -> Vec<(Vec3, Vec3)> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    pub fn last_destination(&self) -> Option<Vec3> {
        self.state.borrow().destination.map(|(position, _)| position)
    }

    pub fn has_pending_movement(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    pub fn stop_count(&self) -> usize {
        self.state.borrow().stop_count
    }

    pub fn set_position(&self, position: Vec3) {
        self.state.borrow_mut().position = position;
    }

    /// Completes the engaged movement. On success the agent stands at the destination.
    ///
    /// # Returns
    /// `false` if no movement was pending.
    pub fn complete(&self, successful: bool) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            if successful {
                if let Some((position, _)) = state.destination {
                    state.position = position;
                }
            }
            state.pending.take()
        };

        match callback {
            Some(callback) => {
                callback(successful);
                true
            }
            None => false,
        }
    }
}

impl Navigation for MockNavigation {
    fn prepare_to_move(&self, position: Vec3, direction: Vec3) {
        {
            let mut state = self.state.borrow_mut();
            state.destination = Some((position, direction));
            state.requests.push((position, direction));
        }
        self.destination_changed.notify(&());
    }

    fn prepare_to_pursuit(&self, target: Rc<dyn Damageable>, offset: Vec3, _velocity_hint: f32) {
        self.prepare_to_move(target.position() + offset, Vec3::ZERO);
    }

    fn engage_movement(&self, on_complete: MovementCallback) {
        let superseded = self.state.borrow_mut().pending.replace(on_complete);
        if let Some(superseded) = superseded {
            superseded(false);
        }
    }

    fn stop_movement(&self) {
        let mut state = self.state.borrow_mut();
        state.pending = None;
        state.stop_count += 1;
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
