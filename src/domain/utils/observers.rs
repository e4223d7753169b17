use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Runs one subscriber callback and keeps a panic inside it from unwinding into the caller.
///
/// # Returns
/// `true` if the callback returned normally, `false` if it panicked (an error is logged).
pub fn invoke_isolated<F: FnOnce()>(context: &str, callback: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(()) => true,
        Err(payload) => {
            log::error!("Subscriber of '{}' panicked and was skipped: {}", context, panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

/// Multi-subscriber notification list.
///
/// Subscribers are called in registration order. The list is snapshotted before
/// delivery, so a subscriber may subscribe further observers (or trigger another
/// notification of the same list) without invalidating the iteration.
pub struct ObserverList<T> {
    name: &'static str,
    observers: RefCell<Vec<Rc<dyn Fn(&T)>>>,
}

impl<T> ObserverList<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, observers: RefCell::new(Vec::new()) }
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    pub fn notify(&self, args: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self.observers.borrow().clone();

        for observer in snapshot {
            invoke_isolated(self.name, || observer(args));
        }
    }

    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.observers.borrow_mut().clear();
    }
}

impl<T> fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList").field("name", &self.name).field("subscribers", &self.len()).finish()
    }
}
