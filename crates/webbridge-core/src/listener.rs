//! Listener registry with set semantics and snapshot fan-out.

use std::rc::Rc;

use serde_json::Value;

/// Host-side capability notified of every inbound message.
pub trait MessageListener {
    fn on_message(&self, kind: &str, payload: Option<&Value>);
}

impl<F> MessageListener for F
where
    F: Fn(&str, Option<&Value>),
{
    fn on_message(&self, kind: &str, payload: Option<&Value>) {
        self(kind, payload)
    }
}

/// Identity of a registration: the allocation, ignoring the vtable.
fn same_listener(a: &Rc<dyn MessageListener>, b: &Rc<dyn MessageListener>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

/// Registered listeners in registration order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Rc<dyn MessageListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add(&mut self, listener: Rc<dyn MessageListener>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, listener: &Rc<dyn MessageListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        self.listeners.len() != before
    }

    pub fn contains(&self, listener: &Rc<dyn MessageListener>) -> bool {
        self.listeners.iter().any(|l| same_listener(l, listener))
    }

    /// Copy of the current registrations, for iteration outside a borrow.
    pub fn snapshot(&self) -> Vec<Rc<dyn MessageListener>> {
        self.listeners.clone()
    }

    /// Deliver one message to every listener registered at call time.
    pub fn dispatch(&self, kind: &str, payload: Option<&Value>) {
        for listener in self.snapshot() {
            listener.on_message(kind, payload);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
