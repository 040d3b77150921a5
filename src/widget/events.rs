//! Widget events and listener bookkeeping
//!
//! Listeners are registered by name (`"keypress"`, `"textchange"`, ...) and
//! always run on the UI thread.

use crate::error::panic_message;
use log::{debug, error};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

pub const KEY_EVENTS: &[&str] = &["keypress", "keyrelease", "keytype"];
pub const MOUSE_EVENTS: &[&str] = &["mousepress", "mouserelease"];
pub const TEXT_CHANGE_EVENT: &str = "textchange";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Key,
    Mouse,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    KeyPressed { key: char },
    KeyReleased { key: char },
    KeyTyped { key: char },
    MousePressed { button: u32, x: f64, y: f64 },
    MouseReleased { button: u32, x: f64, y: f64 },
    TextChanged,
}

impl EventKind {
    pub fn class(&self) -> EventClass {
        match self {
            EventKind::KeyPressed { .. }
            | EventKind::KeyReleased { .. }
            | EventKind::KeyTyped { .. } => EventClass::Key,
            EventKind::MousePressed { .. } | EventKind::MouseReleased { .. } => EventClass::Mouse,
            EventKind::TextChanged => EventClass::Change,
        }
    }

    /// The listener name this kind of event is delivered to.
    pub fn listener_name(&self) -> &'static str {
        match self {
            EventKind::KeyPressed { .. } => "keypress",
            EventKind::KeyReleased { .. } => "keyrelease",
            EventKind::KeyTyped { .. } => "keytype",
            EventKind::MousePressed { .. } => "mousepress",
            EventKind::MouseReleased { .. } => "mouserelease",
            EventKind::TextChanged => TEXT_CHANGE_EVENT,
        }
    }
}

/// An event fired by a widget.
#[derive(Debug, Clone)]
pub struct GuiEvent {
    pub kind: EventKind,
    pub source_id: u64,
    pub action_command: String,
    consumed: Cell<bool>,
}

impl GuiEvent {
    pub fn new(kind: EventKind, source_id: u64, action_command: impl Into<String>) -> Self {
        Self {
            kind,
            source_id,
            action_command: action_command.into(),
            consumed: Cell::new(false),
        }
    }

    pub fn class(&self) -> EventClass {
        self.kind.class()
    }

    pub fn name(&self) -> &'static str {
        self.kind.listener_name()
    }

    /// Stop the widget from applying its default handling of this event.
    pub fn consume(&self) {
        self.consumed.set(true);
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }
}

/// A user callback. Sent from the registering thread, run on the UI thread.
pub type Listener = Box<dyn FnMut(&GuiEvent) + Send + 'static>;

pub type SharedListener = Rc<RefCell<Listener>>;

/// Listener table of one widget. Lives on the UI thread.
#[derive(Default)]
pub struct EventListeners {
    by_name: HashMap<&'static str, SharedListener>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, listener: Listener) {
        self.set_many(&[name], listener);
    }

    /// Register one listener under several names.
    pub fn set_many(&mut self, names: &[&'static str], listener: Listener) {
        let shared = Rc::new(RefCell::new(listener));
        for name in names {
            self.by_name.insert(*name, Rc::clone(&shared));
        }
    }

    pub fn remove_many(&mut self, names: &[&str]) {
        for name in names {
            self.by_name.remove(*name);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<SharedListener> {
        self.by_name.get(name).cloned()
    }
}

/// Invoke a listener, isolating panics and skipping reentrant calls.
///
/// The table must not be borrowed while this runs, so listeners are free to
/// register or remove listeners themselves.
pub fn invoke(listener: &SharedListener, event: &GuiEvent) {
    let Ok(mut callback) = listener.try_borrow_mut() else {
        debug!("Skipping reentrant '{}' listener", event.name());
        return;
    };
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| (*callback)(event))) {
        error!(
            "'{}' listener panicked: {}",
            event.name(),
            panic_message(payload.as_ref())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn names_follow_kind() {
        let press = EventKind::KeyPressed { key: 'a' };
        assert_eq!(press.listener_name(), "keypress");
        assert_eq!(press.class(), EventClass::Key);
        assert_eq!(EventKind::TextChanged.class(), EventClass::Change);
        let click = EventKind::MousePressed { button: 1, x: 0.0, y: 0.0 };
        assert_eq!(click.class(), EventClass::Mouse);
    }

    #[test]
    fn mouse_events_compare_by_position() {
        let at = |x| EventKind::MouseReleased { button: 1, x, y: 2.5 };
        assert_eq!(at(1.5), at(1.5));
        assert_ne!(at(1.5), at(1.75));
        assert_ne!(at(1.5), EventKind::TextChanged);
    }

    #[test]
    fn shared_listener_serves_every_name() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut listeners = EventListeners::new();
        listeners.set_many(
            KEY_EVENTS,
            Box::new(move |e: &GuiEvent| sink.lock().unwrap().push(e.name())),
        );

        for kind in [
            EventKind::KeyPressed { key: 'x' },
            EventKind::KeyTyped { key: 'x' },
        ] {
            let event = GuiEvent::new(kind, 1, "");
            invoke(&listeners.lookup(event.name()).unwrap(), &event);
        }
        assert_eq!(*seen.lock().unwrap(), vec!["keypress", "keytype"]);

        listeners.remove_many(KEY_EVENTS);
        assert!(!listeners.has("keypress"));
    }

    #[test]
    fn panicking_listener_is_contained() {
        let mut listeners = EventListeners::new();
        listeners.set(TEXT_CHANGE_EVENT, Box::new(|_: &GuiEvent| panic!("listener bug")));
        let event = GuiEvent::new(EventKind::TextChanged, 1, "");
        invoke(&listeners.lookup(TEXT_CHANGE_EVENT).unwrap(), &event);
        // Still callable afterwards.
        invoke(&listeners.lookup(TEXT_CHANGE_EVENT).unwrap(), &event);
    }
}
