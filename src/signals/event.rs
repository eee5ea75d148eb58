//! Interaction events and event sources
//!
//! Events mirror what a browser or native UI toolkit reports: pointer motion,
//! clicks, scroll positions, hover enter/leave and key presses. Each carries a
//! millisecond timestamp `t`. Coordinates are optional so malformed producer
//! payloads still deserialize; the collector skips samples it cannot use.

use crate::error::AffectError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Kinds of interaction events a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PointerMove,
    Click,
    Scroll,
    HoverEnter,
    HoverLeave,
    KeyDown,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::PointerMove,
        EventKind::Click,
        EventKind::Scroll,
        EventKind::HoverEnter,
        EventKind::HoverLeave,
        EventKind::KeyDown,
    ];
}

/// A single raw interaction event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    PointerMove {
        t: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
    Click {
        t: f64,
    },
    Scroll {
        t: f64,
        /// Vertical scroll offset in pixels
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
        /// Page scroll progress (0-100), when the producer knows it
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    HoverEnter {
        t: f64,
    },
    HoverLeave {
        t: f64,
    },
    KeyDown {
        t: f64,
    },
}

impl InteractionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InteractionEvent::PointerMove { .. } => EventKind::PointerMove,
            InteractionEvent::Click { .. } => EventKind::Click,
            InteractionEvent::Scroll { .. } => EventKind::Scroll,
            InteractionEvent::HoverEnter { .. } => EventKind::HoverEnter,
            InteractionEvent::HoverLeave { .. } => EventKind::HoverLeave,
            InteractionEvent::KeyDown { .. } => EventKind::KeyDown,
        }
    }

    /// Event timestamp in milliseconds
    pub fn timestamp(&self) -> f64 {
        match *self {
            InteractionEvent::PointerMove { t, .. }
            | InteractionEvent::Click { t }
            | InteractionEvent::Scroll { t, .. }
            | InteractionEvent::HoverEnter { t }
            | InteractionEvent::HoverLeave { t }
            | InteractionEvent::KeyDown { t } => t,
        }
    }

    /// Parse a single event from JSON
    pub fn from_json(json: &str) -> Result<Self, AffectError> {
        serde_json::from_str(json).map_err(|e| AffectError::EventParseError(e.to_string()))
    }

    /// Parse newline-delimited JSON events, skipping blank lines
    pub fn parse_ndjson(input: &str) -> Result<Vec<Self>, AffectError> {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line.trim()).map_err(|e| {
                    AffectError::EventParseError(format!("line {}: {}", index + 1, e))
                })
            })
            .collect()
    }
}

/// Event callback registered on an [`EventSource`].
///
/// Listeners are compared by reference: removing a listener requires the same
/// `Rc` that was added, exactly like DOM `removeEventListener`.
pub type Listener = Rc<dyn Fn(&InteractionEvent)>;

/// Something that interaction listeners can be attached to
pub trait EventSource {
    /// Register `listener` for `kind`. Adding the same listener twice for the
    /// same kind is a no-op.
    fn add_listener(&self, kind: EventKind, listener: Listener);

    /// Remove a previously added listener. Returns whether it was registered.
    fn remove_listener(&self, kind: EventKind, listener: &Listener) -> bool;
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(
        Rc::as_ptr(a) as *const u8,
        Rc::as_ptr(b) as *const u8,
    )
}

/// In-process event source.
///
/// Cloning yields another handle to the same registry. Used by tests, the
/// replay CLI and the FFI layer in place of a real UI toolkit.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<(EventKind, Listener)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every listener registered for its kind.
    ///
    /// Returns the number of listeners invoked. Listeners may add or remove
    /// listeners while being dispatched; changes apply to the next event.
    pub fn dispatch(&self, event: &InteractionEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Total number of registered listeners across all kinds
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of listeners registered for `kind`
    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl EventSource for EventBus {
    fn add_listener(&self, kind: EventKind, listener: Listener) {
        let mut listeners = self.listeners.borrow_mut();
        let exists = listeners
            .iter()
            .any(|(k, l)| *k == kind && same_listener(l, &listener));
        if !exists {
            listeners.push((kind, listener));
        }
    }

    fn remove_listener(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(k, l)| !(*k == kind && same_listener(l, listener)));
        listeners.len() != before
    }
}
