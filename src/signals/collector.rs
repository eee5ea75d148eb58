//! Signal collector
//!
//! Attaches to an [`EventSource`] and turns raw interaction events into window
//! samples. Capture only: no feature computation happens here.
//!
//! The listener references registered at attach time are kept and handed back
//! to the source on detach, so detaching always unregisters exactly what was
//! registered.

use crate::config::WindowCapacities;
use crate::signals::event::{EventKind, EventSource, InteractionEvent, Listener};
use crate::signals::window::{BoundedWindow, InteractionWindow, PointerSample};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Capture state shared between the collector and its listeners
#[derive(Debug)]
struct CaptureState {
    window: InteractionWindow,
    /// Timestamp of the pending hover-enter, if any
    hover_started_at: Option<f64>,
    /// Last scroll offset and its timestamp, for velocity
    last_scroll: Option<(f64, f64)>,
    /// Page progress (0-100) reported by scroll events, not yet consumed
    pending_progress: BoundedWindow<f64>,
    /// Events ignored because they lacked usable data
    skipped: u64,
}

impl CaptureState {
    fn new(capacities: &WindowCapacities) -> Self {
        Self {
            window: InteractionWindow::new(capacities),
            hover_started_at: None,
            last_scroll: None,
            pending_progress: BoundedWindow::new(capacities.scroll),
            skipped: 0,
        }
    }

    fn reset(&mut self) {
        self.window.clear();
        self.hover_started_at = None;
        self.last_scroll = None;
        self.pending_progress.clear();
        self.skipped = 0;
    }

    fn record(&mut self, event: &InteractionEvent) {
        let t = event.timestamp();
        if !t.is_finite() {
            self.skipped += 1;
            return;
        }

        match *event {
            InteractionEvent::PointerMove { x, y, .. } => match (x, y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                    self.window.pointer.push(PointerSample { x, y, t });
                }
                _ => self.skipped += 1,
            },
            InteractionEvent::Click { .. } => {
                self.window.clicks.push(t);
            }
            InteractionEvent::Scroll { y, progress, .. } => {
                let progress = progress.filter(|p| p.is_finite());
                if let Some(progress) = progress {
                    self.pending_progress.push(progress);
                }
                match y {
                    Some(y) if y.is_finite() => {
                        if let Some((last_y, last_t)) = self.last_scroll {
                            let elapsed = t - last_t;
                            if elapsed > 0.0 {
                                self.window.scroll_velocity.push((y - last_y).abs() / elapsed);
                            }
                        }
                        self.last_scroll = Some((y, t));
                    }
                    // Progress-only events still carry journey input
                    _ if progress.is_some() => {}
                    _ => self.skipped += 1,
                }
            }
            InteractionEvent::HoverEnter { .. } => {
                self.hover_started_at = Some(t);
            }
            InteractionEvent::HoverLeave { .. } => match self.hover_started_at.take() {
                Some(start) if t >= start => {
                    self.window.hover_durations.push(t - start);
                }
                _ => self.skipped += 1,
            },
            InteractionEvent::KeyDown { .. } => {
                self.window.keystrokes.push(t);
            }
        }
    }
}

/// Listeners registered on a source, kept for exact removal
struct Attachment {
    source: Rc<dyn EventSource>,
    listeners: Vec<(EventKind, Listener)>,
}

/// Captures interaction events into bounded windows
pub struct SignalCollector {
    state: Rc<RefCell<CaptureState>>,
    attachment: Option<Attachment>,
}

impl Default for SignalCollector {
    fn default() -> Self {
        Self::new(&WindowCapacities::default())
    }
}

impl SignalCollector {
    pub fn new(capacities: &WindowCapacities) -> Self {
        Self {
            state: Rc::new(RefCell::new(CaptureState::new(capacities))),
            attachment: None,
        }
    }

    /// Register one listener per event kind on `source`.
    ///
    /// Returns `false` without touching the source if already attached.
    pub fn attach(&mut self, source: Rc<dyn EventSource>) -> bool {
        if self.attachment.is_some() {
            log::debug!("signal collector already attached; ignoring attach");
            return false;
        }

        let listeners: Vec<(EventKind, Listener)> = EventKind::ALL
            .into_iter()
            .map(|kind| (kind, self.make_listener()))
            .collect();

        for (kind, listener) in &listeners {
            source.add_listener(*kind, Rc::clone(listener));
        }

        log::debug!("signal collector attached ({} listeners)", listeners.len());
        self.attachment = Some(Attachment { source, listeners });
        true
    }

    /// Remove every listener added by [`attach`](Self::attach) and drop the
    /// captured samples. Safe to call when never attached or twice.
    ///
    /// Returns `false` if there was nothing to detach.
    pub fn detach(&mut self) -> bool {
        let Some(attachment) = self.attachment.take() else {
            return false;
        };

        let mut removed = 0;
        for (kind, listener) in &attachment.listeners {
            if attachment.source.remove_listener(*kind, listener) {
                removed += 1;
            }
        }
        if removed != attachment.listeners.len() {
            log::warn!(
                "signal collector detached {} of {} listeners; source dropped the rest",
                removed,
                attachment.listeners.len()
            );
        }

        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.reset();
        }
        log::debug!("signal collector detached");
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Record an event directly, bypassing any event source
    pub fn record(&self, event: &InteractionEvent) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.record(event);
        }
    }

    /// Copy of the current windows
    pub fn snapshot(&self) -> InteractionWindow {
        self.state.borrow().window.clone()
    }

    /// Take the scroll progress values captured since the last call, in
    /// arrival order
    pub fn take_scroll_progress(&self) -> Vec<f64> {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.pending_progress.drain(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of events ignored for missing or invalid data
    pub fn skipped_events(&self) -> u64 {
        self.state.borrow().skipped
    }

    fn make_listener(&self) -> Listener {
        let state: Weak<RefCell<CaptureState>> = Rc::downgrade(&self.state);
        Rc::new(move |event: &InteractionEvent| {
            let Some(state) = state.upgrade() else {
                return;
            };
            // A re-entrant dispatch would already hold the borrow; drop the sample.
            if let Ok(mut state) = state.try_borrow_mut() {
                state.record(event);
            };
        })
    }
}

impl Drop for SignalCollector {
    fn drop(&mut self) {
        self.detach();
    }
}
