//! Interaction signal capture
//!
//! This module owns the raw side of the affective pipeline: interaction events
//! arrive from an injectable [`EventSource`], and the [`SignalCollector`]
//! appends one sample per event into bounded recency windows.
//!
//! Pipeline: EventSource → SignalCollector → InteractionWindow → (tick) FeatureExtractor

pub mod collector;
pub mod event;
pub mod window;

pub use collector::SignalCollector;
pub use event::{EventBus, EventKind, EventSource, InteractionEvent, Listener};
pub use window::{BoundedWindow, InteractionWindow, PointerSample};
