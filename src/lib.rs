//! Synheart Affect - On-device affective interaction engine
//!
//! Affect observes raw UI interaction signals and turns them into a coarse,
//! low-confidence emotional state that a presentation layer can react to:
//! signal capture → feature extraction → mood classification → state store
//! → presets and journey animation directives.
//!
//! ## Modules
//!
//! - **Signals**: Bounded interaction windows fed by an injectable event source
//! - **Classification**: Behavioral features, mood scoring with momentum and confidence gating
//! - **Presentation decisions**: Category presets and per-phase animation directives
//!
//! The engine never renders anything. It decides parameters; the host applies them.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod journey;
pub mod preset;
pub mod scheduler;
pub mod signals;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::{Classification, MoodClassifier, MoodHistory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{AffectEngine, TickReport};
pub use error::AffectError;
pub use features::FeatureExtractor;
pub use journey::{AnimationCommand, JourneyAnimator};
pub use preset::{ContentCategory, EmotionalPreset, PresetResolver};
pub use signals::{EventBus, EventSource, InteractionEvent, SignalCollector};
pub use store::EmotionalStateStore;
pub use types::{AnalyzedPatterns, EmotionalState, MoodKind};

/// Library version
pub const AFFECT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and diagnostics
pub const PRODUCER_NAME: &str = "synheart-affect";
