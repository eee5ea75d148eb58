//! Error types for Synheart Affect
//!
//! The affective core itself is total: extraction, classification, preset
//! resolution and store updates never fail. These errors only surface at the
//! edges (configuration, event parsing, FFI and CLI input).

use thiserror::Error;

/// Errors that can occur at the engine boundary
#[derive(Debug, Error)]
pub enum AffectError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse interaction event: {0}")]
    EventParseError(String),

    #[error("Unknown mood: {0}")]
    UnknownMood(String),

    #[error("Unknown intensity: {0}")]
    UnknownIntensity(String),

    #[error("Unknown content category: {0}")]
    UnknownCategory(String),

    #[error("Unknown journey phase: {0}")]
    UnknownPhase(String),

    #[error("Unknown time of day: {0}")]
    UnknownTimeOfDay(String),

    #[error("Engine is not attached to an event source")]
    NotAttached,
}
