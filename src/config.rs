//! Engine configuration
//!
//! All fields default to the values the affective engine was tuned with, so an
//! empty JSON object (`{}`) is a valid configuration.

use crate::error::AffectError;
use serde::{Deserialize, Serialize};

/// Default analysis tick (feature extraction + classification)
pub const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 2_000;

/// Default session duration tick
pub const DEFAULT_SESSION_TICK_MS: u64 = 1_000;

/// Default wall-clock time-of-day refresh
pub const DEFAULT_TIME_OF_DAY_REFRESH_MS: u64 = 60_000;

/// Upper bound for every timer interval (one day)
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// Classifications must score strictly above this to be committed
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Default mood history length
pub const DEFAULT_MOOD_HISTORY_CAPACITY: usize = 10;

/// Default number of recent history entries considered for momentum
pub const DEFAULT_MOMENTUM_LOOKBACK: usize = 3;

/// Capacities of the five interaction windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowCapacities {
    /// Pointer samples `{x, y, t}`
    pub pointer: usize,
    /// Click timestamps
    pub clicks: usize,
    /// Scroll velocity samples (px/ms)
    pub scroll: usize,
    /// Hover duration samples (ms)
    pub hover: usize,
    /// Keystroke timestamps
    pub keystrokes: usize,
}

impl Default for WindowCapacities {
    fn default() -> Self {
        Self {
            pointer: 50,
            clicks: 20,
            scroll: 20,
            hover: 20,
            keystrokes: 30,
        }
    }
}

/// Configuration for [`crate::engine::AffectEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval of the analysis tick in milliseconds
    pub analysis_interval_ms: u64,
    /// Interval of the session duration counter in milliseconds
    pub session_tick_ms: u64,
    /// Interval of the time-of-day refresh in milliseconds
    pub time_of_day_refresh_ms: u64,
    /// Minimum (exclusive) confidence for a mood commit
    pub confidence_threshold: f64,
    /// Number of committed mood records retained
    pub mood_history_capacity: usize,
    /// Number of most recent records used for momentum
    pub momentum_lookback: usize,
    /// Interaction window capacities
    pub capacities: WindowCapacities,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis_interval_ms: DEFAULT_ANALYSIS_INTERVAL_MS,
            session_tick_ms: DEFAULT_SESSION_TICK_MS,
            time_of_day_refresh_ms: DEFAULT_TIME_OF_DAY_REFRESH_MS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            mood_history_capacity: DEFAULT_MOOD_HISTORY_CAPACITY,
            momentum_lookback: DEFAULT_MOMENTUM_LOOKBACK,
            capacities: WindowCapacities::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AffectError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, AffectError> {
        serde_json::to_string_pretty(self).map_err(AffectError::JsonError)
    }

    /// Check that intervals and capacities are usable
    pub fn validate(&self) -> Result<(), AffectError> {
        let intervals = [
            ("analysis_interval_ms", self.analysis_interval_ms),
            ("session_tick_ms", self.session_tick_ms),
            ("time_of_day_refresh_ms", self.time_of_day_refresh_ms),
        ];
        for (name, interval) in intervals {
            if interval == 0 || interval > MAX_INTERVAL_MS {
                return Err(AffectError::InvalidConfig(format!(
                    "{name} must be within 1..={MAX_INTERVAL_MS}, got {interval}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AffectError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.mood_history_capacity == 0 {
            return Err(AffectError::InvalidConfig(
                "mood_history_capacity must be greater than zero".to_string(),
            ));
        }

        let caps = &self.capacities;
        let named = [
            ("pointer", caps.pointer),
            ("clicks", caps.clicks),
            ("scroll", caps.scroll),
            ("hover", caps.hover),
            ("keystrokes", caps.keystrokes),
        ];
        for (name, cap) in named {
            if cap == 0 {
                return Err(AffectError::InvalidConfig(format!(
                    "capacities.{name} must be greater than zero"
                )));
            }
        }

        if self.momentum_lookback > self.mood_history_capacity {
            log::warn!(
                "momentum_lookback ({}) exceeds mood_history_capacity ({}); only retained records are used",
                self.momentum_lookback,
                self.mood_history_capacity
            );
        }

        Ok(())
    }
}
