//! Shared value types for the affective engine
//!
//! These types flow between the collector, extractor, classifier, store and
//! the animation layers. All of them are plain data.

use crate::error::AffectError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse emotional label inferred from interaction telemetry.
///
/// Declaration order is also the tie-break priority when two moods score the
/// same during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodKind {
    #[default]
    Calm,
    Excited,
    Focused,
    Stressed,
    Happy,
    Contemplative,
}

impl MoodKind {
    /// All moods in priority order
    pub const ALL: [MoodKind; 6] = [
        MoodKind::Calm,
        MoodKind::Excited,
        MoodKind::Focused,
        MoodKind::Stressed,
        MoodKind::Happy,
        MoodKind::Contemplative,
    ];

    /// Position in [`MoodKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodKind::Calm => "calm",
            MoodKind::Excited => "excited",
            MoodKind::Focused => "focused",
            MoodKind::Stressed => "stressed",
            MoodKind::Happy => "happy",
            MoodKind::Contemplative => "contemplative",
        }
    }
}

impl fmt::Display for MoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodKind {
    type Err = AffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoodKind::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AffectError::UnknownMood(s.to_string()))
    }
}

/// Qualitative pointer movement label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Erratic,
    #[default]
    Smooth,
    Deliberate,
}

/// Behavioral feature vector recomputed on every analysis tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyzedPatterns {
    /// Mean hover duration (ms)
    pub hover_duration: f64,
    /// Clicks per second across the click window
    pub click_frequency: f64,
    /// Mean scroll velocity (px/ms)
    pub scroll_velocity: f64,
    /// Pointer movement label
    pub movement_pattern: MovementPattern,
    /// Composite stress score (0-1)
    pub stress_level: f64,
    /// Composite engagement score (0-1)
    pub engagement_level: f64,
    /// Composite focus score (0-1)
    pub focus_level: f64,
}

/// A committed classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodRecord {
    pub mood: MoodKind,
    pub timestamp: DateTime<Utc>,
    /// Classifier confidence (0-1)
    pub confidence: f64,
}

/// Animation intensity preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl FromStr for Intensity {
    type Err = AffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            _ => Err(AffectError::UnknownIntensity(s.to_string())),
        }
    }
}

/// Coarse local time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    #[default]
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket a local wall-clock hour: `<12` morning, `<17` afternoon,
    /// `<21` evening, otherwise night
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if h < 12 => TimeOfDay::Morning,
            h if h < 17 => TimeOfDay::Afternoon,
            h if h < 21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = AffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            _ => Err(AffectError::UnknownTimeOfDay(s.to_string())),
        }
    }
}

/// Stage of the user's path through the content and booking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyPhase {
    #[default]
    Discovery,
    Consideration,
    Decision,
    Booking,
}

impl JourneyPhase {
    pub const ALL: [JourneyPhase; 4] = [
        JourneyPhase::Discovery,
        JourneyPhase::Consideration,
        JourneyPhase::Decision,
        JourneyPhase::Booking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JourneyPhase::Discovery => "discovery",
            JourneyPhase::Consideration => "consideration",
            JourneyPhase::Decision => "decision",
            JourneyPhase::Booking => "booking",
        }
    }
}

impl FromStr for JourneyPhase {
    type Err = AffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JourneyPhase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AffectError::UnknownPhase(s.to_string()))
    }
}

/// User-facing animation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub intensity: Intensity,
    /// Free-form colour preference (e.g. "warm", "cool", "auto")
    pub color_preference: String,
    /// Global animation speed factor (1.0 = normal)
    pub animation_speed: f64,
    /// Honour the OS/user reduced-motion setting
    pub reduced_motion: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            intensity: Intensity::Medium,
            color_preference: "auto".to_string(),
            animation_speed: 1.0,
            reduced_motion: false,
        }
    }
}

/// Ambient context for the session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextualState {
    pub time_of_day: TimeOfDay,
    pub session_duration_ms: u64,
    pub current_phase: JourneyPhase,
}

/// Last emotional response triggered by the presentation layer or animator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalResponse {
    pub tag: String,
    pub intensity: f64,
    pub mood: MoodKind,
}

/// Session-scoped emotional state snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionalState {
    pub user_mood: MoodKind,
    pub preferences: Preferences,
    pub interaction_patterns: AnalyzedPatterns,
    pub contextual_state: ContextualState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_response: Option<EmotionalResponse>,
}

/// What caused a mood change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodChangeSource {
    /// Committed by the classifier above the confidence threshold
    Classifier,
    /// Mapped from an emotional response tag
    Response,
    /// Set directly through `update_mood`
    Manual,
}

/// Mood change notification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodChange {
    pub previous: MoodKind,
    pub mood: MoodKind,
    pub confidence: f64,
    pub source: MoodChangeSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_serialization() {
        let json = serde_json::to_string(&MoodKind::Contemplative).unwrap();
        assert_eq!(json, "\"contemplative\"");

        let parsed: MoodKind = serde_json::from_str("\"stressed\"").unwrap();
        assert_eq!(parsed, MoodKind::Stressed);
    }

    #[test]
    fn test_mood_from_str_is_case_insensitive() {
        assert_eq!("Focused".parse::<MoodKind>().unwrap(), MoodKind::Focused);
        assert!(matches!(
            "grumpy".parse::<MoodKind>(),
            Err(AffectError::UnknownMood(_))
        ));
    }

    #[test]
    fn test_mood_priority_order() {
        for (i, mood) in MoodKind::ALL.iter().enumerate() {
            assert_eq!(mood.index(), i);
        }
        assert_eq!(MoodKind::default(), MoodKind::Calm);
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!(
            "booking".parse::<JourneyPhase>().unwrap(),
            JourneyPhase::Booking
        );
        assert!("checkout".parse::<JourneyPhase>().is_err());
    }

    #[test]
    fn test_emotional_state_defaults() {
        let state = EmotionalState::default();
        assert_eq!(state.user_mood, MoodKind::Calm);
        assert_eq!(state.preferences.intensity, Intensity::Medium);
        assert!(!state.preferences.reduced_motion);
        assert_eq!(state.contextual_state.current_phase, JourneyPhase::Discovery);
        assert_eq!(state.contextual_state.session_duration_ms, 0);
    }

    #[test]
    fn test_state_snapshot_serialization() {
        let state = EmotionalState::default();
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["user_mood"], "calm");
        assert_eq!(value["contextual_state"]["current_phase"], "discovery");
        assert_eq!(value["interaction_patterns"]["movement_pattern"], "smooth");
        assert!(value.get("last_response").is_none());
    }
}
