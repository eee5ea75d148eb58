//! Emotional state store
//!
//! Session-scoped owner of [`EmotionalState`]. All mutation goes through the
//! update methods below, each a shallow merge into one sub-record. Updates are
//! total and synchronous; mood changes are pushed to subscribers.

use crate::types::{
    AnalyzedPatterns, ContextualState, EmotionalResponse, EmotionalState, Intensity, JourneyPhase,
    MoodChange, MoodChangeSource, MoodKind, MoodRecord, TimeOfDay,
};
use serde::{Deserialize, Serialize};

/// Handle returned by [`EmotionalStateStore::subscribe`]
pub type SubscriptionId = u64;

type MoodListener = Box<dyn FnMut(&MoodChange)>;

/// Partial update for [`crate::types::Preferences`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesUpdate {
    pub intensity: Option<Intensity>,
    pub color_preference: Option<String>,
    pub animation_speed: Option<f64>,
    pub reduced_motion: Option<bool>,
}

/// Partial update for [`ContextualState`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextualStateUpdate {
    pub time_of_day: Option<TimeOfDay>,
    pub session_duration_ms: Option<u64>,
    pub current_phase: Option<JourneyPhase>,
}

/// Map a free-form response tag to a mood. Unrecognized tags map to calm.
pub fn mood_for_response(tag: &str) -> MoodKind {
    match tag.trim().to_ascii_lowercase().as_str() {
        "excited" | "excitement" => MoodKind::Excited,
        "contemplating" | "contemplative" => MoodKind::Contemplative,
        "stressed" | "anxious" => MoodKind::Stressed,
        "focused" | "focusing" => MoodKind::Focused,
        "happy" | "celebrating" => MoodKind::Happy,
        _ => MoodKind::Calm,
    }
}

/// Owner of the session's emotional state
#[derive(Default)]
pub struct EmotionalStateStore {
    state: EmotionalState,
    listeners: Vec<(SubscriptionId, MoodListener)>,
    next_subscription: SubscriptionId,
}

impl std::fmt::Debug for EmotionalStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionalStateStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EmotionalStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, e.g. preferences restored by the host
    pub fn with_state(state: EmotionalState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &EmotionalState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> EmotionalState {
        self.state.clone()
    }

    pub fn mood(&self) -> MoodKind {
        self.state.user_mood
    }

    /// Set the mood directly. Notifies only when the mood actually changes.
    pub fn update_mood(&mut self, mood: MoodKind) -> bool {
        self.set_mood(mood, 1.0, MoodChangeSource::Manual)
    }

    /// Apply a classifier commit. Every commit is announced, including
    /// re-commits of the current mood, so consumers see the fresh confidence.
    pub fn commit_classification(&mut self, record: &MoodRecord) {
        let change = MoodChange {
            previous: self.state.user_mood,
            mood: record.mood,
            confidence: record.confidence,
            source: MoodChangeSource::Classifier,
        };
        self.state.user_mood = record.mood;
        self.notify(&change);
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        let prefs = &mut self.state.preferences;
        if let Some(intensity) = update.intensity {
            prefs.intensity = intensity;
        }
        if let Some(color) = update.color_preference {
            prefs.color_preference = color;
        }
        if let Some(speed) = update.animation_speed {
            if speed.is_finite() && speed > 0.0 {
                prefs.animation_speed = speed;
            } else {
                log::warn!("ignoring animation_speed {speed}; must be positive");
            }
        }
        if let Some(reduced) = update.reduced_motion {
            prefs.reduced_motion = reduced;
        }
    }

    pub fn update_interaction_pattern(&mut self, patterns: AnalyzedPatterns) {
        self.state.interaction_patterns = patterns;
    }

    pub fn update_contextual_state(&mut self, update: ContextualStateUpdate) {
        let ctx: &mut ContextualState = &mut self.state.contextual_state;
        if let Some(time_of_day) = update.time_of_day {
            ctx.time_of_day = time_of_day;
        }
        if let Some(duration) = update.session_duration_ms {
            ctx.session_duration_ms = duration;
        }
        if let Some(phase) = update.current_phase {
            ctx.current_phase = phase;
        }
    }

    /// Record an emotional response and move the mood to the tag's mood.
    ///
    /// Returns the mapped mood.
    pub fn trigger_emotional_response(&mut self, tag: &str, intensity: f64) -> MoodKind {
        let mood = mood_for_response(tag);
        let intensity = if intensity.is_finite() {
            intensity.max(0.0)
        } else {
            0.0
        };
        log::debug!("emotional response '{tag}' ({intensity:.2}) -> {mood}");
        self.state.last_response = Some(EmotionalResponse {
            tag: tag.to_string(),
            intensity,
            mood,
        });
        self.set_mood(mood, intensity.min(1.0), MoodChangeSource::Response);
        mood
    }

    /// Derive time of day from a local wall-clock hour
    pub fn refresh_time_of_day(&mut self, hour: u32) -> TimeOfDay {
        let time_of_day = TimeOfDay::from_hour(hour);
        if time_of_day != self.state.contextual_state.time_of_day {
            log::debug!("time of day -> {}", time_of_day.as_str());
        }
        self.state.contextual_state.time_of_day = time_of_day;
        time_of_day
    }

    /// Advance the session duration counter
    pub fn tick_session(&mut self, elapsed_ms: u64) {
        let ctx = &mut self.state.contextual_state;
        ctx.session_duration_ms = ctx.session_duration_ms.saturating_add(elapsed_ms);
    }

    /// Register a mood-change callback
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&MoodChange) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn set_mood(&mut self, mood: MoodKind, confidence: f64, source: MoodChangeSource) -> bool {
        let previous = self.state.user_mood;
        if previous == mood {
            return false;
        }
        self.state.user_mood = mood;
        self.notify(&MoodChange {
            previous,
            mood,
            confidence,
            source,
        });
        true
    }

    fn notify(&mut self, change: &MoodChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_store() -> (EmotionalStateStore, Rc<RefCell<Vec<MoodChange>>>) {
        let mut store = EmotionalStateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |change| sink.borrow_mut().push(*change));
        (store, seen)
    }

    #[test]
    fn test_update_mood_notifies_on_change_only() {
        let (mut store, seen) = recording_store();
        assert!(!store.update_mood(MoodKind::Calm));
        assert!(store.update_mood(MoodKind::Happy));
        assert!(!store.update_mood(MoodKind::Happy));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].previous, MoodKind::Calm);
        assert_eq!(seen[0].mood, MoodKind::Happy);
        assert_eq!(seen[0].source, MoodChangeSource::Manual);
    }

    #[test]
    fn test_commit_always_notifies() {
        let (mut store, seen) = recording_store();
        let record = MoodRecord {
            mood: MoodKind::Focused,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
            confidence: 0.8,
        };
        store.commit_classification(&record);
        store.commit_classification(&record);

        assert_eq!(store.mood(), MoodKind::Focused);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].previous, MoodKind::Focused);
        assert_eq!(seen[1].confidence, 0.8);
        assert_eq!(seen[1].source, MoodChangeSource::Classifier);
    }

    #[test]
    fn test_preferences_shallow_merge() {
        let mut store = EmotionalStateStore::new();
        store.update_preferences(PreferencesUpdate {
            intensity: Some(Intensity::High),
            ..Default::default()
        });
        store.update_preferences(PreferencesUpdate {
            reduced_motion: Some(true),
            animation_speed: Some(-2.0),
            ..Default::default()
        });

        let prefs = &store.state().preferences;
        assert_eq!(prefs.intensity, Intensity::High);
        assert!(prefs.reduced_motion);
        assert_eq!(prefs.animation_speed, 1.0);
        assert_eq!(prefs.color_preference, "auto");
    }

    #[test]
    fn test_contextual_state_merge() {
        let mut store = EmotionalStateStore::new();
        store.update_contextual_state(ContextualStateUpdate {
            current_phase: Some(JourneyPhase::Decision),
            ..Default::default()
        });
        store.tick_session(1_000);
        store.tick_session(1_000);

        let ctx = store.state().contextual_state;
        assert_eq!(ctx.current_phase, JourneyPhase::Decision);
        assert_eq!(ctx.session_duration_ms, 2_000);
        assert_eq!(ctx.time_of_day, TimeOfDay::Afternoon);
    }

    #[test]
    fn test_response_tag_mapping() {
        assert_eq!(mood_for_response("excited"), MoodKind::Excited);
        assert_eq!(mood_for_response("Contemplating"), MoodKind::Contemplative);
        assert_eq!(mood_for_response("stressed"), MoodKind::Stressed);
        assert_eq!(mood_for_response("focused"), MoodKind::Focused);
        assert_eq!(mood_for_response("celebrating"), MoodKind::Happy);
        assert_eq!(mood_for_response("whatever"), MoodKind::Calm);
    }

    #[test]
    fn test_trigger_response_records_and_notifies() {
        let (mut store, seen) = recording_store();
        let mood = store.trigger_emotional_response("contemplating", 0.85);
        assert_eq!(mood, MoodKind::Contemplative);
        assert_eq!(store.mood(), MoodKind::Contemplative);

        let response = store.state().last_response.clone().unwrap();
        assert_eq!(response.tag, "contemplating");
        assert_eq!(response.intensity, 0.85);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].source, MoodChangeSource::Response);
    }

    #[test]
    fn test_refresh_time_of_day() {
        let mut store = EmotionalStateStore::new();
        assert_eq!(store.refresh_time_of_day(22), TimeOfDay::Night);
        assert_eq!(store.state().contextual_state.time_of_day, TimeOfDay::Night);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut store, seen) = recording_store();
        let extra = store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 2);
        assert!(store.unsubscribe(extra));
        assert!(!store.unsubscribe(extra));

        assert!(store.unsubscribe(0));
        store.update_mood(MoodKind::Stressed);
        assert!(seen.borrow().is_empty());
    }
}
