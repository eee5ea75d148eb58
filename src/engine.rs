//! Affect engine
//!
//! Session-scoped owner of the whole pipeline:
//!
//! ```text
//! EventSource → SignalCollector → (tick) FeatureExtractor → MoodClassifier
//!     → EmotionalStateStore → JourneyAnimator → animation listeners
//! ```
//!
//! The engine is single-threaded and cooperative. The host calls
//! [`AffectEngine::advance`] from its event loop; due timer ticks run
//! synchronously before it returns.

use crate::classifier::{MoodClassifier, MoodHistory};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::AffectError;
use crate::features::FeatureExtractor;
use crate::journey::{AnimationCommand, JourneyAnimator, JourneyOutput, MotionSettings};
use crate::preset::{ContentCategory, EmotionalPreset, PresetResolver};
use crate::scheduler::Scheduler;
use crate::signals::{EventSource, InteractionWindow, SignalCollector};
use crate::store::{ContextualStateUpdate, EmotionalStateStore, PreferencesUpdate, SubscriptionId};
use crate::types::{
    AnalyzedPatterns, EmotionalState, JourneyPhase, MoodChange, MoodKind, TimeOfDay,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::rc::Rc;
use uuid::Uuid;

type TickListener = Box<dyn FnMut(&AnalyzedPatterns)>;
type AnimationListener = Box<dyn FnMut(&AnimationCommand)>;

/// Result of one analysis tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub at: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub patterns: AnalyzedPatterns,
    /// Arg-max mood of this tick, committed or not
    pub mood: MoodKind,
    pub confidence: f64,
    pub committed: bool,
    /// Store mood after the tick
    pub user_mood: MoodKind,
}

/// The affective interaction engine
pub struct AffectEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    instance_id: Uuid,
    collector: SignalCollector,
    classifier: MoodClassifier,
    store: EmotionalStateStore,
    animator: JourneyAnimator,
    scheduler: Scheduler,
    tick_listeners: Vec<TickListener>,
    animation_listeners: Vec<AnimationListener>,
}

impl AffectEngine<SystemClock> {
    /// Create an engine on the system clock
    pub fn new(config: EngineConfig) -> Result<Self, AffectError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AffectEngine<C> {
    /// Create an engine with an explicit time source
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self, AffectError> {
        config.validate()?;
        Ok(Self {
            collector: SignalCollector::new(&config.capacities),
            classifier: MoodClassifier::new(
                config.mood_history_capacity,
                config.confidence_threshold,
                config.momentum_lookback,
            ),
            store: EmotionalStateStore::new(),
            animator: JourneyAnimator::default(),
            scheduler: Scheduler::from_config(&config),
            tick_listeners: Vec::new(),
            animation_listeners: Vec::new(),
            instance_id: Uuid::new_v4(),
            config,
            clock,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn is_attached(&self) -> bool {
        self.collector.is_attached()
    }

    /// Attach to an event source and start the timers.
    ///
    /// Returns `false` if already attached.
    pub fn attach(&mut self, source: Rc<dyn EventSource>) -> bool {
        if !self.collector.attach(source) {
            return false;
        }

        self.scheduler.start(self.clock.now_ms());
        self.store.refresh_time_of_day(self.clock.local_hour());
        self.store.update_contextual_state(ContextualStateUpdate {
            session_duration_ms: Some(0),
            ..Default::default()
        });

        // The animator is unbound here, so these only record state.
        let state = self.store.state();
        let motion = MotionSettings::from(&state.preferences);
        let phase = state.contextual_state.current_phase;
        let mood = state.user_mood;
        self.animator.set_motion(motion);
        self.animator.set_phase(phase);
        self.animator.set_mood(mood);
        let output = self.animator.bind();
        self.process_journey(output);

        log::info!("affect engine {} attached", self.instance_id);
        true
    }

    /// Stop the timers, remove every registered listener and cancel the
    /// animation binding. Safe to call when never attached or twice.
    pub fn detach(&mut self) -> bool {
        self.scheduler.stop();
        if !self.collector.detach() {
            return false;
        }
        let output = self.animator.unbind();
        self.process_journey(output);
        log::info!("affect engine {} detached", self.instance_id);
        true
    }

    /// Number of running timers
    pub fn active_timers(&self) -> usize {
        self.scheduler.active_timers()
    }

    /// Apply captured input, then run every timer tick due at the clock's
    /// current time.
    ///
    /// Scroll progress carried by events from the source drives the journey
    /// first. Session ticks run next, then the time-of-day refresh, then at
    /// most one analysis tick. Returns the reports of analysis ticks that ran.
    pub fn advance(&mut self) -> Vec<TickReport> {
        if !self.is_attached() {
            return Vec::new();
        }
        for progress in self.collector.take_scroll_progress() {
            self.update_scroll_progress(progress);
        }

        let due = self.scheduler.poll(self.clock.now_ms());
        if due.session_elapsed_ms > 0 {
            self.store.tick_session(due.session_elapsed_ms);
        }
        if due.refresh_time_of_day {
            self.store.refresh_time_of_day(self.clock.local_hour());
        }

        let mut reports = Vec::new();
        if due.run_analysis {
            reports.push(self.run_analysis_tick());
        }
        reports
    }

    /// Extract features, classify, and commit when confident.
    ///
    /// Also usable outside the timer, e.g. to force an analysis.
    pub fn run_analysis_tick(&mut self) -> TickReport {
        let window = self.collector.snapshot();
        let patterns = FeatureExtractor::extract(&window);
        self.store.update_interaction_pattern(patterns);

        let time_of_day = self.store.state().contextual_state.time_of_day;
        let now = self.clock.now();
        let evaluation = self.classifier.evaluate(&patterns, time_of_day, now);

        if let Some(record) = evaluation.committed {
            self.store.commit_classification(&record);
            self.sync_animator_mood();
        }

        for listener in self.tick_listeners.iter_mut() {
            listener(&patterns);
        }

        TickReport {
            at: now,
            time_of_day,
            patterns,
            mood: evaluation.classification.mood,
            confidence: evaluation.classification.confidence,
            committed: evaluation.committed.is_some(),
            user_mood: self.store.mood(),
        }
    }

    /// Move to another journey phase
    pub fn set_phase(&mut self, phase: JourneyPhase) {
        self.store.update_contextual_state(ContextualStateUpdate {
            current_phase: Some(phase),
            ..Default::default()
        });
        let output = self.animator.set_phase(phase);
        self.process_journey(output);
    }

    /// Report page scroll progress (0-100)
    pub fn update_scroll_progress(&mut self, progress: f64) {
        let output = self.animator.on_scroll(progress);
        self.process_journey(output);
    }

    /// Map a response tag to a mood and apply it
    pub fn trigger_emotional_response(&mut self, tag: &str, intensity: f64) -> MoodKind {
        let mood = self.store.trigger_emotional_response(tag, intensity);
        self.sync_animator_mood();
        mood
    }

    /// Set the mood directly
    pub fn update_mood(&mut self, mood: MoodKind) {
        self.store.update_mood(mood);
        self.sync_animator_mood();
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        self.store.update_preferences(update);
        let motion = MotionSettings::from(&self.store.state().preferences);
        let output = self.animator.set_motion(motion);
        self.process_journey(output);
    }

    /// Called with the feature vector after every analysis tick
    pub fn on_tick<F>(&mut self, listener: F)
    where
        F: FnMut(&AnalyzedPatterns) + 'static,
    {
        self.tick_listeners.push(Box::new(listener));
    }

    /// Called on every mood change
    pub fn on_mood_change<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&MoodChange) + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn off_mood_change(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Called with every animation command for the presentation layer
    pub fn on_animation<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationCommand) + 'static,
    {
        self.animation_listeners.push(Box::new(listener));
    }

    /// Preset for a content card under the current mood and intensity
    pub fn resolve_preset(&self, category: ContentCategory) -> EmotionalPreset {
        let state = self.store.state();
        PresetResolver::resolve(category, state.user_mood, state.preferences.intensity)
    }

    /// Colour ramp for the current mood and time of day
    pub fn color_palette(&self) -> [&'static str; 3] {
        let state = self.store.state();
        PresetResolver::color_palette(state.user_mood, state.contextual_state.time_of_day)
    }

    pub fn state(&self) -> &EmotionalState {
        self.store.state()
    }

    pub fn snapshot(&self) -> EmotionalState {
        self.store.snapshot()
    }

    pub fn snapshot_json(&self) -> Result<String, AffectError> {
        Ok(serde_json::to_string(self.store.state())?)
    }

    pub fn mood_history(&self) -> &MoodHistory {
        self.classifier.history()
    }

    /// Copy of the current interaction windows
    pub fn window_snapshot(&self) -> InteractionWindow {
        self.collector.snapshot()
    }

    pub fn animator(&self) -> &JourneyAnimator {
        &self.animator
    }

    fn sync_animator_mood(&mut self) {
        let output = self.animator.set_mood(self.store.mood());
        self.process_journey(output);
    }

    /// Deliver commands, then feed response cues back into the store.
    ///
    /// The mood resulting from all cues is synced to the animator once. A
    /// rebind never emits cues, so this does not recurse.
    fn process_journey(&mut self, output: JourneyOutput) {
        self.emit_commands(&output.commands);
        if output.responses.is_empty() {
            return;
        }
        for cue in &output.responses {
            self.store.trigger_emotional_response(cue.tag, cue.intensity);
        }
        let rebind = self.animator.set_mood(self.store.mood());
        self.emit_commands(&rebind.commands);
    }

    fn emit_commands(&mut self, commands: &[AnimationCommand]) {
        for command in commands {
            for listener in self.animation_listeners.iter_mut() {
                listener(command);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::journey::AnimationAction;
    use crate::signals::{EventBus, InteractionEvent};
    use crate::types::{Intensity, MoodChangeSource};
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn setup(hour: u32) -> (AffectEngine<ManualClock>, EventBus, ManualClock) {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let clock = ManualClock::with_hour(start, hour);
        let mut engine = AffectEngine::with_clock(EngineConfig::default(), clock.clone()).unwrap();
        let bus = EventBus::new();
        assert!(engine.attach(Rc::new(bus.clone())));
        (engine, bus, clock)
    }

    fn dispatch_stress_burst(bus: &EventBus) {
        // Rapid clicks: 10 intervals over 2s
        for i in 0..=10 {
            bus.dispatch(&InteractionEvent::Click { t: i as f64 * 200.0 });
        }
        // Back-and-forth 25px pointer jitter
        for i in 0..10 {
            let x = if i % 2 == 0 { 0.0 } else { 25.0 };
            bus.dispatch(&InteractionEvent::PointerMove {
                t: i as f64 * 16.0,
                x: Some(x),
                y: Some(0.0),
            });
        }
        bus.dispatch(&InteractionEvent::HoverEnter { t: 0.0 });
        bus.dispatch(&InteractionEvent::HoverLeave { t: 150.0 });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            analysis_interval_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            AffectEngine::new(config),
            Err(AffectError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hover_end_to_end() {
        let (mut engine, bus, clock) = setup(9);
        bus.dispatch(&InteractionEvent::HoverEnter { t: 10_000.0 });
        bus.dispatch(&InteractionEvent::HoverLeave { t: 12_500.0 });

        clock.advance_ms(2_000);
        let reports = engine.advance();
        assert_eq!(reports.len(), 1);

        let patterns = reports[0].patterns;
        assert_eq!(patterns.hover_duration, 2_500.0);
        // hover > 2000 and sparse clicking
        assert_eq!(patterns.focus_level, 0.5);
        assert_eq!(engine.state().interaction_patterns, patterns);
    }

    #[test]
    fn test_no_tick_before_interval() {
        let (mut engine, _bus, clock) = setup(9);
        clock.advance_ms(1_999);
        assert!(engine.advance().is_empty());
        assert_eq!(engine.state().contextual_state.session_duration_ms, 1_000);
    }

    #[test]
    fn test_low_confidence_ticks_keep_mood() {
        let (mut engine, bus, clock) = setup(9);
        engine.update_mood(MoodKind::Happy);
        bus.dispatch(&InteractionEvent::HoverEnter { t: 0.0 });
        bus.dispatch(&InteractionEvent::HoverLeave { t: 2_500.0 });

        for _ in 0..5 {
            clock.advance_ms(2_000);
            let reports = engine.advance();
            assert_eq!(reports.len(), 1);
            assert!(!reports[0].committed);
            assert!(reports[0].confidence <= 0.6);
            assert_eq!(engine.state().user_mood, MoodKind::Happy);
        }
        assert!(engine.mood_history().is_empty());
    }

    #[test]
    fn test_stress_burst_commits() {
        let (mut engine, bus, clock) = setup(9);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        engine.on_mood_change(move |change| sink.borrow_mut().push(*change));

        dispatch_stress_burst(&bus);
        clock.advance_ms(2_000);
        let reports = engine.advance();

        let report = reports[0];
        assert!(report.committed);
        assert_eq!(report.mood, MoodKind::Stressed);
        assert!(report.confidence > 0.6);
        assert_eq!(engine.state().user_mood, MoodKind::Stressed);
        assert_eq!(engine.mood_history().len(), 1);
        assert_eq!(engine.animator().mood(), MoodKind::Stressed);

        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].source, MoodChangeSource::Classifier);
    }

    #[test]
    fn test_double_detach_leaves_nothing_active() {
        let (mut engine, bus, clock) = setup(9);
        assert_eq!(engine.active_timers(), 3);

        assert!(engine.detach());
        assert!(!engine.detach());
        assert!(!engine.is_attached());
        assert_eq!(engine.active_timers(), 0);
        assert_eq!(bus.listener_count(), 0);

        clock.advance_ms(10_000);
        assert!(engine.advance().is_empty());
    }

    #[test]
    fn test_detach_before_attach() {
        let mut engine = AffectEngine::new(EngineConfig::default()).unwrap();
        assert!(!engine.detach());
        assert_eq!(engine.active_timers(), 0);
    }

    #[test]
    fn test_reattach_after_detach() {
        let (mut engine, bus, _clock) = setup(9);
        engine.detach();
        assert!(engine.attach(Rc::new(bus.clone())));
        assert!(!engine.attach(Rc::new(bus.clone())));
        assert_eq!(engine.active_timers(), 3);
    }

    #[test]
    fn test_time_of_day_and_session() {
        let (mut engine, _bus, clock) = setup(22);
        assert_eq!(engine.state().contextual_state.time_of_day, TimeOfDay::Night);

        clock.advance_ms(3_000);
        engine.advance();
        assert_eq!(engine.state().contextual_state.session_duration_ms, 3_000);
    }

    #[test]
    fn test_scroll_response_updates_mood() {
        let (mut engine, _bus, _clock) = setup(9);
        let commands = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&commands);
        engine.on_animation(move |cmd| sink.borrow_mut().push((cmd.action, cmd.directive_id)));

        engine.update_scroll_progress(20.0);

        let state = engine.snapshot();
        assert_eq!(state.user_mood, MoodKind::Excited);
        assert_eq!(state.last_response.map(|r| r.tag), Some("excited".to_string()));
        assert_eq!(engine.animator().mood(), MoodKind::Excited);

        let commands = commands.borrow();
        assert_eq!(commands[0], (AnimationAction::Enter, "cards-reveal"));
        // Rebind for the new mood re-applies the entered range without a cue
        assert!(commands.contains(&(AnimationAction::Apply, "cards-reveal")));
    }

    #[test]
    fn test_scroll_progress_from_source_drives_journey() {
        let (mut engine, bus, _clock) = setup(9);
        let commands = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&commands);
        engine.on_animation(move |cmd| sink.borrow_mut().push((cmd.action, cmd.directive_id)));

        bus.dispatch(&InteractionEvent::Scroll {
            t: 0.0,
            y: Some(400.0),
            progress: Some(20.0),
        });
        assert!(engine.advance().is_empty());

        assert_eq!(commands.borrow()[0], (AnimationAction::Enter, "cards-reveal"));
        let state = engine.snapshot();
        assert_eq!(state.user_mood, MoodKind::Excited);
        assert_eq!(state.last_response.map(|r| r.tag), Some("excited".to_string()));

        // Consumed once
        let emitted = commands.borrow().len();
        engine.advance();
        assert_eq!(commands.borrow().len(), emitted);
    }

    #[test]
    fn test_scroll_progress_dropped_on_detach() {
        let (mut engine, bus, _clock) = setup(9);
        bus.dispatch(&InteractionEvent::Scroll {
            t: 0.0,
            y: None,
            progress: Some(20.0),
        });
        engine.detach();
        assert!(engine.attach(Rc::new(bus.clone())));
        engine.advance();
        assert_eq!(engine.state().user_mood, MoodKind::Calm);
        assert!(engine.state().last_response.is_none());
    }

    #[test]
    fn test_set_phase_updates_context() {
        let (mut engine, _bus, _clock) = setup(9);
        engine.set_phase(JourneyPhase::Booking);
        assert_eq!(
            engine.state().contextual_state.current_phase,
            JourneyPhase::Booking
        );
        assert_eq!(engine.animator().active_directives(), vec!["form-calm"]);
    }

    #[test]
    fn test_resolve_preset_uses_state() {
        let (mut engine, _bus, _clock) = setup(9);
        engine.update_mood(MoodKind::Excited);
        engine.update_preferences(PreferencesUpdate {
            intensity: Some(Intensity::High),
            ..Default::default()
        });
        let preset = engine.resolve_preset(ContentCategory::Development);
        assert_eq!(preset.particle_count, 18);
        assert_eq!(engine.color_palette().len(), 3);
    }

    #[test]
    fn test_tick_listener_and_snapshot_json() {
        let (mut engine, _bus, clock) = setup(9);
        let ticks = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&ticks);
        engine.on_tick(move |_| *counter.borrow_mut() += 1);

        clock.advance_ms(4_000);
        engine.advance();
        engine.run_analysis_tick();
        assert_eq!(*ticks.borrow(), 2);

        let json = engine.snapshot_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["user_mood"], "calm");
        assert_eq!(value["contextual_state"]["time_of_day"], "morning");
    }
}
