//! Mood classification
//!
//! Scores the six moods from an [`AnalyzedPatterns`] feature vector, nudges the
//! scores by time of day and by momentum from recent committed moods, then
//! picks the arg-max with a confidence value.
//!
//! Only classifications with confidence strictly above the configured threshold
//! are committed to history. Low-confidence results are still returned so
//! callers can inspect the raw signal.

use crate::config::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MOMENTUM_LOOKBACK, DEFAULT_MOOD_HISTORY_CAPACITY,
};
use crate::types::{AnalyzedPatterns, MoodKind, MoodRecord, MovementPattern, TimeOfDay};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Summed confidence a mood needs across the lookback to gain momentum
const MOMENTUM_MIN_CONFIDENCE_SUM: f64 = 1.5;

/// Momentum boost per unit of summed confidence
const MOMENTUM_WEIGHT: f64 = 10.0;

/// Upper bound on the momentum boost
const MOMENTUM_MAX_BOOST: f64 = 30.0;

/// Score at which magnitude saturates
const MAGNITUDE_SATURATION: f64 = 100.0;

/// Per-mood scores, indexed in [`MoodKind::ALL`] order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoodScores([f64; 6]);

impl MoodScores {
    pub fn get(&self, mood: MoodKind) -> f64 {
        self.0[mood.index()]
    }

    pub fn add(&mut self, mood: MoodKind, amount: f64) {
        self.0[mood.index()] += amount;
    }

    /// `(mood, score)` pairs in priority order
    pub fn iter(&self) -> impl Iterator<Item = (MoodKind, f64)> + '_ {
        MoodKind::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Highest scoring mood; ties go to the mood declared first
    pub fn arg_max(&self) -> MoodKind {
        let mut best = MoodKind::ALL[0];
        for mood in MoodKind::ALL.into_iter().skip(1) {
            if self.get(mood) > self.get(best) {
                best = mood;
            }
        }
        best
    }

    /// Highest score among every mood except `winner`
    pub fn runner_up(&self, winner: MoodKind) -> f64 {
        self.iter()
            .filter(|(m, _)| *m != winner)
            .map(|(_, s)| s)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Winning mood and its confidence.
    ///
    /// `confidence = separation * magnitude`, where
    /// `separation = (max - runner_up) / max` and `magnitude = min(max / 100, 1)`.
    /// A non-positive maximum yields zero confidence.
    pub fn decide(&self) -> (MoodKind, f64) {
        let winner = self.arg_max();
        let max = self.get(winner);
        if max <= 0.0 {
            return (winner, 0.0);
        }
        let separation = ((max - self.runner_up(winner)) / max).clamp(0.0, 1.0);
        let magnitude = (max / MAGNITUDE_SATURATION).min(1.0);
        (winner, (separation * magnitude).clamp(0.0, 1.0))
    }
}

/// Bounded FIFO of committed mood records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodHistory {
    records: VecDeque<MoodRecord>,
    capacity: usize,
}

impl Default for MoodHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MOOD_HISTORY_CAPACITY)
    }
}

impl MoodHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: MoodRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// The last `n` records, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &MoodRecord> + '_ {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip)
    }

    pub fn latest(&self) -> Option<&MoodRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoodRecord> + '_ {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Serialize history for diagnostics
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Result of a single classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub mood: MoodKind,
    pub confidence: f64,
    pub scores: MoodScores,
}

/// Score the moods from the feature vector alone.
///
/// Each mood accumulates from a handful of independent threshold rules.
pub fn score_patterns(p: &AnalyzedPatterns) -> MoodScores {
    let mut scores = MoodScores::default();
    let stress = p.stress_level;
    let engagement = p.engagement_level;
    let focus = p.focus_level;
    let hover = p.hover_duration;
    let clicks = p.click_frequency;
    let scroll = p.scroll_velocity;
    let movement = p.movement_pattern;

    // Stressed
    if stress > 0.7 {
        scores.add(MoodKind::Stressed, stress * 100.0);
    }
    if movement == MovementPattern::Erratic {
        scores.add(MoodKind::Stressed, 30.0);
    }
    if clicks > 2.0 {
        scores.add(MoodKind::Stressed, 25.0);
    }
    if hover > 0.0 && hover < 300.0 {
        scores.add(MoodKind::Stressed, 15.0);
    }

    // Focused
    if focus > 0.7 {
        scores.add(MoodKind::Focused, focus * 60.0);
    }
    if movement == MovementPattern::Deliberate {
        scores.add(MoodKind::Focused, 40.0);
    }
    if hover > 3000.0 {
        scores.add(MoodKind::Focused, 20.0);
    }
    if clicks < 0.5 && stress < 0.3 {
        scores.add(MoodKind::Focused, 15.0);
    }

    // Excited
    if engagement > 0.8 && stress < 0.4 {
        scores.add(MoodKind::Excited, 50.0);
    }
    if clicks > 1.0 && clicks <= 2.0 {
        scores.add(MoodKind::Excited, 25.0);
    }
    if scroll > 50.0 {
        scores.add(MoodKind::Excited, 20.0);
    }

    // Happy
    let moderate_engagement = (0.4..=0.8).contains(&engagement) && stress < 0.3;
    if moderate_engagement {
        scores.add(MoodKind::Happy, 35.0);
    }
    if movement == MovementPattern::Smooth && clicks > 0.1 {
        scores.add(MoodKind::Happy, 20.0);
    }
    if clicks > 0.1 && clicks < 1.5 && hover > 300.0 && hover < 2000.0 {
        scores.add(MoodKind::Happy, 15.0);
    }

    // Calm
    if stress < 0.2 {
        scores.add(MoodKind::Calm, 30.0);
    }
    if movement == MovementPattern::Smooth && scroll < 20.0 {
        scores.add(MoodKind::Calm, 25.0);
    }
    if moderate_engagement {
        scores.add(MoodKind::Calm, 20.0);
    }

    // Contemplative
    if hover > 2000.0 && clicks < 0.5 {
        scores.add(MoodKind::Contemplative, 45.0);
    }
    if hover > 3000.0 {
        scores.add(MoodKind::Contemplative, 25.0);
    }
    if hover > 1000.0 && focus < 0.5 {
        scores.add(MoodKind::Contemplative, 20.0);
    }

    scores
}

/// Small per-mood nudges by local time of day
pub fn apply_time_of_day_bias(scores: &mut MoodScores, time_of_day: TimeOfDay) {
    let nudges: &[(MoodKind, f64)] = match time_of_day {
        TimeOfDay::Morning => &[
            (MoodKind::Focused, 15.0),
            (MoodKind::Excited, 10.0),
            (MoodKind::Calm, 5.0),
        ],
        TimeOfDay::Afternoon => &[
            (MoodKind::Happy, 10.0),
            (MoodKind::Focused, 10.0),
            (MoodKind::Excited, 5.0),
        ],
        TimeOfDay::Evening => &[
            (MoodKind::Calm, 15.0),
            (MoodKind::Contemplative, 10.0),
            (MoodKind::Stressed, -5.0),
        ],
        TimeOfDay::Night => &[
            (MoodKind::Contemplative, 20.0),
            (MoodKind::Calm, 10.0),
            (MoodKind::Excited, -10.0),
        ],
    };
    for &(mood, amount) in nudges {
        scores.add(mood, amount);
    }
}

/// Boost moods that dominated the most recent `lookback` commits.
///
/// Confidence is summed per mood; a sum above 1.5 adds `min(sum * 10, 30)`.
pub fn apply_momentum(scores: &mut MoodScores, history: &MoodHistory, lookback: usize) {
    let mut sums = [0.0f64; 6];
    for record in history.recent(lookback) {
        sums[record.mood.index()] += record.confidence;
    }
    for mood in MoodKind::ALL {
        let sum = sums[mood.index()];
        if sum > MOMENTUM_MIN_CONFIDENCE_SUM {
            scores.add(mood, (sum * MOMENTUM_WEIGHT).min(MOMENTUM_MAX_BOOST));
        }
    }
}

/// Classify a feature vector against the given history. Pure.
pub fn classify(
    patterns: &AnalyzedPatterns,
    history: &MoodHistory,
    time_of_day: TimeOfDay,
    momentum_lookback: usize,
) -> Classification {
    let mut scores = score_patterns(patterns);
    apply_time_of_day_bias(&mut scores, time_of_day);
    apply_momentum(&mut scores, history, momentum_lookback);
    let (mood, confidence) = scores.decide();
    Classification {
        mood,
        confidence,
        scores,
    }
}

/// Outcome of [`MoodClassifier::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub classification: Classification,
    /// Present when the classification cleared the threshold and was recorded
    pub committed: Option<MoodRecord>,
}

/// Stateful classifier owning the committed mood history
#[derive(Debug, Clone)]
pub struct MoodClassifier {
    history: MoodHistory,
    confidence_threshold: f64,
    momentum_lookback: usize,
}

impl Default for MoodClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_MOOD_HISTORY_CAPACITY,
            DEFAULT_CONFIDENCE_THRESHOLD,
            DEFAULT_MOMENTUM_LOOKBACK,
        )
    }
}

impl MoodClassifier {
    pub fn new(history_capacity: usize, confidence_threshold: f64, momentum_lookback: usize) -> Self {
        Self {
            history: MoodHistory::new(history_capacity),
            confidence_threshold,
            momentum_lookback,
        }
    }

    /// Classify without touching history
    pub fn classify(&self, patterns: &AnalyzedPatterns, time_of_day: TimeOfDay) -> Classification {
        classify(patterns, &self.history, time_of_day, self.momentum_lookback)
    }

    /// Classify and commit to history when confidence clears the threshold
    pub fn evaluate(
        &mut self,
        patterns: &AnalyzedPatterns,
        time_of_day: TimeOfDay,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let classification = self.classify(patterns, time_of_day);

        if classification.confidence > self.confidence_threshold {
            let record = MoodRecord {
                mood: classification.mood,
                timestamp: now,
                confidence: classification.confidence,
            };
            self.history.push(record);
            log::debug!(
                "committed mood {} (confidence {:.2})",
                record.mood,
                record.confidence
            );
            Evaluation {
                classification,
                committed: Some(record),
            }
        } else {
            log::debug!(
                "discarded mood {} (confidence {:.2} <= {:.2})",
                classification.mood,
                classification.confidence,
                self.confidence_threshold
            );
            Evaluation {
                classification,
                committed: None,
            }
        }
    }

    pub fn history(&self) -> &MoodHistory {
        &self.history
    }

    /// Record a mood directly, e.g. when restoring diagnostics
    pub fn record(&mut self, record: MoodRecord) {
        self.history.push(record);
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    fn stressed_patterns() -> AnalyzedPatterns {
        AnalyzedPatterns {
            hover_duration: 150.0,
            click_frequency: 3.0,
            scroll_velocity: 150.0,
            movement_pattern: MovementPattern::Erratic,
            stress_level: 1.0,
            engagement_level: 0.0,
            focus_level: 0.0,
        }
    }

    /// Long hover, no clicks, steady slow scroll: calm edges out focused
    fn ambiguous_patterns() -> AnalyzedPatterns {
        AnalyzedPatterns {
            hover_duration: 2200.0,
            click_frequency: 0.0,
            scroll_velocity: 5.0,
            movement_pattern: MovementPattern::Smooth,
            stress_level: 0.0,
            engagement_level: 0.5,
            focus_level: 0.75,
        }
    }

    /// Highly engaged browsing: excited wins but not decisively
    fn low_confidence_patterns() -> AnalyzedPatterns {
        AnalyzedPatterns {
            hover_duration: 1500.0,
            click_frequency: 1.2,
            scroll_velocity: 30.0,
            movement_pattern: MovementPattern::Smooth,
            stress_level: 0.0,
            engagement_level: 1.0,
            focus_level: 0.0,
        }
    }

    fn focused_record(confidence: f64) -> MoodRecord {
        MoodRecord {
            mood: MoodKind::Focused,
            timestamp: now(),
            confidence,
        }
    }

    #[test]
    fn test_zero_scores_zero_confidence() {
        let scores = MoodScores::default();
        assert_eq!(scores.decide(), (MoodKind::Calm, 0.0));
    }

    #[test]
    fn test_confidence_grows_with_separation() {
        let mut close = MoodScores::default();
        close.add(MoodKind::Happy, 100.0);
        close.add(MoodKind::Calm, 90.0);

        let mut clear = MoodScores::default();
        clear.add(MoodKind::Happy, 100.0);
        clear.add(MoodKind::Calm, 10.0);

        let mut decisive = MoodScores::default();
        decisive.add(MoodKind::Happy, 150.0);

        let (_, c_close) = close.decide();
        let (_, c_clear) = clear.decide();
        let (mood, c_decisive) = decisive.decide();
        assert!(c_close < c_clear);
        assert!(c_clear < c_decisive);
        assert_eq!(mood, MoodKind::Happy);
        assert!((c_decisive - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_magnitude_scales_confidence() {
        let mut scores = MoodScores::default();
        scores.add(MoodKind::Excited, 50.0);
        // Full separation, half magnitude
        assert_eq!(scores.decide(), (MoodKind::Excited, 0.5));
    }

    #[test]
    fn test_tie_breaks_by_declaration_order() {
        let mut scores = MoodScores::default();
        scores.add(MoodKind::Contemplative, 40.0);
        scores.add(MoodKind::Focused, 40.0);
        scores.add(MoodKind::Excited, 40.0);
        let (mood, confidence) = scores.decide();
        assert_eq!(mood, MoodKind::Excited);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_negative_runner_up_clamps_separation() {
        let mut scores = MoodScores::default();
        for mood in MoodKind::ALL {
            scores.add(mood, -10.0);
        }
        scores.add(MoodKind::Calm, 110.0);
        let (mood, confidence) = scores.decide();
        assert_eq!(mood, MoodKind::Calm);
        assert!(confidence <= 1.0);
    }

    #[test]
    fn test_stressed_patterns_score() {
        let scores = score_patterns(&stressed_patterns());
        // 100 (stress level) + 30 (erratic) + 25 (clicks) + 15 (short hover)
        assert_eq!(scores.get(MoodKind::Stressed), 170.0);
        assert_eq!(scores.get(MoodKind::Excited), 20.0);
        assert_eq!(scores.get(MoodKind::Calm), 0.0);
    }

    #[test]
    fn test_stressed_patterns_commit() {
        let mut classifier = MoodClassifier::default();
        let evaluation = classifier.evaluate(&stressed_patterns(), TimeOfDay::Morning, now());

        assert_eq!(evaluation.classification.mood, MoodKind::Stressed);
        // (170 - 30) / 170
        assert!((evaluation.classification.confidence - 140.0 / 170.0).abs() < 1e-9);
        let record = evaluation.committed.unwrap();
        assert_eq!(record.mood, MoodKind::Stressed);
        assert_eq!(classifier.history().len(), 1);
    }

    #[test]
    fn test_low_confidence_not_committed() {
        let mut classifier = MoodClassifier::default();
        for _ in 0..5 {
            let evaluation =
                classifier.evaluate(&low_confidence_patterns(), TimeOfDay::Morning, now());
            assert_eq!(evaluation.classification.mood, MoodKind::Excited);
            assert!(evaluation.classification.confidence < 0.6);
            assert!(evaluation.committed.is_none());
        }
        assert!(classifier.history().is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut scores = MoodScores::default();
        scores.add(MoodKind::Happy, 100.0);
        scores.add(MoodKind::Calm, 40.0);
        // Exactly 0.6 does not clear a 0.6 threshold
        let (_, confidence) = scores.decide();
        assert!((confidence - 0.6).abs() < 1e-9);

        let classifier = MoodClassifier::new(10, confidence, 3);
        assert!(!(confidence > classifier.confidence_threshold()));
    }

    #[test]
    fn test_time_of_day_bias() {
        let mut scores = MoodScores::default();
        apply_time_of_day_bias(&mut scores, TimeOfDay::Night);
        assert_eq!(scores.get(MoodKind::Contemplative), 20.0);
        assert_eq!(scores.get(MoodKind::Excited), -10.0);

        let mut scores = MoodScores::default();
        apply_time_of_day_bias(&mut scores, TimeOfDay::Morning);
        assert_eq!(scores.get(MoodKind::Focused), 15.0);
    }

    #[test]
    fn test_momentum_boost_bounded() {
        let mut history = MoodHistory::new(10);
        for _ in 0..3 {
            history.push(focused_record(1.0));
        }
        let mut scores = MoodScores::default();
        apply_momentum(&mut scores, &history, 3);
        assert_eq!(scores.get(MoodKind::Focused), 30.0);

        // Only the last three records count
        history.push(MoodRecord {
            mood: MoodKind::Calm,
            timestamp: now(),
            confidence: 0.9,
        });
        let mut scores = MoodScores::default();
        apply_momentum(&mut scores, &history, 3);
        assert_eq!(scores.get(MoodKind::Focused), 20.0);
        assert_eq!(scores.get(MoodKind::Calm), 0.0);
    }

    #[test]
    fn test_momentum_requires_sum_above_threshold() {
        let mut history = MoodHistory::new(10);
        history.push(focused_record(0.7));
        history.push(focused_record(0.8));
        let mut scores = MoodScores::default();
        apply_momentum(&mut scores, &history, 3);
        // 1.5 is not above 1.5
        assert_eq!(scores.get(MoodKind::Focused), 0.0);
    }

    #[test]
    fn test_momentum_tips_ambiguous_vector() {
        let patterns = ambiguous_patterns();

        let fresh = MoodClassifier::default();
        let without = fresh.classify(&patterns, TimeOfDay::Afternoon);
        assert_eq!(without.mood, MoodKind::Calm);

        let mut primed = MoodClassifier::default();
        for _ in 0..3 {
            primed.record(focused_record(0.8));
        }
        let with = primed.classify(&patterns, TimeOfDay::Afternoon);
        assert_eq!(with.mood, MoodKind::Focused);

        let boost = with.scores.get(MoodKind::Focused) - without.scores.get(MoodKind::Focused);
        assert!(boost > 0.0 && boost <= 30.0);
    }

    #[test]
    fn test_history_capacity() {
        let mut history = MoodHistory::new(10);
        for i in 0..15 {
            history.push(focused_record(i as f64 / 100.0));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.iter().next().map(|r| r.confidence), Some(0.05));
        assert_eq!(history.latest().map(|r| r.confidence), Some(0.14));
        assert_eq!(history.recent(3).count(), 3);
    }

    #[test]
    fn test_history_json_roundtrip() {
        let mut history = MoodHistory::new(4);
        history.push(focused_record(0.9));
        let json = history.to_json().unwrap();
        let restored = MoodHistory::from_json(&json).unwrap();
        assert_eq!(restored, history);
    }
}
