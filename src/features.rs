//! Behavioral feature extraction
//!
//! Reduces a snapshot of the interaction windows to an [`AnalyzedPatterns`]
//! feature vector. Every function here is total: empty windows produce
//! zero-valued features and divisions are guarded.

use crate::signals::window::{InteractionWindow, PointerSample};
use crate::types::{AnalyzedPatterns, MovementPattern};

/// Pointer steps turning by more than this count as a direction change (45°)
const DIRECTION_CHANGE_THRESHOLD_RAD: f64 = std::f64::consts::FRAC_PI_4;

/// Minimum pointer samples before movement is classified
const MIN_MOVEMENT_SAMPLES: usize = 5;

/// Minimum scroll samples before scroll variance counts toward focus
const MIN_VARIANCE_SAMPLES: usize = 4;

/// Feature extractor for interaction windows
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Compute the feature vector for the current window snapshot
    pub fn extract(window: &InteractionWindow) -> AnalyzedPatterns {
        let hover_samples: Vec<f64> = window.hover_durations.to_vec();
        let click_samples: Vec<f64> = window.clicks.to_vec();
        let scroll_samples: Vec<f64> = window.scroll_velocity.to_vec();
        let pointer_samples: Vec<PointerSample> = window.pointer.to_vec();

        let hover_duration = mean(&hover_samples);
        let click_frequency = compute_click_frequency(&click_samples);
        let scroll_velocity = mean(&scroll_samples);
        let movement_pattern = classify_movement(&pointer_samples);

        let stress_level =
            compute_stress_level(click_frequency, movement_pattern, hover_duration, scroll_velocity);
        let engagement_level = compute_engagement_level(
            click_frequency,
            hover_duration,
            movement_pattern,
            scroll_velocity,
        );
        let focus_level =
            compute_focus_level(movement_pattern, hover_duration, click_frequency, &scroll_samples);

        AnalyzedPatterns {
            hover_duration,
            click_frequency,
            scroll_velocity,
            movement_pattern,
            stress_level,
            engagement_level,
            focus_level,
        }
    }
}

/// Arithmetic mean, 0 for no samples
fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance, 0 for no samples
fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mu = mean(samples);
    samples.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / samples.len() as f64
}

/// Clicks per second across the click window
///
/// Formula: `(count - 1) / seconds(last - first)`
fn compute_click_frequency(click_timestamps_ms: &[f64]) -> f64 {
    if click_timestamps_ms.len() < 2 {
        return 0.0;
    }
    let first = click_timestamps_ms[0];
    let last = click_timestamps_ms[click_timestamps_ms.len() - 1];
    let elapsed_sec = (last - first) / 1000.0;
    if elapsed_sec <= 0.0 {
        return 0.0;
    }
    (click_timestamps_ms.len() - 1) as f64 / elapsed_sec
}

/// Smallest absolute angle between two headings, in [0, π]
fn angle_delta(a: f64, b: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let diff = (a - b).rem_euclid(two_pi);
    diff.min(two_pi - diff)
}

/// Classify pointer movement from consecutive step headings and distances.
///
/// `change_ratio = direction_changes / samples`, `avg_distance = total / samples`.
/// Erratic when `change_ratio > 0.3 && avg_distance > 20`, deliberate when
/// `change_ratio < 0.1 && avg_distance < 10`, smooth otherwise.
fn classify_movement(samples: &[PointerSample]) -> MovementPattern {
    if samples.len() < MIN_MOVEMENT_SAMPLES {
        return MovementPattern::Smooth;
    }

    let mut total_distance = 0.0;
    let mut direction_changes = 0usize;
    let mut last_heading: Option<f64> = None;

    for pair in samples.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        let distance = dx.hypot(dy);
        total_distance += distance;

        // A stationary step has no heading
        if distance == 0.0 {
            continue;
        }
        let heading = dy.atan2(dx);
        if let Some(previous) = last_heading {
            if angle_delta(heading, previous) > DIRECTION_CHANGE_THRESHOLD_RAD {
                direction_changes += 1;
            }
        }
        last_heading = Some(heading);
    }

    let count = samples.len() as f64;
    let change_ratio = direction_changes as f64 / count;
    let avg_distance = total_distance / count;

    if change_ratio > 0.3 && avg_distance > 20.0 {
        MovementPattern::Erratic
    } else if change_ratio < 0.1 && avg_distance < 10.0 {
        MovementPattern::Deliberate
    } else {
        MovementPattern::Smooth
    }
}

fn indicator_score(indicators: &[bool]) -> f64 {
    let hits = indicators.iter().filter(|&&hit| hit).count() as f64;
    (hits / 4.0).clamp(0.0, 1.0)
}

/// Stress indicators: rapid clicking, erratic movement, very short hovers,
/// fast scrolling
fn compute_stress_level(
    click_frequency: f64,
    movement: MovementPattern,
    hover_duration: f64,
    scroll_velocity: f64,
) -> f64 {
    indicator_score(&[
        click_frequency > 2.0,
        movement == MovementPattern::Erratic,
        hover_duration > 0.0 && hover_duration < 300.0,
        scroll_velocity > 100.0,
    ])
}

/// Engagement indicators: moderate clicking, long hovers, smooth movement,
/// moderate scrolling
fn compute_engagement_level(
    click_frequency: f64,
    hover_duration: f64,
    movement: MovementPattern,
    scroll_velocity: f64,
) -> f64 {
    indicator_score(&[
        click_frequency > 0.1 && click_frequency < 1.5,
        hover_duration > 1000.0,
        movement == MovementPattern::Smooth,
        scroll_velocity > 10.0 && scroll_velocity < 50.0,
    ])
}

/// Focus indicators: deliberate movement, very long hovers, sparse clicking,
/// steady scrolling
fn compute_focus_level(
    movement: MovementPattern,
    hover_duration: f64,
    click_frequency: f64,
    scroll_samples: &[f64],
) -> f64 {
    let steady_scroll =
        scroll_samples.len() >= MIN_VARIANCE_SAMPLES && variance(scroll_samples) < 100.0;
    indicator_score(&[
        movement == MovementPattern::Deliberate,
        hover_duration > 2000.0,
        click_frequency < 0.5,
        steady_scroll,
    ])
}
