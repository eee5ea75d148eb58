//! Journey animator
//!
//! A per-phase state machine that turns the current journey phase, mood and
//! scroll position into animation commands for a presentation layer. Each
//! phase owns a fixed list of directives. Directives are data: a property set
//! plus timing, scaled by a per-mood multiplier before they leave this module.
//!
//! Any change of phase, mood or motion preferences tears the current binding
//! down (cancelling everything it applied) and sets up a fresh one. Nothing is
//! ever added on top of a live binding.

use crate::types::{JourneyPhase, MoodKind, Preferences};
use serde::Serialize;

/// Per-mood timing and amplitude scale factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodMultiplier {
    pub duration: f64,
    pub intensity: f64,
}

pub fn mood_multiplier(mood: MoodKind) -> MoodMultiplier {
    let (duration, intensity) = match mood {
        MoodKind::Calm => (1.2, 0.8),
        MoodKind::Excited => (0.7, 1.3),
        MoodKind::Focused => (1.0, 0.9),
        MoodKind::Stressed => (1.5, 0.6),
        MoodKind::Happy => (0.9, 1.15),
        MoodKind::Contemplative => (1.4, 0.85),
    };
    MoodMultiplier {
        duration,
        intensity,
    }
}

/// Visual properties a directive sets. Absent properties are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PropertySet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Vertical offset (px)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate_y: Option<f64>,
    /// Rotation (deg)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    /// Blur radius (px)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    /// Glow strength (0-1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow: Option<f64>,
}

impl PropertySet {
    pub const EMPTY: PropertySet = PropertySet {
        opacity: None,
        scale: None,
        translate_y: None,
        rotate: None,
        blur: None,
        glow: None,
    };

    /// Scale motion amplitudes by `intensity`. Reduced motion pins scale to
    /// 1 and zeroes translation and rotation.
    pub fn scaled(&self, intensity: f64, reduced_motion: bool) -> PropertySet {
        if reduced_motion {
            return PropertySet {
                scale: self.scale.map(|_| 1.0),
                translate_y: self.translate_y.map(|_| 0.0),
                rotate: self.rotate.map(|_| 0.0),
                glow: self.glow.map(|g| g.clamp(0.0, 1.0)),
                ..*self
            };
        }
        PropertySet {
            scale: self.scale.map(|s| 1.0 + (s - 1.0) * intensity),
            translate_y: self.translate_y.map(|y| y * intensity),
            rotate: self.rotate.map(|r| r * intensity),
            glow: self.glow.map(|g| (g * intensity).clamp(0.0, 1.0)),
            ..*self
        }
    }
}

/// When a directive is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Applied once on phase entry
    Immediate,
    /// Applied while scroll progress (0-100) is within `[enter_pct, leave_pct]`
    ScrollTriggered { enter_pct: f64, leave_pct: f64 },
}

impl Trigger {
    fn contains(&self, progress: f64) -> bool {
        match *self {
            Trigger::Immediate => false,
            Trigger::ScrollTriggered {
                enter_pct,
                leave_pct,
            } => progress >= enter_pct && progress <= leave_pct,
        }
    }
}

/// One entry in a phase's directive list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Directive {
    pub id: &'static str,
    /// Presentation-layer element the directive targets
    pub target: &'static str,
    pub trigger: Trigger,
    pub properties: PropertySet,
    /// Applied when scroll leaves the trigger range
    pub on_leave: Option<PropertySet>,
    /// Emotional response tag emitted on entering the trigger range
    pub response: Option<&'static str>,
    /// Unscaled transition duration
    pub duration_ms: u64,
}

const fn scroll(enter_pct: f64, leave_pct: f64) -> Trigger {
    Trigger::ScrollTriggered {
        enter_pct,
        leave_pct,
    }
}

static DISCOVERY: [Directive; 3] = [
    Directive {
        id: "hero-fade-in",
        target: "hero",
        trigger: Trigger::Immediate,
        properties: PropertySet {
            opacity: Some(1.0),
            scale: Some(1.0),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: None,
        duration_ms: 0,
    },
    Directive {
        id: "cards-reveal",
        target: "content-cards",
        trigger: scroll(10.0, 60.0),
        properties: PropertySet {
            opacity: Some(1.0),
            translate_y: Some(-20.0),
            scale: Some(1.03),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            opacity: Some(0.85),
            translate_y: Some(0.0),
            scale: Some(1.0),
            ..PropertySet::EMPTY
        }),
        response: Some("excited"),
        duration_ms: 600,
    },
    Directive {
        id: "category-glow",
        target: "category-nav",
        trigger: scroll(40.0, 90.0),
        properties: PropertySet {
            glow: Some(0.5),
            scale: Some(1.02),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            glow: Some(0.0),
            scale: Some(1.0),
            ..PropertySet::EMPTY
        }),
        response: Some("contemplating"),
        duration_ms: 900,
    },
];

static CONSIDERATION: [Directive; 3] = [
    Directive {
        id: "detail-settle",
        target: "detail-panel",
        trigger: Trigger::Immediate,
        properties: PropertySet {
            opacity: Some(1.0),
            blur: Some(0.0),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: None,
        duration_ms: 0,
    },
    Directive {
        id: "portfolio-focus",
        target: "portfolio",
        trigger: scroll(20.0, 70.0),
        properties: PropertySet {
            scale: Some(1.04),
            glow: Some(0.3),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            scale: Some(1.0),
            glow: Some(0.0),
            ..PropertySet::EMPTY
        }),
        response: Some("focused"),
        duration_ms: 700,
    },
    Directive {
        id: "reviews-warm",
        target: "reviews",
        trigger: scroll(60.0, 100.0),
        properties: PropertySet {
            opacity: Some(1.0),
            translate_y: Some(-12.0),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: Some("happy"),
        duration_ms: 800,
    },
];

static DECISION: [Directive; 3] = [
    Directive {
        id: "pricing-emphasis",
        target: "pricing",
        trigger: Trigger::Immediate,
        properties: PropertySet {
            scale: Some(1.02),
            glow: Some(0.2),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: None,
        duration_ms: 0,
    },
    Directive {
        id: "compare-highlight",
        target: "comparison",
        trigger: scroll(15.0, 55.0),
        properties: PropertySet {
            glow: Some(0.4),
            blur: Some(0.0),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            glow: Some(0.1),
            ..PropertySet::EMPTY
        }),
        response: Some("focused"),
        duration_ms: 500,
    },
    Directive {
        id: "cta-pulse",
        target: "cta",
        trigger: scroll(50.0, 100.0),
        properties: PropertySet {
            scale: Some(1.08),
            glow: Some(0.7),
            rotate: Some(1.0),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            scale: Some(1.0),
            glow: Some(0.2),
            rotate: Some(0.0),
            ..PropertySet::EMPTY
        }),
        response: Some("excited"),
        duration_ms: 400,
    },
];

static BOOKING: [Directive; 3] = [
    Directive {
        id: "form-calm",
        target: "booking-form",
        trigger: Trigger::Immediate,
        properties: PropertySet {
            opacity: Some(1.0),
            blur: Some(0.0),
            scale: Some(1.0),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: None,
        duration_ms: 0,
    },
    Directive {
        id: "progress-steady",
        target: "progress",
        trigger: scroll(0.0, 100.0),
        properties: PropertySet {
            opacity: Some(1.0),
            translate_y: Some(-4.0),
            ..PropertySet::EMPTY
        },
        on_leave: None,
        response: Some("focused"),
        duration_ms: 1_000,
    },
    Directive {
        id: "confirm-celebrate",
        target: "confirmation",
        trigger: scroll(80.0, 100.0),
        properties: PropertySet {
            scale: Some(1.06),
            glow: Some(0.8),
            rotate: Some(2.0),
            ..PropertySet::EMPTY
        },
        on_leave: Some(PropertySet {
            scale: Some(1.0),
            glow: Some(0.0),
            rotate: Some(0.0),
            ..PropertySet::EMPTY
        }),
        response: Some("happy"),
        duration_ms: 1_200,
    },
];

/// Ordered directive list for a phase
pub fn phase_directives(phase: JourneyPhase) -> &'static [Directive] {
    match phase {
        JourneyPhase::Discovery => &DISCOVERY,
        JourneyPhase::Consideration => &CONSIDERATION,
        JourneyPhase::Decision => &DECISION,
        JourneyPhase::Booking => &BOOKING,
    }
}

/// Motion-related preferences the animator honours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    pub reduced_motion: bool,
    /// Global speed factor; durations are divided by it
    pub animation_speed: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            animation_speed: 1.0,
        }
    }
}

impl From<&Preferences> for MotionSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            reduced_motion: prefs.reduced_motion,
            animation_speed: prefs.animation_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationAction {
    /// Set the directive's properties (immediate or rebind within range)
    Apply,
    /// Scroll entered the directive's range
    Enter,
    /// Scroll left the directive's range
    Leave,
    /// The binding was torn down; drop any state this directive set
    Cancel,
}

/// A scaled instruction for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationCommand {
    /// Binding generation the command belongs to
    pub generation: u64,
    pub directive_id: &'static str,
    pub target: &'static str,
    pub action: AnimationAction,
    pub properties: PropertySet,
    pub duration_ms: u64,
}

/// Emotional response emitted when a scroll directive is entered
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseCue {
    pub tag: &'static str,
    pub intensity: f64,
}

/// Everything produced by one animator operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JourneyOutput {
    pub commands: Vec<AnimationCommand>,
    pub responses: Vec<ResponseCue>,
}

impl JourneyOutput {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.responses.is_empty()
    }

    fn extend(&mut self, other: JourneyOutput) {
        self.commands.extend(other.commands);
        self.responses.extend(other.responses);
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveDirective {
    directive: &'static Directive,
    inside: bool,
    applied: bool,
}

#[derive(Debug, Clone)]
struct Binding {
    generation: u64,
    directives: Vec<ActiveDirective>,
}

/// Phase-driven animation state machine
#[derive(Debug, Clone)]
pub struct JourneyAnimator {
    phase: JourneyPhase,
    mood: MoodKind,
    motion: MotionSettings,
    /// Last reported scroll progress (0-100)
    scroll: Option<f64>,
    binding: Option<Binding>,
    generation: u64,
}

impl Default for JourneyAnimator {
    fn default() -> Self {
        Self::new(JourneyPhase::default(), MoodKind::default())
    }
}

impl JourneyAnimator {
    pub fn new(phase: JourneyPhase, mood: MoodKind) -> Self {
        Self {
            phase,
            mood,
            motion: MotionSettings::default(),
            scroll: None,
            binding: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> JourneyPhase {
        self.phase
    }

    pub fn mood(&self) -> MoodKind {
        self.mood
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Generation of the live binding, if any
    pub fn generation(&self) -> Option<u64> {
        self.binding.as_ref().map(|b| b.generation)
    }

    /// Ids of directives currently applied
    pub fn active_directives(&self) -> Vec<&'static str> {
        self.binding
            .as_ref()
            .map(|b| {
                b.directives
                    .iter()
                    .filter(|d| d.applied)
                    .map(|d| d.directive.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set up the binding for the current phase and mood. No-op when bound.
    pub fn bind(&mut self) -> JourneyOutput {
        if self.binding.is_some() {
            return JourneyOutput::default();
        }
        self.setup()
    }

    /// Tear down the live binding. Safe to call when unbound.
    pub fn unbind(&mut self) -> JourneyOutput {
        self.teardown()
    }

    pub fn set_phase(&mut self, phase: JourneyPhase) -> JourneyOutput {
        if phase == self.phase {
            return JourneyOutput::default();
        }
        self.phase = phase;
        // Scroll progress belongs to the previous phase's page.
        self.scroll = None;
        self.rebind()
    }

    pub fn set_mood(&mut self, mood: MoodKind) -> JourneyOutput {
        if mood == self.mood {
            return JourneyOutput::default();
        }
        self.mood = mood;
        self.rebind()
    }

    pub fn set_motion(&mut self, motion: MotionSettings) -> JourneyOutput {
        if motion == self.motion {
            return JourneyOutput::default();
        }
        self.motion = motion;
        self.rebind()
    }

    /// Feed scroll progress (0-100). Emits enter/leave commands for scroll
    /// directives whose range was crossed, and a response cue per entry.
    pub fn on_scroll(&mut self, progress: f64) -> JourneyOutput {
        if !progress.is_finite() {
            return JourneyOutput::default();
        }
        let progress = progress.clamp(0.0, 100.0);
        self.scroll = Some(progress);

        let multiplier = mood_multiplier(self.mood);
        let motion = self.motion;
        let mut output = JourneyOutput::default();
        let Some(binding) = self.binding.as_mut() else {
            return output;
        };
        let generation = binding.generation;

        for active in binding.directives.iter_mut() {
            let directive = active.directive;
            if directive.trigger == Trigger::Immediate {
                continue;
            }
            let inside = directive.trigger.contains(progress);
            if inside && !active.inside {
                output.commands.push(command(
                    generation,
                    directive,
                    AnimationAction::Enter,
                    &directive.properties,
                    directive.duration_ms,
                    multiplier,
                    motion,
                ));
                if let Some(tag) = directive.response {
                    output.responses.push(ResponseCue {
                        tag,
                        intensity: multiplier.intensity,
                    });
                }
                active.applied = true;
            } else if !inside && active.inside {
                if let Some(on_leave) = directive.on_leave.as_ref() {
                    output.commands.push(command(
                        generation,
                        directive,
                        AnimationAction::Leave,
                        on_leave,
                        directive.duration_ms,
                        multiplier,
                        motion,
                    ));
                }
            }
            active.inside = inside;
        }
        output
    }

    fn rebind(&mut self) -> JourneyOutput {
        if self.binding.is_none() {
            return JourneyOutput::default();
        }
        log::debug!(
            "journey rebinding to {}/{}",
            self.phase.as_str(),
            self.mood
        );
        let mut output = self.teardown();
        output.extend(self.setup());
        output
    }

    fn setup(&mut self) -> JourneyOutput {
        self.generation += 1;
        let generation = self.generation;
        let multiplier = mood_multiplier(self.mood);
        let mut output = JourneyOutput::default();
        let mut directives = Vec::new();

        for directive in phase_directives(self.phase) {
            // Ranges already containing the scroll position are applied
            // without a response cue; only real crossings emit responses.
            let applied = match directive.trigger {
                Trigger::Immediate => true,
                trigger => self.scroll.is_some_and(|p| trigger.contains(p)),
            };
            if applied {
                let duration = match directive.trigger {
                    Trigger::Immediate => 0,
                    _ => directive.duration_ms,
                };
                output.commands.push(command(
                    generation,
                    directive,
                    AnimationAction::Apply,
                    &directive.properties,
                    duration,
                    multiplier,
                    self.motion,
                ));
            }
            directives.push(ActiveDirective {
                directive,
                inside: applied && directive.trigger != Trigger::Immediate,
                applied,
            });
        }

        self.binding = Some(Binding {
            generation,
            directives,
        });
        output
    }

    fn teardown(&mut self) -> JourneyOutput {
        let Some(binding) = self.binding.take() else {
            return JourneyOutput::default();
        };
        let commands = binding
            .directives
            .iter()
            .filter(|d| d.applied)
            .map(|d| AnimationCommand {
                generation: binding.generation,
                directive_id: d.directive.id,
                target: d.directive.target,
                action: AnimationAction::Cancel,
                properties: PropertySet::EMPTY,
                duration_ms: 0,
            })
            .collect();
        JourneyOutput {
            commands,
            responses: Vec::new(),
        }
    }
}

fn command(
    generation: u64,
    directive: &Directive,
    action: AnimationAction,
    properties: &PropertySet,
    base_duration_ms: u64,
    multiplier: MoodMultiplier,
    motion: MotionSettings,
) -> AnimationCommand {
    AnimationCommand {
        generation,
        directive_id: directive.id,
        target: directive.target,
        action,
        properties: properties.scaled(multiplier.intensity, motion.reduced_motion),
        duration_ms: scaled_duration(base_duration_ms, multiplier, motion),
    }
}

fn scaled_duration(base_ms: u64, multiplier: MoodMultiplier, motion: MotionSettings) -> u64 {
    if motion.reduced_motion {
        return 0;
    }
    let speed = if motion.animation_speed.is_finite() && motion.animation_speed > 0.0 {
        motion.animation_speed
    } else {
        1.0
    };
    (base_ms as f64 * multiplier.duration / speed).round() as u64
}
