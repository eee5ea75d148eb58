//! Animation presets
//!
//! Pure lookups from (content category, mood, intensity) to the parameters a
//! presentation layer needs for a content card, plus a colour ramp lookup by
//! mood and time of day. Nothing here fails: unknown inputs fall back to a
//! fixed default.

use crate::error::AffectError;
use crate::types::{Intensity, MoodKind, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content categories with their own preset tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    #[default]
    Design,
    Development,
    Music,
    Writing,
    Photography,
    Marketing,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 6] = [
        ContentCategory::Design,
        ContentCategory::Development,
        ContentCategory::Music,
        ContentCategory::Writing,
        ContentCategory::Photography,
        ContentCategory::Marketing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Design => "design",
            ContentCategory::Development => "development",
            ContentCategory::Music => "music",
            ContentCategory::Writing => "writing",
            ContentCategory::Photography => "photography",
            ContentCategory::Marketing => "marketing",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = AffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AffectError::UnknownCategory(s.to_string()))
    }
}

/// The moods that have their own preset rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseMood {
    Calm,
    Excited,
    Focused,
}

impl BaseMood {
    fn from_mood(mood: MoodKind) -> Option<Self> {
        match mood {
            MoodKind::Calm => Some(BaseMood::Calm),
            MoodKind::Excited => Some(BaseMood::Excited),
            MoodKind::Focused => Some(BaseMood::Focused),
            _ => None,
        }
    }
}

/// Unscaled table row
#[derive(Debug, Clone, Copy)]
struct BasePreset {
    breathing_speed: f64,
    glow_intensity: f64,
    primary_color: &'static str,
    celebration_color: &'static str,
    hover_scale: f64,
    hover_rotation: f64,
    particle_count: u32,
    style_id: &'static str,
}

#[allow(clippy::too_many_arguments)]
const fn row(
    breathing_speed: f64,
    glow_intensity: f64,
    primary_color: &'static str,
    celebration_color: &'static str,
    hover_scale: f64,
    hover_rotation: f64,
    particle_count: u32,
    style_id: &'static str,
) -> BasePreset {
    BasePreset {
        breathing_speed,
        glow_intensity,
        primary_color,
        celebration_color,
        hover_scale,
        hover_rotation,
        particle_count,
        style_id,
    }
}

/// Preset used whenever the category or mood has no row
const FALLBACK: BasePreset = row(4.0, 0.3, "#8B5CF6", "#F59E0B", 1.02, 0.5, 6, "gentle-float");

fn base_preset(category: ContentCategory, mood: BaseMood) -> BasePreset {
    use BaseMood::*;
    use ContentCategory::*;

    match (category, mood) {
        (Design, Calm) => FALLBACK,
        (Design, Excited) => row(2.0, 0.6, "#EC4899", "#F97316", 1.05, 2.0, 12, "vibrant-bounce"),
        (Design, Focused) => row(5.0, 0.2, "#6366F1", "#10B981", 1.01, 0.0, 3, "precise-glow"),

        (Development, Calm) => row(4.5, 0.25, "#0EA5E9", "#22C55E", 1.02, 0.0, 5, "code-breathe"),
        (Development, Excited) => {
            row(2.2, 0.55, "#06B6D4", "#84CC16", 1.04, 1.0, 12, "terminal-pulse")
        }
        (Development, Focused) => row(6.0, 0.15, "#3B82F6", "#10B981", 1.01, 0.0, 2, "syntax-focus"),

        (Music, Calm) => row(3.5, 0.35, "#A855F7", "#F472B6", 1.03, 1.0, 8, "wave-sway"),
        (Music, Excited) => row(1.5, 0.7, "#D946EF", "#FACC15", 1.06, 3.0, 20, "beat-drop"),
        (Music, Focused) => row(4.5, 0.25, "#7C3AED", "#34D399", 1.02, 0.5, 4, "rhythm-lock"),

        (Writing, Calm) => row(5.0, 0.2, "#78716C", "#FBBF24", 1.01, 0.0, 3, "ink-settle"),
        (Writing, Excited) => row(2.5, 0.45, "#F43F5E", "#FB923C", 1.03, 1.5, 10, "page-flutter"),
        (Writing, Focused) => row(6.5, 0.1, "#57534E", "#A3E635", 1.01, 0.0, 1, "margin-still"),

        (Photography, Calm) => row(4.0, 0.3, "#14B8A6", "#FDE047", 1.03, 0.0, 5, "aperture-soft"),
        (Photography, Excited) => {
            row(1.8, 0.65, "#F97316", "#FACC15", 1.05, 2.0, 15, "flash-burst")
        }
        (Photography, Focused) => row(5.5, 0.2, "#0F766E", "#38BDF8", 1.02, 0.0, 2, "lens-focus"),

        (Marketing, Calm) => row(3.8, 0.35, "#22C55E", "#EAB308", 1.02, 0.5, 7, "trend-drift"),
        (Marketing, Excited) => row(1.6, 0.75, "#EF4444", "#F59E0B", 1.07, 2.5, 18, "launch-spark"),
        (Marketing, Focused) => row(4.8, 0.25, "#2563EB", "#16A34A", 1.02, 0.0, 4, "metric-track"),
    }
}

/// Scale factor applied to a base preset for an intensity preference
pub fn intensity_multiplier(intensity: Intensity) -> f64 {
    match intensity {
        Intensity::Low => 0.6,
        Intensity::Medium => 1.0,
        Intensity::High => 1.5,
    }
}

/// CSS transform pair for a card's resting and hovered states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeAfterTransform {
    pub before: String,
    pub after: String,
}

/// Animation parameters for one content card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalPreset {
    /// Breathing cycle duration (s); smaller is faster
    pub breathing_speed: f64,
    /// Glow strength (0-1)
    pub glow_intensity: f64,
    pub primary_color: String,
    pub celebration_color: String,
    pub hover_scale: f64,
    /// Hover rotation (deg)
    pub hover_rotation: f64,
    pub particle_count: u32,
    pub style_id: String,
    pub before_after_transform: BeforeAfterTransform,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Preset and palette lookups
pub struct PresetResolver;

impl PresetResolver {
    /// Resolve the preset for a category, mood and intensity.
    ///
    /// Moods without a row (stressed, happy, contemplative) resolve to the
    /// design/calm preset, as does any unknown category.
    pub fn resolve(category: ContentCategory, mood: MoodKind, intensity: Intensity) -> EmotionalPreset {
        let base = match BaseMood::from_mood(mood) {
            Some(base_mood) => base_preset(category, base_mood),
            None => FALLBACK,
        };
        Self::scale(&base, intensity_multiplier(intensity))
    }

    /// Lenient string entry point. Unknown category or mood names fall back
    /// to design/calm; an unknown intensity is treated as medium.
    pub fn resolve_by_name(category: &str, mood: &str, intensity: &str) -> EmotionalPreset {
        let intensity = intensity.parse::<Intensity>().unwrap_or_default();
        match (category.parse::<ContentCategory>(), mood.parse::<MoodKind>()) {
            (Ok(category), Ok(mood)) => Self::resolve(category, mood, intensity),
            _ => {
                log::debug!("no preset for '{category}'/'{mood}', using design/calm");
                Self::scale(&FALLBACK, intensity_multiplier(intensity))
            }
        }
    }

    /// Three-colour ramp for a mood at a time of day.
    ///
    /// Only calm, excited and focused have ramps; other moods use the
    /// afternoon/calm ramp.
    pub fn color_palette(mood: MoodKind, time_of_day: TimeOfDay) -> [&'static str; 3] {
        use TimeOfDay::*;

        const AFTERNOON_CALM: [&str; 3] = ["#DBEAFE", "#BFDBFE", "#93C5FD"];

        let Some(base) = BaseMood::from_mood(mood) else {
            return AFTERNOON_CALM;
        };
        match (time_of_day, base) {
            (Morning, BaseMood::Calm) => ["#FEF3C7", "#FDE68A", "#FCD34D"],
            (Morning, BaseMood::Excited) => ["#FED7AA", "#FDBA74", "#FB923C"],
            (Morning, BaseMood::Focused) => ["#E0F2FE", "#BAE6FD", "#7DD3FC"],

            (Afternoon, BaseMood::Calm) => AFTERNOON_CALM,
            (Afternoon, BaseMood::Excited) => ["#FBCFE8", "#F9A8D4", "#F472B6"],
            (Afternoon, BaseMood::Focused) => ["#C7D2FE", "#A5B4FC", "#818CF8"],

            (Evening, BaseMood::Calm) => ["#FFE4E6", "#FECDD3", "#FDA4AF"],
            (Evening, BaseMood::Excited) => ["#FCA5A5", "#F87171", "#EF4444"],
            (Evening, BaseMood::Focused) => ["#DDD6FE", "#C4B5FD", "#A78BFA"],

            (Night, BaseMood::Calm) => ["#1E1B4B", "#312E81", "#3730A3"],
            (Night, BaseMood::Excited) => ["#4C1D95", "#6D28D9", "#8B5CF6"],
            (Night, BaseMood::Focused) => ["#0F172A", "#1E293B", "#334155"],
        }
    }

    fn scale(base: &BasePreset, multiplier: f64) -> EmotionalPreset {
        let hover_scale = 1.0 + (base.hover_scale - 1.0) * multiplier;
        let hover_rotation = base.hover_rotation * multiplier;
        // Nudge before flooring so exact products like 5 * 0.6 stay at 3.
        let particle_count = (f64::from(base.particle_count) * multiplier + 1e-9).floor() as u32;

        EmotionalPreset {
            breathing_speed: base.breathing_speed / multiplier,
            glow_intensity: (base.glow_intensity * multiplier).min(1.0),
            primary_color: base.primary_color.to_string(),
            celebration_color: base.celebration_color.to_string(),
            hover_scale,
            hover_rotation,
            particle_count,
            style_id: base.style_id.to_string(),
            before_after_transform: BeforeAfterTransform {
                before: "scale(1) rotate(0deg)".to_string(),
                after: format!(
                    "scale({}) rotate({}deg)",
                    round_to(hover_scale, 3),
                    round_to(hover_rotation, 2)
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_development_excited_high() {
        let high = PresetResolver::resolve(
            ContentCategory::Development,
            MoodKind::Excited,
            Intensity::High,
        );
        let medium = PresetResolver::resolve(
            ContentCategory::Development,
            MoodKind::Excited,
            Intensity::Medium,
        );

        assert_eq!(high.particle_count, 18);
        assert!(high.breathing_speed < medium.breathing_speed);
        assert!(high.glow_intensity > medium.glow_intensity);
        assert_eq!(high.style_id, "terminal-pulse");
    }

    #[test]
    fn test_medium_matches_table() {
        let preset =
            PresetResolver::resolve(ContentCategory::Music, MoodKind::Calm, Intensity::Medium);
        assert_eq!(preset.breathing_speed, 3.5);
        assert_eq!(preset.glow_intensity, 0.35);
        assert_eq!(preset.primary_color, "#A855F7");
        assert_eq!(preset.celebration_color, "#F472B6");
        assert!((preset.hover_scale - 1.03).abs() < 1e-9);
        assert_eq!(preset.hover_rotation, 1.0);
        assert_eq!(preset.particle_count, 8);
        assert_eq!(
            preset.before_after_transform,
            BeforeAfterTransform {
                before: "scale(1) rotate(0deg)".to_string(),
                after: "scale(1.03) rotate(1deg)".to_string(),
            }
        );
    }

    #[test]
    fn test_low_intensity_scaling() {
        let preset =
            PresetResolver::resolve(ContentCategory::Photography, MoodKind::Calm, Intensity::Low);
        // 5 * 0.6
        assert_eq!(preset.particle_count, 3);
        assert!((preset.breathing_speed - 4.0 / 0.6).abs() < 1e-9);
        assert!((preset.hover_scale - 1.018).abs() < 1e-9);
    }

    #[test]
    fn test_glow_is_capped() {
        let preset =
            PresetResolver::resolve(ContentCategory::Marketing, MoodKind::Excited, Intensity::High);
        assert_eq!(preset.glow_intensity, 1.0);
    }

    #[test]
    fn test_moods_without_rows_fall_back() {
        let expected =
            PresetResolver::resolve(ContentCategory::Design, MoodKind::Calm, Intensity::Medium);
        for mood in [MoodKind::Stressed, MoodKind::Happy, MoodKind::Contemplative] {
            let preset = PresetResolver::resolve(ContentCategory::Music, mood, Intensity::Medium);
            assert_eq!(preset, expected);
        }
    }

    #[test]
    fn test_resolve_by_name() {
        let preset = PresetResolver::resolve_by_name("Writing", "focused", "high");
        assert_eq!(preset.style_id, "margin-still");
        assert_eq!(preset.particle_count, 1);

        let fallback = PresetResolver::resolve_by_name("pottery", "excited", "medium");
        assert_eq!(fallback.style_id, "gentle-float");

        let unknown_intensity = PresetResolver::resolve_by_name("design", "calm", "extreme");
        assert_eq!(unknown_intensity.particle_count, 6);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "photography".parse::<ContentCategory>().unwrap(),
            ContentCategory::Photography
        );
        assert!(matches!(
            "pottery".parse::<ContentCategory>(),
            Err(AffectError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_color_palette() {
        assert_eq!(
            PresetResolver::color_palette(MoodKind::Calm, TimeOfDay::Night),
            ["#1E1B4B", "#312E81", "#3730A3"]
        );
        assert_eq!(
            PresetResolver::color_palette(MoodKind::Stressed, TimeOfDay::Morning),
            PresetResolver::color_palette(MoodKind::Calm, TimeOfDay::Afternoon)
        );
    }
}
