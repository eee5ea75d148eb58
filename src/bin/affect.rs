//! Affect CLI - Command-line interface for Synheart Affect
//!
//! Commands:
//! - replay: Feed recorded interaction events through the engine
//! - preset: Resolve an animation preset
//! - palette: Print the colour ramp for a mood and time of day
//! - doctor: Diagnose configuration and environment
//! - schema: Print the interaction event schema

use chrono::{DateTime, Duration, Local, TimeZone, Timelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use synheart_affect::preset::{ContentCategory, PresetResolver};
use synheart_affect::types::{Intensity, MoodKind, TimeOfDay};
use synheart_affect::{
    AffectEngine, AffectError, EmotionalState, EngineConfig, EventBus, InteractionEvent,
    ManualClock, TickReport, AFFECT_VERSION, PRODUCER_NAME,
};

/// Affect - On-device affective interaction engine
#[derive(Parser)]
#[command(name = "affect")]
#[command(author = "Synheart AI Inc")]
#[command(version = AFFECT_VERSION)]
#[command(about = "Infer mood from UI interaction telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded interaction events (NDJSON) through the engine
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Local hour (0-23) used for time of day; defaults to the current hour
        #[arg(long)]
        hour: Option<u32>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Resolve the animation preset for a content card
    Preset {
        /// Content category (design, development, music, writing, photography, marketing)
        #[arg(long, default_value = "design")]
        category: String,

        /// Mood (calm, excited, focused, stressed, happy, contemplative)
        #[arg(long, default_value = "calm")]
        mood: String,

        /// Intensity (low, medium, high)
        #[arg(long, default_value = "medium")]
        intensity: String,
    },

    /// Print the colour ramp for a mood and time of day
    Palette {
        /// Mood
        #[arg(long, default_value = "calm")]
        mood: String,

        /// Time of day (morning, afternoon, evening, night)
        #[arg(long, default_value = "afternoon")]
        time_of_day: String,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the interaction event JSON schema
    Schema,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one tick report per line)
    Ndjson,
    /// Pretty-printed JSON summary
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AffectCliError> {
    match cli.command {
        Commands::Replay {
            input,
            config,
            hour,
            output_format,
        } => cmd_replay(&input, config.as_deref(), hour, output_format),

        Commands::Preset {
            category,
            mood,
            intensity,
        } => cmd_preset(&category, &mood, &intensity),

        Commands::Palette { mood, time_of_day } => cmd_palette(&mood, &time_of_day),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema => cmd_schema(),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, AffectCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(EngineConfig::from_json(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, AffectCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Fixed replay origin; event timestamps are offsets from the first event
fn replay_origin() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

fn cmd_replay(
    input: &Path,
    config: Option<&Path>,
    hour: Option<u32>,
    output_format: OutputFormat,
) -> Result<(), AffectCliError> {
    let config = load_config(config)?;
    let events = InteractionEvent::parse_ndjson(&read_input(input)?)?;
    if events.is_empty() {
        return Err(AffectCliError::NoEvents);
    }

    let hour = match hour {
        Some(h) if h < 24 => h,
        Some(h) => return Err(AffectCliError::InvalidHour(h)),
        None => Local::now().hour(),
    };

    let origin = replay_origin();
    let clock = ManualClock::with_hour(origin, hour);
    let analysis_interval_ms = config.analysis_interval_ms;
    let mut engine = AffectEngine::with_clock(config, clock.clone())?;
    let bus = EventBus::new();
    engine.attach(Rc::new(bus.clone()));

    let first_t = events
        .iter()
        .map(InteractionEvent::timestamp)
        .find(|t| t.is_finite())
        .unwrap_or(0.0);

    let mut reports: Vec<TickReport> = Vec::new();
    for event in &events {
        let t = event.timestamp();
        if t.is_finite() {
            let at = Duration::try_milliseconds((t - first_t).max(0.0) as i64)
                .and_then(|offset| origin.checked_add_signed(offset));
            match at {
                Some(at) => clock.set(at),
                None => log::warn!("event timestamp {t} out of range; clock not moved"),
            }
            reports.extend(engine.advance());
        }

        bus.dispatch(event);
    }

    // Flush the input and samples captured after the last tick
    clock.advance_ms(analysis_interval_ms);
    reports.extend(engine.advance());

    log::info!(
        "replayed {} events into {} analysis ticks",
        events.len(),
        reports.len()
    );

    let summary = ReplaySummary {
        producer: PRODUCER_NAME.to_string(),
        version: AFFECT_VERSION.to_string(),
        instance_id: engine.instance_id().to_string(),
        events: events.len(),
        committed: reports.iter().filter(|r| r.committed).count(),
        final_state: engine.snapshot(),
        ticks: reports,
    };
    engine.detach();

    match output_format {
        OutputFormat::Ndjson => {
            for report in &summary.ticks {
                println!("{}", serde_json::to_string(report)?);
            }
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn cmd_preset(category: &str, mood: &str, intensity: &str) -> Result<(), AffectCliError> {
    let category: ContentCategory = category.parse()?;
    let mood: MoodKind = mood.parse()?;
    let intensity: Intensity = intensity.parse()?;

    let preset = PresetResolver::resolve(category, mood, intensity);
    println!("{}", serde_json::to_string_pretty(&preset)?);
    Ok(())
}

fn cmd_palette(mood: &str, time_of_day: &str) -> Result<(), AffectCliError> {
    let mood: MoodKind = mood.parse()?;
    let time_of_day: TimeOfDay = time_of_day.parse()?;

    let palette = PresetResolver::color_palette(mood, time_of_day);
    println!("{}", serde_json::to_string(&palette)?);
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), AffectCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "affect_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Affect version {}", AFFECT_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        Some(path) => match load_config(Some(path)) {
            Ok(config) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (analysis every {} ms, threshold {})",
                    config.analysis_interval_ms, config.confidence_threshold
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    let hour = Local::now().hour();
    checks.push(DoctorCheck {
        name: "time_of_day".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "Local hour {} maps to {}",
            hour,
            TimeOfDay::from_hour(hour).as_str()
        ),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (use -i <file> for replay)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay -i - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: AFFECT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Affect Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AffectCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema() -> Result<(), AffectCliError> {
    println!("{}", serde_json::to_string_pretty(&interaction_event_schema())?);
    Ok(())
}

fn interaction_event_schema() -> serde_json::Value {
    let t = serde_json::json!({ "type": "number", "description": "Timestamp in milliseconds" });
    let coord = serde_json::json!({ "type": "number" });
    let variant = |name: &str, extra: serde_json::Value| {
        let mut properties = serde_json::json!({
            "type": { "const": name },
            "t": t.clone(),
        });
        if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
            props.extend(extra.clone());
        }
        serde_json::json!({
            "type": "object",
            "required": ["type", "t"],
            "properties": properties,
        })
    };

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/affect.interaction_event.v1.json",
        "title": "InteractionEvent",
        "description": "Synheart Affect interaction event (one per NDJSON line)",
        "oneOf": [
            variant("pointer_move", serde_json::json!({ "x": coord, "y": coord })),
            variant("click", serde_json::json!({})),
            variant("scroll", serde_json::json!({
                "y": { "type": "number", "description": "Vertical scroll offset (px)" },
                "progress": { "type": "number", "minimum": 0, "maximum": 100 }
            })),
            variant("hover_enter", serde_json::json!({})),
            variant("hover_leave", serde_json::json!({})),
            variant("key_down", serde_json::json!({})),
        ]
    })
}

// Error types

#[derive(Debug)]
enum AffectCliError {
    Io(io::Error),
    Affect(AffectError),
    Json(serde_json::Error),
    NoEvents,
    InvalidHour(u32),
    DoctorFailed,
}

impl From<io::Error> for AffectCliError {
    fn from(e: io::Error) -> Self {
        AffectCliError::Io(e)
    }
}

impl From<AffectError> for AffectCliError {
    fn from(e: AffectError) -> Self {
        AffectCliError::Affect(e)
    }
}

impl From<serde_json::Error> for AffectCliError {
    fn from(e: serde_json::Error) -> Self {
        AffectCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AffectCliError> for CliError {
    fn from(e: AffectCliError) -> Self {
        match e {
            AffectCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AffectCliError::Affect(e) => {
                let (code, hint) = match &e {
                    AffectError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'affect doctor --config <file>' for details")
                    }
                    AffectError::EventParseError(_) => {
                        ("PARSE_ERROR", "Run 'affect schema' for the event format")
                    }
                    AffectError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    _ => ("INVALID_ARGUMENT", "Run 'affect --help' for accepted values"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            AffectCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AffectCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AffectCliError::InvalidHour(hour) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: format!("Hour {} is out of range", hour),
                hint: Some("Use an hour between 0 and 23".to_string()),
            },
            AffectCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ReplaySummary {
    producer: String,
    version: String,
    instance_id: String,
    events: usize,
    committed: usize,
    final_state: EmotionalState,
    ticks: Vec<TickReport>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
