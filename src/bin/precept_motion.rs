//! Precept CLI - Command-line interface for Precept Motion
//!
//! Commands:
//! - replay: Stream published analyses for a recorded motion stream
//! - practice: Replay a recording as a practice session and print the summary
//! - doctor: Diagnose engine version, constants and configuration

use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use precept_motion::motion::{ACTIVITY_THRESHOLD, JERK_THRESHOLD, MIN_SAMPLES};
use precept_motion::{
    replay, CompletedPractice, MotionAnalysis, MotionError, MotionEvent, MotionTracker,
    PermissionStatus, PracticeConfig, PracticeRecorder, RecordingAdapter, ReplayPermission,
    ReplayPlatform, TrackerConfig, ENGINE_VERSION, PRODUCER_NAME,
};

/// Precept - On-device motion analysis for skill practice
#[derive(Parser)]
#[command(name = "precept-motion")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Analyze recorded motion streams for fluidity and intensity", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recording and emit every published analysis
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Tracker config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// How the simulated platform answers the permission prompt
        #[arg(long, default_value = "ungated")]
        permission: PermissionMode,

        /// Drop the raw window from each published analysis
        #[arg(long)]
        omit_raw: bool,
    },

    /// Replay a recording as one practice session and print its summary
    Practice {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Skill being practiced
        #[arg(short, long)]
        skill: String,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Tracker config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Practice config file (JSON)
        #[arg(long)]
        practice_config: Option<PathBuf>,

        /// How the simulated platform answers the permission prompt
        #[arg(long, default_value = "ungated")]
        permission: PermissionMode,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a tracker config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one motion event per line)
    Ndjson,
    /// JSON array of motion events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one analysis per line)
    Ndjson,
    /// JSON array of analyses
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PermissionMode {
    /// No permission gate
    Ungated,
    /// Gated, the prompt grants access
    Grant,
    /// Gated, the prompt denies access
    Deny,
}

impl From<PermissionMode> for ReplayPermission {
    fn from(mode: PermissionMode) -> Self {
        match mode {
            PermissionMode::Ungated => ReplayPermission::Ungated,
            PermissionMode::Grant => ReplayPermission::Grant,
            PermissionMode::Deny => ReplayPermission::Deny,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
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

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), PreceptCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            config,
            permission,
            omit_raw,
        } => {
            cmd_replay(
                &input,
                &output,
                input_format,
                output_format,
                config.as_deref(),
                permission,
                omit_raw,
            )
            .await
        }

        Commands::Practice {
            input,
            skill,
            input_format,
            config,
            practice_config,
            permission,
        } => {
            cmd_practice(
                &input,
                &skill,
                input_format,
                config.as_deref(),
                practice_config.as_deref(),
                permission,
            )
            .await
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

async fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    permission: PermissionMode,
    omit_raw: bool,
) -> Result<(), PreceptCliError> {
    let events = read_events(input, &input_format)?;
    let tracker_config = load_tracker_config(config)?;

    let mut tracker =
        MotionTracker::with_config(ReplayPlatform::new(permission.into()), tracker_config);
    start_tracker(&mut tracker).await?;

    let mut analyses = replay(&mut tracker, &events)?;
    tracker.stop_tracking();

    if omit_raw {
        for analysis in &mut analyses {
            analysis.raw_data.clear();
        }
    }

    let output_data = format_output(&analyses, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

async fn cmd_practice(
    input: &Path,
    skill: &str,
    input_format: InputFormat,
    config: Option<&Path>,
    practice_config: Option<&Path>,
    permission: PermissionMode,
) -> Result<(), PreceptCliError> {
    let events = read_events(input, &input_format)?;
    let tracker_config = load_tracker_config(config)?;
    let practice_config = match practice_config {
        Some(path) => PracticeConfig::from_json(&fs::read_to_string(path)?)?,
        None => PracticeConfig::default(),
    };

    let mut tracker =
        MotionTracker::with_config(ReplayPlatform::new(permission.into()), tracker_config);
    start_tracker(&mut tracker).await?;

    let mut recorder = PracticeRecorder::with_config(practice_config);
    recorder.start_at(skill, recording_time(events.first()))?;

    let analyses = replay(&mut tracker, &events)?;
    let recorded = analyses.iter().filter(|a| recorder.record(a)).count();
    tracker.stop_tracking();
    debug!(published = analyses.len(), recorded, "practice recording scored");

    let completed: CompletedPractice = recorder.finish_at(recording_time(events.last()))?;
    println!("{}", serde_json::to_string_pretty(&completed)?);

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PreceptCliError> {
    let defaults = TrackerConfig::default();
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "engine_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Precept Motion version {}", ENGINE_VERSION),
        },
        DoctorCheck {
            name: "acquisition".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Sample interval {} ms, analysis window {} ms",
                defaults.sample_interval_ms, defaults.analysis_window_ms
            ),
        },
        DoctorCheck {
            name: "analyzer".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Min samples {}, jerk threshold {}, activity threshold {}",
                MIN_SAMPLES, JERK_THRESHOLD, ACTIVITY_THRESHOLD
            ),
        },
    ];

    // Check config file if provided
    if let Some(config_path) = config {
        let check = if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match TrackerConfig::from_json(&content) {
                    Ok(loaded) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (interval {} ms, window {} ms)",
                            loaded.sample_interval_ms, loaded.analysis_window_ms
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (recordings can be piped in with -i -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Precept Doctor Report");
        println!("=====================");
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
        Err(PreceptCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_events(input: &Path, format: &InputFormat) -> Result<Vec<MotionEvent>, PreceptCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading motion events from an interactive terminal, end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = match format {
        InputFormat::Ndjson => RecordingAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RecordingAdapter::parse_array(&input_data)?,
    };
    debug!(events = events.len(), "motion recording loaded");
    Ok(events)
}

fn load_tracker_config(path: Option<&Path>) -> Result<TrackerConfig, PreceptCliError> {
    match path {
        Some(path) => Ok(TrackerConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(TrackerConfig::default()),
    }
}

async fn start_tracker(
    tracker: &mut MotionTracker<ReplayPlatform>,
) -> Result<(), PreceptCliError> {
    if tracker.start_tracking().await {
        Ok(())
    } else {
        Err(PreceptCliError::TrackingRefused(tracker.permission_status()))
    }
}

/// Wall-clock time of a recorded event, falling back to now
fn recording_time(event: Option<&MotionEvent>) -> DateTime<Utc> {
    event
        .and_then(|e| e.timestamp_ms)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}

fn format_output(
    analyses: &[MotionAnalysis],
    format: &OutputFormat,
) -> Result<String, PreceptCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for analysis in analyses {
                lines.push(serde_json::to_string(analysis)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(analyses)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(analyses)?),
    }
}

// Error handling

#[derive(Debug)]
enum PreceptCliError {
    Io(io::Error),
    Motion(MotionError),
    Json(serde_json::Error),
    TrackingRefused(PermissionStatus),
    DoctorFailed,
}

impl From<io::Error> for PreceptCliError {
    fn from(e: io::Error) -> Self {
        PreceptCliError::Io(e)
    }
}

impl From<MotionError> for PreceptCliError {
    fn from(e: MotionError) -> Self {
        PreceptCliError::Motion(e)
    }
}

impl From<serde_json::Error> for PreceptCliError {
    fn from(e: serde_json::Error) -> Self {
        PreceptCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PreceptCliError> for CliError {
    fn from(e: PreceptCliError) -> Self {
        match e {
            PreceptCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PreceptCliError::Motion(e) => {
                let (code, hint) = match &e {
                    MotionError::JsonError(_) | MotionError::ParseError { .. } => (
                        "PARSE_ERROR",
                        "Each event needs acceleration_including_gravity and timestamp_ms",
                    ),
                    MotionError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'precept-motion doctor --config <file>'")
                    }
                    MotionError::MissingTimestamp(_) => {
                        ("MISSING_TIMESTAMP", "Every recorded event needs timestamp_ms")
                    }
                    MotionError::NoEvents => ("NO_EVENTS", "Ensure input file is not empty"),
                    MotionError::InvalidPracticeState { .. } => {
                        ("PRACTICE_STATE", "Start a session before finishing it")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PreceptCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PreceptCliError::TrackingRefused(status) => CliError {
                code: "TRACKING_REFUSED".to_string(),
                message: format!("Motion tracking not started (permission {})", status.as_str()),
                hint: Some("Use --permission grant or --permission ungated".to_string()),
            },
            PreceptCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
