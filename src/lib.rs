//! Precept Motion - On-device motion analysis for skill practice
//!
//! Precept turns a live accelerometer/gyroscope stream into fluidity,
//! intensity and direction-change metrics through a deterministic pipeline:
//! platform event → throttle → trailing window → analyzer → published analysis.
//!
//! ## Modules
//!
//! - **Motion**: Acquisition lifecycle, permission negotiation and the analyzer
//! - **Session**: Practice session recording and mastery checks
//! - **Replay**: Recorded motion streams for offline and deterministic runs

pub mod config;
pub mod error;
pub mod motion;
pub mod replay;
pub mod session;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{PracticeConfig, TrackerConfig, ANALYSIS_WINDOW_MS, SAMPLE_RATE_MS};
pub use error::MotionError;
pub use motion::{
    MotionAnalysis, MotionAnalyzer, MotionEvent, MotionMetrics, MotionPlatform, MotionSample,
    MotionStream, MotionTracker, PermissionGate, PermissionPrompt, PermissionStatus,
};
pub use replay::{replay, RecordingAdapter, ReplayPermission, ReplayPlatform};
pub use session::{
    best_session_average, is_skill_mastered, overall_average_fluidity, CompletedPractice,
    PracticeRecorder, PracticeSession, PracticeState, SessionSummary,
};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported reports
pub const PRODUCER_NAME: &str = "precept-motion";
