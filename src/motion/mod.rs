//! Motion signal analysis
//!
//! This module turns a live stream of accelerometer/gyroscope events into
//! fluidity, intensity and direction-change metrics.
//!
//! Pipeline: Platform event → Throttle → Sample window → Analyzer → Published analysis

pub mod analyzer;
pub mod permission;
pub mod stream;
pub mod tracker;
pub mod types;
pub mod window;

pub use analyzer::{MotionAnalyzer, ACTIVITY_THRESHOLD, JERK_THRESHOLD, MIN_SAMPLES};
pub use permission::{FixedPrompt, PermissionGate, PermissionPrompt};
pub use stream::MotionStream;
pub use tracker::{MotionPlatform, MotionTracker};
pub use types::{
    Acceleration, AccelerationReading, MotionAnalysis, MotionEvent, MotionMetrics, MotionSample,
    PermissionStatus, RotationRate, RotationReading,
};
pub use window::SampleWindow;
