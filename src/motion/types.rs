//! Motion data types
//!
//! This module defines the samples, inbound platform events and published
//! analysis snapshots that flow through the motion engine.

use serde::{Deserialize, Serialize};

/// Three-axis acceleration in the device-local frame (m/s², includes gravity)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the vector
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

/// Angular velocity around the device axes (deg/s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationRate {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// One instantaneous motion reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Acceleration including gravity
    pub acceleration: Acceleration,
    /// Rotation rate
    pub rotation_rate: RotationRate,
    /// Capture time in milliseconds
    pub timestamp: i64,
}

impl MotionSample {
    pub fn new(acceleration: Acceleration, timestamp: i64) -> Self {
        Self {
            acceleration,
            rotation_rate: RotationRate::default(),
            timestamp,
        }
    }

    /// Convert a platform event into a sample, defaulting missing axes to 0
    pub fn from_event(event: &MotionEvent, timestamp: i64) -> Self {
        let accel = event.acceleration_including_gravity.unwrap_or_default();
        let rotation = event.rotation_rate.unwrap_or_default();

        Self {
            acceleration: Acceleration {
                x: reading(accel.x),
                y: reading(accel.y),
                z: reading(accel.z),
            },
            rotation_rate: RotationRate {
                alpha: reading(rotation.alpha),
                beta: reading(rotation.beta),
                gamma: reading(rotation.gamma),
            },
            timestamp,
        }
    }
}

/// Missing and non-finite readings both count as absent
fn reading(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Partial acceleration reading as delivered by a platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelerationReading {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

/// Partial rotation reading as delivered by a platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationReading {
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
}

/// A motion event from the platform event source.
///
/// Every field is optional; hardware that cannot report an axis leaves it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    /// Acceleration including gravity
    #[serde(default, alias = "accelerationIncludingGravity")]
    pub acceleration_including_gravity: Option<AccelerationReading>,
    /// Rotation rate
    #[serde(default, alias = "rotationRate")]
    pub rotation_rate: Option<RotationReading>,
    /// Capture time, present in recordings; live events are stamped on arrival
    #[serde(
        default,
        alias = "timestamp",
        alias = "timestampMs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_ms: Option<i64>,
}

impl MotionEvent {
    /// Event carrying a full acceleration reading and nothing else
    pub fn with_acceleration(x: f64, y: f64, z: f64) -> Self {
        Self {
            acceleration_including_gravity: Some(AccelerationReading {
                x: Some(x),
                y: Some(y),
                z: Some(z),
            }),
            rotation_rate: None,
            timestamp_ms: None,
        }
    }

    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Unrounded analyzer output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionMetrics {
    /// 0-100, higher = smoother movement
    pub fluidity_score: f64,
    /// 0-100, scaled average acceleration magnitude
    pub intensity: f64,
    /// Sign flips accompanied by high jerk
    pub direction_changes: u32,
    /// Whether intensity exceeds the activity threshold
    pub is_active: bool,
}

/// Published motion analysis snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionAnalysis {
    /// 0-100, higher = smoother movement
    pub fluidity_score: u8,
    /// 0-100, movement intensity
    pub intensity: u8,
    /// Number of abrupt direction changes in the window
    pub direction_changes: u32,
    /// Whether the user is actively moving
    pub is_active: bool,
    /// The window this analysis was computed from
    pub raw_data: Vec<MotionSample>,
}

impl MotionAnalysis {
    /// Round analyzer metrics for publication alongside their window
    pub fn from_metrics(metrics: MotionMetrics, raw_data: Vec<MotionSample>) -> Self {
        Self {
            fluidity_score: round_score(metrics.fluidity_score),
            intensity: round_score(metrics.intensity),
            direction_changes: metrics.direction_changes,
            is_active: metrics.is_active,
            raw_data,
        }
    }

    /// Whether this is the zero state published before tracking or after a stop
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

fn round_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Outcome of motion permission negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Not yet requested
    #[default]
    Prompt,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Prompt => "prompt",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
        }
    }
}
