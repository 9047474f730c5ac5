//! Fluidity and intensity analysis
//!
//! Derives smoothness, intensity and direction-change metrics from a window of
//! motion samples. The analysis is a pure function of its input window.

use crate::motion::types::{Acceleration, MotionMetrics, MotionSample};

/// Windows shorter than this produce the zero state
pub const MIN_SAMPLES: usize = 10;

/// Jerk magnitude a sign flip must exceed to count as a direction change
pub const JERK_THRESHOLD: f64 = 15.0;

/// Intensity above which the user is considered to be moving
pub const ACTIVITY_THRESHOLD: f64 = 10.0;

/// Fluidity points lost per unit of average jerk
const FLUIDITY_JERK_WEIGHT: f64 = 2.0;

/// Intensity points per unit of average acceleration magnitude
const INTENSITY_SCALE: f64 = 5.0;

/// Analyzer for motion windows
pub struct MotionAnalyzer;

impl MotionAnalyzer {
    /// Analyze a window of samples ordered by ascending timestamp.
    ///
    /// Returns the zero state when fewer than [`MIN_SAMPLES`] samples are
    /// available. Pairs with non-increasing timestamps are skipped.
    pub fn analyze(window: &[MotionSample]) -> MotionMetrics {
        if window.len() < MIN_SAMPLES {
            return MotionMetrics::default();
        }

        let mut total_jerk = 0.0;
        let mut total_magnitude = 0.0;
        let mut direction_changes = 0u32;
        let mut prev_direction: Option<[i8; 3]> = None;

        for pair in window.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let dt = curr.timestamp.saturating_sub(prev.timestamp) as f64 / 1000.0;

            if dt <= 0.0 {
                continue;
            }

            let jerk = jerk_magnitude(&prev.acceleration, &curr.acceleration, dt);
            total_jerk += jerk;
            total_magnitude += curr.acceleration.magnitude();

            let direction = direction_of(&curr.acceleration);
            if let Some(previous) = prev_direction {
                if direction != previous && jerk > JERK_THRESHOLD {
                    direction_changes += 1;
                }
            }
            prev_direction = Some(direction);
        }

        let avg_jerk = total_jerk / (window.len() - 1) as f64;
        let avg_magnitude = total_magnitude / window.len() as f64;

        let fluidity_score = compute_fluidity(avg_jerk);
        let intensity = compute_intensity(avg_magnitude);

        MotionMetrics {
            fluidity_score,
            intensity,
            direction_changes,
            is_active: is_active(intensity),
        }
    }
}

/// Euclidean norm of per-axis jerk between two readings `dt` seconds apart
fn jerk_magnitude(prev: &Acceleration, curr: &Acceleration, dt: f64) -> f64 {
    let jx = (curr.x - prev.x).abs() / dt;
    let jy = (curr.y - prev.y).abs() / dt;
    let jz = (curr.z - prev.z).abs() / dt;
    (jx.powi(2) + jy.powi(2) + jz.powi(2)).sqrt()
}

/// Per-axis sign: -1, 0 or +1. Zero stays zero.
fn direction_of(accel: &Acceleration) -> [i8; 3] {
    [sign(accel.x), sign(accel.y), sign(accel.z)]
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Fluidity score
///
/// Formula: `clamp(100 - avg_jerk * 2, 0, 100)`
fn compute_fluidity(avg_jerk: f64) -> f64 {
    bounded(100.0 - avg_jerk * FLUIDITY_JERK_WEIGHT)
}

/// Intensity
///
/// Formula: `clamp(avg_magnitude * 5, 0, 100)`. The magnitude includes gravity.
fn compute_intensity(avg_magnitude: f64) -> f64 {
    bounded(avg_magnitude * INTENSITY_SCALE)
}

/// Whether an (unrounded) intensity counts as active movement
pub fn is_active(intensity: f64) -> bool {
    intensity > ACTIVITY_THRESHOLD
}

/// Clamp into 0-100; NaN collapses to 0
fn bounded(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
