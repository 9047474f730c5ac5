//! Tunable settings for acquisition and practice recording
//!
//! Defaults carry the calibrated constants; downstream scoring is tuned
//! against them, so changing a default changes observable behavior.

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Minimum interval between accepted samples (ms)
pub const SAMPLE_RATE_MS: i64 = 50;

/// Length of the trailing analysis window (ms)
pub const ANALYSIS_WINDOW_MS: i64 = 2000;

/// Most recent fluidity scores kept per practice session
pub const DEFAULT_HISTORY_LIMIT: usize = 51;

/// Completed sessions required before a skill can be mastered
pub const DEFAULT_MASTERY_MIN_SESSIONS: usize = 3;

/// Average fluidity required for mastery
pub const DEFAULT_MASTERY_MIN_AVERAGE: f64 = 70.0;

/// Sample acquisition settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Events arriving sooner than this after the last accepted sample are dropped
    pub sample_interval_ms: i64,
    /// Samples with `now - timestamp >= analysis_window_ms` are evicted
    pub analysis_window_ms: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: SAMPLE_RATE_MS,
            analysis_window_ms: ANALYSIS_WINDOW_MS,
        }
    }
}

impl TrackerConfig {
    /// Load and validate a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, MotionError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace out-of-range fields with their defaults
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            sample_interval_ms: if self.sample_interval_ms < 0 {
                defaults.sample_interval_ms
            } else {
                self.sample_interval_ms
            },
            analysis_window_ms: if self.analysis_window_ms <= 0 {
                defaults.analysis_window_ms
            } else {
                self.analysis_window_ms
            },
        }
    }

    pub fn to_json(&self) -> Result<String, MotionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), MotionError> {
        if self.sample_interval_ms < 0 {
            return Err(MotionError::InvalidConfig(format!(
                "sample_interval_ms must be >= 0, got {}",
                self.sample_interval_ms
            )));
        }
        if self.analysis_window_ms <= 0 {
            return Err(MotionError::InvalidConfig(format!(
                "analysis_window_ms must be > 0, got {}",
                self.analysis_window_ms
            )));
        }
        Ok(())
    }
}

/// Practice recording and mastery settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub history_limit: usize,
    pub mastery_min_sessions: usize,
    pub mastery_min_average: f64,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            mastery_min_sessions: DEFAULT_MASTERY_MIN_SESSIONS,
            mastery_min_average: DEFAULT_MASTERY_MIN_AVERAGE,
        }
    }
}

impl PracticeConfig {
    pub fn from_json(json: &str) -> Result<Self, MotionError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MotionError> {
        if self.history_limit == 0 {
            return Err(MotionError::InvalidConfig(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.mastery_min_average) {
            return Err(MotionError::InvalidConfig(format!(
                "mastery_min_average must be within 0-100, got {}",
                self.mastery_min_average
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_defaults_match_constants() {
        let config = TrackerConfig::default();
        assert_eq!(config.sample_interval_ms, 50);
        assert_eq!(config.analysis_window_ms, 2000);
    }

    #[test]
    fn test_tracker_partial_json_uses_defaults() {
        let config = TrackerConfig::from_json(r#"{"analysis_window_ms": 3000}"#).unwrap();
        assert_eq!(config.sample_interval_ms, 50);
        assert_eq!(config.analysis_window_ms, 3000);
    }

    #[test]
    fn test_tracker_rejects_empty_window() {
        let result = TrackerConfig::from_json(r#"{"analysis_window_ms": 0}"#);
        assert!(matches!(result, Err(MotionError::InvalidConfig(_))));

        let result = TrackerConfig::from_json(r#"{"sample_interval_ms": -5}"#);
        assert!(matches!(result, Err(MotionError::InvalidConfig(_))));
    }

    #[test]
    fn test_tracker_sanitized_falls_back_per_field() {
        let config = TrackerConfig {
            sample_interval_ms: -1,
            analysis_window_ms: 500,
        }
        .sanitized();
        assert_eq!(config.sample_interval_ms, SAMPLE_RATE_MS);
        assert_eq!(config.analysis_window_ms, 500);

        let config = TrackerConfig {
            sample_interval_ms: 0,
            analysis_window_ms: 0,
        }
        .sanitized();
        assert_eq!(config.sample_interval_ms, 0);
        assert_eq!(config.analysis_window_ms, ANALYSIS_WINDOW_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tracker_invalid_json() {
        let result = TrackerConfig::from_json("not json");
        assert!(matches!(result, Err(MotionError::JsonError(_))));
    }

    #[test]
    fn test_practice_config_validation() {
        assert!(PracticeConfig::default().validate().is_ok());

        let result = PracticeConfig::from_json(r#"{"history_limit": 0}"#);
        assert!(result.is_err());

        let result = PracticeConfig::from_json(r#"{"mastery_min_average": 120.0}"#);
        assert!(result.is_err());
    }
}
