//! Throttled acquisition state
//!
//! `MotionStream` owns everything that survives between motion callbacks: the
//! sample window, the last accepted timestamp and the most recently published
//! analysis. Each accepted event runs throttle → convert → window → analyze →
//! publish as one synchronous step.

use tracing::{trace, warn};

use crate::config::TrackerConfig;
use crate::motion::analyzer::MotionAnalyzer;
use crate::motion::types::{MotionAnalysis, MotionEvent, MotionSample};
use crate::motion::window::SampleWindow;

/// Owned acquisition state for one motion source
#[derive(Debug, Clone)]
pub struct MotionStream {
    config: TrackerConfig,
    window: SampleWindow,
    last_accepted_ms: Option<i64>,
    analysis: MotionAnalysis,
}

impl Default for MotionStream {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionStream {
    /// Create a stream with the default 50 ms throttle and 2 s window
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Create a stream with custom settings.
    ///
    /// Out-of-range fields fall back to their defaults.
    pub fn with_config(config: TrackerConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "tracker config out of range, using defaults for invalid fields");
        }
        let config = config.sanitized();

        Self {
            window: SampleWindow::new(config.analysis_window_ms),
            config,
            last_accepted_ms: None,
            analysis: MotionAnalysis::default(),
        }
    }

    /// Feed one motion event captured at `now_ms`.
    ///
    /// Returns the freshly published analysis, or `None` if the event was
    /// dropped by the throttle.
    pub fn ingest(&mut self, event: &MotionEvent, now_ms: i64) -> Option<MotionAnalysis> {
        if let Some(last) = self.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.config.sample_interval_ms {
                trace!(now_ms, last, "motion event throttled");
                return None;
            }
        }
        self.last_accepted_ms = Some(now_ms);

        let sample = MotionSample::from_event(event, now_ms);
        self.window.push_and_evict(sample);

        let raw_data = self.window.to_vec();
        let metrics = MotionAnalyzer::analyze(&raw_data);
        self.analysis = MotionAnalysis::from_metrics(metrics, raw_data);

        trace!(
            now_ms,
            window_len = self.window.len(),
            fluidity = self.analysis.fluidity_score,
            intensity = self.analysis.intensity,
            "motion sample accepted"
        );

        Some(self.analysis.clone())
    }

    /// Clear the window and publish the zero state
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_accepted_ms = None;
        self.analysis = MotionAnalysis::default();
    }

    /// Snapshot of the most recently published analysis
    pub fn analysis(&self) -> MotionAnalysis {
        self.analysis.clone()
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn last_accepted_ms(&self) -> Option<i64> {
        self.last_accepted_ms
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
