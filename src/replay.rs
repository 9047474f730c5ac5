//! Recorded motion streams
//!
//! Parses recorded motion events (NDJSON or a JSON array) and replays them
//! through a [`MotionTracker`] on an in-memory platform. Used by the CLI and
//! for deterministic end-to-end checks.

use tracing::debug;

use crate::error::MotionError;
use crate::motion::permission::{FixedPrompt, PermissionGate};
use crate::motion::tracker::{MotionPlatform, MotionTracker};
use crate::motion::types::{MotionAnalysis, MotionEvent};

/// Adapter for recorded motion event streams
pub struct RecordingAdapter;

impl RecordingAdapter {
    /// Parse a JSON array of motion events
    pub fn parse_array(json: &str) -> Result<Vec<MotionEvent>, MotionError> {
        let events: Vec<MotionEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (one motion event per line). Blank lines are skipped.
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<MotionEvent>, MotionError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event = serde_json::from_str::<MotionEvent>(trimmed).map_err(|e| {
                MotionError::ParseError {
                    line: line_num + 1,
                    message: e.to_string(),
                }
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Every event must carry a timestamp to be replayed
    pub fn validate(events: &[MotionEvent]) -> Result<(), MotionError> {
        if events.is_empty() {
            return Err(MotionError::NoEvents);
        }
        match events.iter().position(|e| e.timestamp_ms.is_none()) {
            Some(index) => Err(MotionError::MissingTimestamp(index)),
            None => Ok(()),
        }
    }
}

/// How a [`ReplayPlatform`] answers permission requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPermission {
    /// No permission gate
    Ungated,
    /// Gated, user grants
    Grant,
    /// Gated, user denies
    Deny,
}

/// In-memory motion platform for replaying recordings
#[derive(Debug, Clone)]
pub struct ReplayPlatform {
    supported: bool,
    permission: ReplayPermission,
    subscribed: bool,
    subscriptions: usize,
}

impl Default for ReplayPlatform {
    fn default() -> Self {
        Self::new(ReplayPermission::Ungated)
    }
}

impl ReplayPlatform {
    pub fn new(permission: ReplayPermission) -> Self {
        Self {
            supported: true,
            permission,
            subscribed: false,
            subscriptions: 0,
        }
    }

    /// A platform with no motion capability
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::default()
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Number of times the tracker subscribed
    pub fn subscriptions(&self) -> usize {
        self.subscriptions
    }
}

impl MotionPlatform for ReplayPlatform {
    fn supports_motion(&self) -> bool {
        self.supported
    }

    fn permission_gate(&self) -> PermissionGate {
        match self.permission {
            ReplayPermission::Ungated => PermissionGate::Ungated,
            ReplayPermission::Grant => PermissionGate::gated(FixedPrompt::granting()),
            ReplayPermission::Deny => PermissionGate::gated(FixedPrompt::denying()),
        }
    }

    fn subscribe(&mut self) {
        self.subscribed = true;
        self.subscriptions += 1;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }
}

/// Feed timestamped events into a tracking `tracker`.
///
/// Returns every published analysis, in order. Throttled events publish
/// nothing.
pub fn replay<P: MotionPlatform>(
    tracker: &mut MotionTracker<P>,
    events: &[MotionEvent],
) -> Result<Vec<MotionAnalysis>, MotionError> {
    RecordingAdapter::validate(events)?;

    let mut published = Vec::new();
    for event in events {
        // validate() guarantees a timestamp
        let Some(now_ms) = event.timestamp_ms else {
            continue;
        };
        if let Some(analysis) = tracker.handle_motion(event, now_ms) {
            published.push(analysis);
        }
    }

    debug!(
        events = events.len(),
        published = published.len(),
        "motion recording replayed"
    );
    Ok(published)
}
