//! Motion tracking lifecycle
//!
//! `MotionTracker` bridges a platform motion-event source into a
//! [`MotionStream`]: it detects support once, negotiates permission, manages
//! the event subscription and republishes an analysis for every accepted
//! sample.

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::motion::permission::PermissionGate;
use crate::motion::stream::MotionStream;
use crate::motion::types::{MotionAnalysis, MotionEvent, PermissionStatus};
use crate::motion::window::SampleWindow;

/// Platform capabilities the tracker depends on.
///
/// The host delivers events by calling [`MotionTracker::handle_motion`] while
/// subscribed.
pub trait MotionPlatform {
    /// Whether the platform exposes a motion-event capability
    fn supports_motion(&self) -> bool;

    /// The permission gate this platform requires
    fn permission_gate(&self) -> PermissionGate;

    /// Start delivering motion events
    fn subscribe(&mut self);

    /// Stop delivering motion events
    fn unsubscribe(&mut self);
}

/// Motion tracker owning one platform subscription
pub struct MotionTracker<P: MotionPlatform> {
    platform: P,
    gate: PermissionGate,
    is_supported: bool,
    is_tracking: bool,
    permission_status: PermissionStatus,
    stream: MotionStream,
}

impl<P: MotionPlatform> MotionTracker<P> {
    /// Create a tracker with the default throttle and analysis window
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, TrackerConfig::default())
    }

    /// Create a tracker with custom acquisition settings
    pub fn with_config(platform: P, config: TrackerConfig) -> Self {
        let is_supported = platform.supports_motion();
        let gate = platform.permission_gate();
        debug!(is_supported, gated = gate.is_gated(), "motion tracker initialized");

        Self {
            platform,
            gate,
            is_supported,
            is_tracking: false,
            permission_status: PermissionStatus::Prompt,
            stream: MotionStream::with_config(config),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.is_supported
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn permission_status(&self) -> PermissionStatus {
        self.permission_status
    }

    /// Snapshot of the latest published analysis
    pub fn analysis(&self) -> MotionAnalysis {
        self.stream.analysis()
    }

    pub fn window(&self) -> &SampleWindow {
        self.stream.window()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Ask the platform for motion access and record the outcome.
    ///
    /// Callers must let one request settle before issuing another.
    pub async fn request_permission(&mut self) -> PermissionStatus {
        let status = self.gate.request().await;
        self.permission_status = status;
        status
    }

    /// Subscribe to motion events, negotiating permission first if needed.
    ///
    /// Returns `false` when motion is unsupported or permission is refused. A
    /// previously denied permission is not asked for again.
    pub async fn start_tracking(&mut self) -> bool {
        if !self.is_supported {
            debug!("motion tracking unavailable on this platform");
            return false;
        }
        if self.is_tracking {
            return true;
        }

        let granted = match self.permission_status {
            PermissionStatus::Granted => true,
            PermissionStatus::Prompt => {
                self.request_permission().await == PermissionStatus::Granted
            }
            PermissionStatus::Denied => false,
        };

        if !granted {
            warn!("motion permission denied; tracking not started");
            return false;
        }

        self.platform.subscribe();
        self.is_tracking = true;
        debug!("motion tracking started");
        true
    }

    /// Unsubscribe, clear the window and publish the zero state
    pub fn stop_tracking(&mut self) {
        if self.is_tracking {
            self.platform.unsubscribe();
            self.is_tracking = false;
            debug!("motion tracking stopped");
        }
        self.stream.reset();
    }

    /// Deliver a platform motion event captured at `now_ms`.
    ///
    /// Returns the new analysis if the event was accepted. Events arriving
    /// while not tracking are ignored.
    pub fn handle_motion(&mut self, event: &MotionEvent, now_ms: i64) -> Option<MotionAnalysis> {
        if !self.is_tracking {
            return None;
        }
        self.stream.ingest(event, now_ms)
    }

    /// Deliver a platform motion event stamped with the wall clock
    pub fn handle_motion_now(&mut self, event: &MotionEvent) -> Option<MotionAnalysis> {
        self.handle_motion(event, Utc::now().timestamp_millis())
    }
}

impl<P: MotionPlatform> Drop for MotionTracker<P> {
    fn drop(&mut self) {
        if self.is_tracking {
            self.platform.unsubscribe();
            self.is_tracking = false;
            debug!("motion subscription released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::permission::FixedPrompt;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy)]
    enum Gate {
        Open,
        Grant,
        Deny,
    }

    struct TestPlatform {
        supported: bool,
        gate: Gate,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl TestPlatform {
        fn new(supported: bool, gate: Gate) -> (Self, Rc<RefCell<Vec<&'static str>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let platform = Self {
                supported,
                gate,
                calls: Rc::clone(&calls),
            };
            (platform, calls)
        }
    }

    impl MotionPlatform for TestPlatform {
        fn supports_motion(&self) -> bool {
            self.supported
        }

        fn permission_gate(&self) -> PermissionGate {
            match self.gate {
                Gate::Open => PermissionGate::Ungated,
                Gate::Grant => PermissionGate::gated(FixedPrompt::granting()),
                Gate::Deny => PermissionGate::gated(FixedPrompt::denying()),
            }
        }

        fn subscribe(&mut self) {
            self.calls.borrow_mut().push("subscribe");
        }

        fn unsubscribe(&mut self) {
            self.calls.borrow_mut().push("unsubscribe");
        }
    }

    fn gravity() -> MotionEvent {
        MotionEvent::with_acceleration(0.0, 0.0, 9.8)
    }

    #[tokio::test]
    async fn test_unsupported_platform_never_starts() {
        let (platform, calls) = TestPlatform::new(false, Gate::Open);
        let mut tracker = MotionTracker::new(platform);

        assert!(!tracker.is_supported());
        assert!(!tracker.start_tracking().await);
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.permission_status(), PermissionStatus::Prompt);
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_ungated_start_subscribes() {
        let (platform, calls) = TestPlatform::new(true, Gate::Open);
        let mut tracker = MotionTracker::new(platform);

        assert!(tracker.start_tracking().await);
        assert!(tracker.is_tracking());
        assert_eq!(tracker.permission_status(), PermissionStatus::Granted);
        assert_eq!(*calls.borrow(), vec!["subscribe"]);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (platform, calls) = TestPlatform::new(true, Gate::Grant);
        let mut tracker = MotionTracker::new(platform);

        assert!(tracker.start_tracking().await);
        assert!(tracker.start_tracking().await);
        assert_eq!(*calls.borrow(), vec!["subscribe"]);
    }

    #[tokio::test]
    async fn test_denied_permission_leaves_state_unchanged() {
        let (platform, calls) = TestPlatform::new(true, Gate::Deny);
        let mut tracker = MotionTracker::new(platform);

        assert!(!tracker.start_tracking().await);
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.permission_status(), PermissionStatus::Denied);
        assert!(tracker.analysis().is_zero());
        assert!(calls.borrow().is_empty());

        // Denied is terminal for start_tracking
        assert!(!tracker.start_tracking().await);
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_request_updates_status() {
        let (platform, _calls) = TestPlatform::new(true, Gate::Grant);
        let mut tracker = MotionTracker::new(platform);

        assert_eq!(tracker.request_permission().await, PermissionStatus::Granted);
        assert_eq!(tracker.permission_status(), PermissionStatus::Granted);
        assert!(tracker.start_tracking().await);
    }

    #[tokio::test]
    async fn test_events_ignored_while_not_tracking() {
        let (platform, _calls) = TestPlatform::new(true, Gate::Open);
        let mut tracker = MotionTracker::new(platform);

        assert!(tracker.handle_motion(&gravity(), 0).is_none());
        assert!(tracker.window().is_empty());
    }

    #[tokio::test]
    async fn test_stop_resets_to_zero_state() {
        let (platform, calls) = TestPlatform::new(true, Gate::Open);
        let mut tracker = MotionTracker::new(platform);
        tracker.start_tracking().await;

        for i in 0..30 {
            tracker.handle_motion(&gravity(), i * 50);
        }
        assert!(!tracker.analysis().is_zero());
        assert!(!tracker.window().is_empty());

        tracker.stop_tracking();
        assert!(!tracker.is_tracking());
        assert!(tracker.analysis().is_zero());
        assert!(tracker.window().is_empty());
        assert_eq!(*calls.borrow(), vec!["subscribe", "unsubscribe"]);

        // Events after stop are ignored
        assert!(tracker.handle_motion(&gravity(), 5000).is_none());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (platform, calls) = TestPlatform::new(true, Gate::Open);
        let mut tracker = MotionTracker::new(platform);

        tracker.stop_tracking();
        assert!(tracker.analysis().is_zero());
        assert!(calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (platform, calls) = TestPlatform::new(true, Gate::Open);
        {
            let mut tracker = MotionTracker::new(platform);
            tracker.start_tracking().await;
        }
        assert_eq!(*calls.borrow(), vec!["subscribe", "unsubscribe"]);
    }

    #[tokio::test]
    async fn test_drop_after_stop_does_not_unsubscribe_twice() {
        let (platform, calls) = TestPlatform::new(true, Gate::Open);
        {
            let mut tracker = MotionTracker::new(platform);
            tracker.start_tracking().await;
            tracker.stop_tracking();
        }
        assert_eq!(*calls.borrow(), vec!["subscribe", "unsubscribe"]);
    }

    #[tokio::test]
    async fn test_restart_after_stop_starts_fresh_window() {
        let (platform, _calls) = TestPlatform::new(true, Gate::Open);
        let mut tracker = MotionTracker::new(platform);
        tracker.start_tracking().await;
        for i in 0..15 {
            tracker.handle_motion(&gravity(), i * 50);
        }
        tracker.stop_tracking();

        assert!(tracker.start_tracking().await);
        let analysis = tracker.handle_motion(&gravity(), 800).unwrap();
        assert_eq!(analysis.raw_data.len(), 1);
        assert_eq!(analysis.fluidity_score, 0);
    }

    #[tokio::test]
    async fn test_wall_clock_events_are_throttled() {
        let (platform, _calls) = TestPlatform::new(true, Gate::Open);
        let config = TrackerConfig {
            sample_interval_ms: 60_000,
            ..TrackerConfig::default()
        };
        let mut tracker = MotionTracker::with_config(platform, config);
        assert!(tracker.start_tracking().await);

        let before = Utc::now().timestamp_millis();
        let analysis = tracker.handle_motion_now(&gravity()).unwrap();
        assert!(tracker.handle_motion_now(&gravity()).is_none());

        assert_eq!(analysis.raw_data.len(), 1);
        assert!(analysis.raw_data[0].timestamp >= before);
        assert_eq!(tracker.window().len(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_constant_gravity() {
        let (platform, _calls) = TestPlatform::new(true, Gate::Grant);
        let mut tracker = MotionTracker::new(platform);
        assert!(tracker.start_tracking().await);

        let mut last = None;
        for i in 0..=60 {
            last = tracker.handle_motion(&gravity(), 10_000 + i * 50);
        }
        let analysis = last.unwrap();

        assert_eq!(analysis.fluidity_score, 100);
        assert_eq!(analysis.direction_changes, 0);
        assert_eq!(analysis.raw_data.len(), 40);
        // 9.8 * 39 / 40 * 5 = 47.775
        assert_eq!(analysis.intensity, 48);
        assert!(analysis.is_active);
    }
}
