//! Time-bounded sample window
//!
//! Keeps the trailing `analysis_window_ms` of samples, oldest first. Samples
//! are appended at the tail and evicted from the head.

use std::collections::VecDeque;

use crate::config::ANALYSIS_WINDOW_MS;
use crate::motion::types::MotionSample;

/// Sliding window of the most recent motion samples
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<MotionSample>,
    window_ms: i64,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(ANALYSIS_WINDOW_MS)
    }
}

impl SampleWindow {
    /// Create an empty window spanning `window_ms` milliseconds
    pub fn new(window_ms: i64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_ms,
        }
    }

    /// Evict samples that fall out of the window relative to `sample`, then
    /// append it.
    ///
    /// A sample is evicted when `sample.timestamp - timestamp >= window_ms`.
    pub fn push_and_evict(&mut self, sample: MotionSample) {
        let now = sample.timestamp;
        self.samples
            .retain(|s| now.saturating_sub(s.timestamp) < self.window_ms);
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn oldest(&self) -> Option<&MotionSample> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&MotionSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionSample> {
        self.samples.iter()
    }

    /// Contiguous copy of the window, oldest first
    pub fn to_vec(&self) -> Vec<MotionSample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::types::Acceleration;

    fn sample_at(timestamp: i64) -> MotionSample {
        MotionSample::new(Acceleration::new(0.0, 0.0, 9.8), timestamp)
    }

    #[test]
    fn test_window_never_holds_stale_samples() {
        let mut window = SampleWindow::default();

        // 100 ms spacing over 5 seconds of simulated time
        for i in 0..=50 {
            let now = i * 100;
            window.push_and_evict(sample_at(now));

            let newest = window.newest().unwrap().timestamp;
            assert_eq!(newest, now);
            assert!(window.iter().all(|s| newest - s.timestamp < 2000));
        }

        // (now - 1900) ..= now at 100 ms spacing
        assert_eq!(window.len(), 20);
        assert_eq!(window.oldest().unwrap().timestamp, 3100);
    }

    #[test]
    fn test_sample_exactly_window_old_is_evicted() {
        let mut window = SampleWindow::new(2000);
        window.push_and_evict(sample_at(0));
        window.push_and_evict(sample_at(1999));
        assert_eq!(window.len(), 2);

        window.push_and_evict(sample_at(2000));
        assert_eq!(window.len(), 2);
        assert_eq!(window.oldest().unwrap().timestamp, 1999);
    }

    #[test]
    fn test_eviction_across_i64_extremes() {
        let mut window = SampleWindow::default();
        window.push_and_evict(sample_at(i64::MIN));
        window.push_and_evict(sample_at(i64::MAX));
        assert_eq!(window.len(), 1);
        assert_eq!(window.newest().unwrap().timestamp, i64::MAX);

        // Going backwards never evicts
        window.push_and_evict(sample_at(i64::MIN));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_window_preserves_order() {
        let mut window = SampleWindow::default();
        for t in [10, 60, 110, 160] {
            window.push_and_evict(sample_at(t));
        }
        let timestamps: Vec<i64> = window.to_vec().iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![10, 60, 110, 160]);
    }

    #[test]
    fn test_clear_empties_window() {
        let mut window = SampleWindow::default();
        window.push_and_evict(sample_at(0));
        window.push_and_evict(sample_at(50));
        window.clear();
        assert!(window.is_empty());
        assert!(window.newest().is_none());
    }
}
