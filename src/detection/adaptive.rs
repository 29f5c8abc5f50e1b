//! Adaptive anomaly threshold.
//!
//! Keeps a bounded window of recent scores. Unsupervised mode moves the
//! threshold to the window's 95th percentile once the window is full;
//! labeled feedback nudges it multiplicatively instead. The threshold is
//! always kept inside `[0.1, 0.9]`.

use crate::kernel::stats::percentile;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MIN_THRESHOLD: f64 = 0.1;
pub const MAX_THRESHOLD: f64 = 0.9;

const FALSE_POSITIVE_FACTOR: f64 = 1.05;
const FALSE_NEGATIVE_FACTOR: f64 = 0.95;

/// Construction options for [`AdaptiveThreshold`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Starting threshold (default 0.3)
    pub initial_threshold: f64,
    /// Rolling window capacity (default 100)
    pub window_size: usize,
    /// Percentile-based updates on unlabeled scores (default true)
    pub unsupervised: bool,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 0.3,
            window_size: 100,
            unsupervised: true,
        }
    }
}

/// Threshold plus window percentiles. Percentiles are `None` while the
/// window is empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStats {
    pub threshold: f64,
    pub p50: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

/// Rolling-window threshold calibrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveThreshold {
    threshold: f64,
    window: VecDeque<f64>,
    window_size: usize,
    unsupervised: bool,
}

impl AdaptiveThreshold {
    /// Create a calibrator. The initial threshold is clamped to `[0.1, 0.9]`
    /// and a zero window size is raised to 1.
    pub fn new(initial_threshold: f64, window_size: usize, unsupervised: bool) -> Self {
        let window_size = window_size.max(1);
        Self {
            threshold: clamp(initial_threshold),
            window: VecDeque::with_capacity(window_size),
            window_size,
            unsupervised,
        }
    }

    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self::new(
            config.initial_threshold,
            config.window_size,
            config.unsupervised,
        )
    }

    /// Current threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_unsupervised(&self) -> bool {
        self.unsupervised
    }

    /// Number of scores currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Record a score and return the updated threshold.
    ///
    /// `label` is `Some(is_anomaly)` for supervised feedback:
    /// - false positive (`Some(false)` and `score > threshold`): threshold × 1.05
    /// - false negative (`Some(true)` and `score ≤ threshold`): threshold × 0.95
    ///
    /// With `None` in unsupervised mode and a full window, the threshold
    /// becomes the window's 95th percentile. A labeled call never applies
    /// the percentile rule.
    pub fn update(&mut self, score: f64, label: Option<bool>) -> f64 {
        self.window.push_back(score);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        match label {
            Some(is_anomaly) => {
                if !is_anomaly && score > self.threshold {
                    self.threshold = clamp(self.threshold * FALSE_POSITIVE_FACTOR);
                } else if is_anomaly && score <= self.threshold {
                    self.threshold = clamp(self.threshold * FALSE_NEGATIVE_FACTOR);
                }
            }
            None => {
                if self.unsupervised && self.window.len() == self.window_size {
                    if let Some(p95) = self.percentile(0.95) {
                        self.threshold = clamp(p95);
                    }
                }
            }
        }

        self.threshold
    }

    /// Current threshold and the 50th/95th/99th window percentiles.
    pub fn stats(&self) -> ThresholdStats {
        ThresholdStats {
            threshold: self.threshold,
            p50: self.percentile(0.50),
            p95: self.percentile(0.95),
            p99: self.percentile(0.99),
        }
    }

    fn percentile(&self, p: f64) -> Option<f64> {
        let values: Vec<f64> = self.window.iter().copied().collect();
        percentile(&values, p)
    }
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self::from_config(&AdaptiveConfig::default())
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = AdaptiveThreshold::default();
        assert_eq!(t.threshold(), 0.3);
        assert_eq!(t.window_size(), 100);
        assert!(t.is_unsupervised());
        assert!(t.is_empty());
    }

    #[test]
    fn test_percentile_after_full_window() {
        let mut t = AdaptiveThreshold::new(0.3, 10, true);
        for i in 0..9 {
            t.update(i as f64 * 0.1, None);
            // Below capacity: unchanged
            assert_eq!(t.threshold(), 0.3);
        }
        t.update(0.9, None);
        let th = t.threshold();
        assert!(th > 0.8 && th < 0.95, "Expected ~95th percentile, got {}", th);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut t = AdaptiveThreshold::new(0.3, 3, false);
        for s in [0.1, 0.2, 0.3, 0.4] {
            t.update(s, None);
        }
        assert_eq!(t.len(), 3);
        let stats = t.stats();
        assert_eq!(stats.p50, Some(0.3));
        assert_eq!(stats.p99, Some(0.4));
        // Supervised-only calibrator never moves on unlabeled scores
        assert_eq!(stats.threshold, 0.3);
    }

    #[test]
    fn test_false_positive_raises_threshold() {
        let mut t = AdaptiveThreshold::new(0.5, 100, true);
        let before = t.threshold();
        t.update(0.8, Some(false));
        assert!(t.threshold() > before);
    }

    #[test]
    fn test_false_negative_lowers_threshold() {
        let mut t = AdaptiveThreshold::new(0.5, 100, true);
        let before = t.threshold();
        t.update(0.2, Some(true));
        assert!(t.threshold() < before);
    }

    #[test]
    fn test_correct_labels_leave_threshold() {
        let mut t = AdaptiveThreshold::new(0.5, 100, true);
        t.update(0.8, Some(true));
        t.update(0.2, Some(false));
        assert_eq!(t.threshold(), 0.5);
    }

    #[test]
    fn test_feedback_stays_bounded() {
        let mut t = AdaptiveThreshold::new(0.5, 5, true);
        for _ in 0..500 {
            t.update(10.0, Some(false));
        }
        assert!(t.threshold() <= MAX_THRESHOLD);
        assert!(t.threshold() >= MIN_THRESHOLD);
        assert_eq!(t.threshold(), MAX_THRESHOLD);

        for _ in 0..500 {
            t.update(-10.0, Some(true));
        }
        assert!(t.threshold() >= MIN_THRESHOLD);
        assert_eq!(t.threshold(), MIN_THRESHOLD);
    }

    #[test]
    fn test_labeled_update_skips_percentile_rule() {
        let mut t = AdaptiveThreshold::new(0.3, 2, true);
        t.update(0.85, Some(true));
        // Window is now full, but the call was labeled
        t.update(0.85, Some(true));
        assert_eq!(t.threshold(), 0.3);
    }

    #[test]
    fn test_stats_empty() {
        let t = AdaptiveThreshold::new(0.4, 10, true);
        let stats = t.stats();
        assert_eq!(stats.threshold, 0.4);
        assert_eq!(stats.p50, None);
        assert_eq!(stats.p95, None);
        assert_eq!(stats.p99, None);
    }

    #[test]
    fn test_initial_threshold_clamped() {
        assert_eq!(AdaptiveThreshold::new(2.0, 10, true).threshold(), MAX_THRESHOLD);
        assert_eq!(AdaptiveThreshold::new(0.0, 10, true).threshold(), MIN_THRESHOLD);
    }
}
