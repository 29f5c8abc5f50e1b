//! Detection layer: streaming anomaly detection on top of the memory.
//!
//! - [`ThresholdSpec`] / [`FeatureSchema`] turn raw readings into bits
//! - [`AnomalyDetector`] buffers snapshots, recalls them and scores the
//!   relaxation against a trained baseline
//! - [`AdaptiveThreshold`] calibrates the decision threshold from recent scores
//! - [`Monitor`] pushes readings through a detector and notifies observers

pub mod adaptive;
pub mod detector;
pub mod features;
pub mod monitor;

pub use adaptive::{AdaptiveConfig, AdaptiveThreshold, ThresholdStats};
pub use detector::{
    AnomalyDetector, BaselineStatistics, DetectionResult, DetectorConfig, DetectorSnapshot,
    FeatureImpact, RecallDiagnostics, ScoreMetrics, ScoreWeights, TrainingData,
};
pub use features::{FeatureSchema, ThresholdSpec};
pub use monitor::{Monitor, MonitorEvent, MonitorObserver};
