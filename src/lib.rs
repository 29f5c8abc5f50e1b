//! # Hopfield Sentinel: Associative-Memory Anomaly Detection
//!
//! A classical Hopfield network stores "normal" system states as energy
//! minima. Live readings are binarized, buffered into a sliding window and
//! relaxed by the network; how far the window has to travel, and how much
//! energy it sheds on the way, tells how unusual it is.
//!
//! ## Quick Start
//!
//! ```rust
//! use hopfield_sentinel::{AnomalyDetector, DetectorConfig, ThresholdSpec, TrainingData};
//! use std::collections::HashMap;
//!
//! let mut config = DetectorConfig::new(3);
//! config.snapshot_length = 5;
//! config.network.seed = Some(12345);
//!
//! let mut detector = AnomalyDetector::new(config)?;
//! detector.set_thresholds(
//!     [
//!         ("temperature", ThresholdSpec::Range { min: 60.0, max: 80.0 }),
//!         ("pressure", ThresholdSpec::Below { value: 120.0 }),
//!         ("vibration", ThresholdSpec::Below { value: 50.0 }),
//!     ],
//!     None,
//! )?;
//! detector.train(TrainingData::Defaults)?;
//!
//! let reading: HashMap<String, f64> = [
//!     ("temperature".to_string(), 70.0),
//!     ("pressure".to_string(), 100.0),
//!     ("vibration".to_string(), 20.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! for _ in 0..5 {
//!     detector.add_data_point(&reading)?;
//! }
//! if let Some(result) = detector.detect()? {
//!     println!("score {:.3}, anomaly: {}", result.anomaly_score, result.is_anomaly);
//! }
//! # Ok::<(), hopfield_sentinel::HopfieldError>(())
//! ```
//!
//! ## Layers
//!
//! - **kernel**: bipolar [`Pattern`]s, the symmetric [`WeightMatrix`] and the
//!   seeded [`RandomSequence`] driving recall order
//! - **memory**: the [`HopfieldNetwork`] itself (Hebbian and Storkey
//!   learning, capacity estimation, asynchronous recall)
//! - **detection**: binarization, baseline scoring, adaptive thresholds and
//!   the push-style [`Monitor`]

pub mod detection;
pub mod error;
pub mod kernel;
pub mod memory;

mod persist;

// Re-exports for convenience
pub use detection::{
    AdaptiveConfig, AdaptiveThreshold, AnomalyDetector, DetectionResult, DetectorConfig,
    DetectorSnapshot, FeatureImpact, Monitor, MonitorEvent, MonitorObserver, ThresholdSpec,
    TrainingData,
};
pub use error::{HopfieldError, Result};
pub use kernel::{Pattern, RandomSequence, SeededSequence, WeightMatrix};
pub use memory::{
    HopfieldNetwork, LearningRule, NetworkConfig, NetworkSnapshot, RecallResult, TrainReport,
};
