//! Streaming anomaly detector built on the Hopfield memory.
//!
//! Readings are binarized per feature, buffered as the last
//! `snapshot_length` snapshots, flattened into one bipolar pattern and
//! relaxed by the network. Four metrics of that relaxation are z-scored
//! against statistics gathered while training:
//!
//! | metric             | raw value                                          |
//! |--------------------|----------------------------------------------------|
//! | `energy`           | energy of the input state                          |
//! | `energy_drop`      | input energy − recalled energy, floored at 0       |
//! | `hamming`          | mismatched bits / pattern size                     |
//! | `one_minus_margin` | 1 − mean \|h\| over neurons aligned with their field |
//!
//! Only positive deviations count: `score = Σ w_k · max(0, z_k)`.
//!
//! # Layout
//!
//! The flattened pattern is feature-major: bit `f * snapshot_length + t`
//! is feature `f` at buffer slot `t` (oldest first). Each feature therefore
//! owns the contiguous slice used by feature attribution.
//!
//! # Example
//!
//! ```rust
//! use hopfield_sentinel::detection::{AnomalyDetector, DetectorConfig, ThresholdSpec, TrainingData};
//! use std::collections::HashMap;
//!
//! let mut config = DetectorConfig::new(2);
//! config.snapshot_length = 3;
//! config.network.seed = Some(1);
//! let mut detector = AnomalyDetector::new(config).unwrap();
//! detector
//!     .set_thresholds(
//!         [
//!             ("cpu", ThresholdSpec::Below { value: 90.0 }),
//!             ("mem", ThresholdSpec::Below { value: 75.0 }),
//!         ],
//!         None,
//!     )
//!     .unwrap();
//! detector.train(TrainingData::Defaults).unwrap();
//!
//! let reading: HashMap<String, f64> =
//!     [("cpu".to_string(), 40.0), ("mem".to_string(), 50.0)].into_iter().collect();
//! for _ in 0..3 {
//!     detector.add_data_point(&reading).unwrap();
//! }
//! let result = detector.detect().unwrap().expect("buffer is full");
//! assert!(!result.is_anomaly);
//! ```

use super::adaptive::{AdaptiveConfig, AdaptiveThreshold, ThresholdStats};
use super::features::{FeatureSchema, ThresholdSpec};
use crate::error::{HopfieldError, Result};
use crate::kernel::stats::{mean, std_dev};
use crate::kernel::Pattern;
use crate::memory::{HopfieldNetwork, NetworkConfig, NetworkSnapshot, RecallResult, TrainReport};
use crate::persist;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use tracing::debug;

/// Floor applied to baseline standard deviations.
pub const MIN_BASELINE_STD: f64 = 1e-6;

// =============================================================================
// Configuration
// =============================================================================

/// Weights combining the four positive z-scores into one score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub energy: f64,
    pub energy_drop: f64,
    pub hamming: f64,
    pub margin: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            energy: 0.25,
            energy_drop: 0.25,
            hamming: 0.25,
            margin: 0.25,
        }
    }
}

impl ScoreWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.energy, self.energy_drop, self.hamming, self.margin]
    }

    /// `Σ w_k · max(0, z_k)`
    pub fn combine(&self, z: &ScoreMetrics) -> f64 {
        self.as_array()
            .iter()
            .zip(z.as_array())
            .map(|(w, zk)| w * zk.max(0.0))
            .sum()
    }
}

/// Construction options for [`AnomalyDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of features per reading
    pub feature_count: usize,
    /// Readings per snapshot (default 10)
    pub snapshot_length: usize,
    /// Static decision threshold, used when `adaptive_threshold` is off (default 0.5)
    pub anomaly_threshold: f64,
    /// Recall sweep budget (default 100)
    pub max_iterations: usize,
    pub weights: ScoreWeights,
    /// Use [`AdaptiveThreshold`] instead of the static threshold (default false)
    pub adaptive_threshold: bool,
    pub adaptive: AdaptiveConfig,
    pub network: NetworkConfig,
}

impl DetectorConfig {
    /// Defaults for `feature_count` features.
    pub fn new(feature_count: usize) -> Self {
        Self {
            feature_count,
            snapshot_length: 10,
            anomaly_threshold: 0.5,
            max_iterations: 100,
            weights: ScoreWeights::default(),
            adaptive_threshold: false,
            adaptive: AdaptiveConfig::default(),
            network: NetworkConfig::default(),
        }
    }

    /// Check the config and return the pattern size it implies.
    fn validate(&self) -> Result<usize> {
        let positive = [
            ("feature count", self.feature_count),
            ("snapshot length", self.snapshot_length),
            ("max iterations", self.max_iterations),
            ("adaptive window size", self.adaptive.window_size),
        ];
        for (what, got) in positive {
            if got == 0 {
                return Err(HopfieldError::InvalidSize { what, got });
            }
        }
        if !self.anomaly_threshold.is_finite() {
            return Err(HopfieldError::InvalidConfig(format!(
                "anomaly threshold must be finite, got {}",
                self.anomaly_threshold
            )));
        }
        if let Some(w) = self
            .weights
            .as_array()
            .into_iter()
            .find(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(HopfieldError::InvalidConfig(format!(
                "score weights must be finite and non-negative, got {}",
                w
            )));
        }
        self.feature_count
            .checked_mul(self.snapshot_length)
            .ok_or_else(|| {
                HopfieldError::InvalidConfig(format!(
                    "pattern size {} x {} overflows",
                    self.feature_count, self.snapshot_length
                ))
            })
    }
}

/// Patterns to train the detector on.
#[derive(Clone, Debug)]
pub enum TrainingData {
    /// An all-(−1) and an all-(+1) pattern spanning the full pattern size
    Defaults,
    /// Explicit bipolar patterns of length `feature_count × snapshot_length`.
    ///
    /// Patterns use the detector's feature-major layout: index
    /// `f * snapshot_length + t` is feature `f` (in threshold order) at
    /// window slot `t`, oldest slot first. A reading that satisfies its
    /// threshold is +1, any other reading −1.
    Patterns(Vec<Pattern>),
}

// =============================================================================
// Metrics and results
// =============================================================================

/// The four relaxation metrics (raw values, z-scores, means or deviations).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub energy: f64,
    pub energy_drop: f64,
    pub hamming: f64,
    pub one_minus_margin: f64,
}

impl ScoreMetrics {
    fn as_array(&self) -> [f64; 4] {
        [
            self.energy,
            self.energy_drop,
            self.hamming,
            self.one_minus_margin,
        ]
    }

    fn from_array(a: [f64; 4]) -> Self {
        Self {
            energy: a[0],
            energy_drop: a[1],
            hamming: a[2],
            one_minus_margin: a[3],
        }
    }

    /// `(self − mean) / std` per metric.
    pub fn z_scores(&self, baseline: &BaselineStatistics) -> Self {
        let raw = self.as_array();
        let m = baseline.mean.as_array();
        let s = baseline.std.as_array();
        Self::from_array(std::array::from_fn(|k| (raw[k] - m[k]) / s[k]))
    }
}

/// Per-metric mean and (floored) standard deviation over the training set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineStatistics {
    pub mean: ScoreMetrics,
    pub std: ScoreMetrics,
}

impl BaselineStatistics {
    fn from_samples(samples: &[ScoreMetrics]) -> Self {
        let columns: [Vec<f64>; 4] =
            std::array::from_fn(|k| samples.iter().map(|s| s.as_array()[k]).collect());
        Self {
            mean: ScoreMetrics::from_array(std::array::from_fn(|k| mean(&columns[k]))),
            std: ScoreMetrics::from_array(std::array::from_fn(|k| {
                std_dev(&columns[k]).max(MIN_BASELINE_STD)
            })),
        }
    }
}

/// Estimated energy change from flipping one feature's slice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub energy_delta: f64,
}

/// Recall summary attached to a detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecallDiagnostics {
    pub iterations: usize,
    pub converged: bool,
    pub initial_energy: f64,
    pub final_energy: f64,
}

impl From<&RecallResult> for RecallDiagnostics {
    fn from(r: &RecallResult) -> Self {
        Self {
            iterations: r.iterations,
            converged: r.converged,
            initial_energy: r.initial_energy(),
            final_energy: r.final_energy(),
        }
    }
}

/// Outcome of one [`AnomalyDetector::detect`] call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub anomaly_score: f64,
    pub is_anomaly: bool,
    /// Threshold the score was compared against
    pub threshold: f64,
    /// `|anomaly_score − threshold|`
    pub confidence: f64,
    pub raw: ScoreMetrics,
    pub z_scores: ScoreMetrics,
    /// Sorted by descending `|energy_delta|`
    pub feature_impact: Vec<FeatureImpact>,
    pub recall: RecallDiagnostics,
}

// =============================================================================
// Detector
// =============================================================================

/// Hopfield-backed anomaly detector over a sliding window of readings.
#[derive(Clone, Debug)]
pub struct AnomalyDetector {
    config: DetectorConfig,
    pattern_size: usize,
    network: HopfieldNetwork,
    adaptive: AdaptiveThreshold,
    schema: Option<FeatureSchema>,
    buffer: VecDeque<Vec<bool>>,
    baseline: Option<BaselineStatistics>,
}

impl AnomalyDetector {
    /// Create an untrained detector with no thresholds set.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let pattern_size = config.validate()?;
        let network = HopfieldNetwork::new(pattern_size, config.network.clone())?;
        let adaptive = AdaptiveThreshold::from_config(&config.adaptive);
        let buffer = VecDeque::with_capacity(config.snapshot_length);
        Ok(Self {
            config,
            pattern_size,
            network,
            adaptive,
            schema: None,
            buffer,
            baseline: None,
        })
    }

    // --- Accessors ---

    /// Configuration with the network seed pinned to the one in use.
    pub fn config(&self) -> DetectorConfig {
        DetectorConfig {
            network: self.network.config(),
            ..self.config.clone()
        }
    }

    pub fn pattern_size(&self) -> usize {
        self.pattern_size
    }

    pub fn network(&self) -> &HopfieldNetwork {
        &self.network
    }

    /// Feature names in layout order; empty until thresholds are set.
    pub fn feature_names(&self) -> Vec<&str> {
        self.schema.as_ref().map(|s| s.names()).unwrap_or_default()
    }

    pub fn is_trained(&self) -> bool {
        self.baseline.is_some()
    }

    /// True once the buffer holds `snapshot_length` readings.
    pub fn is_ready(&self) -> bool {
        self.buffer.len() == self.config.snapshot_length
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn baseline(&self) -> Option<&BaselineStatistics> {
        self.baseline.as_ref()
    }

    /// Threshold the next detection will compare against (before any
    /// adaptive update that detection performs).
    pub fn threshold(&self) -> f64 {
        if self.config.adaptive_threshold {
            self.adaptive.threshold()
        } else {
            self.config.anomaly_threshold
        }
    }

    pub fn threshold_stats(&self) -> ThresholdStats {
        self.adaptive.stats()
    }

    // --- Thresholds ---

    /// Define the binarization rule for every feature.
    ///
    /// Exactly `feature_count` entries are required. `order` fixes the
    /// feature layout; without it the iteration order of `specs` is used.
    ///
    /// Re-setting thresholds keeps the snapshot buffer when the feature
    /// order is unchanged. If the order changes, buffered bits no longer
    /// line up with the layout and the buffer is cleared, as by
    /// [`reset`](Self::reset).
    pub fn set_thresholds<I, S>(&mut self, specs: I, order: Option<&[&str]>) -> Result<()>
    where
        I: IntoIterator<Item = (S, ThresholdSpec)>,
        S: Into<String>,
    {
        let specs = specs.into_iter().map(|(n, s)| (n.into(), s)).collect();
        self.install_schema(FeatureSchema::new(self.config.feature_count, specs, order)?);
        Ok(())
    }

    /// Like [`set_thresholds`](Self::set_thresholds) from a JSON object of
    /// `{name: {"mode": ..., ...}}` entries.
    pub fn set_thresholds_json(&mut self, specs: &Value, order: Option<&[&str]>) -> Result<()> {
        self.install_schema(FeatureSchema::from_json(self.config.feature_count, specs, order)?);
        Ok(())
    }

    fn install_schema(&mut self, schema: FeatureSchema) {
        let same_layout = self
            .schema
            .as_ref()
            .is_some_and(|old| old.names() == schema.names());
        if !same_layout {
            self.buffer.clear();
        }
        self.schema = Some(schema);
    }

    /// Binarize one reading per configured feature, in layout order.
    pub fn binarize(&self, features: &HashMap<String, f64>) -> Result<Vec<bool>> {
        self.schema
            .as_ref()
            .ok_or(HopfieldError::ThresholdsNotSet)?
            .binarize(features)
    }

    // --- Streaming ---

    /// Binarize and buffer a reading, evicting the oldest when full.
    ///
    /// Returns whether the buffer now holds `snapshot_length` readings.
    pub fn add_data_point(&mut self, features: &HashMap<String, f64>) -> Result<bool> {
        let bits = self.binarize(features)?;
        self.buffer.push_back(bits);
        while self.buffer.len() > self.config.snapshot_length {
            self.buffer.pop_front();
        }
        Ok(self.is_ready())
    }

    /// Drop all buffered readings. Training is kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// The buffered readings flattened feature-major into one bipolar pattern.
    ///
    /// Slots not yet filled are −1.
    pub fn current_pattern(&self) -> Pattern {
        let l = self.config.snapshot_length;
        let mut flat = vec![false; self.pattern_size];
        for (t, bits) in self.buffer.iter().enumerate() {
            for (f, &bit) in bits.iter().enumerate() {
                flat[f * l + t] = bit;
            }
        }
        Pattern::from_bits(&flat)
    }

    // --- Training ---

    /// Train the network and compute baseline statistics.
    ///
    /// Every training pattern is recalled once; the four metrics of those
    /// recalls give the per-metric mean and standard deviation used for
    /// z-scoring. Retraining replaces network and baseline wholesale.
    pub fn train(&mut self, data: TrainingData) -> Result<TrainReport> {
        if self.schema.is_none() {
            return Err(HopfieldError::ThresholdsNotSet);
        }
        let patterns = match data {
            TrainingData::Defaults => vec![
                Pattern::filled(self.pattern_size, -1),
                Pattern::filled(self.pattern_size, 1),
            ],
            TrainingData::Patterns(patterns) => patterns,
        };

        let report = self.network.train(&patterns)?;

        let samples = patterns
            .iter()
            .map(|p| self.measure(p).map(|(metrics, _)| metrics))
            .collect::<Result<Vec<_>>>()?;
        let baseline = BaselineStatistics::from_samples(&samples);
        debug!(
            patterns = patterns.len(),
            energy_mean = baseline.mean.energy,
            energy_std = baseline.std.energy,
            hamming_mean = baseline.mean.hamming,
            "detector baseline computed"
        );
        self.baseline = Some(baseline);

        Ok(report)
    }

    // --- Detection ---

    /// Score the current buffer.
    ///
    /// Returns `Ok(None)` while the buffer holds fewer than
    /// `snapshot_length` readings. With adaptive thresholding on, the score
    /// is fed to the calibrator before the decision is made.
    pub fn detect(&mut self) -> Result<Option<DetectionResult>> {
        let baseline = self
            .baseline
            .clone()
            .ok_or(HopfieldError::NotTrained("detect"))?;
        if !self.is_ready() {
            return Ok(None);
        }

        let input = self.current_pattern();
        let (raw, recall) = self.measure(&input)?;
        let z_scores = raw.z_scores(&baseline);
        let anomaly_score = self.config.weights.combine(&z_scores);

        let threshold = if self.config.adaptive_threshold {
            self.adaptive.update(anomaly_score, None)
        } else {
            self.config.anomaly_threshold
        };

        let feature_impact = self.feature_impact(&input)?;

        Ok(Some(DetectionResult {
            anomaly_score,
            is_anomaly: anomaly_score > threshold,
            threshold,
            confidence: (anomaly_score - threshold).abs(),
            raw,
            z_scores,
            feature_impact,
            recall: RecallDiagnostics::from(&recall),
        }))
    }

    /// Supervised feedback for the adaptive threshold. Returns the new
    /// threshold. Has no effect on decisions unless adaptive thresholding
    /// is enabled.
    pub fn feedback(&mut self, score: f64, is_anomaly: bool) -> f64 {
        self.adaptive.update(score, Some(is_anomaly))
    }

    /// Recall `input` and compute the four raw metrics.
    fn measure(&mut self, input: &Pattern) -> Result<(ScoreMetrics, RecallResult)> {
        let recall = self.network.recall(input, self.config.max_iterations)?;
        let energy = recall.initial_energy();
        let energy_drop = (energy - recall.final_energy()).max(0.0);
        let hamming = input.hamming_distance(&recall.state) as f64 / self.pattern_size as f64;
        let fields = self.network.local_fields(&recall.state)?;
        let margin = stability_margin(&fields, &recall.state);
        Ok((
            ScoreMetrics {
                energy,
                energy_drop,
                hamming,
                one_minus_margin: 1.0 - margin,
            },
            recall,
        ))
    }

    /// First-order energy change from flipping each feature's slice.
    ///
    /// The full field `h = W·x` is computed once. For a feature's slice
    /// `[start, end)` the intra-slice part of the field is removed, leaving
    /// the field from all other features, and `ΔE = 2·Σ x[i]·h_ext[i]`.
    fn feature_impact(&self, x: &Pattern) -> Result<Vec<FeatureImpact>> {
        let h = self.network.local_fields(x)?;
        let weights = self.network.weights();
        let l = self.config.snapshot_length;

        let mut impacts: Vec<FeatureImpact> = self
            .feature_names()
            .into_iter()
            .enumerate()
            .map(|(f, name)| {
                let (start, end) = (f * l, (f + 1) * l);
                let sum: f64 = (start..end)
                    .map(|i| {
                        let row = weights.row(i);
                        let intra: f64 = (start..end)
                            .filter(|&j| j != i)
                            .map(|j| row[j] * x[j] as f64)
                            .sum();
                        x[i] as f64 * (h[i] - intra)
                    })
                    .sum();
                FeatureImpact {
                    feature: name.to_string(),
                    energy_delta: 2.0 * sum,
                }
            })
            .collect();

        impacts.sort_by(|a, b| b.energy_delta.abs().total_cmp(&a.energy_delta.abs()));
        Ok(impacts)
    }

    // --- Persistence ---

    /// Export state for persistence.
    pub fn snapshot(&self) -> DetectorSnapshot {
        DetectorSnapshot {
            config: self.config(),
            schema: self.schema.clone(),
            baseline: self.baseline.clone(),
            network: self.network.snapshot(),
            adaptive: self.adaptive.clone(),
            buffer: self.buffer.iter().cloned().collect(),
        }
    }

    /// Restore from a snapshot. The restored detector produces identical
    /// results to the original for identical subsequent input.
    pub fn from_snapshot(snap: DetectorSnapshot) -> Result<Self> {
        let pattern_size = snap.config.validate()?;
        let network = HopfieldNetwork::from_snapshot(snap.network)?;
        if network.size() != pattern_size {
            return Err(HopfieldError::DimensionMismatch {
                expected: pattern_size,
                got: network.size(),
            });
        }
        if let Some(schema) = &snap.schema {
            if schema.len() != snap.config.feature_count {
                return Err(HopfieldError::ThresholdCount {
                    expected: snap.config.feature_count,
                    got: schema.len(),
                });
            }
        }
        if snap.buffer.len() > snap.config.snapshot_length {
            return Err(HopfieldError::InvalidConfig(format!(
                "buffer holds {} readings, snapshot length is {}",
                snap.buffer.len(),
                snap.config.snapshot_length
            )));
        }
        if let Some(bits) = snap
            .buffer
            .iter()
            .find(|b| b.len() != snap.config.feature_count)
        {
            return Err(HopfieldError::DimensionMismatch {
                expected: snap.config.feature_count,
                got: bits.len(),
            });
        }

        Ok(Self {
            config: snap.config,
            pattern_size,
            network,
            adaptive: snap.adaptive,
            schema: snap.schema,
            buffer: snap.buffer.into_iter().collect(),
            baseline: snap.baseline,
        })
    }
}

/// Mean `|h[i]|` over neurons whose state agrees with their field's sign
/// (`h ≥ 0` counts as positive). Zero when no neuron agrees.
fn stability_margin(fields: &[f64], state: &Pattern) -> f64 {
    let (sum, count) = fields
        .iter()
        .zip(state.data())
        .filter(|&(&h, &s)| (h >= 0.0) == (s > 0))
        .fold((0.0, 0usize), |(sum, n), (&h, _)| (sum + h.abs(), n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Serializable snapshot of an [`AnomalyDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorSnapshot {
    pub config: DetectorConfig,
    /// Threshold specs in feature order
    pub schema: Option<FeatureSchema>,
    pub baseline: Option<BaselineStatistics>,
    pub network: NetworkSnapshot,
    pub adaptive: AdaptiveThreshold,
    /// Buffered binarized readings, oldest first
    pub buffer: Vec<Vec<bool>>,
}

impl DetectorSnapshot {
    /// Persist to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::save_json(self, path)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        persist::load_json(path)
    }
}

// =============================================================================
// Tests
// =============================================================================
