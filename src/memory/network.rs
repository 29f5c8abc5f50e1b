//! Classical Hopfield network with asynchronous energy-descent recall.
//!
//! Stores bipolar patterns in a symmetric weight matrix using one of two
//! batch learning rules, then relaxes query states toward the nearest
//! attractor.
//!
//! # Learning rules
//!
//! - **Hebbian**: `w[i][j] = Σ_p x_p[i]·x_p[j] / N`. Capacity ≈ 0.138·N.
//! - **Storkey**: patterns are folded in one at a time and the cross-talk
//!   from previously stored patterns (the local field `h`) is subtracted:
//!   `w[i][j] += (x[i]x[j] − x[i]h[j] − h[i]x[j]) / N`. Capacity ≈ 0.25·N.
//!
//! # Recall
//!
//! Each sweep visits every neuron once in an order shuffled by the network's
//! [`RandomSequence`], setting `s[i] = +1` when its local field is `≥ 0` and
//! `−1` otherwise. Energy `E(s) = −Σ_{i<j} w[i][j]·s[i]·s[j]` never increases
//! under these updates, so the recorded energy path is monotone.
//!
//! # Usage
//!
//! ```rust
//! use hopfield_sentinel::kernel::Pattern;
//! use hopfield_sentinel::memory::{HopfieldNetwork, NetworkConfig};
//!
//! let stored = Pattern::from_data(vec![1, -1, 1, -1, 1, -1, 1, -1]);
//! let config = NetworkConfig { seed: Some(7), ..Default::default() };
//! let mut net = HopfieldNetwork::new(8, config).unwrap();
//! net.train(&[stored.clone()]).unwrap();
//!
//! let mut noisy = stored.clone();
//! noisy[0] = -1;
//! let result = net.recall(&noisy, 10).unwrap();
//! assert!(result.converged);
//! assert_eq!(result.state, stored);
//! ```

use crate::error::{HopfieldError, Result};
use crate::kernel::{shuffle, Pattern, RandomSequence, SeededSequence, WeightMatrix};
use crate::persist;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Weight-update scheme used by [`HopfieldNetwork::train`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningRule {
    /// Normalized outer-product rule
    #[default]
    Hebbian,
    /// Sequential rule with cross-talk cancellation
    Storkey,
}

impl LearningRule {
    /// Fraction of N used as the theoretical pattern capacity.
    pub fn capacity_factor(self) -> f64 {
        match self {
            LearningRule::Hebbian => 0.138,
            LearningRule::Storkey => 0.25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LearningRule::Hebbian => "hebbian",
            LearningRule::Storkey => "storkey",
        }
    }
}

impl fmt::Display for LearningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LearningRule {
    type Err = HopfieldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hebbian" => Ok(LearningRule::Hebbian),
            "storkey" => Ok(LearningRule::Storkey),
            _ => Err(HopfieldError::UnknownLearningRule(s.to_string())),
        }
    }
}

/// Construction options for [`HopfieldNetwork`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Learning rule (default: Hebbian)
    pub learning_rule: LearningRule,
    /// Seed for the recall visiting order. `None` draws a random seed once
    /// at construction; [`HopfieldNetwork::seed`] reports the one in use.
    pub seed: Option<u64>,
    /// Fail training instead of warning when capacity is exceeded
    pub strict_capacity: bool,
}

// =============================================================================
// Results
// =============================================================================

/// Non-fatal diagnostic: more patterns were trained than the network can
/// reliably hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityWarning {
    pub patterns: usize,
    pub capacity: usize,
    pub size: usize,
    pub learning_rule: LearningRule,
}

impl fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} patterns exceed estimated {} capacity {} for {} neurons; expect spurious attractors",
            self.patterns, self.learning_rule, self.capacity, self.size
        )
    }
}

/// Outcome of a successful [`HopfieldNetwork::train`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainReport {
    /// Number of patterns stored
    pub patterns: usize,
    /// Correlation-adjusted capacity estimate for this pattern set
    pub capacity: usize,
    /// Set when `patterns > capacity` in non-strict mode
    pub warning: Option<CapacityWarning>,
}

/// Outcome of a [`HopfieldNetwork::recall`] run.
#[derive(Clone, Debug, PartialEq)]
pub struct RecallResult {
    /// Final state
    pub state: Pattern,
    /// Full sweeps performed
    pub iterations: usize,
    /// Energy before the first sweep and after every sweep (`iterations + 1` entries)
    pub energy_path: Vec<f64>,
    /// True when the last sweep changed no neuron
    pub converged: bool,
}

impl RecallResult {
    /// Energy of the final state.
    pub fn final_energy(&self) -> f64 {
        self.energy_path.last().copied().unwrap_or(0.0)
    }

    /// Energy of the input state.
    pub fn initial_energy(&self) -> f64 {
        self.energy_path.first().copied().unwrap_or(0.0)
    }
}

// =============================================================================
// Network
// =============================================================================

/// Hopfield associative memory over `size` bipolar neurons.
///
/// Generic over the sequence driving the recall visiting order; the default
/// [`SeededSequence`] is the only one that can be snapshotted.
#[derive(Clone, Debug)]
pub struct HopfieldNetwork<R: RandomSequence = SeededSequence> {
    size: usize,
    learning_rule: LearningRule,
    strict_capacity: bool,
    weights: WeightMatrix,
    trained: bool,
    sequence: R,
}

impl HopfieldNetwork<SeededSequence> {
    /// Create an untrained network with zero weights.
    pub fn new(size: usize, config: NetworkConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_sequence(size, &config, SeededSequence::new(seed))
    }

    /// Seed of the recall sequence.
    pub fn seed(&self) -> u64 {
        self.sequence.seed()
    }

    /// Configuration that reproduces this network, with the seed pinned.
    pub fn config(&self) -> NetworkConfig {
        NetworkConfig {
            learning_rule: self.learning_rule,
            seed: Some(self.seed()),
            strict_capacity: self.strict_capacity,
        }
    }

    /// Export state for persistence.
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            size: self.size,
            learning_rule: self.learning_rule,
            weights: self.weights.as_flat().to_vec(),
            trained: self.trained,
            seed: self.sequence.seed(),
            strict_capacity: self.strict_capacity,
            sequence_position: self.sequence.position(),
        }
    }

    /// Restore from a snapshot.
    pub fn from_snapshot(snap: NetworkSnapshot) -> Result<Self> {
        if snap.size == 0 {
            return Err(HopfieldError::InvalidSize {
                what: "network size",
                got: 0,
            });
        }
        let weights = WeightMatrix::from_flat(snap.size, snap.weights).ok_or_else(|| {
            HopfieldError::InvalidConfig(format!(
                "snapshot weights must be a symmetric {0}x{0} matrix with zero diagonal",
                snap.size
            ))
        })?;
        Ok(Self {
            size: snap.size,
            learning_rule: snap.learning_rule,
            strict_capacity: snap.strict_capacity,
            weights,
            trained: snap.trained,
            sequence: SeededSequence::resume(snap.seed, snap.sequence_position),
        })
    }
}

impl<R: RandomSequence> HopfieldNetwork<R> {
    /// Create an untrained network driven by an explicit sequence.
    ///
    /// `config.seed` is ignored; `sequence` is used as-is.
    pub fn with_sequence(size: usize, config: &NetworkConfig, sequence: R) -> Result<Self> {
        if size == 0 {
            return Err(HopfieldError::InvalidSize {
                what: "network size",
                got: size,
            });
        }
        Ok(Self {
            size,
            learning_rule: config.learning_rule,
            strict_capacity: config.strict_capacity,
            weights: WeightMatrix::zeros(size),
            trained: false,
            sequence,
        })
    }

    // --- Accessors ---

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn learning_rule(&self) -> LearningRule {
        self.learning_rule
    }

    pub fn strict_capacity(&self) -> bool {
        self.strict_capacity
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    /// Weight between neurons `i` and `j`.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights.get(i, j)
    }

    // --- Capacity ---

    /// Estimated number of patterns the network can store.
    ///
    /// Without patterns (or with fewer than two) this is the theoretical
    /// `floor(factor × N)`. With a pattern set, the factor is divided by
    /// `1 + 10 × mean |x_a·x_b| / N` over all pattern pairs, since
    /// correlated patterns interfere with each other. Every given pattern
    /// must be a valid bipolar pattern of length N.
    pub fn estimate_capacity(&self, patterns: Option<&[Pattern]>) -> Result<usize> {
        let factor = self.learning_rule.capacity_factor();
        let n = self.size as f64;
        match patterns {
            Some(ps) if ps.len() >= 2 => {
                for (p, pattern) in ps.iter().enumerate() {
                    self.validate(pattern, p)?;
                }
                let corr = mean_abs_correlation(ps, self.size);
                Ok((n * factor / (1.0 + 10.0 * corr)).floor() as usize)
            }
            _ => Ok((factor * n).floor() as usize),
        }
    }

    // --- Training ---

    /// Replace the weights with ones storing `patterns`.
    ///
    /// Every pattern must have length N and contain only ±1. Exceeding the
    /// estimated capacity is an error under strict capacity and a
    /// [`CapacityWarning`] otherwise. On error the previous weights are kept.
    pub fn train(&mut self, patterns: &[Pattern]) -> Result<TrainReport> {
        if patterns.is_empty() {
            return Err(HopfieldError::EmptyInput(
                "training requires at least one pattern".into(),
            ));
        }
        for (p, pattern) in patterns.iter().enumerate() {
            self.validate(pattern, p)?;
        }

        let capacity = self.estimate_capacity(Some(patterns))?;
        let mut warning = None;
        if patterns.len() > capacity {
            if self.strict_capacity {
                return Err(HopfieldError::CapacityExceeded {
                    patterns: patterns.len(),
                    capacity,
                    size: self.size,
                });
            }
            let w = CapacityWarning {
                patterns: patterns.len(),
                capacity,
                size: self.size,
                learning_rule: self.learning_rule,
            };
            warn!(
                patterns = w.patterns,
                capacity = w.capacity,
                size = w.size,
                rule = %w.learning_rule,
                "pattern count exceeds estimated capacity"
            );
            warning = Some(w);
        }

        self.weights.clear();
        self.trained = false;
        match self.learning_rule {
            LearningRule::Hebbian => self.train_hebbian(patterns),
            LearningRule::Storkey => self.train_storkey(patterns),
        }
        self.trained = true;

        debug!(
            patterns = patterns.len(),
            capacity,
            size = self.size,
            rule = %self.learning_rule,
            "network trained"
        );

        Ok(TrainReport {
            patterns: patterns.len(),
            capacity,
            warning,
        })
    }

    fn train_hebbian(&mut self, patterns: &[Pattern]) {
        let n = self.size as f64;
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                let sum: i64 = patterns
                    .iter()
                    .map(|p| (p[i] as i64) * (p[j] as i64))
                    .sum();
                self.weights.set(i, j, sum as f64 / n);
            }
        }
    }

    fn train_storkey(&mut self, patterns: &[Pattern]) {
        let n = self.size as f64;
        for pattern in patterns {
            let x = pattern.data();
            // Fields from the weights as they stand before this pattern
            let h: Vec<f64> = (0..self.size)
                .map(|i| self.weights.local_field(i, x))
                .collect();
            for i in 0..self.size {
                let xi = x[i] as f64;
                for j in (i + 1)..self.size {
                    let xj = x[j] as f64;
                    let delta = (xi * xj - xi * h[j] - h[i] * xj) / n;
                    self.weights.add(i, j, delta);
                }
            }
            self.weights.clear_diagonal();
        }
    }

    // --- Energy and fields ---

    /// Energy `E(s) = −Σ_{i<j} w[i][j]·s[i]·s[j]`.
    pub fn energy(&self, state: &Pattern) -> Result<f64> {
        self.check_len(state)?;
        Ok(self.energy_of(state.data()))
    }

    /// Local field of every neuron: `h[i] = Σ_{j≠i} w[i][j]·s[j]`.
    pub fn local_fields(&self, state: &Pattern) -> Result<Vec<f64>> {
        self.check_len(state)?;
        Ok((0..self.size)
            .map(|i| self.weights.local_field(i, state.data()))
            .collect())
    }

    fn energy_of(&self, s: &[i8]) -> f64 {
        let mut e = 0.0;
        for i in 0..self.size {
            let row = self.weights.row(i);
            let si = s[i] as f64;
            for j in (i + 1)..self.size {
                e += row[j] * si * s[j] as f64;
            }
        }
        -e
    }

    // --- Recall ---

    /// Relax `input` by asynchronous sweeps until a sweep changes nothing or
    /// `max_iterations` sweeps have run.
    ///
    /// Non-convergence is reported through `converged == false`, not as an error.
    pub fn recall(&mut self, input: &Pattern, max_iterations: usize) -> Result<RecallResult> {
        if !self.trained {
            return Err(HopfieldError::NotTrained("recall"));
        }
        self.validate(input, 0)?;
        if max_iterations == 0 {
            return Err(HopfieldError::InvalidConfig(
                "max_iterations must be positive".into(),
            ));
        }

        let mut state = input.data().to_vec();
        let mut energy_path = Vec::with_capacity(max_iterations + 1);
        energy_path.push(self.energy_of(&state));

        for sweep in 1..=max_iterations {
            let order = shuffle(self.size, &mut self.sequence);
            let mut changes = 0usize;
            for i in order {
                let h = self.weights.local_field(i, &state);
                let next = if h >= 0.0 { 1 } else { -1 };
                if next != state[i] {
                    state[i] = next;
                    changes += 1;
                }
            }
            energy_path.push(self.energy_of(&state));

            if changes == 0 {
                return Ok(RecallResult {
                    state: Pattern::from_data(state),
                    iterations: sweep,
                    energy_path,
                    converged: true,
                });
            }
        }

        debug!(
            max_iterations,
            size = self.size,
            "recall did not converge"
        );
        Ok(RecallResult {
            state: Pattern::from_data(state),
            iterations: max_iterations,
            energy_path,
            converged: false,
        })
    }

    // --- Private helpers ---

    fn check_len(&self, pattern: &Pattern) -> Result<()> {
        if pattern.len() != self.size {
            return Err(HopfieldError::DimensionMismatch {
                expected: self.size,
                got: pattern.len(),
            });
        }
        Ok(())
    }

    fn validate(&self, pattern: &Pattern, index: usize) -> Result<()> {
        if pattern.len() != self.size {
            return Err(HopfieldError::PatternLength {
                pattern: index,
                expected: self.size,
                got: pattern.len(),
            });
        }
        if let Some((i, value)) = pattern.first_non_bipolar() {
            return Err(HopfieldError::NonBipolar {
                pattern: index,
                index: i,
                value,
            });
        }
        Ok(())
    }
}

/// Mean of `|x_a · x_b| / n` over all unordered pattern pairs.
///
/// Patterns must already be validated to length `n`.
fn mean_abs_correlation(patterns: &[Pattern], n: usize) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for a in 0..patterns.len() {
        for b in (a + 1)..patterns.len() {
            let dot = patterns[a].dot(&patterns[b]);
            total += (dot as f64 / n as f64).abs();
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Serializable snapshot of a [`HopfieldNetwork`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub size: usize,
    pub learning_rule: LearningRule,
    /// Flat row-major: size rows × size columns.
    pub weights: Vec<f64>,
    pub trained: bool,
    pub seed: u64,
    pub strict_capacity: bool,
    /// Stream position of the recall sequence, so a restored network
    /// continues with the same visiting orders.
    pub sequence_position: u128,
}

impl NetworkSnapshot {
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_patterns(count: usize, size: usize, seed: u64) -> Vec<Pattern> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Pattern::from_data(
                    (0..size)
                        .map(|_| if rng.gen::<bool>() { 1 } else { -1 })
                        .collect(),
                )
            })
            .collect()
    }

    /// Mutually orthogonal patterns: pattern k follows bit k of the index.
    fn walsh_patterns(count: usize, size: usize) -> Vec<Pattern> {
        (0..count)
            .map(|k| {
                Pattern::from_data(
                    (0..size)
                        .map(|i| if (i >> k) & 1 == 1 { 1 } else { -1 })
                        .collect(),
                )
            })
            .collect()
    }

    fn network(size: usize, rule: LearningRule) -> HopfieldNetwork {
        HopfieldNetwork::new(
            size,
            NetworkConfig {
                learning_rule: rule,
                seed: Some(12345),
                strict_capacity: false,
            },
        )
        .unwrap()
    }

    fn assert_non_increasing(path: &[f64], tolerance: f64) {
        for k in 1..path.len() {
            assert!(
                path[k] <= path[k - 1] + tolerance,
                "Energy rose at step {}: {} -> {}",
                k,
                path[k - 1],
                path[k]
            );
        }
    }

    #[test]
    fn test_new_rejects_zero_size() {
        let err = HopfieldNetwork::new(0, NetworkConfig::default()).unwrap_err();
        assert!(matches!(err, HopfieldError::InvalidSize { got: 0, .. }));
    }

    #[test]
    fn test_learning_rule_parsing() {
        assert_eq!("hebbian".parse::<LearningRule>().unwrap(), LearningRule::Hebbian);
        assert_eq!(" Storkey ".parse::<LearningRule>().unwrap(), LearningRule::Storkey);
        let err = "oja".parse::<LearningRule>().unwrap_err();
        assert!(matches!(err, HopfieldError::UnknownLearningRule(ref s) if s == "oja"));
    }

    #[test]
    fn test_weights_symmetric_zero_diagonal() {
        for rule in [LearningRule::Hebbian, LearningRule::Storkey] {
            let mut net = network(40, rule);
            net.train(&random_patterns(4, 40, 1)).unwrap();
            for i in 0..40 {
                assert_eq!(net.weight(i, i), 0.0, "{} diagonal at {}", rule, i);
                for j in 0..40 {
                    assert_eq!(net.weight(i, j), net.weight(j, i), "{} asymmetric at ({}, {})", rule, i, j);
                }
            }
        }
    }

    #[test]
    fn test_hebbian_weights_normalized() {
        let mut net = network(4, LearningRule::Hebbian);
        let a = Pattern::from_data(vec![1, 1, 1, 1]);
        let b = Pattern::from_data(vec![1, -1, 1, -1]);
        net.train(&[a, b]).unwrap();
        assert_eq!(net.weight(0, 1), 0.0);
        assert_eq!(net.weight(0, 2), 0.5);
        assert_eq!(net.weight(1, 3), 0.5);
    }

    #[test]
    fn test_storkey_subtracts_cross_talk() {
        let mut net = network(4, LearningRule::Storkey);
        let a = Pattern::from_data(vec![1, 1, 1, 1]);
        let b = Pattern::from_data(vec![1, -1, 1, -1]);
        net.train(&[a, b]).unwrap();
        // After a: w = 0.25 everywhere. Fields for b: h[i] = -b[i]/4.
        // Update: 0.25 + 1.5 * b[i]b[j] / 4
        assert_eq!(net.weight(0, 1), -0.125);
        assert_eq!(net.weight(0, 2), 0.625);
        assert_eq!(net.weight(2, 3), -0.125);
    }

    #[test]
    fn test_single_pattern_rules_agree() {
        let p = random_patterns(1, 30, 9);
        let mut h = network(30, LearningRule::Hebbian);
        let mut s = network(30, LearningRule::Storkey);
        h.train(&p).unwrap();
        s.train(&p).unwrap();
        assert_eq!(h.weights(), s.weights());
    }

    #[test]
    fn test_single_pattern_perfect_recall() {
        for rule in [LearningRule::Hebbian, LearningRule::Storkey] {
            for seed in 0..5 {
                let p = random_patterns(1, 32, seed);
                let mut net = network(32, rule);
                net.train(&p).unwrap();
                let result = net.recall(&p[0], 10).unwrap();
                assert!(result.converged);
                assert_eq!(result.iterations, 1);
                assert_eq!(result.energy_path.len(), 2);
                assert_eq!(result.state, p[0]);
            }
        }
    }

    #[test]
    fn test_recall_corrects_noise() {
        let stored = walsh_patterns(3, 64);
        let mut net = network(64, LearningRule::Hebbian);
        net.train(&stored).unwrap();

        let mut noisy = stored[0].clone();
        for i in [0, 9, 18, 27, 36, 45] {
            noisy[i] = -noisy[i];
        }
        let result = net.recall(&noisy, 20).unwrap();
        assert!(result.converged);
        assert_eq!(result.state, stored[0]);
        assert!(result.final_energy() < result.initial_energy());
    }

    #[test]
    fn test_energy_path_non_increasing() {
        let stored = walsh_patterns(4, 64);
        let mut net = network(64, LearningRule::Hebbian);
        net.train(&stored).unwrap();
        for query in random_patterns(10, 64, 77) {
            let result = net.recall(&query, 50).unwrap();
            assert_eq!(result.energy_path.len(), result.iterations + 1);
            assert_non_increasing(&result.energy_path, 0.0);
        }

        let mut storkey = network(48, LearningRule::Storkey);
        storkey.train(&random_patterns(5, 48, 5)).unwrap();
        for query in random_patterns(10, 48, 78) {
            let result = storkey.recall(&query, 50).unwrap();
            assert_non_increasing(&result.energy_path, 1e-9);
        }
    }

    #[test]
    fn test_non_convergence_is_not_an_error() {
        let stored = random_patterns(6, 20, 3);
        let mut net = network(20, LearningRule::Hebbian);
        net.train(&stored).unwrap();
        let query = random_patterns(1, 20, 4).remove(0);
        let result = net.recall(&query, 1).unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.energy_path.len(), 2);
        // Either outcome is legal; a single sweep only converges if the query was already stable
        if !result.converged {
            assert_ne!(result.state, query);
        }
    }

    #[test]
    fn test_theoretical_capacity() {
        let hebbian = network(100, LearningRule::Hebbian);
        let storkey = network(100, LearningRule::Storkey);
        assert_eq!(hebbian.estimate_capacity(None).unwrap(), 13);
        assert_eq!(storkey.estimate_capacity(None).unwrap(), 25);
        assert!(storkey.estimate_capacity(None).unwrap() > hebbian.estimate_capacity(None).unwrap());
    }

    #[test]
    fn test_capacity_rejects_malformed_patterns() {
        let net = network(8, LearningRule::Hebbian);
        let mut patterns = walsh_patterns(3, 8);
        patterns.push(Pattern::filled(5, 1));
        assert!(matches!(
            net.estimate_capacity(Some(&patterns)),
            Err(HopfieldError::PatternLength { pattern: 3, expected: 8, got: 5 })
        ));

        let mixed = vec![Pattern::filled(8, 1), Pattern::from_data(vec![1, 0, 1, 1, 1, 1, 1, 1])];
        assert!(matches!(
            net.estimate_capacity(Some(&mixed)),
            Err(HopfieldError::NonBipolar { pattern: 1, index: 1, value: 0 })
        ));

        // A single pattern never enters the correlation term
        assert_eq!(net.estimate_capacity(Some(&patterns[..1])).unwrap(), 1);
    }

    #[test]
    fn test_correlated_patterns_lower_capacity() {
        let net = network(64, LearningRule::Hebbian);
        let uncorrelated = walsh_patterns(4, 64);

        let base = uncorrelated[0].clone();
        let correlated: Vec<Pattern> = (0..4)
            .map(|k| {
                let mut p = base.clone();
                p[k] = -p[k];
                p
            })
            .collect();

        let c_uncorrelated = net.estimate_capacity(Some(&uncorrelated)).unwrap();
        let c_correlated = net.estimate_capacity(Some(&correlated)).unwrap();
        assert_eq!(c_uncorrelated, 8);
        assert!(
            c_correlated < c_uncorrelated,
            "correlated {} should be below uncorrelated {}",
            c_correlated,
            c_uncorrelated
        );
    }

    #[test]
    fn test_strict_capacity_errors() {
        let patterns = random_patterns(5, 20, 11);
        let mut strict = HopfieldNetwork::new(
            20,
            NetworkConfig {
                strict_capacity: true,
                seed: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        let err = strict.train(&patterns).unwrap_err();
        assert!(matches!(err, HopfieldError::CapacityExceeded { patterns: 5, .. }));
        assert!(!strict.is_trained());

        let mut lenient = network(20, LearningRule::Hebbian);
        let report = lenient.train(&patterns).unwrap();
        let warning = report.warning.expect("capacity warning");
        assert_eq!(warning.patterns, 5);
        assert!(warning.capacity < 5);
        assert!(lenient.is_trained());
    }

    #[test]
    fn test_train_validation() {
        let mut net = network(4, LearningRule::Hebbian);
        assert!(matches!(net.train(&[]), Err(HopfieldError::EmptyInput(_))));

        let short = Pattern::from_data(vec![1, -1, 1]);
        assert!(matches!(
            net.train(&[short]),
            Err(HopfieldError::PatternLength { pattern: 0, expected: 4, got: 3 })
        ));

        let good = Pattern::from_data(vec![1, -1, 1, -1]);
        let bad = Pattern::from_data(vec![1, 0, 1, -1]);
        assert!(matches!(
            net.train(&[good, bad]),
            Err(HopfieldError::NonBipolar { pattern: 1, index: 1, value: 0 })
        ));
        assert!(!net.is_trained());
    }

    #[test]
    fn test_recall_preconditions() {
        let mut net = network(4, LearningRule::Hebbian);
        let p = Pattern::from_data(vec![1, -1, 1, -1]);
        assert!(matches!(net.recall(&p, 5), Err(HopfieldError::NotTrained(_))));

        net.train(&[p.clone()]).unwrap();
        let wrong = Pattern::from_data(vec![1, -1]);
        assert!(net.recall(&wrong, 5).is_err());
        assert!(matches!(net.recall(&p, 0), Err(HopfieldError::InvalidConfig(_))));
        assert!(matches!(
            net.energy(&wrong),
            Err(HopfieldError::DimensionMismatch { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_retrain_replaces_weights() {
        let first = random_patterns(2, 30, 21);
        let second = random_patterns(2, 30, 22);

        let mut net = network(30, LearningRule::Storkey);
        net.train(&first).unwrap();
        net.train(&second).unwrap();

        let mut fresh = network(30, LearningRule::Storkey);
        fresh.train(&second).unwrap();
        assert_eq!(net.weights(), fresh.weights());
    }

    #[test]
    fn test_energy_matches_definition() {
        let mut net = network(3, LearningRule::Hebbian);
        net.train(&[Pattern::from_data(vec![1, 1, -1])]).unwrap();
        // w01 = 1/3, w02 = -1/3, w12 = -1/3
        let s = Pattern::from_data(vec![1, -1, 1]);
        let expected = -(net.weight(0, 1) * -1.0 + net.weight(0, 2) * 1.0 + net.weight(1, 2) * -1.0);
        assert!((net.energy(&s).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_injected_sequence() {
        struct Zeros;
        impl RandomSequence for Zeros {
            fn next_unit(&mut self) -> f64 {
                0.0
            }
        }

        let stored = walsh_patterns(2, 16);
        let mut net =
            HopfieldNetwork::with_sequence(16, &NetworkConfig::default(), Zeros).unwrap();
        net.train(&stored).unwrap();
        let mut noisy = stored[1].clone();
        noisy[3] = -noisy[3];
        let result = net.recall(&noisy, 10).unwrap();
        assert!(result.converged);
        assert_eq!(result.state, stored[1]);
    }

    #[test]
    fn test_same_seed_same_recall() {
        let stored = random_patterns(3, 40, 31);
        let query = random_patterns(1, 40, 32).remove(0);
        let mut a = network(40, LearningRule::Hebbian);
        let mut b = network(40, LearningRule::Hebbian);
        a.train(&stored).unwrap();
        b.train(&stored).unwrap();
        assert_eq!(a.recall(&query, 30).unwrap(), b.recall(&query, 30).unwrap());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let stored = random_patterns(3, 24, 41);
        let mut net = network(24, LearningRule::Storkey);
        net.train(&stored).unwrap();
        // Advance the sequence so the position matters
        net.recall(&stored[0], 5).unwrap();

        let json = serde_json::to_string(&net.snapshot()).unwrap();
        let snap: NetworkSnapshot = serde_json::from_str(&json).unwrap();
        let mut restored = HopfieldNetwork::from_snapshot(snap).unwrap();

        assert_eq!(restored.size(), net.size());
        assert_eq!(restored.is_trained(), net.is_trained());
        assert_eq!(restored.learning_rule(), net.learning_rule());
        assert_eq!(restored.seed(), net.seed());
        for (a, b) in net.weights().as_flat().iter().zip(restored.weights().as_flat()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }

        let query = random_patterns(1, 24, 42).remove(0);
        assert_eq!(net.recall(&query, 20).unwrap(), restored.recall(&query, 20).unwrap());
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let mut net = network(10, LearningRule::Hebbian);
        net.train(&random_patterns(1, 10, 51)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        net.snapshot().save(&path).unwrap();
        let loaded = NetworkSnapshot::load(&path).unwrap();
        assert_eq!(loaded, net.snapshot());
    }

    #[test]
    fn test_from_snapshot_rejects_bad_weights() {
        let mut snap = network(3, LearningRule::Hebbian).snapshot();
        snap.weights[1] = 1.0; // w01 without w10
        assert!(matches!(
            HopfieldNetwork::from_snapshot(snap),
            Err(HopfieldError::InvalidConfig(_))
        ));
    }
}
