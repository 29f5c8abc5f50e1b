//! Error types for hopfield-sentinel.

use thiserror::Error;

/// Errors raised by the network, the detector and their persistence helpers.
///
/// Non-convergence and a not-yet-full snapshot buffer are *not* errors:
/// they surface as `converged == false` and `Ok(None)` respectively.
#[derive(Error, Debug)]
pub enum HopfieldError {
    /// A size or count that must be a positive integer was zero
    #[error("{what} must be a positive integer, got {got}")]
    InvalidSize { what: &'static str, got: usize },

    /// Vector length does not match the network size
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A training pattern has the wrong length
    #[error("Pattern {pattern} has length {got}, network size is {expected}")]
    PatternLength {
        pattern: usize,
        expected: usize,
        got: usize,
    },

    /// A pattern contains a value outside {-1, +1}
    #[error("Pattern {pattern} has non-bipolar value {value} at index {index}")]
    NonBipolar {
        pattern: usize,
        index: usize,
        value: i8,
    },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Pattern count exceeds estimated capacity under strict-capacity mode
    #[error("Pattern count {patterns} exceeds estimated capacity {capacity} for {size} neurons")]
    CapacityExceeded {
        patterns: usize,
        capacity: usize,
        size: usize,
    },

    /// Learning rule name not recognised
    #[error("Unknown learning rule: {0:?} (expected \"hebbian\" or \"storkey\")")]
    UnknownLearningRule(String),

    /// Operation requires a trained network or detector
    #[error("Cannot {0} before training")]
    NotTrained(&'static str),

    /// Detector training requested before thresholds were configured
    #[error("Thresholds must be set before training")]
    ThresholdsNotSet,

    /// Malformed threshold specification for a feature
    #[error("Invalid threshold for feature {feature:?}: {reason}")]
    InvalidThreshold { feature: String, reason: String },

    /// Threshold map size does not match the configured feature count
    #[error("Expected thresholds for {expected} features, got {got}")]
    ThresholdCount { expected: usize, got: usize },

    /// A configured feature is absent from a data point
    #[error("Missing feature: {0:?}")]
    MissingFeature(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while saving or loading a snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for hopfield-sentinel operations.
pub type Result<T> = std::result::Result<T, HopfieldError>;
