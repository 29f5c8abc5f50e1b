//! Memory layer: the Hopfield associative memory.
//!
//! - [`HopfieldNetwork`]: stores bipolar patterns with the Hebbian or
//!   Storkey rule, estimates capacity, and recalls by asynchronous energy
//!   descent.
//! - [`NetworkSnapshot`]: serializable state for persistence.
//!
//! # Usage
//!
//! ```rust
//! use hopfield_sentinel::kernel::Pattern;
//! use hopfield_sentinel::memory::{HopfieldNetwork, LearningRule, NetworkConfig};
//!
//! let config = NetworkConfig {
//!     learning_rule: LearningRule::Storkey,
//!     seed: Some(42),
//!     strict_capacity: false,
//! };
//! let mut net = HopfieldNetwork::new(16, config).unwrap();
//! let report = net.train(&[Pattern::filled(16, 1)]).unwrap();
//! assert!(report.warning.is_none());
//!
//! let result = net.recall(&Pattern::filled(16, 1), 10).unwrap();
//! assert_eq!(result.iterations, 1);
//! ```

pub mod network;

pub use network::{
    CapacityWarning, HopfieldNetwork, LearningRule, NetworkConfig, NetworkSnapshot, RecallResult,
    TrainReport,
};
