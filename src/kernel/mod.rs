//! Kernel layer: numeric building blocks.
//!
//! - [`Pattern`]: bipolar state vectors
//! - [`WeightMatrix`]: symmetric, zero-diagonal weight storage
//! - [`RandomSequence`] / [`SeededSequence`]: reproducible visiting orders
//! - [`stats`]: mean, standard deviation and percentile helpers
//!
//! This layer has no dependencies on [`memory`](crate::memory) or
//! [`detection`](crate::detection).
//!
//! # Example
//!
//! ```rust
//! use hopfield_sentinel::kernel::{shuffle, Pattern, SeededSequence, WeightMatrix};
//!
//! let p = Pattern::from_bits(&[true, false, true, true]);
//! let mut w = WeightMatrix::zeros(p.len());
//! w.set(0, 2, 0.25);
//! assert_eq!(w.get(2, 0), 0.25);
//!
//! let mut seq = SeededSequence::new(12345);
//! let order = shuffle(p.len(), &mut seq);
//! assert_eq!(order.len(), 4);
//! ```

pub mod pattern;
pub mod sequence;
pub mod stats;
pub mod weights;

pub use pattern::Pattern;
pub use sequence::{shuffle, RandomSequence, SeededSequence};
pub use weights::WeightMatrix;
