//! Pattern type for the network.
//!
//! Patterns are bipolar vectors with elements in {-1, +1}, stored as i8.
//! The detector produces them from binary feature bits via [`Pattern::from_bits`].

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A bipolar state vector.
///
/// Construction does not validate contents; [`Pattern::first_non_bipolar`]
/// is checked by the network before a pattern is trained or recalled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    data: Vec<i8>,
}

impl Pattern {
    /// Create a pattern from raw data.
    pub fn from_data(data: Vec<i8>) -> Self {
        Self { data }
    }

    /// Create a pattern with every element set to `value`.
    pub fn filled(len: usize, value: i8) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    /// Convert binary bits to bipolar: `true` → +1, `false` → -1.
    pub fn from_bits(bits: &[bool]) -> Self {
        Self {
            data: bits.iter().map(|&b| if b { 1 } else { -1 }).collect(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the raw data as a slice.
    pub fn data(&self) -> &[i8] {
        &self.data
    }

    /// Index and value of the first element outside {-1, +1}, if any.
    pub fn first_non_bipolar(&self) -> Option<(usize, i8)> {
        self.data
            .iter()
            .enumerate()
            .find(|(_, &v)| v != 1 && v != -1)
            .map(|(i, &v)| (i, v))
    }

    /// Raw inner product.
    ///
    /// # Panics
    /// If the lengths differ.
    pub fn dot(&self, other: &Pattern) -> i64 {
        assert_eq!(self.len(), other.len(), "Pattern length mismatch in dot");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a as i64) * (b as i64))
            .sum()
    }

    /// Number of positions where the two patterns differ.
    pub fn hamming_distance(&self, other: &Pattern) -> usize {
        assert_eq!(
            self.len(),
            other.len(),
            "Pattern length mismatch in hamming_distance"
        );
        self.data
            .iter()
            .zip(other.data.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl Index<usize> for Pattern {
    type Output = i8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for Pattern {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}
