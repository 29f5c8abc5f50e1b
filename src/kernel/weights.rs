//! Symmetric weight storage.
//!
//! `WeightMatrix` keeps an N×N row-major buffer with `w[i][j] == w[j][i]`
//! and a zero diagonal. Writes go through symmetric setters so the two
//! mirrored entries never diverge.

use serde::{Deserialize, Serialize};

/// N×N symmetric matrix with zero diagonal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    size: usize,
    /// Flat row-major: size rows × size columns.
    data: Vec<f64>,
}

impl WeightMatrix {
    /// Zero-filled matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Rebuild from flat row-major data. Returns `None` if the length is not
    /// `size * size` or the data breaks symmetry / zero diagonal.
    pub fn from_flat(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        let m = Self { size, data };
        m.is_symmetric().then_some(m)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Weight between neurons `i` and `j`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.size && j < self.size,
            "Weight index ({}, {}) out of range for size {}",
            i,
            j,
            self.size
        );
        self.data[i * self.size + j]
    }

    /// Set `w[i][j]` and `w[j][i]` together. Writes to the diagonal are ignored.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            i < self.size && j < self.size,
            "Weight index ({}, {}) out of range for size {}",
            i,
            j,
            self.size
        );
        if i == j {
            return;
        }
        self.data[i * self.size + j] = value;
        self.data[j * self.size + i] = value;
    }

    /// Add `delta` to both mirrored entries. Diagonal is ignored.
    pub fn add(&mut self, i: usize, j: usize, delta: f64) {
        let current = self.get(i, j);
        self.set(i, j, current + delta);
    }

    /// Row `i` as a slice (length `size`).
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Flat row-major view.
    pub fn as_flat(&self) -> &[f64] {
        &self.data
    }

    /// Force the diagonal back to zero.
    pub fn clear_diagonal(&mut self) {
        for i in 0..self.size {
            self.data[i * self.size + i] = 0.0;
        }
    }

    /// Reset every entry to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// `Σ_{j≠i} w[i][j] · state[j]`.
    #[inline]
    pub fn local_field(&self, i: usize, state: &[i8]) -> f64 {
        self.row(i)
            .iter()
            .zip(state.iter())
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, (&w, &s))| w * s as f64)
            .sum()
    }

    /// Exact symmetry and zero-diagonal check.
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| {
            self.data[i * self.size + i] == 0.0
                && (i + 1..self.size)
                    .all(|j| self.data[i * self.size + j] == self.data[j * self.size + i])
        })
    }
}
