//! Deterministic pseudo-random sequences.
//!
//! Recall visits neurons in a shuffled order drawn from a [`RandomSequence`].
//! The default [`SeededSequence`] seeds a ChaCha8 stream from an integer so
//! the same seed always replays the same visiting orders. It exists for
//! reproducibility, not security.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A stream of numbers in `[0, 1)`.
pub trait RandomSequence {
    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// ChaCha8-backed sequence seeded by an integer.
///
/// The stream position can be read back with [`SeededSequence::position`]
/// and restored with [`SeededSequence::resume`], so a persisted network
/// continues exactly where the original left off.
#[derive(Clone, Debug)]
pub struct SeededSequence {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededSequence {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Recreate a sequence at a previously recorded stream position.
    pub fn resume(seed: u64, position: u128) -> Self {
        let mut seq = Self::new(seed);
        seq.rng.set_word_pos(position);
        seq
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current position in the underlying stream, in 32-bit words.
    pub fn position(&self) -> u128 {
        self.rng.get_word_pos()
    }
}

impl RandomSequence for SeededSequence {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Fisher–Yates shuffle of `0..n` drawing from `seq`.
pub fn shuffle<R: RandomSequence + ?Sized>(n: usize, seq: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        // next_unit() < 1.0, but guard the edge anyway
        let j = ((seq.next_unit() * (i + 1) as f64) as usize).min(i);
        order.swap(i, j);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of values, cycling.
    struct Fixed {
        values: Vec<f64>,
        at: usize,
    }

    impl RandomSequence for Fixed {
        fn next_unit(&mut self) -> f64 {
            let v = self.values[self.at % self.values.len()];
            self.at += 1;
            v
        }
    }

    #[test]
    fn test_deterministic() {
        let mut a = SeededSequence::new(42);
        let mut b = SeededSequence::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn test_unit_range() {
        let mut s = SeededSequence::new(7);
        for _ in 0..1000 {
            let v = s.next_unit();
            assert!((0.0..1.0).contains(&v), "value {} outside [0, 1)", v);
        }
    }

    #[test]
    fn test_resume_continues_stream() {
        let mut original = SeededSequence::new(99);
        for _ in 0..37 {
            original.next_unit();
        }
        let mut resumed = SeededSequence::resume(99, original.position());
        for _ in 0..50 {
            assert_eq!(original.next_unit(), resumed.next_unit());
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut s = SeededSequence::new(3);
        let mut order = shuffle(50, &mut s);
        order.sort_unstable();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_with_known_stream() {
        // All zeros: each step swaps i with 0
        let mut zeros = Fixed {
            values: vec![0.0],
            at: 0,
        };
        assert_eq!(shuffle(4, &mut zeros), vec![1, 2, 3, 0]);

        // Values just below 1.0 pick j == i every step: identity
        let mut high = Fixed {
            values: vec![0.999_999],
            at: 0,
        };
        assert_eq!(shuffle(5, &mut high), vec![0, 1, 2, 3, 4]);
    }
}
