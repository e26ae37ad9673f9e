//! Random number sources for the `RNG` instruction.
//!
//! The [`RandomSource`] trait is the seam between the processor and the host.
//! [`OsRandom`] is used by default; [`FixedRandom`] replays a known sequence so
//! programs using `RNG` can be tested deterministically.

use rand_core::{OsRng, RngCore};

/// Supplier of 64-bit random values.
pub trait RandomSource {
    /// Returns the next value. Every bit pattern should be reachable.
    fn next_u64(&mut self) -> u64;
}

/// Operating-system entropy through [`OsRng`].
#[derive(Default, Clone, Copy, Debug)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }
}

/// Cycles through a fixed list of values.
#[derive(Clone, Debug)]
pub struct FixedRandom {
    values: Vec<u64>,
    cursor: usize,
}

impl FixedRandom {
    /// Creates a source that yields `values` in order and then starts over.
    /// An empty list always yields zero.
    pub fn new(values: impl Into<Vec<u64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }
}

impl RandomSource for FixedRandom {
    fn next_u64(&mut self) -> u64 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}
