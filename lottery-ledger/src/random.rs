//! Randomness capability for the winner draw
//!
//! The engine never reaches for ambient randomness. A [`RandomSource`] is
//! injected when the ledger opens so tests can pin the draw.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};

/// Supplies an index into the current roster
pub trait RandomSource: Send {
    /// Return a value in `0..len`. Callers guarantee `len > 0`.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Draws from the operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_index(&mut self, len: usize) -> usize {
        OsRng.gen_range(0..len)
    }
}

/// Deterministic draws from a seeded generator
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create from a 64-bit seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Always picks the same roster position (wrapped to the roster length)
#[derive(Debug, Clone, Copy)]
pub struct FixedIndex(pub usize);

impl RandomSource for FixedIndex {
    fn next_index(&mut self, len: usize) -> usize {
        self.0 % len
    }
}

/// Random source selected by configuration
pub fn from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(OsRandom),
    }
}
