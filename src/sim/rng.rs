//! Seeded random selection helpers
//!
//! Every random choice in a session goes through one `GameRng` so a run can be
//! replayed from its seed.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Session RNG (PCG32 seeded from a single u64)
#[derive(Debug, Clone)]
pub struct GameRng {
    seed: u64,
    inner: Pcg32,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seed this RNG was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform index in `[0, n)`. Returns 0 when `n` is 0.
    pub fn index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.inner.random_range(0..n)
    }

    /// Fair coin flip
    pub fn coin(&mut self) -> bool {
        self.inner.random_bool(0.5)
    }

    /// Uniform float in `[lo, hi)`
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.inner.random_range(lo..hi)
    }
}
