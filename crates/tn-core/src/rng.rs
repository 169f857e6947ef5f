//! Combat random number generation
//!
//! Uses a seeded ChaCha RNG so crit/dodge rolls are reproducible in tests.
//! Every rolling code path takes `&mut CombatRng` rather than reaching for
//! a process-wide source.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Combat random number generator
///
/// Wraps ChaCha8Rng behind the handful of roll shapes the engine needs.
#[derive(Debug, Clone)]
pub struct CombatRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl CombatRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a new RNG with a random seed
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Get the seed used to create this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns 0..n-1, or 0 if n is 0
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Inclusive range roll; degenerate ranges return `min`
    pub fn between(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Returns true with probability `percent`/100. Values above 100 always hit.
    pub fn percent(&mut self, percent: f64) -> bool {
        if percent <= 0.0 {
            return false;
        }
        self.rng.gen_range(0.0..100.0) < percent
    }

    /// Returns true with probability 1/n
    pub fn one_in(&mut self, n: u32) -> bool {
        self.below(n) == 0
    }

    /// Fair coin flip
    pub fn coin(&mut self) -> bool {
        self.rng.r#gen()
    }

    /// Choose a random element from a slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.below(items.len() as u32) as usize])
        }
    }
}

impl Default for CombatRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
