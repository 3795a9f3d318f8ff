// src/domain/randomness.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub const CONFIDENCE_MIN: u8 = 80;
pub const CONFIDENCE_MAX: u8 = 95;

/// The one place display-only randomness comes from.
///
/// Confidence scores and the synthetic Pro price are presentation values,
/// not estimates. Seed it in tests and assert on bounds instead of exact numbers.
pub struct DisplayRandom {
    rng: Mutex<StdRng>,
}

impl DisplayRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform integer in `[80, 95]`.
    pub fn confidence(&self) -> u8 {
        self.with_rng(|rng| rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX))
    }

    pub fn coin_flip(&self) -> bool {
        self.with_rng(|rng| rng.gen_bool(0.5))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock still holds a usable generator.
        let mut guard = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl Default for DisplayRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}
