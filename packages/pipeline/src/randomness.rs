//! Pluggable sources of the pipeline's random outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

/// Source of uniformly distributed integers.
pub trait Randomness: Send + Sync {
    /// Returns an integer in `low..=high`. Returns `low` if `high < low`.
    fn next_in(&self, low: u32, high: u32) -> u32;
}

/// [`Randomness`] backed by a [`StdRng`].
pub struct SeededRandomness {
    rng: Mutex<StdRng>,
}

impl SeededRandomness {
    /// Deterministic sequence for a given seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl Randomness for SeededRandomness {
    fn next_in(&self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(low..=high)
    }
}

/// [`Randomness`] that replays a fixed list of values, cycling when it
/// runs out. Each value is clamped into the requested range.
pub struct SequenceRandomness {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl SequenceRandomness {
    /// Replays `values` in order. An empty list always yields the range's
    /// lower bound.
    #[must_use]
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self {
            values: values.into(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Randomness for SequenceRandomness {
    fn next_in(&self, low: u32, high: u32) -> u32 {
        if self.values.is_empty() || high <= low {
            return low;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[index].clamp(low, high)
    }
}
