//! Case id generation.
//!
//! Ids are `CASE-<millis>-<suffix>`: a millisecond timestamp that never
//! goes backwards within one generator, followed by nine random base-36
//! characters. Collisions are not impossible, so the registry still checks
//! for duplicates on insert.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use fakesense_case_models::CaseId;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

/// Characters used for the random suffix.
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 9;

/// Generates unique case ids.
pub struct CaseIdGenerator {
    last_millis: AtomicI64,
    rng: Mutex<StdRng>,
}

impl CaseIdGenerator {
    /// Creates a generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates a generator with a fixed seed, for reproducible ids.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    const fn with_rng(rng: StdRng) -> Self {
        Self {
            last_millis: AtomicI64::new(0),
            rng: Mutex::new(rng),
        }
    }

    /// Returns the next id stamped with the current time.
    pub fn next_id(&self) -> CaseId {
        self.next_id_at(chrono::Utc::now().timestamp_millis())
    }

    /// Returns the next id for the wall-clock time `now_millis`.
    ///
    /// The embedded timestamp is clamped so it never decreases, even if the
    /// wall clock steps backwards.
    pub fn next_id_at(&self, now_millis: i64) -> CaseId {
        let previous = self.last_millis.fetch_max(now_millis, Ordering::SeqCst);
        let millis = previous.max(now_millis);
        CaseId::from_parts(millis, &self.suffix())
    }

    fn suffix(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
            .collect()
    }
}

impl Default for CaseIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
