//! Fault-injecting storage wrapper
//!
//! Randomly fails saves so tests can drive the store's best-effort
//! durability path: a failed write keeps the in-memory mutation and only
//! surfaces as a warning.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex, PoisonError};

use super::{Storage, StorageError};

const DEFAULT_SEED: u64 = 0x5EED_C0FF_EE00_0001;

/// Storage wrapper that fails a seeded, reproducible fraction of saves.
///
/// Loads always pass through so a store can be opened over it.
#[derive(Debug, Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    failure_rate: f64,
    faults: Arc<Mutex<FaultState>>,
}

#[derive(Debug)]
struct FaultState {
    seed: u64,
    attempts: usize,
}

impl FaultState {
    /// xorshift64*, mapped onto [0.0, 1.0).
    fn roll(&mut self) -> f64 {
        let mut x = self.seed;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.seed = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Wrap `inner`, failing roughly `failure_rate` of saves.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside [0.0, 1.0].
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, DEFAULT_SEED)
    }

    /// Same as [`Self::new`] with an explicit seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside [0.0, 1.0].
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );
        // xorshift never leaves zero
        let seed = if seed == 0 { DEFAULT_SEED } else { seed };
        Self { inner, failure_rate, faults: Arc::new(Mutex::new(FaultState { seed, attempts: 0 })) }
    }

    /// Wrapped storage, holding whatever actually got written.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Save attempts so far, failed or not.
    pub fn save_attempts(&self) -> usize {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).attempts
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.load()
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let fail = {
            let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
            faults.attempts += 1;
            faults.roll() < self.failure_rate
        };
        if fail {
            return Err(StorageError::Injected);
        }
        self.inner.save(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn zero_rate_passes_everything_through() {
        let chaotic = ChaoticStorage::new(MemoryStorage::new(), 0.0);
        for i in 0..50u8 {
            chaotic.save(&[i]).unwrap();
        }
        assert_eq!(chaotic.inner().save_count(), 50);
        assert_eq!(chaotic.load(), Ok(Some(vec![49])));
    }

    #[test]
    fn full_rate_keeps_old_document() {
        let chaotic = ChaoticStorage::new(MemoryStorage::with_document("old"), 1.0);
        assert_eq!(chaotic.save(b"new"), Err(StorageError::Injected));
        assert_eq!(chaotic.load(), Ok(Some(b"old".to_vec())));
        assert_eq!(chaotic.save_attempts(), 1);
    }

    #[test]
    fn same_seed_same_faults() {
        let outcomes = |seed| {
            let chaotic = ChaoticStorage::with_seed(MemoryStorage::new(), 0.5, seed);
            (0..64u8).map(|i| chaotic.save(&[i]).is_ok()).collect::<Vec<_>>()
        };
        let first = outcomes(42);
        assert_eq!(first, outcomes(42));
        assert!(first.contains(&true) && first.contains(&false));
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between 0.0 and 1.0")]
    fn rejects_rate_above_one() {
        let _ = ChaoticStorage::new(MemoryStorage::new(), 1.5);
    }
}
