//! Score cache keyed by a stable hash of the review text.
//!
//! Each key owns a slot guarded by its own mutex. A caller that misses holds
//! the slot lock while it computes the score, so concurrent callers for the
//! same review wait for that result instead of issuing a second external
//! call. Different reviews never contend beyond the short map lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 hex digest of a review.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        Self(hex::encode(Sha256::digest(text.as_bytes())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cache statistics for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

type Slot = Arc<Mutex<Option<f64>>>;

/// Grow-only score cache with at most one computation in flight per key.
#[derive(Debug, Default)]
pub struct ScoreCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    stats: Mutex<CacheStats>,
}

impl ScoreCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached score for `text`, if any, without waiting on an in-flight call.
    #[must_use]
    pub fn peek(&self, text: &str) -> Option<f64> {
        let slot = self.slots.lock().get(&CacheKey::for_text(text)).cloned()?;
        slot.try_lock().and_then(|value| *value)
    }

    /// Return the cached score or compute it with `compute`.
    ///
    /// A failed computation leaves the key empty so a later call can retry.
    /// The boolean is `true` on a cache hit.
    pub fn get_or_try_insert_with<F>(&self, text: &str, compute: F) -> Result<(f64, bool)>
    where
        F: FnOnce() -> Result<f64>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(CacheKey::for_text(text)).or_default())
        };

        let mut value = slot.lock();
        if let Some(score) = *value {
            self.stats.lock().hits += 1;
            return Ok((score, true));
        }

        self.stats.lock().misses += 1;
        let score = compute()?;
        *value = Some(score);
        self.stats.lock().entries += 1;
        Ok((score, false))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.stats.lock().entries).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::RbsError;

    #[test]
    fn key_is_stable_sha256() {
        let key = CacheKey::for_text("abc");
        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(key, CacheKey::for_text("abc"));
        assert_ne!(key, CacheKey::for_text("abd"));
    }

    #[test]
    fn second_lookup_is_a_hit() {
        let cache = ScoreCache::new();
        let (first, hit) = cache.get_or_try_insert_with("tasty", || Ok(80.0)).unwrap();
        assert!(!hit);
        let (second, hit) = cache
            .get_or_try_insert_with("tasty", || panic!("must not recompute"))
            .unwrap();
        assert!(hit);
        assert_eq!(first, second);
        assert_eq!(cache.peek("tasty"), Some(80.0));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn failure_is_not_cached() {
        let cache = ScoreCache::new();
        let err = cache
            .get_or_try_insert_with("flaky", || Err(RbsError::Transport("down".to_string())))
            .unwrap_err();
        assert!(matches!(err, RbsError::Transport(_)));
        assert!(cache.is_empty());
        let (score, hit) = cache.get_or_try_insert_with("flaky", || Ok(12.0)).unwrap();
        assert_eq!((score, hit), (12.0, false));
    }

    #[test]
    fn concurrent_callers_compute_once_per_key() {
        let cache = ScoreCache::new();
        let computations = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let (score, _) = cache
                        .get_or_try_insert_with("same review", || {
                            computations.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok(55.0)
                        })
                        .unwrap();
                    assert_eq!(score, 55.0);
                });
            }
        });
        assert_eq!(computations.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
