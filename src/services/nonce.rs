//! Nonce replay protection.

use std::sync::Arc;
use std::time::Duration;

use crate::services::cache::{CacheError, CacheStore};

/// Safety margin added to the marker TTL to tolerate clock and
/// propagation skew while still bounding memory.
const TTL_MARGIN_MS: u64 = 60_000;

/// Enforces "each nonce usable at most once within a window".
///
/// The claim is a single conditional set against the shared cache, so two
/// concurrent requests carrying the same nonce can never both pass. After
/// the marker expires the nonce becomes reusable; that is a deliberate
/// space/security tradeoff, bounded by the signature's own timestamp
/// window.
pub struct NonceGuard {
    cache: Arc<dyn CacheStore>,
    prefix: String,
}

impl NonceGuard {
    pub fn new(cache: Arc<dyn CacheStore>, prefix: &str) -> Self {
        Self {
            cache,
            prefix: prefix.to_string(),
        }
    }

    /// Claim the nonce. `Ok(true)` means first use; `Ok(false)` means it
    /// was already used within the window.
    pub fn claim(&self, nonce: &str, window_ms: u64) -> Result<bool, CacheError> {
        let key = format!("{}:nonce:{}", self.prefix, nonce);
        let ttl = Duration::from_millis(2 * window_ms + TTL_MARGIN_MS);
        self.cache.set_if_absent(&key, "1", ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    #[test]
    fn first_claim_succeeds_second_fails() {
        let guard = NonceGuard::new(Arc::new(MemoryCache::new()), "t");
        assert!(guard.claim("n1", 1_000).unwrap());
        assert!(!guard.claim("n1", 1_000).unwrap());
    }

    #[test]
    fn distinct_nonces_are_independent() {
        let guard = NonceGuard::new(Arc::new(MemoryCache::new()), "t");
        assert!(guard.claim("n1", 1_000).unwrap());
        assert!(guard.claim("n2", 1_000).unwrap());
    }

    #[test]
    fn concurrent_claims_admit_exactly_one() {
        let guard = Arc::new(NonceGuard::new(Arc::new(MemoryCache::new()), "t"));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = Arc::clone(&guard);
            handles.push(std::thread::spawn(move || {
                guard.claim("shared", 1_000).unwrap()
            }));
        }
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
