//! Fixed-window rate limiting and IP blacklisting.
//!
//! Counters live in the shared cache as atomic increments with a TTL set
//! on the first increment of a window only. The window therefore rolls
//! forward instead of extending under sustained load. Fixed-window
//! semantics allow short bursts of up to roughly twice the nominal rate
//! at window boundaries; that is documented, accepted behavior.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local};
use tracing::warn;

use crate::models::{BlacklistEntry, RateWindow};
use crate::services::cache::{CacheError, CacheStore};

/// Which identity a rate window is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Ip,
    Nonce,
}

impl RateScope {
    fn key_segment(&self) -> &'static str {
        match self {
            RateScope::Ip => "ip-rate-limit",
            RateScope::Nonce => "nonce-rate-limit",
        }
    }
}

/// Counter-based limiter over the shared cache.
pub struct RateLimiter {
    cache: Arc<dyn CacheStore>,
    prefix: String,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn CacheStore>, prefix: &str) -> Self {
        Self {
            cache,
            prefix: prefix.to_string(),
        }
    }

    /// Try to take one slot from the window. `Ok(true)` admits the call.
    /// A disabled window (zero limit or zero interval) always admits.
    pub fn acquire(
        &self,
        scope: RateScope,
        identity: &str,
        window: &RateWindow,
    ) -> Result<bool, CacheError> {
        if window.is_disabled() {
            return Ok(true);
        }
        let key = format!("{}:{}:{}", self.prefix, scope.key_segment(), identity);
        self.acquire_key(&key, window)
    }

    /// Same acquisition against a fully-formed key. Used by the
    /// repeat-submit guard, whose keys are content hashes.
    pub fn acquire_key(&self, key: &str, window: &RateWindow) -> Result<bool, CacheError> {
        if window.is_disabled() {
            return Ok(true);
        }
        let count = self
            .cache
            .increment(key, Duration::from_millis(window.window_ms as u64))?;
        Ok(count <= i64::from(window.limit))
    }
}

/// Temporary deny-list for IPs that exhausted their rate window.
pub struct BlacklistGuard {
    cache: Arc<dyn CacheStore>,
    prefix: String,
}

impl BlacklistGuard {
    pub fn new(cache: Arc<dyn CacheStore>, prefix: &str) -> Self {
        Self {
            cache,
            prefix: prefix.to_string(),
        }
    }

    fn key(&self, ip: &str) -> String {
        format!("{}:ip-blacklist:{}", self.prefix, ip)
    }

    /// Membership check; runs before any fresh rate-limit acquisition so
    /// a blacklisted IP never increments a new window.
    pub fn is_blacklisted(&self, ip: &str) -> Result<bool, CacheError> {
        Ok(self.cache.get(&self.key(ip))?.is_some())
    }

    /// Write the entry with a TTL that expires at local midnight. Expiry
    /// is lazy via the cache TTL; there is no sweep, and once the entry
    /// lapses the IP is automatically eligible again.
    pub fn promote(&self, entry: &BlacklistEntry) -> Result<(), CacheError> {
        let json = serde_json::to_string(entry)
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let ttl = until_local_midnight();
        warn!(
            ip = %entry.ip,
            route = %entry.route,
            ttl_secs = ttl.as_secs(),
            "promoting ip to blacklist"
        );
        self.cache.set_if_absent(&self.key(entry.ip.as_str()), &json, ttl)?;
        Ok(())
    }
}

/// Seconds remaining until the next local midnight, floored at one
/// second so an entry written at 23:59:59 still lands in the cache.
pub fn until_local_midnight() -> Duration {
    let now = Local::now();
    let next_midnight = (now + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest());
    match next_midnight {
        Some(midnight) => {
            let secs = (midnight - now).num_seconds().max(1);
            Duration::from_secs(secs as u64)
        }
        // Unresolvable local time (DST edge); fall back to a day.
        None => Duration::from_secs(86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryCache::new()), "t")
    }

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let limiter = limiter();
        let window = RateWindow::new(3, 60_000);
        for _ in 0..3 {
            assert!(limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
        }
        assert!(!limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
    }

    #[test]
    fn window_rolls_over() {
        let limiter = limiter();
        let window = RateWindow::new(1, 40);
        assert!(limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
        assert!(!limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
    }

    #[test]
    fn scopes_do_not_share_counters() {
        let limiter = limiter();
        let window = RateWindow::new(1, 60_000);
        assert!(limiter.acquire(RateScope::Ip, "x", &window).unwrap());
        assert!(limiter.acquire(RateScope::Nonce, "x", &window).unwrap());
    }

    #[test]
    fn disabled_window_always_admits() {
        let limiter = limiter();
        let window = RateWindow::new(0, 60_000);
        for _ in 0..100 {
            assert!(limiter.acquire(RateScope::Ip, "10.0.0.1", &window).unwrap());
        }
    }

    #[test]
    fn blacklist_membership_after_promotion() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let guard = BlacklistGuard::new(Arc::clone(&cache), "t");
        assert!(!guard.is_blacklisted("10.0.0.9").unwrap());
        let entry = BlacklistEntry::new("10.0.0.9", "/api/orders", "POST", RateWindow::new(10, 1000));
        guard.promote(&entry).unwrap();
        assert!(guard.is_blacklisted("10.0.0.9").unwrap());
    }

    #[test]
    fn midnight_ttl_is_bounded_by_a_day() {
        let ttl = until_local_midnight();
        assert!(ttl.as_secs() >= 1);
        assert!(ttl.as_secs() <= 86_400);
    }
}
