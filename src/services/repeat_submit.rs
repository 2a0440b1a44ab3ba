//! Suppression of identical submissions inside a short window.
//!
//! A repeat submit is a specialization of the rate limiter: the dedup key
//! is a content hash of (method, route, caller, parameters) and the
//! window is `limit = 1` over the configured interval.

use std::collections::BTreeSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::models::{ParamSnapshot, RateWindow, Rejection};
use crate::services::cache::{CacheError, CacheStore};
use crate::services::canonical::{self, JoinOrder};
use crate::services::rate_limit::RateLimiter;

pub struct RepeatSubmitGuard {
    limiter: RateLimiter,
    prefix: String,
}

impl RepeatSubmitGuard {
    pub fn new(cache: Arc<dyn CacheStore>, prefix: &str) -> Self {
        Self {
            limiter: RateLimiter::new(cache, prefix),
            prefix: prefix.to_string(),
        }
    }

    /// Content-addressed dedup hash. Fields listed in `excluded` do not
    /// participate, so two submissions differing only in an excluded
    /// field hash identically.
    pub fn dedup_hash(
        method: &str,
        route: &str,
        caller: &str,
        snapshot: &ParamSnapshot,
        excluded: &BTreeSet<String>,
    ) -> Result<String, Rejection> {
        let params = canonical::canonical_string_excluding(snapshot, JoinOrder::Insertion, excluded)
            .map_err(|_| Rejection::ParameterError)?;
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b"\n");
        hasher.update(route.as_bytes());
        hasher.update(b"\n");
        hasher.update(caller.as_bytes());
        hasher.update(b"\n");
        hasher.update(params.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// `Ok(true)` admits the submission. An interval of zero or less
    /// disables the guard for the route.
    pub fn check(
        &self,
        method: &str,
        route: &str,
        caller: &str,
        snapshot: &ParamSnapshot,
        excluded: &BTreeSet<String>,
        interval_ms: i64,
    ) -> Result<bool, RepeatSubmitError> {
        if interval_ms <= 0 {
            return Ok(true);
        }
        let hash = Self::dedup_hash(method, route, caller, snapshot, excluded)
            .map_err(RepeatSubmitError::Rejected)?;
        let key = format!("{}:repeat-submit:{}", self.prefix, hash);
        let window = RateWindow::new(1, interval_ms);
        self.limiter
            .acquire_key(&key, &window)
            .map_err(RepeatSubmitError::Cache)
    }
}

/// Failure modes of the repeat-submit check.
#[derive(Debug)]
pub enum RepeatSubmitError {
    /// Parameter-level problem while hashing (duplicate keys).
    Rejected(Rejection),
    /// Cache failure; the pipeline fails closed on this.
    Cache(CacheError),
}
