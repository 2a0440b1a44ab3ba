//! Shared cache abstraction and the bundled in-memory backend.
//!
//! The admission pipeline needs only four operations from its cache:
//! `get`, conditional set with TTL, atomic increment with TTL, and
//! `delete`. Any key-value store with atomic conditional-set and expiry
//! satisfies the trait; a Redis-backed implementation would wrap the
//! corresponding commands and surface its own timeouts as
//! [`CacheError::Timeout`].

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Entries are purged lazily; a full sweep runs only once the map grows
/// past this size.
const PURGE_THRESHOLD: usize = 10_000;

/// Failure of a cache operation. The pipeline treats any of these as a
/// fail-closed rejection during security checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache operation timed out")]
    Timeout,
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Minimal key-value contract the admission pipeline consumes.
///
/// Implementations must make `set_if_absent` and `increment` atomic:
/// two concurrent `set_if_absent` calls on the same absent key must not
/// both return `true`. Every operation must be bounded in time; a remote
/// backend carries a timeout on each call.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` only if the key is absent (or expired).
    /// Returns `true` when this call created the entry.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Atomically increment the counter at `key`, creating it at 1 with
    /// the given TTL. The TTL is set only on creation; later increments
    /// inside the same window do not extend it, so the window rolls
    /// forward instead of stretching under load.
    fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

enum Slot {
    Value(String),
    Counter(i64),
}

struct Entry {
    slot: Slot,
    expires_at: Instant,
}

/// In-memory [`CacheStore`] for single-process deployments and tests.
///
/// A single mutex guards the map; every operation completes without
/// blocking on anything external, so no timeout is needed here.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => match &entry.slot {
                Slot::Value(v) => Ok(Some(v.clone())),
                Slot::Counter(n) => Ok(Some(n.to_string())),
            },
            _ => Ok(None),
        }
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut entries = self.lock();
        let now = Instant::now();
        if entries.len() > PURGE_THRESHOLD {
            entries.retain(|_, e| e.expires_at > now);
        }
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        slot: Slot::Value(value.to_string()),
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut entries = self.lock();
        let now = Instant::now();
        if entries.len() > PURGE_THRESHOLD {
            entries.retain(|_, e| e.expires_at > now);
        }
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => match &mut entry.slot {
                Slot::Counter(n) => {
                    *n += 1;
                    Ok(*n)
                }
                Slot::Value(_) => Err(CacheError::Backend(format!(
                    "key holds a value, not a counter: {key}"
                ))),
            },
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        slot: Slot::Counter(1),
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Acquire a cache-backed lock, retrying until `wait` elapses.
///
/// Built from `set_if_absent`; used only for one-time startup
/// initialization. Returns `false` if the lock could not be acquired
/// within the bound.
pub fn acquire_lock(
    cache: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    wait: Duration,
) -> Result<bool, CacheError> {
    let deadline = Instant::now() + wait;
    loop {
        if cache.set_if_absent(key, "locked", ttl)? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}
