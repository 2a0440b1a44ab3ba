//! Per-route admission policy, resolved once at route registration.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A fixed-window rate budget: at most `limit` acquisitions per
/// `window_ms`. Either field being zero disables the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    pub limit: u32,
    pub window_ms: i64,
}

impl RateWindow {
    pub fn new(limit: u32, window_ms: i64) -> Self {
        Self { limit, window_ms }
    }

    pub fn is_disabled(&self) -> bool {
        self.limit == 0 || self.window_ms <= 0
    }
}

/// Flags controlling which admission stages run for a route.
///
/// Replaces the annotation-driven per-route policy of interceptor-style
/// frameworks: resolved once when the route is registered and attached to
/// route metadata, no runtime reflection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDecision {
    /// Bypass every check and hand straight off to the auth delegate.
    /// Overrides all other flags.
    pub skip_all: bool,
    pub skip_platform_check: bool,
    pub skip_signature: bool,
    pub skip_timestamp: bool,
    pub require_body_decrypt: bool,
    pub require_response_encrypt: bool,
    /// Repeat-submit suppression window; `None` or `<= 0` disables.
    pub repeat_submit_interval_ms: Option<i64>,
    /// Fields ignored when computing the repeat-submit dedup hash.
    pub repeat_submit_excluded_fields: BTreeSet<String>,
    /// Replaces the global IP rate window for this route only.
    pub ip_rate_override: Option<RateWindow>,
}

impl PolicyDecision {
    /// Policy that runs every stage with global settings.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Policy that bypasses the whole pipeline.
    pub fn open() -> Self {
        Self {
            skip_all: true,
            ..Self::default()
        }
    }

    pub fn repeat_submit(mut self, interval_ms: i64, excluded: &[&str]) -> Self {
        self.repeat_submit_interval_ms = Some(interval_ms);
        self.repeat_submit_excluded_fields =
            excluded.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// Route-keyed policy table, populated at startup.
///
/// Lookup is by `(method, route pattern)`; unknown routes fall back to the
/// default policy so an unregistered route still gets the strict pipeline.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    routes: HashMap<(String, String), PolicyDecision>,
    default: PolicyDecision,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default: PolicyDecision) -> Self {
        Self {
            routes: HashMap::new(),
            default,
        }
    }

    pub fn register(
        &mut self,
        method: impl Into<String>,
        route: impl Into<String>,
        policy: PolicyDecision,
    ) {
        self.routes
            .insert((method.into().to_uppercase(), route.into()), policy);
    }

    pub fn resolve(&self, method: &str, route: &str) -> &PolicyDecision {
        self.routes
            .get(&(method.to_uppercase(), route.to_string()))
            .unwrap_or(&self.default)
    }
}
