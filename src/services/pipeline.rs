//! The admission pipeline state machine.
//!
//! Runs the guards in a fixed order and short-circuits on the first
//! rejection: platform check, blacklist (membership then IP rate, with
//! promotion on exhaustion), clock skew, nonce rate, nonce replay,
//! signature, repeat submit. Cache failures during a security check fail
//! closed: the request is rejected, never silently allowed.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::AdmissionConfig;
use crate::models::{
    BlacklistEntry, ConfigError, ParamSnapshot, PolicyDecision, Rejection, SigningHeaders,
};
use crate::services::cache::{self, CacheError, CacheStore};
use crate::services::clock;
use crate::services::metrics::AdmissionMetrics;
use crate::services::nonce::NonceGuard;
use crate::services::rate_limit::{BlacklistGuard, RateLimiter, RateScope};
use crate::services::repeat_submit::{RepeatSubmitError, RepeatSubmitGuard};
use crate::services::signature;

/// User-Agent substrings accepted when the platform restriction is on.
const MOBILE_MARKERS: [&str; 5] = ["android", "iphone", "ipad", "okhttp", "dalvik"];

/// Fallback nonce-replay window when the clock-skew check is disabled.
const DEFAULT_NONCE_WINDOW_MS: u64 = 300_000;

const BOOTSTRAP_LOCK_TTL: Duration = Duration::from_secs(30);
const BOOTSTRAP_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Transport-level facts about one request.
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub method: &'a str,
    pub route: &'a str,
    pub ip: &'a str,
    pub user_agent: Option<&'a str>,
    /// Authenticated caller when known, otherwise the client IP. Feeds
    /// the repeat-submit dedup hash only.
    pub caller_identity: &'a str,
}

/// Orchestrates the guards. Holds no per-request state; all shared state
/// lives behind the cache.
pub struct AdmissionPipeline {
    config: AdmissionConfig,
    nonce: NonceGuard,
    limiter: RateLimiter,
    blacklist: BlacklistGuard,
    repeat: RepeatSubmitGuard,
    metrics: AdmissionMetrics,
}

impl std::fmt::Debug for AdmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPipeline").finish_non_exhaustive()
    }
}

impl AdmissionPipeline {
    /// Validate configuration and perform one-time initialization.
    ///
    /// With signing required and an empty key this fails fatally; the
    /// service must not start. When signing is active, a fingerprint of
    /// the key is registered in the cache under a bootstrap lock so that
    /// instances with divergent keys refuse to come up.
    pub fn new(config: AdmissionConfig, cache: Arc<dyn CacheStore>) -> Result<Self, ConfigError> {
        if config.signature.require_signature && config.signature.signature_key.is_empty() {
            return Err(ConfigError::EmptySignatureKey);
        }

        if config.signature.signing_enabled() {
            bootstrap_signing_key(cache.as_ref(), &config)?;
        }

        let prefix = config.key_prefix.clone();
        let pipeline = Self {
            nonce: NonceGuard::new(Arc::clone(&cache), &prefix),
            limiter: RateLimiter::new(Arc::clone(&cache), &prefix),
            blacklist: BlacklistGuard::new(Arc::clone(&cache), &prefix),
            repeat: RepeatSubmitGuard::new(Arc::clone(&cache), &prefix),
            metrics: AdmissionMetrics::new()?,
            config,
        };
        info!(
            signing = pipeline.config.signature.signing_enabled(),
            platform_restriction = pipeline.config.app_platform_restriction,
            "admission pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn metrics(&self) -> &AdmissionMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Run the full pipeline for one request and record the decision.
    pub fn admit(
        &self,
        desc: &RequestDescriptor<'_>,
        policy: &PolicyDecision,
        snapshot: &ParamSnapshot,
        headers: &SigningHeaders,
    ) -> Result<(), Rejection> {
        let result = self.run(desc, policy, snapshot, headers);
        let outcome = match &result {
            Ok(()) => "allow",
            Err(rejection) => rejection.label(),
        };
        self.metrics.record(desc.route, outcome);
        result
    }

    fn run(
        &self,
        desc: &RequestDescriptor<'_>,
        policy: &PolicyDecision,
        snapshot: &ParamSnapshot,
        headers: &SigningHeaders,
    ) -> Result<(), Rejection> {
        // skip_all hands straight off to the auth delegate.
        if policy.skip_all {
            return Ok(());
        }

        // PLATFORM_CHECK
        if self.config.app_platform_restriction && !policy.skip_platform_check {
            let ua = desc.user_agent.ok_or(Rejection::UserAgentError)?;
            if !is_mobile_client(ua) {
                return Err(Rejection::UserAgentError);
            }
        }

        // BLACKLIST_CHECK: membership first, so a blacklisted IP never
        // increments a fresh window.
        if self.blacklist.is_blacklisted(desc.ip).map_err(fail_closed)? {
            return Err(Rejection::RateLimit);
        }
        let ip_window = policy
            .ip_rate_override
            .unwrap_or(self.config.rate_limit.ip);
        if !self
            .limiter
            .acquire(RateScope::Ip, desc.ip, &ip_window)
            .map_err(fail_closed)?
        {
            if self.config.rate_limit.ip_open_blacklist {
                let entry = BlacklistEntry::new(desc.ip, desc.route, desc.method, ip_window);
                if let Err(e) = self.blacklist.promote(&entry) {
                    warn!(error = %e, ip = %desc.ip, "blacklist write failed");
                }
            }
            return Err(Rejection::RateLimit);
        }

        if self.config.signature.signing_enabled() && !policy.skip_signature {
            let ctx = headers.resolve()?;

            // CLOCK_CHECK
            if !policy.skip_timestamp
                && !clock::within_skew(
                    ctx.timestamp_ms,
                    self.config.signature.max_time_diff_seconds,
                )
            {
                return Err(Rejection::SignError);
            }

            // NONCE_RATE_CHECK
            if !self
                .limiter
                .acquire(RateScope::Nonce, &ctx.nonce, &self.config.rate_limit.nonce)
                .map_err(fail_closed)?
            {
                return Err(Rejection::RateLimit);
            }

            // Nonce replay claim; a reused nonce means a replayed
            // signature, so the rejection is uniform SIGN_ERROR.
            let window_ms = nonce_window_ms(self.config.signature.max_time_diff_seconds);
            if !self
                .nonce
                .claim(&ctx.nonce, window_ms)
                .map_err(fail_closed)?
            {
                return Err(Rejection::SignError);
            }

            // SIGNATURE_CHECK
            signature::verify(snapshot, &ctx, &self.config.signature.signature_key)?;
        }

        // REPEAT_SUBMIT_CHECK
        if let Some(interval_ms) = policy.repeat_submit_interval_ms {
            if interval_ms > 0 {
                let admitted = self
                    .repeat
                    .check(
                        desc.method,
                        desc.route,
                        desc.caller_identity,
                        snapshot,
                        &policy.repeat_submit_excluded_fields,
                        interval_ms,
                    )
                    .map_err(|e| match e {
                        RepeatSubmitError::Rejected(r) => r,
                        RepeatSubmitError::Cache(e) => fail_closed(e),
                    })?;
                if !admitted {
                    return Err(Rejection::RepeatSubmit);
                }
            }
        }

        Ok(())
    }
}

/// Register the signing-key fingerprint under the bootstrap lock.
fn bootstrap_signing_key(cache: &dyn CacheStore, config: &AdmissionConfig) -> Result<(), ConfigError> {
    let lock_key = format!("{}:lock:bootstrap", config.key_prefix);
    if !cache::acquire_lock(cache, &lock_key, BOOTSTRAP_LOCK_TTL, BOOTSTRAP_LOCK_WAIT)? {
        return Err(ConfigError::BootstrapLockTimeout(BOOTSTRAP_LOCK_WAIT));
    }

    let result = (|| {
        let fingerprint = hex::encode(Sha256::digest(config.signature.signature_key.as_bytes()));
        let key = format!("{}:signing-key-fingerprint", config.key_prefix);
        cache.set_if_absent(&key, &fingerprint, Duration::from_secs(86_400))?;
        match cache.get(&key)? {
            Some(existing) if existing != fingerprint => Err(ConfigError::SigningKeyMismatch),
            _ => Ok(()),
        }
    })();

    if let Err(e) = cache.delete(&lock_key) {
        warn!(error = %e, "failed to release bootstrap lock");
    }
    result
}

fn is_mobile_client(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}

fn nonce_window_ms(max_time_diff_seconds: u64) -> u64 {
    if max_time_diff_seconds == 0 {
        DEFAULT_NONCE_WINDOW_MS
    } else {
        max_time_diff_seconds * 1000
    }
}

/// A cache failure during a security check rejects the request. A
/// fail-open policy here would defeat the admission control.
fn fail_closed(error: CacheError) -> Rejection {
    warn!(error = %error, "cache failure during admission check, failing closed");
    Rejection::RateLimit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    #[test]
    fn mobile_markers_match_case_insensitively() {
        assert!(is_mobile_client("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"));
        assert!(is_mobile_client("okhttp/4.12.0"));
        assert!(!is_mobile_client("Mozilla/5.0 (X11; Linux x86_64)"));
    }

    #[test]
    fn empty_key_with_signing_required_fails_startup() {
        let mut config = AdmissionConfig::default();
        config.signature.require_signature = true;
        config.signature.signature_key.clear();
        let err = AdmissionPipeline::new(config, Arc::new(MemoryCache::new())).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySignatureKey));
    }

    #[test]
    fn divergent_signing_keys_refuse_to_boot() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let mut config = AdmissionConfig::default();
        config.signature.require_signature = true;
        config.signature.signature_key = "key-one".to_string();
        AdmissionPipeline::new(config.clone(), Arc::clone(&cache)).unwrap();

        config.signature.signature_key = "key-two".to_string();
        let err = AdmissionPipeline::new(config, cache).unwrap_err();
        assert!(matches!(err, ConfigError::SigningKeyMismatch));
    }

    #[test]
    fn nonce_window_falls_back_when_skew_disabled() {
        assert_eq!(nonce_window_ms(0), DEFAULT_NONCE_WINDOW_MS);
        assert_eq!(nonce_window_ms(60), 60_000);
    }
}
