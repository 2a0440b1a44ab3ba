//! Configuration structures and loading utilities.
//!
//! Each concern gets its own struct with a `Default` impl and a
//! `from_env()` loader. The combined [`AdmissionConfig`] is built once at
//! startup, is read-only afterward, and is passed explicitly to the
//! components that need it. There is no global configuration holder.

pub mod rate_limit;
pub mod signature;

pub use rate_limit::*;
pub use signature::*;

use std::env;

/// Complete admission-control configuration.
#[derive(Clone)]
pub struct AdmissionConfig {
    /// Prefix for every cache key this crate writes.
    pub key_prefix: String,
    /// Reject callers whose User-Agent does not identify a mobile client.
    pub app_platform_restriction: bool,
    pub signature: SignatureConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            key_prefix: "gatekeep".to_string(),
            app_platform_restriction: false,
            signature: SignatureConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AdmissionConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let key_prefix =
            env::var("ADMISSION_KEY_PREFIX").unwrap_or_else(|_| "gatekeep".to_string());

        let app_platform_restriction = env::var("ADMISSION_PLATFORM_RESTRICTION")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            key_prefix,
            app_platform_restriction,
            signature: SignatureConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
