//! Signature and clock-skew configuration.

use std::env;

/// Configuration for signature verification and timestamp checking.
#[derive(Clone)]
pub struct SignatureConfig {
    /// Master switch; when false the signature, nonce and clock stages
    /// are skipped for every route.
    pub require_signature: bool,
    /// Shared signing secret. Must be non-empty when signing is required.
    pub signature_key: String,
    /// Maximum tolerated |server time - client timestamp| in seconds.
    /// Zero disables the clock-skew check.
    pub max_time_diff_seconds: u64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            require_signature: false,
            signature_key: String::new(),
            max_time_diff_seconds: 300, // 5 minutes
        }
    }
}

impl SignatureConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let require_signature = env::var("ADMISSION_REQUIRE_SIGNATURE")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let signature_key = env::var("ADMISSION_SIGNATURE_KEY").unwrap_or_default();

        let max_time_diff_seconds = env::var("ADMISSION_MAX_TIME_DIFF")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        Self {
            require_signature,
            signature_key,
            max_time_diff_seconds,
        }
    }

    /// Signing (and with it the nonce and clock stages) is active.
    pub fn signing_enabled(&self) -> bool {
        self.require_signature
    }
}
