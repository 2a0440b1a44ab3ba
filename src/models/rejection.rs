//! Rejection taxonomy and startup error types.
//!
//! Every per-request denial the admission pipeline can produce maps to one
//! of the fixed rejection codes below. The pipeline never invents ad hoc
//! messages; callers see only the numeric code, a stable message key, and
//! the default English message.

use std::time::Duration;

use crate::services::cache::CacheError;

/// A typed denial produced by the admission pipeline.
///
/// Each variant carries a stable numeric code and a localizable message
/// key. Internal details (cache keys, which signature sub-check failed)
/// are never exposed through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// A required header or field is missing or malformed.
    #[error("required parameter is missing or malformed")]
    ParameterError,
    /// Signature verification failed (bad digest, stale timestamp, or
    /// replayed nonce; uniform on purpose).
    #[error("signature verification failed")]
    SignError,
    /// The caller's platform is not allowed for this route.
    #[error("client platform is not allowed")]
    UserAgentError,
    /// A rate window is exhausted or the IP is blacklisted.
    #[error("rate limit exceeded")]
    RateLimit,
    /// An identical submission was seen inside the repeat-submit window.
    #[error("duplicate submission")]
    RepeatSubmit,
}

impl Rejection {
    /// Stable numeric code surfaced to callers.
    pub fn code(&self) -> u16 {
        match self {
            Rejection::ParameterError => 1001,
            Rejection::SignError => 1002,
            Rejection::UserAgentError => 1003,
            Rejection::RateLimit => 1004,
            Rejection::RepeatSubmit => 1005,
        }
    }

    /// Localizable message key.
    pub fn message_key(&self) -> &'static str {
        match self {
            Rejection::ParameterError => "admission.parameter-error",
            Rejection::SignError => "admission.sign-error",
            Rejection::UserAgentError => "admission.useragent-error",
            Rejection::RateLimit => "admission.rate-limit",
            Rejection::RepeatSubmit => "admission.repeat-submit",
        }
    }

    /// HTTP status the adapter answers with.
    pub fn status(&self) -> u16 {
        match self {
            Rejection::ParameterError => 400,
            Rejection::SignError => 401,
            Rejection::UserAgentError => 403,
            Rejection::RateLimit => 429,
            Rejection::RepeatSubmit => 429,
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::ParameterError => "parameter_error",
            Rejection::SignError => "sign_error",
            Rejection::UserAgentError => "useragent_error",
            Rejection::RateLimit => "rate_limit",
            Rejection::RepeatSubmit => "repeat_submit",
        }
    }
}

/// Fatal configuration problems detected while constructing the pipeline.
///
/// These abort service startup; they are never converted into per-request
/// rejections.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signature checking is enabled but no signing key is configured")]
    EmptySignatureKey,
    #[error("could not acquire the bootstrap lock within {0:?}")]
    BootstrapLockTimeout(Duration),
    #[error("configured signing key does not match the key already registered in the cache")]
    SigningKeyMismatch,
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}
