//! Gatekeep - request admission control for HTTP APIs
//!
//! Decides, for every inbound API call, whether the call is authentic,
//! non-replayed, within rate limits, and not a duplicate submission,
//! before any business logic runs:
//! - Canonical-parameter HMAC signing with clock-skew checking
//! - Nonce replay protection with atomic claim semantics
//! - Fixed-window rate limiting by IP and by nonce
//! - Automatic IP blacklisting until local midnight
//! - Content-addressed repeat-submit suppression
//! - Prometheus decision metrics
//!
//! ## Architecture
//!
//! The codebase is organized into focused modules:
//! - `models/` - Parameter snapshot, route policy, rejection taxonomy
//! - `services/` - The guards, the pipeline, and the cache abstraction
//! - `middleware/` - Actix Web adapter
//! - `utils/` - Request-information helpers
//! - `config/` - Configuration structures and environment loading
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatekeep::{AdmissionConfig, AdmissionPipeline, MemoryCache};
//!
//! let config = AdmissionConfig::from_env();
//! let pipeline = AdmissionPipeline::new(config, Arc::new(MemoryCache::new()))
//!     .expect("admission configuration invalid");
//! ```

// Core modules
pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use config::{AdmissionConfig, RateLimitConfig, SignatureConfig};
pub use middleware::{
    admission_middleware, admission_middleware_with_files, build_snapshot,
    build_snapshot_with_digests, file_digest, rejection_response,
};
pub use models::{
    BlacklistEntry, ConfigError, ParamSnapshot, PolicyDecision, PolicyRegistry, RateWindow,
    Rejection, SigningContext, SigningHeaders,
};
pub use services::{
    AdmissionMetrics, AdmissionPipeline, BlacklistGuard, CacheError, CacheStore, CanonicalError,
    JoinOrder, MemoryCache, NonceGuard, RateLimiter, RateScope, RepeatSubmitGuard,
    RequestDescriptor, canonical_string, canonical_string_excluding, sign, verify, within_skew,
};
pub use utils::{extract_client_ip, extract_route_pattern, extract_user_agent};
