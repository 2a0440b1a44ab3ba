//! Core admission-control services.
//!
//! This module contains the guards that make up the pipeline, the cache
//! abstraction they share, and the pipeline orchestrator itself.

pub mod cache;
pub mod canonical;
pub mod clock;
pub mod metrics;
pub mod nonce;
pub mod pipeline;
pub mod rate_limit;
pub mod repeat_submit;
pub mod signature;

pub use cache::*;
pub use canonical::*;
pub use clock::*;
pub use metrics::*;
pub use nonce::*;
pub use pipeline::*;
pub use rate_limit::*;
pub use repeat_submit::*;
pub use signature::{sign, verify};
