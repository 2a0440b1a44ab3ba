//! Data models for the admission pipeline.
//!
//! This module contains the value objects threaded through the pipeline:
//! the per-request parameter snapshot, signing context, route policy,
//! blacklist entry, and the rejection taxonomy.

pub mod blacklist;
pub mod policy;
pub mod rejection;
pub mod signing;
pub mod snapshot;

pub use blacklist::*;
pub use policy::*;
pub use rejection::*;
pub use signing::*;
pub use snapshot::*;
