//! HTTP-layer adapters for the admission pipeline.

pub mod admission;

pub use admission::*;
