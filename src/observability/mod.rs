//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing setup for binaries and tests

pub mod tracing;
