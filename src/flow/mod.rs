//! Flow control for continuous consumption.
//!
//! Provides:
//! - Idle backoff between empty pulls of a listener session

pub mod backoff;

pub use backoff::idle_backoff;
