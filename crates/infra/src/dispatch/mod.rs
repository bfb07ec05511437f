//! Dispatch layer
//!
//! Builds and issues outbound search requests shaped like organic browser
//! traffic: engine-specific URLs, a realistic referrer mix, a full
//! navigation header set, and cookie/redirect behavior matching a real
//! session. Owns failure/backoff state; nothing in here throws past the
//! dispatch boundary.

mod failure;
mod profile;
mod service;

pub use failure::FailureTracker;
pub use service::{ClickOutcome, DispatchOutcome, DispatcherConfig, QueryDispatcher};
