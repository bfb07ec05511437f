//! # Chaff Infra
//!
//! Infrastructure adapters for the noise engine: the outbound dispatch
//! layer, state persistence, default probe implementations, and the runtime
//! configuration loader. Implements the ports defined in `chaff-core`.

pub mod config;
pub mod dispatch;
pub mod probes;
pub mod storage;

pub use dispatch::{
    ClickOutcome, DispatchOutcome, DispatcherConfig, FailureTracker, QueryDispatcher,
};
pub use probes::{FixedIdleProbe, TracingStatusIndicator};
pub use storage::JsonFileStore;
