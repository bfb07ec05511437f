//! Port interfaces for the noise engine
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chaff_domain::{Result, Settings, Statistics, UserState};

/// Trait for persisting engine state between runs.
///
/// Backed by a two-record key-value layout (`settings`, `statistics`).
/// Implementations follow persist-after-mutate, last-write-wins; there is no
/// transactional guarantee against a concurrent external writer.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted settings record, `None` if never written.
    async fn load_settings(&self) -> Result<Option<Settings>>;

    /// Persist the settings record.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Load the persisted statistics record, `None` if never written.
    async fn load_statistics(&self) -> Result<Option<Statistics>>;

    /// Persist the statistics record.
    async fn save_statistics(&self, statistics: &Statistics) -> Result<()>;
}

/// Trait for probing user presence at the machine.
#[async_trait]
pub trait IdleProbe: Send + Sync {
    /// Current user state, treating `threshold_secs` without input as idle.
    async fn query_state(&self, threshold_secs: u32) -> Result<UserState>;
}

/// Trait for the visual status surface (badge, tray icon, log line).
pub trait StatusIndicator: Send + Sync {
    fn set_text(&self, text: &str);

    fn set_color(&self, color: &str);
}
