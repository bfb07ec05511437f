//! Statistics types
//!
//! Lifetime counters persisted after every successful dispatch (storage key
//! `statistics`) and the dispatch-layer failure surface reported through
//! `getStatus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query counters persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Lifetime total of successfully dispatched queries.
    pub total_queries: u64,
    /// Queries dispatched since the engine was last started.
    pub queries_this_session: u64,
    pub session_start_time: DateTime<Utc>,
}

impl Statistics {
    /// Fresh counters for an engine session starting at `now`.
    pub fn started_at(now: DateTime<Utc>) -> Self {
        Self { total_queries: 0, queries_this_session: 0, session_start_time: now }
    }

    /// Reset the per-session counters, keeping the lifetime total.
    pub fn begin_session(&mut self, now: DateTime<Utc>) {
        self.queries_this_session = 0;
        self.session_start_time = now;
    }

    pub fn record_query(&mut self) {
        self.total_queries += 1;
        self.queries_this_session += 1;
    }
}

/// Failure-tracking snapshot from the dispatch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    pub failure_count: u32,
    pub backoff_multiplier: f64,
    pub last_failure_time: Option<DateTime<Utc>>,
}
