//! Search session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::topic::TopicId;

/// A bounded run of topic-coherent queries.
///
/// Created by the pacer when no session exists or the previous one is
/// exhausted, and replaced once `queries_remaining` reaches zero. The topic
/// is assigned by the synthesizer on first use and must not change for the
/// remainder of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub queries_remaining: u32,
    pub topic: Option<TopicId>,
    pub start_time: DateTime<Utc>,
}

impl Session {
    pub fn new(queries_remaining: u32, start_time: DateTime<Utc>) -> Self {
        Self { queries_remaining, topic: None, start_time }
    }

    /// Whether this session has queries left to issue.
    pub fn is_exhausted(&self) -> bool {
        self.queries_remaining == 0
    }
}
