//! Common data types used throughout the application

use serde::{Deserialize, Serialize};

pub mod session;
pub mod settings;
pub mod stats;
pub mod topic;

pub use session::Session;
pub use settings::{Intensity, Schedule, SearchEngine, Settings, SettingsPatch};
pub use stats::{DispatchStats, Statistics};
pub use topic::TopicId;

/// Reported state of the user at the machine, as seen by the idle probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    Active,
    Idle,
    Locked,
}

/// Complexity tier of a synthesized query.
///
/// The tiers roughly track word count: 1-2 words, 3-5 words, 6-10 words,
/// full natural-language questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryComplexity {
    Short,
    Medium,
    Long,
    VeryLong,
}
