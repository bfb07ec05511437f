//! Topic identifiers
//!
//! The ten fixed topic categories queries are drawn from. The set is closed;
//! per-topic enablement lives in [`Settings`](super::settings::Settings).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed enumeration of query topic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicId {
    News,
    Shopping,
    Entertainment,
    Technology,
    Health,
    Travel,
    Food,
    Education,
    Local,
    General,
}

impl TopicId {
    /// Every topic, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::News,
        Self::Shopping,
        Self::Entertainment,
        Self::Technology,
        Self::Health,
        Self::Travel,
        Self::Food,
        Self::Education,
        Self::Local,
        Self::General,
    ];

    /// Stable lowercase name, matching the persisted settings keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::Technology => "technology",
            Self::Health => "health",
            Self::Travel => "travel",
            Self::Food => "food",
            Self::Education => "education",
            Self::Local => "local",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
