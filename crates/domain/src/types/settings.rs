//! User-facing settings
//!
//! The persisted settings record (storage key `settings`) and the merge
//! patch applied by the control protocol's `updateSettings` request. Field
//! names serialize in camelCase to match the persisted record layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::topic::TopicId;
use crate::constants::{CUSTOM_RATE_MAX, CUSTOM_RATE_MIN};

/// Named pacing tier controlling target queries per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
    Custom,
}

/// Supported search engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Google,
    Bing,
    Duckduckgo,
}

/// Daily active window. Hours are local, `start_hour` inclusive,
/// `end_hour` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub enabled: bool,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self { enabled: false, start_hour: 9, end_hour: 23 }
    }
}

/// Complete user settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub intensity: Intensity,
    /// Queries per hour; consulted only when `intensity` is `Custom`.
    pub custom_rate: u32,
    pub search_engine: SearchEngine,
    pub enable_result_clicks: bool,
    pub debug_mode: bool,
    pub schedule: Schedule,
    /// Per-topic enablement. A topic absent from the map counts as enabled.
    pub topics: BTreeMap<TopicId, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: Intensity::Medium,
            custom_rate: 12,
            search_engine: SearchEngine::Google,
            enable_result_clicks: false,
            debug_mode: false,
            schedule: Schedule::default(),
            topics: TopicId::ALL.iter().map(|&id| (id, true)).collect(),
        }
    }
}

impl Settings {
    /// Whether queries may be drawn from `topic`.
    pub fn topic_enabled(&self, topic: TopicId) -> bool {
        self.topics.get(&topic).copied().unwrap_or(true)
    }

    /// Topics currently eligible for selection.
    pub fn enabled_topics(&self) -> Vec<TopicId> {
        TopicId::ALL.iter().copied().filter(|&id| self.topic_enabled(id)).collect()
    }

    /// Merge a partial update into the record.
    ///
    /// Topic toggles merge per key; everything else replaces wholesale.
    /// `custom_rate` is clamped to its documented range.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(intensity) = patch.intensity {
            self.intensity = intensity;
        }
        if let Some(rate) = patch.custom_rate {
            self.custom_rate = rate.clamp(CUSTOM_RATE_MIN, CUSTOM_RATE_MAX);
        }
        if let Some(engine) = patch.search_engine {
            self.search_engine = engine;
        }
        if let Some(clicks) = patch.enable_result_clicks {
            self.enable_result_clicks = clicks;
        }
        if let Some(debug) = patch.debug_mode {
            self.debug_mode = debug;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
        if let Some(topics) = &patch.topics {
            for (&topic, &enabled) in topics {
                self.topics.insert(topic, enabled);
            }
        }
    }
}

/// Partial settings update, as carried by `updateSettings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub intensity: Option<Intensity>,
    pub custom_rate: Option<u32>,
    pub search_engine: Option<SearchEngine>,
    pub enable_result_clicks: Option<bool>,
    pub debug_mode: Option<bool>,
    pub schedule: Option<Schedule>,
    pub topics: Option<BTreeMap<TopicId, bool>>,
}
