//! Shared test support: in-memory port implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use chaff_core::{StateStore, StatusIndicator};
use chaff_domain::{Result, Settings, Statistics};

/// In-memory state store recording every persisted value.
#[derive(Default)]
pub struct MemoryStore {
    settings: Mutex<Option<Settings>>,
    statistics: Mutex<Option<Statistics>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persisted_settings(&self) -> Option<Settings> {
        self.settings.lock().expect("settings lock").clone()
    }

    pub fn persisted_statistics(&self) -> Option<Statistics> {
        self.statistics.lock().expect("statistics lock").clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_settings(&self) -> Result<Option<Settings>> {
        Ok(self.settings.lock().expect("settings lock").clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().expect("settings lock") = Some(settings.clone());
        Ok(())
    }

    async fn load_statistics(&self) -> Result<Option<Statistics>> {
        Ok(self.statistics.lock().expect("statistics lock").clone())
    }

    async fn save_statistics(&self, statistics: &Statistics) -> Result<()> {
        *self.statistics.lock().expect("statistics lock") = Some(statistics.clone());
        Ok(())
    }
}

/// Indicator that records the latest badge state.
#[derive(Default)]
pub struct RecordingIndicator {
    pub text: Mutex<String>,
    pub color: Mutex<String>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().expect("text lock").clone()
    }

    pub fn color(&self) -> String {
        self.color.lock().expect("color lock").clone()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set_text(&self, text: &str) {
        *self.text.lock().expect("text lock") = text.to_string();
    }

    fn set_color(&self, color: &str) {
        *self.color.lock().expect("color lock") = color.to_string();
    }
}
