//! State persistence
//!
//! JSON-file-backed implementation of the [`StateStore`] port. The file
//! holds the two persisted records side by side under their storage keys:
//!
//! ```json
//! { "settings": { ... }, "statistics": { ... } }
//! ```
//!
//! Reads of a missing file yield `None` per record so callers fall back to
//! defaults; writes follow persist-after-mutate, last-write-wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chaff_core::StateStore;
use chaff_domain::{ChaffError, Result, Settings, Statistics};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StateFile {
    settings: Option<Settings>,
    statistics: Option<Statistics>,
}

/// Flat-file state store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_state(&self) -> Result<StateFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                ChaffError::Storage(format!("corrupt state file {}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file missing, starting fresh");
                Ok(StateFile::default())
            }
            Err(err) => Err(ChaffError::Storage(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    async fn write_state(&self, state: &StateFile) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|err| ChaffError::Storage(format!("failed to encode state: {err}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    ChaffError::Storage(format!("failed to create {}: {err}", parent.display()))
                })?;
            }
        }

        tokio::fs::write(&self.path, bytes).await.map_err(|err| {
            ChaffError::Storage(format!("failed to write {}: {err}", self.path.display()))
        })
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_settings(&self) -> Result<Option<Settings>> {
        Ok(self.read_state().await?.settings)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut state = self.read_state().await.unwrap_or_default();
        state.settings = Some(settings.clone());
        self.write_state(&state).await
    }

    async fn load_statistics(&self) -> Result<Option<Statistics>> {
        Ok(self.read_state().await?.statistics)
    }

    async fn save_statistics(&self, statistics: &Statistics) -> Result<()> {
        let mut state = self.read_state().await.unwrap_or_default();
        state.statistics = Some(statistics.clone());
        self.write_state(&state).await
    }
}
