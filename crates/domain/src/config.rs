//! Runtime configuration structures
//!
//! Deployment-level knobs, as opposed to the user-facing [`Settings`]
//! record: where state lives on disk and how outbound HTTP behaves. Loaded
//! by the infra config loader from environment variables or a TOML file.
//!
//! [`Settings`]: crate::types::Settings

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

/// Where persisted state (settings + statistics) lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { state_path: PathBuf::from("chaff-state.json") }
    }
}

/// Outbound HTTP behavior for the dispatch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Route all search traffic to this base URL instead of the engine's
    /// real endpoint. Test hook; leave unset in production.
    pub endpoint_override: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) ",
                "Gecko/20100101 Firefox/128.0"
            )
            .to_string(),
            endpoint_override: None,
        }
    }
}
