//! Configuration loader
//!
//! Loads runtime configuration (storage path, outbound HTTP behavior) with
//! automatic fallback:
//!
//! 1. Start from a TOML config file if one is found
//! 2. Apply environment-variable overrides on top
//! 3. Anything still unset keeps its default
//!
//! ## Environment Variables
//! - `CHAFF_STATE_PATH`: state file path
//! - `CHAFF_HTTP_TIMEOUT_SECS`: outbound request timeout in seconds
//! - `CHAFF_USER_AGENT`: user agent presented on outbound requests
//! - `CHAFF_ENDPOINT_OVERRIDE`: route search traffic to this base URL
//!
//! ## File Locations
//! The loader probes `./chaff.toml` then `./config.toml` in the working
//! directory.

use std::path::{Path, PathBuf};

use chaff_domain::{ChaffError, Config, Result};
use tracing::{debug, info};

const CONFIG_FILE_CANDIDATES: &[&str] = &["chaff.toml", "config.toml"];

/// Load configuration with the file-then-env fallback strategy.
pub fn load() -> Result<Config> {
    let mut config = match find_config_file() {
        Some(path) => {
            let config = load_from_file(&path)?;
            info!(path = %path.display(), "configuration loaded from file");
            config
        }
        None => {
            debug!("no config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a specific TOML file.
///
/// # Errors
/// Returns `ChaffError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ChaffError::Config(format!("failed to read {}: {err}", path.display()))
    })?;
    parse_toml(&raw)
        .map_err(|err| ChaffError::Config(format!("invalid config {}: {err}", path.display())))
}

fn parse_toml(raw: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(path) = std::env::var("CHAFF_STATE_PATH") {
        config.storage.state_path = PathBuf::from(path);
    }

    if let Ok(raw) = std::env::var("CHAFF_HTTP_TIMEOUT_SECS") {
        config.http.timeout_seconds = raw
            .parse::<u64>()
            .map_err(|err| ChaffError::Config(format!("invalid HTTP timeout: {err}")))?;
    }

    if let Ok(agent) = std::env::var("CHAFF_USER_AGENT") {
        config.http.user_agent = agent;
    }

    if let Ok(endpoint) = std::env::var("CHAFF_ENDPOINT_OVERRIDE") {
        config.http.endpoint_override = Some(endpoint);
    }

    Ok(())
}
