//! chaff - search-noise generation engine
//!
//! Headless entry point: loads configuration, assembles the engine context,
//! and runs until interrupted.

use std::sync::Arc;

use chaff_core::ThreadRngSource;
use chaff_engine::NoiseEngine;
use chaff_infra::{
    DispatcherConfig, FixedIdleProbe, JsonFileStore, QueryDispatcher, TracingStatusIndicator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first so config loading is visible.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = chaff_infra::config::load()?;
    info!(state_path = %config.storage.state_path.display(), "chaff starting");

    let store = Arc::new(JsonFileStore::new(config.storage.state_path.clone()));
    let dispatcher = Arc::new(QueryDispatcher::new(
        DispatcherConfig::from_http(&config.http),
        Box::new(ThreadRngSource),
    )?);
    let engine = NoiseEngine::new(
        store,
        Arc::new(FixedIdleProbe::active()),
        Arc::new(TracingStatusIndicator),
        dispatcher,
    );

    engine.init().await;
    info!("chaff initialized, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    engine.stop().await?;

    Ok(())
}
