//! Irrigo proxy
//!
//! Offline-capable caching proxy in front of the irrigation controller API:
//! - Pre-caches the app shell on install, purges stale cache versions on activate
//! - Network-first for controller API routes, falling back to the last cached response
//! - Cache-first for everything else, storing misses in the background
//! - In-memory (moka) or Redis cache storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::WorkerManifest;
use infrastructure::{CacheStorageFactory, HttpFetcher, InterceptionProxy, WorkerHost};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state from configuration
///
/// The worker is registered but not yet installed; call `start` on the host.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache_config = config.cache.to_cache_config()?;
    info!(backend = %cache_config.cache_type, "Opening cache storage");

    let storage = CacheStorageFactory::new().create(&cache_config).await?;

    let fetcher = Arc::new(HttpFetcher::with_timeout(
        &config.upstream.base_url,
        config.upstream.timeout(),
    )?);
    info!(upstream = %fetcher.base_url(), "Upstream configured");

    let worker = InterceptionProxy::new(WorkerManifest::default(), storage.clone(), fetcher.clone());
    let host = WorkerHost::new(Arc::new(worker), fetcher);

    Ok(AppState::new(Arc::new(host), storage))
}
