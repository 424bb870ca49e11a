//! Install command - runs install and activate once, then exits
//!
//! Useful with the redis backend to pre-warm a persistent cache.

use tracing::info;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state_with_config(&config).await?;

    state.host.start().await?;

    let status = state.host.status().await;
    let caches = state.storage.keys().await?;
    info!(
        state = %status.state,
        cache = %status.cache_name,
        caches = ?caches,
        "Worker installed"
    );

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
