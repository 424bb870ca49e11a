//! Serve command - installs the worker, then proxies on the configured port

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::observability::init_metrics;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let metrics = init_metrics(&config.metrics);

    let state = crate::create_app_state_with_config(&config).await?;

    if let Err(e) = state.host.start().await {
        error!(error = %e, "Worker failed to start");
        return Err(e.into());
    }

    let app = create_router(state, metrics);

    let addr = build_socket_addr(&config)?;
    info!("Starting proxy on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy stopped");
    Ok(())
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
