use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::proxy::proxy_handler;
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Prefix reserved for the proxy's own endpoints
pub const ADMIN_PREFIX: &str = "/_proxy";

/// Create the full router: own endpoints under `/_proxy`, everything else through the worker
pub fn create_router(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let own = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .merge(admin::create_admin_router());

    let mut router = Router::new()
        .nest(ADMIN_PREFIX, own)
        .fallback(proxy_handler)
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics));
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
