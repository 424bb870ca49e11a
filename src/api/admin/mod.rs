//! Read-only admin endpoints for inspecting the worker and its caches

pub mod caches;
pub mod worker;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/worker", get(worker::get_worker))
        .route("/caches", get(caches::list_caches))
        .route("/caches/{name}", get(caches::get_cache))
}
