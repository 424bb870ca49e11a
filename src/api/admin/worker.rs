//! Worker status endpoint

use axum::{extract::State, Json};
use tracing::debug;

use crate::api::state::AppState;
use crate::infrastructure::WorkerStatus;

/// GET /_proxy/worker
pub async fn get_worker(State(state): State<AppState>) -> Json<WorkerStatus> {
    debug!("Admin reading worker status");

    Json(state.host.status().await)
}
