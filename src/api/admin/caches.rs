//! Cache inspection endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::CacheEntryMeta;

#[derive(Debug, Clone, Serialize)]
pub struct ListCachesResponse {
    pub caches: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheResponse {
    pub name: String,
    pub entries: Vec<CacheEntryMeta>,
    pub total: usize,
}

/// GET /_proxy/caches
pub async fn list_caches(
    State(state): State<AppState>,
) -> Result<Json<ListCachesResponse>, ApiError> {
    debug!("Admin listing cache stores");

    let caches = state.storage.keys().await?;
    let total = caches.len();

    Ok(Json(ListCachesResponse { caches, total }))
}

/// GET /_proxy/caches/{name}
pub async fn get_cache(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheResponse>, ApiError> {
    debug!(cache = %name, "Admin reading cache store");

    let store = state
        .storage
        .open_existing(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Cache '{}' not found", name)))?;

    let entries = store.entries().await?;
    let total = entries.len();

    Ok(Json(CacheResponse {
        name,
        entries,
        total,
    }))
}
