//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::CacheStorage;
use crate::infrastructure::WorkerHost;

/// Application state: the hosted worker and the storage it caches into
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<WorkerHost>,
    pub storage: Arc<dyn CacheStorage>,
}

impl AppState {
    pub fn new(host: Arc<WorkerHost>, storage: Arc<dyn CacheStorage>) -> Self {
        Self { host, storage }
    }
}
