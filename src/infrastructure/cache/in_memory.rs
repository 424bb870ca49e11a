//! In-memory cache storage using moka

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::domain::cache::{CacheEntryMeta, CacheStorage, CacheStore, RequestKey};
use crate::domain::{DomainError, HttpResponse};

/// Configuration for in-memory cache storage
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Pre-allocated entries per store
    pub initial_capacity: usize,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct StoredEntry {
    response: HttpResponse,
    stored_at: DateTime<Utc>,
}

/// One named store backed by an unbounded moka cache
///
/// No capacity, TTL or idle limit is configured, so entries are never
/// evicted.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    name: String,
    cache: MokaCache<RequestKey, StoredEntry>,
}

impl InMemoryCacheStore {
    fn new(name: &str, config: &InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .initial_capacity(config.initial_capacity)
            .build();

        Self {
            name: name.to_string(),
            cache,
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<HttpResponse>, DomainError> {
        Ok(self.cache.get(key).await.map(|entry| entry.response))
    }

    async fn put(&self, key: &RequestKey, response: &HttpResponse) -> Result<(), DomainError> {
        let entry = StoredEntry {
            response: response.clone(),
            stored_at: Utc::now(),
        };

        self.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn entries(&self) -> Result<Vec<CacheEntryMeta>, DomainError> {
        self.cache.run_pending_tasks().await;

        let mut entries: Vec<(RequestKey, StoredEntry)> = self
            .cache
            .iter()
            .map(|(key, entry)| (key.as_ref().clone(), entry))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(entries
            .into_iter()
            .map(|(key, entry)| CacheEntryMeta {
                key: key.to_string(),
                status: entry.response.status,
                size_bytes: entry.response.body.len(),
                stored_at: entry.stored_at,
            })
            .collect())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}

/// Process-local cache storage; stores are kept in creation order
#[derive(Debug, Default)]
pub struct InMemoryCacheStorage {
    stores: RwLock<Vec<Arc<InMemoryCacheStore>>>,
    config: InMemoryCacheConfig,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            stores: RwLock::new(Vec::new()),
            config,
        }
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, DomainError> {
        if let Some(store) = self.stores.read().await.iter().find(|s| s.name == name) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;

        // Another task may have created it between the two locks
        if let Some(store) = stores.iter().find(|s| s.name == name) {
            return Ok(store.clone());
        }

        let store = Arc::new(InMemoryCacheStore::new(name, &self.config));
        stores.push(store.clone());
        Ok(store)
    }

    async fn has(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.stores.read().await.iter().any(|s| s.name == name))
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != name);
        Ok(stores.len() != before)
    }
}
