//! Cache storage trait definitions

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RequestKey;
use crate::domain::http::HttpResponse;
use crate::domain::DomainError;

/// Cache entry metadata, as listed by the admin API
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryMeta {
    pub key: String,
    pub status: u16,
    pub size_bytes: usize,
    pub stored_at: DateTime<Utc>,
}

/// A single named cache store: request key -> full response
///
/// Entries never expire and the store has no size bound.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Name of the store (the cache version)
    fn name(&self) -> &str;

    /// Looks up the stored response for an exact request key
    async fn match_request(&self, key: &RequestKey) -> Result<Option<HttpResponse>, DomainError>;

    /// Stores a response, replacing any previous entry for the key
    async fn put(&self, key: &RequestKey, response: &HttpResponse) -> Result<(), DomainError>;

    /// Removes an entry
    async fn delete(&self, key: &RequestKey) -> Result<bool, DomainError>;

    /// Lists entry metadata sorted by key
    async fn entries(&self) -> Result<Vec<CacheEntryMeta>, DomainError>;

    /// Returns the number of entries in the store
    async fn size(&self) -> Result<usize, DomainError> {
        Ok(self.entries().await?.len())
    }

    /// Stores every response in order, stopping at the first failed write
    async fn put_all(&self, entries: &[(RequestKey, HttpResponse)]) -> Result<(), DomainError> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }

        Ok(())
    }
}

/// The collection of named cache stores
#[async_trait]
pub trait CacheStorage: Send + Sync + Debug {
    /// Opens a store, creating it when absent
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, DomainError>;

    /// Checks whether a store exists
    async fn has(&self, name: &str) -> Result<bool, DomainError>;

    /// Store names in creation order
    async fn keys(&self) -> Result<Vec<String>, DomainError>;

    /// Deletes a store with all of its entries
    async fn delete(&self, name: &str) -> Result<bool, DomainError>;

    /// Opens a store only if it already exists
    async fn open_existing(&self, name: &str) -> Result<Option<Arc<dyn CacheStore>>, DomainError> {
        if self.has(name).await? {
            Ok(Some(self.open(name).await?))
        } else {
            Ok(None)
        }
    }
}
