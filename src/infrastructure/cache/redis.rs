//! Redis cache storage
//!
//! Layout under the optional key prefix:
//! - `caches`: sorted set of store names scored by creation time (ms)
//! - `cache:{name}`: hash of request key -> JSON entry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use crate::domain::cache::{CacheEntryMeta, CacheStorage, CacheStore, RequestKey};
use crate::domain::{DomainError, HttpResponse};

/// Configuration for Redis cache storage
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn index_key(&self) -> String {
        self.prefix_key("caches")
    }

    fn store_key(&self, name: &str) -> String {
        self.prefix_key(&format!("cache:{}", name))
    }
}

/// Serialized form of a cached response
#[derive(Debug, Serialize, Deserialize)]
struct RedisEntry {
    status: u16,
    headers: Vec<(String, String)>,
    /// Base64 encoded body
    body: String,
    stored_at: DateTime<Utc>,
}

impl RedisEntry {
    fn encode(response: &HttpResponse) -> Result<String, DomainError> {
        let entry = RedisEntry {
            status: response.status,
            headers: response.headers.clone(),
            body: BASE64.encode(&response.body),
            stored_at: Utc::now(),
        };

        serde_json::to_string(&entry)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cache entry: {}", e)))
    }

    fn decode(data: &str) -> Result<Self, DomainError> {
        serde_json::from_str(data)
            .map_err(|e| DomainError::cache(format!("Failed to deserialize cache entry: {}", e)))
    }

    fn into_response(self) -> Result<HttpResponse, DomainError> {
        let body = BASE64
            .decode(&self.body)
            .map_err(|e| DomainError::cache(format!("Invalid cached body: {}", e)))?;

        Ok(HttpResponse {
            status: self.status,
            headers: self.headers,
            body: Bytes::from(body),
        })
    }
}

/// Encodes every entry up front so a batch is written with a single HSET or not at all
fn encode_fields(entries: &[(RequestKey, HttpResponse)]) -> Result<Vec<(String, String)>, DomainError> {
    entries
        .iter()
        .map(|(key, response)| Ok((key.to_string(), RedisEntry::encode(response)?)))
        .collect()
}

/// One named store kept in a Redis hash
#[derive(Clone)]
pub struct RedisCacheStore {
    name: String,
    hash_key: String,
    connection: ConnectionManager,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("name", &self.name)
            .field("hash_key", &self.hash_key)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<HttpResponse>, DomainError> {
        let mut conn = self.connection.clone();

        let data: Option<String> = conn
            .hget(&self.hash_key, key.to_string())
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get '{}': {}", key, e)))?;

        match data {
            Some(data) => Ok(Some(RedisEntry::decode(&data)?.into_response()?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &RequestKey, response: &HttpResponse) -> Result<(), DomainError> {
        let data = RedisEntry::encode(response)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset(&self.hash_key, key.to_string(), data)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to put '{}': {}", key, e)))?;

        Ok(())
    }

    async fn put_all(&self, entries: &[(RequestKey, HttpResponse)]) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let fields = encode_fields(entries)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset_multiple(&self.hash_key, fields.as_slice())
            .await
            .map_err(|e| DomainError::cache(format!("Failed to store {} entries: {}", fields.len(), e)))?;

        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: i64 = conn
            .hdel(&self.hash_key, key.to_string())
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete '{}': {}", key, e)))?;

        Ok(removed > 0)
    }

    async fn entries(&self) -> Result<Vec<CacheEntryMeta>, DomainError> {
        let mut conn = self.connection.clone();

        let raw: HashMap<String, String> = conn
            .hgetall(&self.hash_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to list '{}': {}", self.name, e)))?;

        let mut entries = Vec::with_capacity(raw.len());

        for (key, data) in raw {
            let entry = RedisEntry::decode(&data)?;
            let stored_at = entry.stored_at;
            let response = entry.into_response()?;

            entries.push(CacheEntryMeta {
                key,
                status: response.status,
                size_bytes: response.body.len(),
                stored_at,
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn size(&self) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let len: usize = conn
            .hlen(&self.hash_key)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to count '{}': {}", self.name, e)))?;

        Ok(len)
    }
}

/// Cache storage persisted in Redis, shared across proxy restarts
#[derive(Clone)]
pub struct RedisCacheStorage {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCacheStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStorage")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheStorage {
    /// Connects to Redis
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn store(&self, name: &str) -> RedisCacheStore {
        RedisCacheStore {
            name: name.to_string(),
            hash_key: self.config.store_key(name),
            connection: self.connection.clone(),
        }
    }
}

#[async_trait]
impl CacheStorage for RedisCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, DomainError> {
        let mut conn = self.connection.clone();
        let created_at = Utc::now().timestamp_millis();

        let _: i64 = redis::cmd("ZADD")
            .arg(self.config.index_key())
            .arg("NX")
            .arg(created_at)
            .arg(name)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to open cache '{}': {}", name, e)))?;

        Ok(Arc::new(self.store(name)))
    }

    async fn has(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let score: Option<f64> = conn
            .zscore(self.config.index_key(), name)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to look up cache '{}': {}", name, e)))?;

        Ok(score.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        conn.zrange(self.config.index_key(), 0, -1)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to list caches: {}", e)))
    }

    async fn delete(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: i64 = conn
            .zrem(self.config.index_key(), name)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete cache '{}': {}", name, e)))?;

        let _: i64 = conn
            .del(self.config.store_key(name))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete cache '{}': {}", name, e)))?;

        Ok(removed > 0)
    }
}
