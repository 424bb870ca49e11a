//! Cache storage factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use crate::domain::cache::CacheStorage;
use crate::domain::DomainError;

use super::in_memory::InMemoryCacheStorage;
use super::redis::{RedisCacheConfig, RedisCacheStorage};

/// Supported cache storage backends
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheType {
    /// Process-local storage using moka
    #[default]
    InMemory,
    /// Redis storage, persistent across restarts
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the cache storage factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_type: CacheType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing (Redis only)
    pub key_prefix: Option<String>,
    pub connection_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    pub fn in_memory() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            ..Default::default()
        }
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            cache_type: CacheType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Factory for creating cache storage instances
#[derive(Debug, Default)]
pub struct CacheStorageFactory;

impl CacheStorageFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates cache storage based on configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn CacheStorage>, DomainError> {
        match config.cache_type {
            CacheType::InMemory => Ok(self.create_in_memory()),
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config =
                    RedisCacheConfig::new(url).with_connection_timeout(config.connection_timeout);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let storage = RedisCacheStorage::new(redis_config).await?;
                Ok(Arc::new(storage))
            }
        }
    }

    pub fn create_in_memory(&self) -> Arc<dyn CacheStorage> {
        Arc::new(InMemoryCacheStorage::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("in_memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("REDIS".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert!("memcached".parse::<CacheType>().is_err());
    }

    #[test]
    fn test_cache_type_display() {
        assert_eq!(CacheType::InMemory.to_string(), "in_memory");
        assert_eq!(CacheType::Redis.to_string(), "redis");
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::redis("redis://cache:6379").with_key_prefix("irrigo");

        assert_eq!(config.cache_type, CacheType::Redis);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.key_prefix.as_deref(), Some("irrigo"));
        assert_eq!(CacheConfig::in_memory().cache_type, CacheType::InMemory);
    }

    #[tokio::test]
    async fn test_create_in_memory() {
        let storage = CacheStorageFactory::new()
            .create(&CacheConfig::in_memory())
            .await
            .unwrap();

        storage.open("irrigo-v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["irrigo-v1"]);
    }

    #[tokio::test]
    async fn test_redis_requires_url() {
        let config = CacheConfig {
            cache_type: CacheType::Redis,
            ..Default::default()
        };

        let result = CacheStorageFactory::new().create(&config).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
