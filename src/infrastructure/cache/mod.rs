//! Cache infrastructure - Cache storage implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheConfig, CacheStorageFactory, CacheType};
pub use in_memory::{InMemoryCacheConfig, InMemoryCacheStorage, InMemoryCacheStore};
pub use redis::{RedisCacheConfig, RedisCacheStorage, RedisCacheStore};
