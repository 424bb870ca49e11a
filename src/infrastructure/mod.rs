//! Infrastructure layer - cache backends, network access, worker hosting

pub mod cache;
pub mod logging;
pub mod network;
pub mod observability;
pub mod worker;

pub use cache::{CacheConfig, CacheStorageFactory, CacheType, InMemoryCacheStorage};
pub use network::HttpFetcher;
pub use worker::{InterceptionProxy, WorkerHost, WorkerStatus};
