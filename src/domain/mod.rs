//! Domain layer - Core proxy policy, entities and seams

pub mod cache;
pub mod error;
pub mod fetch;
pub mod http;
pub mod manifest;
pub mod worker;

pub use cache::{CacheEntryMeta, CacheStorage, CacheStore, RequestKey};
pub use error::DomainError;
pub use fetch::Fetcher;
pub use http::{HttpResponse, ProxyRequest};
pub use manifest::{RoutePolicy, WorkerManifest, API_ROUTES, CACHE_NAME, STATIC_ASSETS};
pub use worker::{
    ActivateEvent, FetchEvent, FetchResponse, InstallEvent, ResponseSource, ServiceWorker,
    WorkerState,
};
