//! Worker domain - lifecycle handlers invoked by the host

mod event;
mod lifecycle;

pub use event::{ActivateEvent, FetchEvent, InstallEvent};
pub use lifecycle::WorkerState;

use async_trait::async_trait;

use super::http::HttpResponse;
use super::DomainError;

/// Where a worker-served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
        }
    }
}

/// A response produced by `on_fetch`
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub response: HttpResponse,
    pub source: ResponseSource,
}

impl FetchResponse {
    pub fn network(response: HttpResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    pub fn cache(response: HttpResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
        }
    }
}

/// The three lifecycle handlers of a worker
///
/// The host awaits each handler before moving the lifecycle forward, so a
/// handler's future resolving is its completion signal.
#[async_trait]
pub trait ServiceWorker: Send + Sync + std::fmt::Debug {
    /// Name of the cache version this worker installs into
    fn cache_name(&self) -> &str;

    /// Prepares the worker's resources. An error aborts installation.
    async fn on_install(&self, event: &mut InstallEvent) -> Result<(), DomainError>;

    /// Cleans up after previous versions before the worker takes over
    async fn on_activate(&self, event: &mut ActivateEvent) -> Result<(), DomainError>;

    /// Serves an intercepted request
    async fn on_fetch(&self, event: &mut FetchEvent) -> Result<FetchResponse, DomainError>;
}
