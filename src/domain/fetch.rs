//! Network fetch abstraction

use async_trait::async_trait;

use super::http::{HttpResponse, ProxyRequest};
use super::DomainError;

/// Performs a live network request
///
/// Any HTTP status is a successful fetch. Only transport failures
/// (unreachable upstream, timeout, broken connection) are errors, and those
/// are reported as `DomainError::Network`.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, request: &ProxyRequest) -> Result<HttpResponse, DomainError>;
}
