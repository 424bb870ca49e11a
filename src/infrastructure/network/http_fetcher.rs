use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::domain::{DomainError, Fetcher, HttpResponse, ProxyRequest};

/// Headers that describe a single connection and are never forwarded
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_forwardable_request_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name != "host" && name != "content-length" && !HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

fn is_forwardable_response_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name != "content-length" && !HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Real network fetcher using reqwest, forwarding to the upstream origin
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DomainError> {
        Self::build(base_url, reqwest::Client::builder())
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        Self::build(base_url, reqwest::Client::builder().timeout(timeout))
    }

    /// Redirects are returned to the caller as-is, never followed
    fn build(
        base_url: impl Into<String>,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, DomainError> {
        let client = builder
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn target_url(&self, request: &ProxyRequest) -> String {
        format!("{}{}", self.base_url, request.url)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> Result<HttpResponse, DomainError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            DomainError::validation(format!("Invalid method '{}': {}", request.method, e))
        })?;
        let url = self.target_url(request);

        debug!(method = %method, url = %url, "Fetching from upstream");

        let mut builder = self.client.request(method, &url);

        for (name, value) in &request.headers {
            if is_forwardable_request_header(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| is_forwardable_response_header(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::network(format!("Failed to read body from {}: {}", url, e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
