//! Cache key: the identity of a request inside a cache store

use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// Method plus URL
///
/// The URL is the path and query relative to the upstream origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    method: String,
    url: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Only GET requests may be matched against or written to a cache store
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl FromStr for RequestKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(' ') {
            Some((method, url)) if !method.is_empty() && url.starts_with('/') => {
                Ok(Self::new(method, url))
            }
            _ => Err(DomainError::validation(format!(
                "Invalid request key: '{}'",
                s
            ))),
        }
    }
}
