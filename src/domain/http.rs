//! Request and response values exchanged between the host, the worker and the network

use bytes::Bytes;

use super::cache::RequestKey;

/// A request intercepted from a client
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: String,
    /// Path and query, always starting with '/'
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The URL path without its query string
    pub fn path(&self) -> &str {
        match self.url.split_once('?') {
            Some((path, _)) => path,
            None => &self.url,
        }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), self.url.clone())
    }
}

/// A fully buffered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 200-299 range
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Partial content cannot be stored in a cache store
    pub fn is_storable(&self) -> bool {
        self.status != 206
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Splits the response into two independent copies: one for the caller,
    /// one for the cache. The body buffer is shared, not copied.
    pub fn tee(self) -> (Self, Self) {
        let copy = Self {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        };
        (self, copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_strips_query() {
        let request = ProxyRequest::get("/status?pump=1");
        assert_eq!(request.path(), "/status");
        assert_eq!(request.key().url(), "/status?pump=1");
    }

    #[test]
    fn test_request_method_uppercased() {
        let request = ProxyRequest::new("post", "/irrigation/stop");
        assert_eq!(request.method, "POST");
        assert_eq!(request.key().to_string(), "POST /irrigation/stop");
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(HttpResponse::new(200, "ok").is_ok());
        assert!(HttpResponse::new(204, "").is_ok());
        assert!(!HttpResponse::new(404, "").is_ok());
        assert!(!HttpResponse::new(206, "").is_storable());
        assert!(HttpResponse::new(500, "").is_storable());
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "").with_header("Content-Type", "text/css");
        assert_eq!(response.header("content-type"), Some("text/css"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_tee_produces_independent_copies() {
        let response = HttpResponse::new(200, "body").with_header("content-type", "text/plain");
        let (first, mut second) = response.tee();

        second.headers.push(("x-extra".to_string(), "1".to_string()));

        assert_eq!(first.body, Bytes::from_static(b"body"));
        assert_eq!(second.body, Bytes::from_static(b"body"));
        assert_eq!(first.headers.len(), 1);
        assert_eq!(second.headers.len(), 2);
    }
}
