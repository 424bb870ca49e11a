//! Fallback handler feeding every non-admin request through the worker host

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::Response,
};
use tracing::debug;

use super::state::AppState;
use super::types::ApiError;
use crate::domain::{FetchResponse, ProxyRequest};

/// Header naming where a worker-served response came from
pub const SOURCE_HEADER: &str = "x-irrigo-source";

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let request = into_proxy_request(request).await?;
    debug!(method = %request.method, url = %request.url, "Dispatching to worker host");

    let served = state.host.dispatch(request).await?;
    into_response(served)
}

async fn into_proxy_request(request: Request<Body>) -> Result<ProxyRequest, ApiError> {
    let (parts, body) = request.into_parts();

    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?;

    let mut proxy_request = ProxyRequest::new(parts.method.as_str(), url).with_body(body);

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            proxy_request = proxy_request.with_header(name.as_str(), value);
        }
    }

    Ok(proxy_request)
}

fn into_response(served: FetchResponse) -> Result<Response, ApiError> {
    let status = StatusCode::from_u16(served.response.status).map_err(|_| {
        ApiError::bad_gateway(format!("Invalid upstream status {}", served.response.status))
    })?;

    let mut response = Response::new(Body::from(served.response.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &served.response.headers {
        // Unrepresentable headers are dropped rather than failing the response
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    headers.insert(
        HeaderName::from_static(SOURCE_HEADER),
        HeaderValue::from_static(served.source.as_str()),
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HttpResponse;

    #[tokio::test]
    async fn test_into_proxy_request_keeps_query_headers_and_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/schedule?zone=2")
            .header("content-type", "application/json")
            .body(Body::from("{\"at\":\"06:00\"}"))
            .unwrap();

        let proxy_request = into_proxy_request(request).await.unwrap();

        assert_eq!(proxy_request.method, "POST");
        assert_eq!(proxy_request.url, "/schedule?zone=2");
        assert_eq!(proxy_request.path(), "/schedule");
        assert_eq!(proxy_request.body, "{\"at\":\"06:00\"}");
        assert!(proxy_request
            .headers
            .iter()
            .any(|(n, v)| n == "content-type" && v == "application/json"));
    }

    #[test]
    fn test_into_response_copies_status_headers_and_tags_source() {
        let served = FetchResponse::cache(
            HttpResponse::new(200, "<html></html>").with_header("Content-Type", "text/html"),
        );

        let response = into_response(served).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/html");
        assert_eq!(response.headers()[SOURCE_HEADER], "cache");
    }

    #[test]
    fn test_into_response_rejects_invalid_status() {
        let served = FetchResponse::network(HttpResponse::new(1000, ""));

        let err = into_response(served).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }
}
