//! The interception proxy: pre-caching on install, cache purging on activate,
//! network-first or cache-first serving on fetch

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::domain::{
    ActivateEvent, CacheStorage, DomainError, FetchEvent, FetchResponse, Fetcher, HttpResponse,
    InstallEvent, ProxyRequest, RequestKey, RoutePolicy, ServiceWorker, WorkerManifest,
};
use crate::infrastructure::observability::{
    record_cache_write, record_network_failure, record_proxy_response,
};

/// Caching worker for the irrigation app
#[derive(Debug, Clone)]
pub struct InterceptionProxy {
    manifest: WorkerManifest,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
}

impl InterceptionProxy {
    pub fn new(
        manifest: WorkerManifest,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            manifest,
            storage,
            fetcher,
        }
    }

    /// Looks up a request in the current store without creating it
    async fn match_current(&self, key: &RequestKey) -> Result<Option<HttpResponse>, DomainError> {
        if !key.is_cacheable() {
            return Ok(None);
        }

        match self.storage.open_existing(self.manifest.cache_name()).await? {
            Some(store) => store.match_request(key).await,
            None => Ok(None),
        }
    }

    async fn fetch_asset(&self, asset: &str) -> Result<(RequestKey, HttpResponse), DomainError> {
        let request = ProxyRequest::get(asset);

        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| DomainError::install(format!("GET {} failed: {}", asset, e)))?;

        if !response.is_ok() {
            return Err(DomainError::install(format!(
                "GET {} returned status {}",
                asset, response.status
            )));
        }

        Ok((request.key(), response))
    }

    async fn network_first(&self, request: &ProxyRequest) -> Result<FetchResponse, DomainError> {
        let error = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(FetchResponse::network(response)),
            Err(e) => e,
        };

        record_network_failure(RoutePolicy::NetworkFirst);
        warn!(url = %request.url, error = %error, "Network failed, falling back to cache");

        match self.match_current(&request.key()).await? {
            Some(cached) => {
                debug!(url = %request.url, "Serving API response from cache");
                Ok(FetchResponse::cache(cached))
            }
            None => Err(error),
        }
    }

    async fn cache_first(
        &self,
        event: &mut FetchEvent,
        request: &ProxyRequest,
    ) -> Result<FetchResponse, DomainError> {
        let key = request.key();

        if let Some(cached) = self.match_current(&key).await? {
            debug!(key = %key, "Cache hit");
            return Ok(FetchResponse::cache(cached));
        }

        debug!(key = %key, "Cache miss");

        let response = self
            .fetcher
            .fetch(request)
            .await
            .inspect_err(|_| record_network_failure(RoutePolicy::CacheFirst))?;

        if !key.is_cacheable() || !response.is_storable() {
            return Ok(FetchResponse::network(response));
        }

        let (response, copy) = response.tee();
        let storage = self.storage.clone();
        let cache_name = self.manifest.cache_name().to_string();

        event.wait_until(async move {
            match store_response(storage.as_ref(), &cache_name, &key, &copy).await {
                Ok(()) => {
                    record_cache_write(true);
                    debug!(key = %key, cache = %cache_name, "Stored response");
                }
                Err(e) => {
                    record_cache_write(false);
                    warn!(key = %key, error = %e, "Failed to store response");
                }
            }
        });

        Ok(FetchResponse::network(response))
    }
}

async fn store_response(
    storage: &dyn CacheStorage,
    cache_name: &str,
    key: &RequestKey,
    response: &HttpResponse,
) -> Result<(), DomainError> {
    storage.open(cache_name).await?.put(key, response).await
}

#[async_trait]
impl ServiceWorker for InterceptionProxy {
    fn cache_name(&self) -> &str {
        self.manifest.cache_name()
    }

    async fn on_install(&self, event: &mut InstallEvent) -> Result<(), DomainError> {
        let store = self.storage.open(self.manifest.cache_name()).await?;

        // All assets are fetched before anything is written, so a failure
        // leaves the store untouched
        let fetched =
            try_join_all(self.manifest.static_assets().map(|a| self.fetch_asset(a))).await?;

        store.put_all(&fetched).await?;

        info!(
            cache = %self.manifest.cache_name(),
            assets = fetched.len(),
            "Static assets cached"
        );

        event.skip_waiting();
        Ok(())
    }

    async fn on_activate(&self, event: &mut ActivateEvent) -> Result<(), DomainError> {
        let current = self.manifest.cache_name();
        let names = self.storage.keys().await?;

        let stale: Vec<&String> = names.iter().filter(|name| *name != current).collect();

        try_join_all(stale.iter().map(|name| self.storage.delete(name))).await?;

        for name in &stale {
            info!(cache = %name, "Deleted superseded cache");
        }

        event.claim_clients();
        Ok(())
    }

    async fn on_fetch(&self, event: &mut FetchEvent) -> Result<FetchResponse, DomainError> {
        let request = event.request().clone();
        let policy = self.manifest.classify(request.path());

        let result = match policy {
            RoutePolicy::NetworkFirst => self.network_first(&request).await,
            RoutePolicy::CacheFirst => self.cache_first(event, &request).await,
        };

        if let Ok(response) = &result {
            record_proxy_response(policy, response.source);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{MockCacheStorage, MockCacheStore};
    use crate::domain::fetch::mock::MockFetcher;
    use crate::domain::{ResponseSource, STATIC_ASSETS};

    fn online_fetcher() -> MockFetcher {
        STATIC_ASSETS
            .iter()
            .fold(MockFetcher::new(), |fetcher, asset| {
                fetcher.with_response(*asset, HttpResponse::new(200, format!("asset {}", asset)))
            })
            .with_response("/status", HttpResponse::new(200, r#"{"pump_1":"on"}"#))
            .with_response("/start/pump1", HttpResponse::new(200, r#"{"status":"on"}"#))
            .with_response("/statuses", HttpResponse::new(200, "not an api route"))
    }

    fn proxy(storage: &Arc<MockCacheStorage>, fetcher: &Arc<MockFetcher>) -> InterceptionProxy {
        InterceptionProxy::new(WorkerManifest::default(), storage.clone(), fetcher.clone())
    }

    fn current_store(storage: &MockCacheStorage) -> Arc<MockCacheStore> {
        storage.store("irrigo-v1")
    }

    async fn fetch(proxy: &InterceptionProxy, request: ProxyRequest) -> Result<FetchResponse, DomainError> {
        let mut event = FetchEvent::new(request);
        let result = proxy.on_fetch(&mut event).await;
        event.settled().await;
        result
    }

    #[tokio::test]
    async fn test_install_caches_every_static_asset() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let mut event = InstallEvent::new();
        proxy.on_install(&mut event).await.unwrap();

        assert!(event.skip_waiting_requested());
        assert_eq!(fetcher.calls(), STATIC_ASSETS.len());

        for asset in STATIC_ASSETS {
            let response = fetch(&proxy, ProxyRequest::get(*asset)).await.unwrap();
            assert_eq!(response.source, ResponseSource::Cache, "{}", asset);
            assert_eq!(response.response.body, format!("asset {}", asset));
        }

        assert_eq!(fetcher.calls(), STATIC_ASSETS.len());
    }

    #[tokio::test]
    async fn test_install_fails_when_an_asset_is_unreachable() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(online_fetcher().with_error("/styles.css", "connection reset"));
        let proxy = proxy(&storage, &fetcher);

        let mut event = InstallEvent::new();
        let err = proxy.on_install(&mut event).await.unwrap_err();

        assert!(matches!(err, DomainError::Install { .. }));
        assert!(err.to_string().contains("/styles.css"));
        assert!(!event.skip_waiting_requested());
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_install_fails_on_error_status() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(
            online_fetcher().with_response("/manifest.json", HttpResponse::new(404, "Not Found")),
        );
        let proxy = proxy(&storage, &fetcher);

        let err = proxy.on_install(&mut InstallEvent::new()).await.unwrap_err();

        assert!(err.to_string().contains("404"));
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_activate_deletes_superseded_caches() {
        let storage = Arc::new(
            MockCacheStorage::new()
                .with_store("irrigo-v0")
                .with_store("irrigo-v1"),
        );
        let fetcher = Arc::new(MockFetcher::new());
        let proxy = proxy(&storage, &fetcher);

        let mut event = ActivateEvent::new();
        proxy.on_activate(&mut event).await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["irrigo-v1"]);
        assert!(event.claim_requested());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_activate_without_current_cache_deletes_everything_else() {
        let storage = Arc::new(
            MockCacheStorage::new()
                .with_store("irrigo-v0")
                .with_store("other-app"),
        );
        let proxy = proxy(&storage, &Arc::new(MockFetcher::new()));

        proxy.on_activate(&mut ActivateEvent::new()).await.unwrap();

        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_propagates_cache_errors() {
        let storage = Arc::new(MockCacheStorage::new().with_error("redis down"));
        let proxy = proxy(&storage, &Arc::new(MockFetcher::new()));

        let mut event = ActivateEvent::new();
        let err = proxy.on_activate(&mut event).await.unwrap_err();

        assert!(matches!(err, DomainError::Cache { .. }));
        assert!(!event.claim_requested());
    }

    #[tokio::test]
    async fn test_root_before_install_is_fetched_and_stored() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let response = fetch(&proxy, ProxyRequest::get("/")).await.unwrap();

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.response.body, "asset /");
        assert_eq!(fetcher.calls(), 1);

        let store = current_store(&storage);
        assert_eq!(store.puts(), 1);
        let stored = store.get(&RequestKey::get("/")).unwrap();
        assert_eq!(stored.body, "asset /");
    }

    #[tokio::test]
    async fn test_cache_hit_returns_stored_bytes_without_network() {
        let cached = HttpResponse::new(200, vec![0u8, 1, 2, 255])
            .with_header("content-type", "image/svg+xml");
        let storage = Arc::new(MockCacheStorage::new().with_entry(
            "irrigo-v1",
            RequestKey::get("/assets/images/water-drop.svg"),
            cached.clone(),
        ));
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let response = fetch(&proxy, ProxyRequest::get("/assets/images/water-drop.svg"))
            .await
            .unwrap();

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.response, cached);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_once_and_writes_once() {
        let storage = Arc::new(MockCacheStorage::new().with_store("irrigo-v1"));
        let fetcher = Arc::new(
            MockFetcher::new().with_response("/favicon.ico", HttpResponse::new(200, "icon")),
        );
        let proxy = proxy(&storage, &fetcher);

        fetch(&proxy, ProxyRequest::get("/favicon.ico")).await.unwrap();
        let second = fetch(&proxy, ProxyRequest::get("/favicon.ico")).await.unwrap();

        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(current_store(&storage).puts(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_network_failure_propagates() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(MockFetcher::new().offline());
        let proxy = proxy(&storage, &fetcher);

        let err = fetch(&proxy, ProxyRequest::get("/index.html")).await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_status_offline_serves_cached_response() {
        let cached = HttpResponse::new(200, r#"{"pump_1":"off","pump_2":"off"}"#);
        let storage = Arc::new(MockCacheStorage::new().with_entry(
            "irrigo-v1",
            RequestKey::get("/status"),
            cached.clone(),
        ));
        let fetcher = Arc::new(MockFetcher::new().offline());
        let proxy = proxy(&storage, &fetcher);

        let response = fetch(&proxy, ProxyRequest::get("/status")).await.unwrap();

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.response, cached);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(current_store(&storage).lookups(), 1);
    }

    #[tokio::test]
    async fn test_api_offline_without_cache_fails() {
        let storage = Arc::new(MockCacheStorage::new().with_store("irrigo-v1"));
        let fetcher = Arc::new(MockFetcher::new().offline());
        let proxy = proxy(&storage, &fetcher);

        let err = fetch(&proxy, ProxyRequest::get("/pumps")).await.unwrap_err();

        assert!(err.is_network());
        assert_eq!(current_store(&storage).lookups(), 1);
    }

    #[tokio::test]
    async fn test_api_online_never_touches_cache() {
        let storage = Arc::new(MockCacheStorage::new().with_entry(
            "irrigo-v1",
            RequestKey::get("/status"),
            HttpResponse::new(200, "stale"),
        ));
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let response = fetch(&proxy, ProxyRequest::get("/status")).await.unwrap();

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.response.body, r#"{"pump_1":"on"}"#);
        assert_eq!(current_store(&storage).lookups(), 0);
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_api_sub_path_is_network_first() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let mut event = FetchEvent::new(ProxyRequest::get("/start/pump1"));
        let response = proxy.on_fetch(&mut event).await.unwrap();

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.response.body, r#"{"status":"on"}"#);
        assert_eq!(event.pending(), 0);
        assert!(!storage.has("irrigo-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_api_error_status_is_returned_not_masked() {
        let storage = Arc::new(MockCacheStorage::new().with_entry(
            "irrigo-v1",
            RequestKey::get("/mode"),
            HttpResponse::new(200, "cached"),
        ));
        let fetcher = Arc::new(
            MockFetcher::new().with_response("/mode", HttpResponse::new(500, "GPIO error")),
        );
        let proxy = proxy(&storage, &fetcher);

        let response = fetch(&proxy, ProxyRequest::get("/mode")).await.unwrap();

        assert_eq!(response.response.status, 500);
        assert_eq!(response.source, ResponseSource::Network);
    }

    #[tokio::test]
    async fn test_lookalike_path_is_cache_first() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        fetch(&proxy, ProxyRequest::get("/statuses")).await.unwrap();

        assert!(current_store(&storage).get(&RequestKey::get("/statuses")).is_some());
    }

    #[tokio::test]
    async fn test_non_get_requests_are_never_cached() {
        let storage = Arc::new(MockCacheStorage::new().with_store("irrigo-v1"));
        let fetcher = Arc::new(
            MockFetcher::new().with_response("/irrigation", HttpResponse::new(200, "on")),
        );
        let proxy = proxy(&storage, &fetcher);

        let request = ProxyRequest::new("POST", "/irrigation").with_body(r#"{"id":0}"#);
        fetch(&proxy, request.clone()).await.unwrap();
        fetch(&proxy, request).await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(current_store(&storage).lookups(), 0);
        assert_eq!(current_store(&storage).puts(), 0);
    }

    #[tokio::test]
    async fn test_partial_content_is_not_stored() {
        let storage = Arc::new(MockCacheStorage::new());
        let fetcher = Arc::new(
            MockFetcher::new().with_response("/video.mp4", HttpResponse::new(206, "part")),
        );
        let proxy = proxy(&storage, &fetcher);

        let mut event = FetchEvent::new(ProxyRequest::get("/video.mp4"));
        let response = proxy.on_fetch(&mut event).await.unwrap();

        assert_eq!(response.response.status, 206);
        assert_eq!(event.pending(), 0);
    }

    #[tokio::test]
    async fn test_cache_lookup_failure_propagates() {
        let storage = Arc::new(MockCacheStorage::new().with_error("redis down"));
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let err = fetch(&proxy, ProxyRequest::get("/")).await.unwrap_err();

        assert!(matches!(err, DomainError::Cache { .. }));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_background_write_failure_does_not_fail_response() {
        let storage = Arc::new(MockCacheStorage::new().with_store("irrigo-v1"));
        let fetcher = Arc::new(online_fetcher());
        let proxy = proxy(&storage, &fetcher);

        let mut event = FetchEvent::new(ProxyRequest::get("/index.html"));
        let response = proxy.on_fetch(&mut event).await.unwrap();

        // The write has been spawned but not yet polled on this runtime
        storage.set_error("disk full");
        event.settled().await;

        assert_eq!(response.response.body, "asset /index.html");
        assert_eq!(current_store(&storage).puts(), 0);
    }
}
