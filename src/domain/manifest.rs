//! Build-time constants of the proxy: cache version, pre-cached assets and API routes

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Name of the current cache store. Bump whenever `STATIC_ASSETS` changes.
pub const CACHE_NAME: &str = "irrigo-v1";

/// Assets fetched and stored during install, in order
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/assets/images/water-drop.svg",
    "/assets/images/car-plant.svg",
    "/manifest.json",
];

/// Path prefixes served network-first
pub const API_ROUTES: &[&str] = &["/pumps", "/mode", "/status", "/start", "/stop", "/schedule"];

/// How a request is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Live fetch, cache lookup only when the network fails
    NetworkFirst,
    /// Cache lookup, live fetch and store on miss
    CacheFirst,
}

impl RoutePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePolicy::NetworkFirst => "network_first",
            RoutePolicy::CacheFirst => "cache_first",
        }
    }
}

impl fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one worker version
#[derive(Debug, Clone)]
pub struct WorkerManifest {
    cache_name: Cow<'static, str>,
    static_assets: Vec<Cow<'static, str>>,
    api_routes: Vec<Cow<'static, str>>,
}

impl Default for WorkerManifest {
    fn default() -> Self {
        Self {
            cache_name: Cow::Borrowed(CACHE_NAME),
            static_assets: STATIC_ASSETS.iter().map(|a| Cow::Borrowed(*a)).collect(),
            api_routes: API_ROUTES.iter().map(|r| Cow::Borrowed(*r)).collect(),
        }
    }
}

impl WorkerManifest {
    pub fn new<A, R>(cache_name: impl Into<String>, static_assets: A, api_routes: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            cache_name: Cow::Owned(cache_name.into()),
            static_assets: static_assets
                .into_iter()
                .map(|a| Cow::Owned(a.into()))
                .collect(),
            api_routes: api_routes.into_iter().map(|r| Cow::Owned(r.into())).collect(),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn static_assets(&self) -> impl Iterator<Item = &str> {
        self.static_assets.iter().map(|a| a.as_ref())
    }

    pub fn api_routes(&self) -> impl Iterator<Item = &str> {
        self.api_routes.iter().map(|r| r.as_ref())
    }

    /// A path is an API route when it equals a route or continues it after a '/'.
    /// `/statuses` is therefore not `/status`.
    pub fn is_api_route(&self, path: &str) -> bool {
        self.api_routes().any(|route| {
            path == route
                || path
                    .strip_prefix(route)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn classify(&self, path: &str) -> RoutePolicy {
        if self.is_api_route(path) {
            RoutePolicy::NetworkFirst
        } else {
            RoutePolicy::CacheFirst
        }
    }
}
