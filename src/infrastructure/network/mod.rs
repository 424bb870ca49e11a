//! Network infrastructure - live fetches against the upstream API

mod http_fetcher;

pub use http_fetcher::HttpFetcher;
