//! Cache domain - named, versioned request/response stores

mod key;
mod repository;

pub use key::RequestKey;
pub use repository::{CacheEntryMeta, CacheStorage, CacheStore};

#[cfg(test)]
pub use repository::mock::{MockCacheStorage, MockCacheStore};
