//! Request/Response Cache Abstraction
//!
//! Models the platform's named response caches: a set of caches addressed by
//! name, each mapping a request URL to one captured [`HttpResponse`].
//!
//! - Browser: the `CacheStorage` API
//! - Desktop: an in-process map (see `bridge-desktop`)
//!
//! Semantics every implementation must keep:
//! - `open` creates the named cache when it does not exist yet
//! - `put` replaces any previous entry for the same URL (last writer wins)
//! - `match_any` searches caches in creation order and returns the first hit
//! - entries never expire on their own; only `delete` removes them

use async_trait::async_trait;

use crate::error::Result;
use crate::http::HttpResponse;

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (creating if absent) the cache with the given name.
    async fn open(&self, cache_name: &str) -> Result<()>;

    /// Check whether a cache with the given name exists.
    async fn has(&self, cache_name: &str) -> Result<bool>;

    /// Names of all existing caches, in creation order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete a cache and every entry in it.
    ///
    /// Returns `Ok(false)` if no such cache existed.
    async fn delete(&self, cache_name: &str) -> Result<bool>;

    /// Look up a URL in one named cache.
    async fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<HttpResponse>>;

    /// Look up a URL across every cache.
    async fn match_any(&self, url: &str) -> Result<Option<HttpResponse>>;

    /// Store a response under a URL, creating the cache if needed.
    async fn put(&self, cache_name: &str, url: &str, response: HttpResponse) -> Result<()>;

    /// URLs stored in the named cache. Empty if the cache does not exist.
    async fn entries(&self, cache_name: &str) -> Result<Vec<String>>;
}
