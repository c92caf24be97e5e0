//! In-process response cache storage

use async_trait::async_trait;
use bridge_traits::{cache::CacheStorage, error::Result, http::HttpResponse};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

struct NamedCache {
    name: String,
    entries: HashMap<String, HttpResponse>,
}

/// `CacheStorage` backed by memory.
///
/// Caches are kept in creation order so `match_any` resolves the same way the
/// browser API does. Contents live as long as the process.
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<Vec<NamedCache>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, cache_name: &str) -> Result<()> {
        let mut caches = self.caches.write().await;
        if !caches.iter().any(|c| c.name == cache_name) {
            debug!(cache = cache_name, "Creating cache");
            caches.push(NamedCache {
                name: cache_name.to_string(),
                entries: HashMap::new(),
            });
        }
        Ok(())
    }

    async fn has(&self, cache_name: &str) -> Result<bool> {
        let caches = self.caches.read().await;
        Ok(caches.iter().any(|c| c.name == cache_name))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches.iter().map(|c| c.name.clone()).collect())
    }

    async fn delete(&self, cache_name: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|c| c.name != cache_name);
        Ok(caches.len() != before)
    }

    async fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<HttpResponse>> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|c| c.name == cache_name)
            .and_then(|c| c.entries.get(url).cloned()))
    }

    async fn match_any(&self, url: &str) -> Result<Option<HttpResponse>> {
        let caches = self.caches.read().await;
        Ok(caches.iter().find_map(|c| c.entries.get(url).cloned()))
    }

    async fn put(&self, cache_name: &str, url: &str, response: HttpResponse) -> Result<()> {
        let mut caches = self.caches.write().await;
        match caches.iter_mut().find(|c| c.name == cache_name) {
            Some(cache) => {
                cache.entries.insert(url.to_string(), response);
            }
            None => {
                let mut entries = HashMap::new();
                entries.insert(url.to_string(), response);
                caches.push(NamedCache {
                    name: cache_name.to_string(),
                    entries,
                });
            }
        }
        Ok(())
    }

    async fn entries(&self, cache_name: &str) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|c| c.name == cache_name)
            .map(|c| c.entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}
