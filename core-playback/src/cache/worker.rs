//! # Offline Cache Worker
//!
//! Request/response cache with two versioned namespaces and a cache-first
//! interception policy.
//!
//! Lifecycle:
//!
//! 1. [`install`](OfflineCacheWorker::install) opens the general cache and
//!    pre-caches the configured URLs. No traffic is intercepted yet.
//! 2. [`activate`](OfflineCacheWorker::activate) deletes every cache that is
//!    not part of the current generation and starts interception.
//! 3. [`handle_fetch`](OfflineCacheWorker::handle_fetch) serves each request.
//!
//! Audio pushed from the track library arrives as [`WorkerMessage`]s and is
//! stored independently of the lifecycle.

use crate::cache::config::OfflineCacheConfig;
use crate::cache::responses;
use crate::cache::routing::{route, Route};
use crate::error::{PlaybackError, Result};
use bridge_traits::{
    cache::CacheStorage,
    http::{HttpClient, HttpRequest, HttpResponse},
    message::WorkerMessage,
};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Installed,
    Active,
}

/// Result of intercepting a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The worker does not handle this request; the caller goes to the network.
    PassThrough,
    /// Response to hand back, from cache, network, or a synthetic fallback.
    Respond(HttpResponse),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Respond(response) => Some(response),
        }
    }
}

/// Offline cache worker.
pub struct OfflineCacheWorker {
    config: OfflineCacheConfig,
    general_cache: String,
    audio_cache: String,
    storage: Arc<dyn CacheStorage>,
    http_client: Arc<dyn HttpClient>,
    event_bus: Option<Arc<EventBus>>,
    state: RwLock<WorkerState>,
}

impl OfflineCacheWorker {
    /// Create a worker for the configured cache generation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn new(
        config: OfflineCacheConfig,
        storage: Arc<dyn CacheStorage>,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        Ok(Self {
            general_cache: config.general_cache_name(),
            audio_cache: config.audio_cache_name(),
            config,
            storage,
            http_client,
            event_bus: None,
            state: RwLock::new(WorkerState::Idle),
        })
    }

    /// Set event bus for cache events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &OfflineCacheConfig {
        &self.config
    }

    pub fn general_cache_name(&self) -> &str {
        &self.general_cache
    }

    pub fn audio_cache_name(&self) -> &str {
        &self.audio_cache
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Active
    }

    /// Open the general cache and store every pre-cache URL.
    ///
    /// All URLs are fetched before anything is written. A single failed or
    /// non-200 fetch fails the install and leaves the cache untouched.
    #[instrument(skip(self), fields(cache = %self.general_cache))]
    pub async fn install(&self) -> Result<()> {
        info!(urls = self.config.precache_urls.len(), "Installing offline cache");

        self.storage.open(&self.general_cache).await?;

        let mut fetched = Vec::with_capacity(self.config.precache_urls.len());
        for url in &self.config.precache_urls {
            let response = self
                .http_client
                .execute(HttpRequest::get(url.as_str()))
                .await
                .map_err(|e| PlaybackError::PrecacheFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

            if !response.is_ok() {
                return Err(PlaybackError::PrecacheFailed {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            fetched.push((url, response));
        }

        let precached = fetched.len() as u32;
        for (url, response) in fetched {
            self.storage.put(&self.general_cache, url, response).await?;
        }

        *self.state.write() = WorkerState::Installed;
        self.emit(CacheEvent::Installed {
            cache_name: self.general_cache.clone(),
            precached,
        });

        info!(precached, "Offline cache installed");
        Ok(())
    }

    /// Delete every cache outside the current generation and start
    /// intercepting requests. Returns the deleted cache names.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();

        for name in self.storage.keys().await? {
            if name == self.general_cache || name == self.audio_cache {
                continue;
            }
            if self.storage.delete(&name).await? {
                info!(cache = %name, "Deleted old cache");
                deleted.push(name);
            }
        }

        self.storage.open(&self.general_cache).await?;
        self.storage.open(&self.audio_cache).await?;

        *self.state.write() = WorkerState::Active;
        self.emit(CacheEvent::Activated {
            general_cache: self.general_cache.clone(),
            audio_cache: self.audio_cache.clone(),
            deleted: deleted.clone(),
        });

        info!(deleted = deleted.len(), "Offline cache activated");
        Ok(deleted)
    }

    /// Intercept one request.
    ///
    /// Network failures never surface as errors; they become synthetic
    /// responses.
    pub async fn handle_fetch(&self, request: HttpRequest) -> FetchOutcome {
        match route(&request, &self.config.skipped_schemes, self.is_active()) {
            Route::PassThrough => FetchOutcome::PassThrough,
            Route::Audio => FetchOutcome::Respond(self.fetch_audio(request).await),
            Route::General => FetchOutcome::Respond(self.fetch_general(request).await),
        }
    }

    /// Store audio pushed by the track library. Failures are logged only.
    pub async fn handle_message(&self, message: WorkerMessage) {
        match message {
            WorkerMessage::CacheAudio {
                audio_data,
                filename,
            } => {
                let url = self.config.cached_audio_url(&filename);
                let size = audio_data.len() as u64;
                debug!(url = %url, size, "Caching audio from message");

                match self
                    .storage
                    .put(&self.audio_cache, &url, responses::cached_audio(audio_data))
                    .await
                {
                    Ok(()) => {
                        info!(url = %url, size, "Cached audio");
                        self.emit(CacheEvent::AudioCached { url, size });
                    }
                    Err(e) => {
                        error!(url = %url, error = %e, "Failed to cache audio");
                        self.emit(CacheEvent::WriteFailed {
                            url,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Handle messages on a background task until every sender is gone.
    pub fn spawn_message_listener(
        self: Arc<Self>,
        mut receiver: UnboundedReceiver<WorkerMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                self.handle_message(message).await;
            }
            debug!("Message channel closed, listener stopped");
        })
    }

    async fn fetch_audio(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url.clone();

        match self.storage.match_in(&self.audio_cache, &url).await {
            Ok(Some(cached)) => {
                debug!(url = %url, "Serving audio from cache");
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!(url = %url, error = %e, "Audio cache lookup failed"),
        }

        match self.http_client.execute(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store(&self.audio_cache, &url, &response).await;
                }
                response
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Audio fetch failed");
                responses::audio_unavailable()
            }
        }
    }

    async fn fetch_general(&self, request: HttpRequest) -> HttpResponse {
        let url = request.url.clone();

        if let Some(cached) = self.lookup(&url).await {
            debug!(url = %url, "Serving from cache");
            return cached;
        }

        let navigation = request.is_navigation();
        match self.http_client.execute(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store(&self.general_cache, &url, &response).await;
                }
                response
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Fetch failed");
                if navigation {
                    self.offline_document().await
                } else {
                    responses::resource_unavailable()
                }
            }
        }
    }

    async fn offline_document(&self) -> HttpResponse {
        for root in [self.config.scope.as_str(), "./"] {
            if let Some(cached) = self.lookup(root).await {
                return cached;
            }
        }
        responses::offline_page()
    }

    async fn lookup(&self, url: &str) -> Option<HttpResponse> {
        match self.storage.match_any(url).await {
            Ok(found) => found,
            Err(e) => {
                warn!(url = %url, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    async fn store(&self, cache_name: &str, url: &str, response: &HttpResponse) {
        if let Err(e) = self.storage.put(cache_name, url, response.clone()).await {
            warn!(cache = cache_name, url = %url, error = %e, "Failed to store response");
            self.emit(CacheEvent::WriteFailed {
                url: url.to_string(),
                message: e.to_string(),
            });
        } else {
            debug!(cache = cache_name, url = %url, "Stored response");
        }
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is not an error.
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }
}
