//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, response
//! cache storage, playable URLs, media probing) into the track library and
//! the offline cache worker. Desktop apps typically enable the
//! `desktop-shims` feature so that any bridge left unset falls back to the
//! `bridge-desktop` implementation.
//!
//! ```rust,ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::builder().database_path("musicist.db").build()?;
//! let core = CoreService::bootstrap(config).await?;
//! let report = core.add_tracks(uploads).await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_desktop::ChannelMessagePort;
use bridge_traits::http::HttpRequest;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{
    AudioUpload, PlayableTrack, SqliteTrackRepository, StorageUsage, TrackRepository,
};
use core_playback::cache::{FetchOutcome, OfflineCacheConfig, OfflineCacheWorker};
use core_runtime::config::{CoreConfig, DatabaseLocation};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use core_runtime::logging::strip_path;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// An upload from a batch that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub file_name: String,
    pub message: String,
}

/// Outcome of [`CoreService::add_tracks`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAddReport {
    pub added: Vec<PlayableTrack>,
    pub failed: Vec<FailedUpload>,
    /// Files that were not audio and were never attempted.
    pub skipped: Vec<String>,
}

impl BatchAddReport {
    /// Every attempted upload failed. Skipped non-audio files are not
    /// attempts.
    pub fn is_failure(&self) -> bool {
        self.added.is_empty() && !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.failed.len() + self.skipped.len()
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    repository: Arc<dyn TrackRepository>,
    offline_cache: Arc<OfflineCacheWorker>,
    event_bus: Arc<EventBus>,
}

impl CoreService {
    /// Open storage, install and activate the offline cache, and start the
    /// worker's message listener.
    ///
    /// This is the only place an unusable storage environment is reported.
    ///
    /// # Errors
    ///
    /// - `Library(UnsupportedEnvironment)` if the database cannot be opened
    /// - `Playback` if the offline cache cannot be installed or activated
    /// - `InitializationFailed` when called outside a Tokio runtime
    #[instrument(skip(config), fields(cache_version = %config.cache_version))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "bootstrap requires a Tokio runtime".to_string(),
            ));
        }
        config.validate()?;

        let database = match &config.database {
            DatabaseLocation::File(path) => DatabaseConfig::new(path.clone()),
            DatabaseLocation::InMemory => DatabaseConfig::in_memory(),
        };
        let pool = create_pool(database).await?;

        let event_bus = Arc::new(EventBus::new(DEFAULT_EVENT_BUFFER_SIZE));

        let offline_cache = Arc::new(
            OfflineCacheWorker::new(
                OfflineCacheConfig::from_core(&config),
                Arc::clone(&config.cache_storage),
                Arc::clone(&config.http_client),
            )?
            .with_event_bus(Arc::clone(&event_bus)),
        );
        offline_cache.install().await?;
        offline_cache.activate().await?;

        let (port, receiver) = ChannelMessagePort::new();
        Arc::clone(&offline_cache).spawn_message_listener(receiver);

        let repository = SqliteTrackRepository::new(
            pool,
            Arc::clone(&config.object_urls),
            Arc::clone(&config.media_probe),
        )
        .with_message_port(Arc::new(port))
        .with_probe_timeout(config.duration_probe_timeout);

        info!(
            general_cache = offline_cache.general_cache_name(),
            audio_cache = offline_cache.audio_cache_name(),
            "Core service ready"
        );

        Ok(Self {
            config: Arc::new(config),
            repository: Arc::new(repository),
            offline_cache,
            event_bus,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn repository(&self) -> Arc<dyn TrackRepository> {
        Arc::clone(&self.repository)
    }

    pub fn offline_cache(&self) -> Arc<OfflineCacheWorker> {
        Arc::clone(&self.offline_cache)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Store a batch of uploads one at a time.
    ///
    /// Non-audio files are skipped. A failing upload is logged and the rest
    /// of the batch continues.
    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn add_tracks(&self, uploads: Vec<AudioUpload>) -> BatchAddReport {
        let mut report = BatchAddReport::default();

        for upload in uploads {
            let file_name = strip_path(&upload.filename).to_string();

            if !upload.is_audio() {
                info!(file = %file_name, mime_type = %upload.mime_type, "Skipping non-audio file");
                report.skipped.push(file_name);
                continue;
            }

            match self.repository.store(upload).await {
                Ok(track) => {
                    self.emit(LibraryEvent::TrackAdded {
                        track_id: track.track.id.clone(),
                        name: track.track.name.clone(),
                        size: u64::try_from(track.track.size).unwrap_or_default(),
                    });
                    report.added.push(track);
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Failed to add track");
                    self.emit(LibraryEvent::TrackRejected {
                        file_name: file_name.clone(),
                        message: e.to_string(),
                    });
                    report.failed.push(FailedUpload {
                        file_name,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.emit(LibraryEvent::BatchCompleted {
            added: report.added.len() as u32,
            failed: report.failed.len() as u32,
        });
        info!(
            added = report.added.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Batch upload finished"
        );
        report
    }

    /// Every track with a fresh playable URL.
    pub async fn tracks(&self) -> Result<Vec<PlayableTrack>> {
        Ok(self.repository.list().await?)
    }

    pub async fn track(&self, id: &str) -> Result<Option<PlayableTrack>> {
        Ok(self.repository.get(id).await?)
    }

    /// Remove one track. Unknown ids succeed.
    pub async fn remove_track(&self, id: &str) -> Result<()> {
        self.repository.remove(id).await?;
        self.emit(LibraryEvent::TrackRemoved {
            track_id: id.to_string(),
        });
        Ok(())
    }

    pub async fn clear_library(&self) -> Result<()> {
        self.repository.clear().await?;
        self.emit(LibraryEvent::LibraryCleared);
        Ok(())
    }

    pub async fn storage_info(&self) -> Result<StorageUsage> {
        Ok(self.repository.storage_usage().await?)
    }

    /// Release a playable URL handed out by this service.
    pub fn release_url(&self, url: &str) {
        self.repository.release_url(url);
    }

    /// Route a request through the offline cache.
    pub async fn handle_fetch(&self, request: HttpRequest) -> FetchOutcome {
        self.offline_cache.handle_fetch(request).await
    }

    fn emit(&self, event: LibraryEvent) {
        let _ = self.event_bus.emit(CoreEvent::Library(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(name: &str) -> FailedUpload {
        FailedUpload {
            file_name: name.to_string(),
            message: "Storage transaction failed".to_string(),
        }
    }

    #[test]
    fn test_empty_batch_is_not_a_failure() {
        assert!(!BatchAddReport::default().is_failure());
    }

    #[test]
    fn test_skip_only_batch_is_not_a_failure() {
        let mut report = BatchAddReport::default();
        report.skipped.push("cover.jpg".to_string());
        assert!(!report.is_failure());
    }

    #[test]
    fn test_batch_without_successes_is_a_failure() {
        let mut report = BatchAddReport::default();
        report.skipped.push("cover.jpg".to_string());
        report.failed.push(failed("a.mp3"));
        assert!(report.is_failure());
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = BatchAddReport::default();
        report.failed.push(failed("a.mp3"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"][0]["fileName"], "a.mp3");
        assert!(json["added"].as_array().unwrap().is_empty());
    }
}
