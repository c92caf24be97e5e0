//! Track repository trait and implementation

use crate::duration::probe_duration;
use crate::error::{LibraryError, Result};
use crate::models::{AudioUpload, PlayableTrack, StorageUsage, Track, TrackId};
use crate::repositories::{BlobStore, MetadataStore};
use async_trait::async_trait;
use bridge_traits::{
    message::{MessagePort, WorkerMessage},
    playback::MediaProbe,
    storage::ObjectUrlProvider,
    time::{Clock, SystemClock},
};
use bytes::Bytes;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default bound on duration extraction.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Track repository interface
///
/// Reads always hand out fresh playable URLs. The repository never tracks or
/// revokes the URLs it returns; callers release them with
/// [`release_url`](TrackRepository::release_url).
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Store an upload's audio and metadata in one transaction.
    ///
    /// The returned track carries the URL that was used to probe its duration.
    ///
    /// # Errors
    /// Returns error if:
    /// - A playable URL cannot be created
    /// - The transaction fails
    async fn store(&self, upload: AudioUpload) -> Result<PlayableTrack>;

    /// All tracks ordered by id, each with a new URL.
    async fn list(&self) -> Result<Vec<PlayableTrack>>;

    /// One track with a new URL, if it exists.
    async fn get(&self, id: &str) -> Result<Option<PlayableTrack>>;

    /// Raw audio of a track.
    ///
    /// # Errors
    /// Returns `AudioMissing` if no audio is stored under `id`.
    async fn audio_data(&self, id: &str) -> Result<Bytes>;

    /// Delete a track's metadata and audio. Unknown ids are a no-op.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Delete every track.
    async fn clear(&self) -> Result<()>;

    /// Track count and summed byte size.
    async fn storage_usage(&self) -> Result<StorageUsage>;

    /// Release a URL handed out by this repository.
    fn release_url(&self, url: &str);
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
    object_urls: Arc<dyn ObjectUrlProvider>,
    media_probe: Arc<dyn MediaProbe>,
    message_port: Option<Arc<dyn MessagePort>>,
    clock: Arc<dyn Clock>,
    probe_timeout: Duration,
}

impl SqliteTrackRepository {
    pub fn new(
        pool: SqlitePool,
        object_urls: Arc<dyn ObjectUrlProvider>,
        media_probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            pool,
            object_urls,
            media_probe,
            message_port: None,
            clock: Arc::new(SystemClock),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Post every stored upload to the offline cache worker.
    pub fn with_message_port(mut self, port: Arc<dyn MessagePort>) -> Self {
        self.message_port = Some(port);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    fn playable(&self, track: Track, data: Option<Bytes>) -> Result<PlayableTrack> {
        let url = match data {
            Some(data) => Some(self.object_urls.create_url(data, &track.mime_type)?),
            None => {
                warn!(track_id = %track.id, "Track has no stored audio");
                None
            }
        };
        Ok(PlayableTrack { track, url })
    }

    async fn write_track(&self, track: &Track, data: &[u8]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        MetadataStore::insert(&mut *tx, track).await?;
        BlobStore::put(&mut *tx, &track.id, data).await?;
        tx.commit().await?;
        Ok(())
    }

    fn post_to_worker(&self, id: &str, data: Bytes) {
        let Some(port) = &self.message_port else {
            return;
        };

        if let Err(e) = port.post_message(WorkerMessage::cache_audio(data, id)) {
            warn!(track_id = %id, error = %e, "Failed to hand audio to offline cache");
        }
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    #[instrument(skip(self, upload), fields(size = upload.data.len()))]
    async fn store(&self, upload: AudioUpload) -> Result<PlayableTrack> {
        let now = self.clock.now();
        let id = TrackId::generate(now);

        let url = self
            .object_urls
            .create_url(upload.data.clone(), &upload.mime_type)?;

        let duration = probe_duration(
            Arc::clone(&self.media_probe),
            url.clone(),
            self.probe_timeout,
        )
        .await;

        let track = Track::from_upload(id, &upload, duration, now);

        if let Err(e) = self.write_track(&track, &upload.data).await {
            self.object_urls.revoke(&url);
            warn!(track_id = %track.id, error = %e, "Failed to store track");
            return Err(e);
        }

        info!(track_id = %track.id, duration, "Stored track");
        self.post_to_worker(&track.id, upload.data);

        Ok(PlayableTrack {
            track,
            url: Some(url),
        })
    }

    async fn list(&self) -> Result<Vec<PlayableTrack>> {
        let mut tx = self.pool.begin().await?;
        let tracks = MetadataStore::list(&mut *tx).await?;

        let mut playable = Vec::with_capacity(tracks.len());
        for track in tracks {
            let data = BlobStore::get(&mut *tx, &track.id).await?;
            playable.push(self.playable(track, data)?);
        }
        tx.commit().await?;

        debug!(count = playable.len(), "Listed tracks");
        Ok(playable)
    }

    async fn get(&self, id: &str) -> Result<Option<PlayableTrack>> {
        let mut tx = self.pool.begin().await?;
        let Some(track) = MetadataStore::get(&mut *tx, id).await? else {
            return Ok(None);
        };
        let data = BlobStore::get(&mut *tx, id).await?;
        tx.commit().await?;

        self.playable(track, data).map(Some)
    }

    async fn audio_data(&self, id: &str) -> Result<Bytes> {
        BlobStore::get(&self.pool, id)
            .await?
            .ok_or_else(|| LibraryError::AudioMissing(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let had_metadata = MetadataStore::delete(&mut *tx, id).await?;
        let had_audio = BlobStore::delete(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(had_metadata, had_audio, "Removed track");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let tracks = MetadataStore::clear(&mut *tx).await?;
        let blobs = BlobStore::clear(&mut *tx).await?;
        tx.commit().await?;

        info!(tracks, blobs, "Cleared track library");
        Ok(())
    }

    async fn storage_usage(&self) -> Result<StorageUsage> {
        let (count, total) = MetadataStore::totals(&self.pool).await?;
        Ok(StorageUsage::new(count, total))
    }

    fn release_url(&self, url: &str) {
        self.object_urls.revoke(url);
    }
}
