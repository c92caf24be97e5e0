//! End-to-end tests for the core service façade

use async_trait::async_trait;
use bridge_traits::cache::CacheStorage;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::ObjectUrlProvider;
use bytes::Bytes;
use core_library::AudioUpload;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventStream, LibraryEvent};
use core_service::CoreService;
use mockall::mock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn is_connected(&self) -> bool;
    }
}

/// Refuses to hand out URLs, so every store fails.
struct NoUrls;

impl ObjectUrlProvider for NoUrls {
    fn create_url(&self, _data: Bytes, _mime_type: &str) -> BridgeResult<String> {
        Err(BridgeError::NotAvailable("object URLs".to_string()))
    }

    fn resolve(&self, _url: &str) -> Option<Bytes> {
        None
    }

    fn revoke(&self, _url: &str) {}
}

/// Fails the first URL request, then hands out real blob URLs.
struct FailFirstUrl {
    failed: AtomicBool,
    urls: bridge_desktop::BlobUrlRegistry,
}

impl FailFirstUrl {
    fn new() -> Self {
        Self {
            failed: AtomicBool::new(false),
            urls: bridge_desktop::BlobUrlRegistry::new(),
        }
    }
}

impl ObjectUrlProvider for FailFirstUrl {
    fn create_url(&self, data: Bytes, mime_type: &str) -> BridgeResult<String> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("quota exceeded".to_string()));
        }
        self.urls.create_url(data, mime_type)
    }

    fn resolve(&self, url: &str) -> Option<Bytes> {
        self.urls.resolve(url)
    }

    fn revoke(&self, url: &str) {
        self.urls.revoke(url)
    }
}

fn offline_http() -> Arc<MockHttp> {
    let mut http = MockHttp::new();
    http.expect_execute().never();
    Arc::new(http)
}

async fn service() -> CoreService {
    let config = CoreConfig::builder()
        .in_memory()
        .http_client(offline_http())
        .build()
        .unwrap();
    CoreService::bootstrap(config).await.unwrap()
}

/// Next library event; cache events from the message listener are skipped.
async fn next_library_event(events: &mut EventStream) -> LibraryEvent {
    match events.recv().await.unwrap() {
        CoreEvent::Library(event) => event,
        other => panic!("unexpected event: {:?}", other),
    }
}

fn mp3(name: &str, len: usize) -> AudioUpload {
    AudioUpload::new(name, "audio/mpeg", vec![0xAB; len])
}

#[tokio::test]
async fn batch_skips_non_audio_files() {
    let core = service().await;

    let report = core
        .add_tracks(vec![
            mp3("/home/me/Music/first.mp3", 100),
            AudioUpload::new("cover.jpg", "image/jpeg", vec![1u8; 10]),
            AudioUpload::new("second.FLAC", "", vec![2u8; 50]),
        ])
        .await;

    assert_eq!(report.added.len(), 2);
    assert_eq!(report.skipped, vec!["cover.jpg".to_string()]);
    assert!(report.failed.is_empty());
    assert!(!report.is_failure());

    let tracks = core.tracks().await.unwrap();
    assert_eq!(tracks.len(), 2);

    let usage = core.storage_info().await.unwrap();
    assert_eq!(usage.track_count, 2);
    assert_eq!(usage.total_bytes, 150);
    assert_eq!(usage.formatted_size, "150 Bytes");
}

#[tokio::test]
async fn batch_with_no_successes_is_a_failure() {
    let config = CoreConfig::builder()
        .in_memory()
        .http_client(offline_http())
        .object_urls(Arc::new(NoUrls))
        .build()
        .unwrap();
    let core = CoreService::bootstrap(config).await.unwrap();
    let mut events = core.event_bus().stream().library_only();

    let report = core.add_tracks(vec![mp3("a.mp3", 4), mp3("b.mp3", 4)]).await;

    assert!(report.added.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].file_name, "a.mp3");
    assert!(report.is_failure());
    assert!(core.tracks().await.unwrap().is_empty());

    let mut rejected = 0;
    loop {
        match next_library_event(&mut events).await {
            LibraryEvent::TrackRejected { .. } => rejected += 1,
            LibraryEvent::BatchCompleted { added, failed } => {
                assert_eq!((added, failed), (0, 2));
                break;
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
    assert_eq!(rejected, 2);
}

#[tokio::test]
async fn batch_continues_after_a_failed_upload() {
    let config = CoreConfig::builder()
        .in_memory()
        .http_client(offline_http())
        .object_urls(Arc::new(FailFirstUrl::new()))
        .build()
        .unwrap();
    let core = CoreService::bootstrap(config).await.unwrap();
    let mut events = core.event_bus().stream().library_only();

    let report = core
        .add_tracks(vec![mp3("broken.mp3", 4), mp3("fine.mp3", 6)])
        .await;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "broken.mp3");
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.added[0].track.name, "fine");
    assert!(!report.is_failure());

    let tracks = core.tracks().await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(core.storage_info().await.unwrap().total_bytes, 6);

    assert!(matches!(
        next_library_event(&mut events).await,
        LibraryEvent::TrackRejected { ref file_name, .. } if file_name == "broken.mp3"
    ));
    assert!(matches!(
        next_library_event(&mut events).await,
        LibraryEvent::TrackAdded { ref name, .. } if name == "fine"
    ));
    assert_eq!(
        next_library_event(&mut events).await,
        LibraryEvent::BatchCompleted {
            added: 1,
            failed: 1
        }
    );
}

#[tokio::test]
async fn skip_only_batch_is_not_a_failure() {
    let core = service().await;

    let report = core
        .add_tracks(vec![AudioUpload::new("notes.txt", "text/plain", vec![1u8; 3])])
        .await;

    assert!(report.added.is_empty());
    assert_eq!(report.skipped, vec!["notes.txt".to_string()]);
    assert!(!report.is_failure());
}

#[tokio::test]
async fn stored_audio_reaches_offline_cache() {
    let core = service().await;

    let report = core.add_tracks(vec![mp3("song.mp3", 32)]).await;
    let id = report.added[0].track.id.clone();
    let url = format!("/cached-audio/{}", id);

    // The message is delivered asynchronously.
    let storage = Arc::clone(&core.config().cache_storage);
    tokio::time::timeout(Duration::from_secs(5), async {
        while storage
            .match_in("musicist-audio-v3", &url)
            .await
            .unwrap()
            .is_none()
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let outcome = core.handle_fetch(HttpRequest::get(url.as_str())).await;
    let response = outcome.response().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type(), Some("audio/mpeg"));
    assert_eq!(&response.body[..], &[0xAB; 32][..]);
}

#[tokio::test]
async fn remove_and_clear_emit_events() {
    let core = service().await;
    let report = core
        .add_tracks(vec![mp3("a.mp3", 1), mp3("b.mp3", 2)])
        .await;
    let mut events = core.event_bus().stream().library_only();

    let removed = report.added[0].track.id.clone();
    core.remove_track(&removed).await.unwrap();
    core.remove_track(&removed).await.unwrap();

    let remaining = core.tracks().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0].track.id, removed);

    core.clear_library().await.unwrap();
    assert!(core.tracks().await.unwrap().is_empty());
    assert_eq!(core.storage_info().await.unwrap().total_bytes, 0);

    assert_eq!(
        next_library_event(&mut events).await,
        LibraryEvent::TrackRemoved {
            track_id: removed.clone()
        }
    );
    assert_eq!(
        next_library_event(&mut events).await,
        LibraryEvent::TrackRemoved { track_id: removed }
    );
    assert_eq!(
        next_library_event(&mut events).await,
        LibraryEvent::LibraryCleared
    );
}

#[tokio::test]
async fn released_urls_stop_resolving() {
    let urls = Arc::new(bridge_desktop::BlobUrlRegistry::new());
    let config = CoreConfig::builder()
        .in_memory()
        .http_client(offline_http())
        .object_urls(urls.clone())
        .build()
        .unwrap();
    let core = CoreService::bootstrap(config).await.unwrap();
    core.add_tracks(vec![mp3("a.mp3", 8)]).await;

    let track = core.tracks().await.unwrap().remove(0);
    let url = track.url.unwrap();
    assert!(urls.resolve(&url).is_some());

    core.release_url(&url);
    assert!(urls.resolve(&url).is_none());
}

#[tokio::test]
async fn unopenable_database_is_unsupported_environment() {
    let config = CoreConfig::builder()
        .database_path("/nonexistent-musicist-root/deeper/library.db")
        .http_client(offline_http())
        .build()
        .unwrap();

    let err = match CoreService::bootstrap(config).await {
        Ok(_) => panic!("bootstrap should fail"),
        Err(e) => e,
    };
    assert!(err.is_unsupported_environment());
}

#[tokio::test]
async fn bootstrap_uses_configured_cache_generation() {
    let config = CoreConfig::builder()
        .in_memory()
        .cache_prefix("player")
        .cache_version("v7")
        .http_client(offline_http())
        .build()
        .unwrap();
    let core = CoreService::bootstrap(config).await.unwrap();

    let cache = core.offline_cache();
    assert!(cache.is_active());
    assert_eq!(cache.general_cache_name(), "player-v7");
    assert_eq!(cache.audio_cache_name(), "player-audio-v7");
}
