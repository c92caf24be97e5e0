//! End-to-end tests for the track repository over an in-memory database

use bridge_desktop::{BlobUrlRegistry, LoftyMediaProbe};
use bridge_traits::storage::ObjectUrlProvider;
use bytes::Bytes;
use core_library::db::create_test_pool;
use core_library::{AudioUpload, SqliteTrackRepository, TrackRepository};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    urls: Arc<BlobUrlRegistry>,
    repo: SqliteTrackRepository,
}

async fn fixture() -> Fixture {
    let pool = create_test_pool().await.unwrap();
    let urls = Arc::new(BlobUrlRegistry::new());
    let probe = Arc::new(LoftyMediaProbe::new(urls.clone()));
    let repo = SqliteTrackRepository::new(pool, urls.clone(), probe)
        .with_probe_timeout(Duration::from_secs(3));
    Fixture { urls, repo }
}

/// 8 kHz mono 8-bit PCM.
fn wav(seconds: u32) -> Vec<u8> {
    let rate: u32 = 8_000;
    let len = rate * seconds;
    let mut out = Vec::with_capacity(44 + len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&len.to_le_bytes());
    out.resize(44 + len as usize, 0x80);
    out
}

#[tokio::test]
async fn ten_second_upload_is_named_sized_and_timed() {
    let f = fixture().await;
    let data = wav(10);

    let stored = f
        .repo
        .store(AudioUpload::new("test.mp3", "audio/mpeg", data.clone()))
        .await
        .unwrap();

    assert_eq!(stored.track.name, "test");
    assert_eq!(stored.track.original_name, "test.mp3");
    assert_eq!(stored.track.size as usize, data.len());
    assert!(
        (stored.track.duration - 10.0).abs() < 0.1,
        "duration was {}",
        stored.track.duration
    );

    let url = stored.url.unwrap();
    assert_eq!(f.urls.resolve(&url).unwrap(), Bytes::from(data));
}

#[tokio::test]
async fn unparseable_upload_is_stored_with_zero_duration() {
    let f = fixture().await;

    let stored = f
        .repo
        .store(AudioUpload::new("broken.mp3", "audio/mpeg", vec![0u8; 32]))
        .await
        .unwrap();

    assert_eq!(stored.track.duration, 0.0);
    assert_eq!(f.repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn listed_urls_serve_identical_bytes() {
    let f = fixture().await;
    let payloads: Vec<Vec<u8>> = vec![vec![1, 2, 3], wav(1), (0..=255u8).collect()];

    for (i, data) in payloads.iter().enumerate() {
        f.repo
            .store(AudioUpload::new(format!("{}.wav", i), "audio/wav", data.clone()))
            .await
            .unwrap();
    }

    let listed = f.repo.list().await.unwrap();
    assert_eq!(listed.len(), payloads.len());

    for track in listed {
        let bytes = f.urls.resolve(track.url.as_deref().unwrap()).unwrap();
        let original = f.repo.audio_data(track.id()).await.unwrap();
        assert_eq!(bytes, original);
        assert_eq!(bytes.len() as i64, track.track.size);
    }
}

#[tokio::test]
async fn list_is_ordered_by_id() {
    let f = fixture().await;
    for name in ["z.mp3", "a.mp3", "m.mp3"] {
        f.repo
            .store(AudioUpload::new(name, "audio/mpeg", vec![1u8]))
            .await
            .unwrap();
    }

    let ids: Vec<String> = f
        .repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.track.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn concurrent_uploads_both_land() {
    let f = fixture().await;

    let (a, b) = tokio::join!(
        f.repo.store(AudioUpload::new("a.mp3", "audio/mpeg", vec![1u8; 10])),
        f.repo.store(AudioUpload::new("b.mp3", "audio/mpeg", vec![2u8; 20])),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_ne!(a.track.id, b.track.id);

    let listed = f.repo.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|t| t.track.id == a.track.id));
    assert!(listed.iter().any(|t| t.track.id == b.track.id));
}

#[tokio::test]
async fn remove_excludes_track_and_repeats_as_noop() {
    let f = fixture().await;
    let kept = f
        .repo
        .store(AudioUpload::new("keep.mp3", "audio/mpeg", vec![1u8]))
        .await
        .unwrap();
    let gone = f
        .repo
        .store(AudioUpload::new("gone.mp3", "audio/mpeg", vec![2u8]))
        .await
        .unwrap();

    f.repo.remove(gone.id()).await.unwrap();
    f.repo.remove(gone.id()).await.unwrap();
    f.repo.remove("never-existed").await.unwrap();

    let listed = f.repo.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), kept.id());
    assert!(f.repo.audio_data(gone.id()).await.is_err());
}

#[tokio::test]
async fn storage_usage_sums_stored_sizes() {
    let f = fixture().await;
    let sizes = [100usize, 2048, 1];

    for (i, size) in sizes.iter().enumerate() {
        f.repo
            .store(AudioUpload::new(format!("{}.mp3", i), "audio/mpeg", vec![0u8; *size]))
            .await
            .unwrap();
    }

    let usage = f.repo.storage_usage().await.unwrap();
    assert_eq!(usage.track_count, 3);
    assert_eq!(usage.total_bytes, sizes.iter().sum::<usize>() as u64);
    assert_eq!(usage.formatted_size, "2.1 KB");
}

#[tokio::test]
async fn clear_empties_library_and_is_idempotent() {
    let f = fixture().await;
    for i in 0..3 {
        f.repo
            .store(AudioUpload::new(format!("{}.mp3", i), "audio/mpeg", vec![0u8; 4]))
            .await
            .unwrap();
    }

    f.repo.clear().await.unwrap();
    assert!(f.repo.list().await.unwrap().is_empty());
    assert_eq!(f.repo.storage_usage().await.unwrap().total_bytes, 0);

    f.repo.clear().await.unwrap();
    assert!(f.repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_library_lists_nothing() {
    let f = fixture().await;
    assert!(f.repo.list().await.unwrap().is_empty());
    assert_eq!(f.repo.storage_usage().await.unwrap().formatted_size, "0 Bytes");
}
