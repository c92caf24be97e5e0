//! Duration probing with `lofty`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    playback::MediaProbe,
    storage::ObjectUrlProvider,
};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Reads container headers of blobs registered with an [`ObjectUrlProvider`].
///
/// Parsing runs on the blocking pool. A probe that loses its timeout race
/// keeps running there until lofty returns; its result is dropped.
pub struct LoftyMediaProbe {
    urls: Arc<dyn ObjectUrlProvider>,
}

impl LoftyMediaProbe {
    pub fn new(urls: Arc<dyn ObjectUrlProvider>) -> Self {
        Self { urls }
    }

    fn read_duration(data: &[u8]) -> Result<f64> {
        let tagged_file = Probe::new(Cursor::new(data))
            .guess_file_type()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to probe media: {}", e)))?
            .read()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to parse media: {}", e)))?;

        Ok(tagged_file.properties().duration().as_secs_f64())
    }
}

#[async_trait]
impl MediaProbe for LoftyMediaProbe {
    async fn probe_duration(&self, url: &str) -> Result<f64> {
        let data = self
            .urls
            .resolve(url)
            .ok_or_else(|| BridgeError::OperationFailed(format!("Unknown media URL: {}", url)))?;

        let duration = tokio::task::spawn_blocking(move || Self::read_duration(&data))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Probe task failed: {}", e)))??;

        debug!(url = %url, duration, "Probed media duration");
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_url::BlobUrlRegistry;
    use bytes::Bytes;

    /// 8 kHz mono 8-bit PCM of the given length.
    fn silent_wav(seconds: u32) -> Vec<u8> {
        let sample_rate: u32 = 8_000;
        let data_len = sample_rate * seconds;
        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&8u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(44 + data_len as usize, 0x80);
        wav
    }

    #[tokio::test]
    async fn test_probe_wav_duration() {
        let registry = Arc::new(BlobUrlRegistry::new());
        let url = registry
            .create_url(Bytes::from(silent_wav(10)), "audio/wav")
            .unwrap();

        let probe = LoftyMediaProbe::new(registry.clone());
        let duration = probe.probe_duration(&url).await.unwrap();

        assert!((duration - 10.0).abs() < 0.01, "got {duration}");
    }

    #[tokio::test]
    async fn test_probe_rejects_garbage() {
        let registry = Arc::new(BlobUrlRegistry::new());
        let url = registry
            .create_url(Bytes::from_static(b"definitely not audio"), "audio/mpeg")
            .unwrap();

        let probe = LoftyMediaProbe::new(registry);
        assert!(probe.probe_duration(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_unknown_url() {
        let probe = LoftyMediaProbe::new(Arc::new(BlobUrlRegistry::new()));
        let result = probe.probe_duration("blob:musicist/missing").await;

        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }
}
