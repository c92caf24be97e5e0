//! Cross-Context Messaging
//!
//! The offline cache worker runs in its own execution context. The only way to
//! reach it is to post a [`WorkerMessage`] through a [`MessagePort`].
//!
//! Delivery is fire-and-forget and at-most-once: there is no acknowledgement,
//! no correlation id and no backpressure. A successful `post_message` only
//! means the message was handed to the channel.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Messages understood by the offline cache worker.
///
/// The JSON form matches the page-to-worker protocol:
/// `{ "type": "CACHE_AUDIO", "audioData": ..., "filename": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Store raw audio bytes in the audio cache under a synthetic path.
    #[serde(rename = "CACHE_AUDIO", rename_all = "camelCase")]
    CacheAudio { audio_data: Bytes, filename: String },
}

impl WorkerMessage {
    pub fn cache_audio(audio_data: Bytes, filename: impl Into<String>) -> Self {
        Self::CacheAudio {
            audio_data,
            filename: filename.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::CacheAudio { .. } => "CACHE_AUDIO",
        }
    }
}

/// Sending half of the page-to-worker channel.
pub trait MessagePort: Send + Sync {
    /// Post a message without waiting for it to be handled.
    ///
    /// # Errors
    ///
    /// Returns an error when no worker is listening anymore.
    fn post_message(&self, message: WorkerMessage) -> Result<()>;
}
