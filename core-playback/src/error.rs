//! # Playback Error Types
//!
//! Errors raised by the offline cache worker and the playlist state machine.

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// A pre-cache request did not produce a cacheable response.
    #[error("Failed to pre-cache {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    /// Offline cache configuration is invalid.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("Track {0} is not in the playlist")]
    TrackNotFound(String),

    #[error("Volume {0} is outside 0.0..=1.0")]
    InvalidVolume(f32),

    #[error("Host bridge failed: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// The network was unreachable or served something uncacheable.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Bridge(BridgeError::Network(_)) | PlaybackError::PrecacheFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
