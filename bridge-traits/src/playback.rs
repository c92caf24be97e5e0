//! Media probing bridge.
//!
//! Loads just enough of a playable URL to report its duration, the way a
//! browser media element fires `loadedmetadata`. Callers race the probe
//! against a timeout, so implementations may be slow but must not hold locks
//! across the whole load.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of the media behind `url`, in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved or the media cannot be
    /// parsed.
    async fn probe_duration(&self, url: &str) -> Result<f64>;
}
