//! Bounded duration extraction
//!
//! The probe runs as its own task and is raced against a timeout. When the
//! timeout wins, the task is detached rather than cancelled and whatever it
//! eventually returns is discarded.

use bridge_traits::playback::MediaProbe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Duration of the media behind `url` in seconds, or `0.0` if the probe fails,
/// returns a non-finite value, or does not finish within `timeout`.
pub async fn probe_duration(probe: Arc<dyn MediaProbe>, url: String, timeout: Duration) -> f64 {
    let task_url = url.clone();
    let handle = tokio::spawn(async move { probe.probe_duration(&task_url).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(seconds))) if seconds.is_finite() && seconds >= 0.0 => seconds,
        Ok(Ok(Ok(seconds))) => {
            debug!(url = %url, seconds, "Probe returned an unusable duration");
            0.0
        }
        Ok(Ok(Err(e))) => {
            debug!(url = %url, error = %e, "Duration probe failed");
            0.0
        }
        Ok(Err(e)) => {
            warn!(url = %url, error = %e, "Duration probe task panicked");
            0.0
        }
        Err(_) => {
            debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Duration probe timed out");
            0.0
        }
    }
}
