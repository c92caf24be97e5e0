//! Synthetic responses served when the network is unreachable

use bridge_traits::http::HttpResponse;

pub const AUDIO_UNAVAILABLE_BODY: &str = "Audio not available";
pub const OFFLINE_RESOURCE_BODY: &str = "Resource not available offline";
pub const OFFLINE_PAGE_HTML: &str =
    "<h1>Offline</h1><p>Please check your connection and try again.</p>";

/// Content type attached to audio stored from a cache-audio message.
pub const CACHED_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// `404` for an audio request that missed the cache and the network.
pub fn audio_unavailable() -> HttpResponse {
    HttpResponse::new(404, AUDIO_UNAVAILABLE_BODY)
}

/// `503 Service Unavailable` for any other failed request.
pub fn resource_unavailable() -> HttpResponse {
    HttpResponse::new(503, OFFLINE_RESOURCE_BODY).with_status_text("Service Unavailable")
}

/// Minimal page for navigations when no root document is cached.
pub fn offline_page() -> HttpResponse {
    HttpResponse::new(200, OFFLINE_PAGE_HTML)
        .with_status_text("OK")
        .with_header("Content-Type", "text/html")
}

pub fn cached_audio(data: bytes::Bytes) -> HttpResponse {
    HttpResponse::new(200, data)
        .with_status_text("OK")
        .with_header("Content-Type", CACHED_AUDIO_CONTENT_TYPE)
}
