//! Request classification for the offline cache worker

use bridge_traits::http::{HttpMethod, HttpRequest};

/// Path suffixes that mark a request as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

/// Where an intercepted request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not handled by the worker at all.
    PassThrough,
    /// Audio namespace only.
    Audio,
    /// Cache-first across every namespace, stored in the general one.
    General,
}

/// Classify a request. Nothing is intercepted before activation.
pub fn route(request: &HttpRequest, skipped_schemes: &[String], active: bool) -> Route {
    if !active || request.method != HttpMethod::Get {
        return Route::PassThrough;
    }
    if skipped_schemes
        .iter()
        .any(|scheme| request.url.starts_with(scheme.as_str()))
    {
        return Route::PassThrough;
    }
    if is_audio_request(&request.url) {
        Route::Audio
    } else {
        Route::General
    }
}

/// True for URLs whose path ends in a known audio extension (any case) or
/// that contain `audio/`, which includes every `cached-audio/` key.
pub fn is_audio_request(url: &str) -> bool {
    if url.contains("audio/") {
        return true;
    }

    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => AUDIO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        _ => false,
    }
}
