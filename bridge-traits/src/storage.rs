//! Playable URL Abstraction
//!
//! A playable URL is a transient handle that lets a playback surface read a
//! blob without copying it around:
//! - Browser: `URL.createObjectURL` / `URL.revokeObjectURL`
//! - Desktop: an in-process registry of `blob:` URLs
//!
//! Handles are never persisted. Every call to [`ObjectUrlProvider::create_url`]
//! yields a new handle with its own lifetime; releasing it is the caller's job.

use bytes::Bytes;

use crate::error::Result;

pub trait ObjectUrlProvider: Send + Sync {
    /// Register a blob and return a fresh URL addressing it.
    fn create_url(&self, data: Bytes, mime_type: &str) -> Result<String>;

    /// Resolve a URL back to the bytes it addresses.
    ///
    /// Returns `None` for unknown or revoked URLs.
    fn resolve(&self, url: &str) -> Option<Bytes>;

    /// Release a URL. Revoking an unknown URL is a no-op.
    fn revoke(&self, url: &str);
}
