//! `blob:` URL registry

use bridge_traits::{error::Result, storage::ObjectUrlProvider};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;
use uuid::Uuid;

struct BlobEntry {
    data: Bytes,
    mime_type: String,
}

/// Desktop stand-in for `URL.createObjectURL`.
///
/// Every URL holds a reference to its blob until revoked; nothing is revoked
/// automatically.
pub struct BlobUrlRegistry {
    origin: String,
    blobs: RwLock<HashMap<String, BlobEntry>>,
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::with_origin("musicist")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of URLs that have not been revoked yet.
    pub fn active_count(&self) -> usize {
        self.blobs.read().len()
    }

    /// MIME type the URL was created with.
    pub fn mime_type(&self, url: &str) -> Option<String> {
        self.blobs.read().get(url).map(|entry| entry.mime_type.clone())
    }
}

impl Default for BlobUrlRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectUrlProvider for BlobUrlRegistry {
    fn create_url(&self, data: Bytes, mime_type: &str) -> Result<String> {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        trace!(url = %url, size = data.len(), "Created blob URL");
        self.blobs.write().insert(
            url.clone(),
            BlobEntry {
                data,
                mime_type: mime_type.to_string(),
            },
        );
        Ok(url)
    }

    fn resolve(&self, url: &str) -> Option<Bytes> {
        self.blobs.read().get(url).map(|entry| entry.data.clone())
    }

    fn revoke(&self, url: &str) {
        if self.blobs.write().remove(url).is_some() {
            trace!(url = %url, "Revoked blob URL");
        }
    }
}
