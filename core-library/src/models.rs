//! Domain models for the track library
//!
//! Track records mirror the `tracks` table one to one. Playable URLs are never
//! part of a row; they are attached on read through [`PlayableTrack`].

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Extensions accepted as audio when the MIME type says otherwise.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

const ID_SUFFIX_LEN: usize = 11;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
///
/// Millisecond timestamp in base 36 followed by a random base-36 suffix. Ids
/// sort roughly by creation time, which is the order `list` returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let millis = u128::try_from(now.timestamp_millis()).unwrap_or_default();
        let mut suffix = to_base36(Uuid::new_v4().as_u128());
        suffix.truncate(ID_SUFFIX_LEN);
        Self(format!("{}{}", to_base36(millis), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

// =============================================================================
// Domain Models
// =============================================================================

/// Persisted metadata for one uploaded audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    /// Display name: file name without its last extension
    pub name: String,
    pub original_name: String,
    /// Byte size of the stored audio
    pub size: i64,
    /// MIME type supplied with the upload, possibly empty
    #[serde(rename = "type")]
    pub mime_type: String,
    /// ISO-8601 UTC with millisecond precision
    pub date_added: String,
    /// Seconds; 0 when it could not be determined in time
    pub duration: f64,
    pub artist: String,
    pub album: String,
    pub title: String,
}

impl Track {
    /// Builds the record for a new upload.
    pub fn from_upload(
        id: TrackId,
        upload: &AudioUpload,
        duration: f64,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into_inner(),
            name: track_name_from_filename(&upload.filename).to_string(),
            original_name: upload.filename.clone(),
            size: i64::try_from(upload.data.len()).unwrap_or(i64::MAX),
            mime_type: upload.mime_type.clone(),
            date_added: added_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            duration,
            artist: String::new(),
            album: String::new(),
            title: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Track id cannot be empty".to_string());
        }
        if self.size < 0 {
            return Err("Track size cannot be negative".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!("Invalid duration: {}", self.duration));
        }
        if DateTime::parse_from_rfc3339(&self.date_added).is_err() {
            return Err(format!("Invalid date_added: {}", self.date_added));
        }
        Ok(())
    }
}

/// A track record with a freshly minted playable URL
///
/// `url` is `None` when the record has no matching audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayableTrack {
    #[serde(flatten)]
    pub track: Track,
    pub url: Option<String>,
}

impl PlayableTrack {
    pub fn id(&self) -> &str {
        &self.track.id
    }
}

/// Raw file handed over by the UI
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl AudioUpload {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// `audio/*` MIME type, or a known audio extension.
    pub fn is_audio(&self) -> bool {
        if self.mime_type.starts_with("audio/") {
            return true;
        }
        let lower = self.filename.to_ascii_lowercase();
        AUDIO_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}

/// Totals over every stored track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub track_count: u64,
    pub total_bytes: u64,
    pub formatted_size: String,
}

impl StorageUsage {
    pub fn new(track_count: u64, total_bytes: u64) -> Self {
        Self {
            track_count,
            total_bytes,
            formatted_size: format_bytes(total_bytes),
        }
    }
}

/// Strips the last extension: `"a.b.flac"` becomes `"a.b"`.
///
/// An extension is a non-empty run after the final `.` that contains no `/`.
pub fn track_name_from_filename(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) => {
            let ext = &filename[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                filename
            } else {
                &filename[..dot]
            }
        }
        None => filename,
    }
}

/// Human-readable size in 1024 steps with up to two decimals.
///
/// ```
/// use core_library::models::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
