//! # Repository Pattern Implementation
//!
//! ## Architecture
//!
//! - `BlobStore` and `MetadataStore` are thin table accessors generic over
//!   any sqlx executor, so a single transaction can span both tables
//! - `TrackRepository` composes them into the operations the UI uses
//! - All operations return `Result<T>` for error handling

pub mod blob;
pub mod metadata;
pub mod track;

pub use blob::BlobStore;
pub use metadata::MetadataStore;
pub use track::{SqliteTrackRepository, TrackRepository, DEFAULT_PROBE_TIMEOUT};
