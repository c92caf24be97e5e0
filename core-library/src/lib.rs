//! # Track Library Module
//!
//! Persists uploaded audio on the client and hands out playable URLs for it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations (`tracks` and `audio_files`)
//! - The blob and metadata stores, keyed by the same track id
//! - The track repository that writes both in one transaction
//! - Bounded duration probing for new uploads
//!
//! A track record exists exactly when its audio exists. Playable URLs are
//! never stored; every read mints new ones.

pub mod db;
pub mod duration;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{AudioUpload, PlayableTrack, StorageUsage, Track, TrackId};
pub use repositories::{SqliteTrackRepository, TrackRepository};
