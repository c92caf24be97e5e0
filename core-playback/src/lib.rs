//! # Playback & Offline Cache Module
//!
//! ## Overview
//!
//! This crate handles:
//! - The offline cache worker: versioned namespaces, cache-first request
//!   interception and audio pushed over the worker message channel
//! - Playlist navigation state (current track, shuffle, repeat, volume)

pub mod cache;
pub mod error;
pub mod playlist;

pub use cache::{FetchOutcome, OfflineCacheConfig, OfflineCacheWorker};
pub use error::{PlaybackError, Result};
pub use playlist::{Playlist, RepeatMode, Transition};
