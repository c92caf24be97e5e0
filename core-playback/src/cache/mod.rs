//! # Offline Cache Module
//!
//! Keeps application assets and uploaded audio available without network
//! access.
//!
//! ## Overview
//!
//! Responses are stored per request URL in two namespaces that share a
//! version label:
//! - `<prefix>-<version>` for general assets
//! - `<prefix>-audio-<version>` for audio
//!
//! Changing the version and activating a new worker drops every older
//! generation wholesale. There is no TTL, size cap, or eviction.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     OfflineCacheWorker                 │
//! │  - install() / activate()              │
//! │  - handle_fetch()                      │
//! │  - handle_message()                    │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> CacheStorage (named caches)
//!          ├──> HttpClient (network)
//!          └──> EventBus (optional)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::cache::{FetchOutcome, OfflineCacheConfig, OfflineCacheWorker};
//! use bridge_traits::http::HttpRequest;
//!
//! let worker = OfflineCacheWorker::new(OfflineCacheConfig::default(), storage, http)?;
//! worker.install().await?;
//! worker.activate().await?;
//!
//! match worker.handle_fetch(HttpRequest::get("/song.mp3")).await {
//!     FetchOutcome::Respond(response) => println!("{}", response.status),
//!     FetchOutcome::PassThrough => {}
//! }
//! ```

pub mod config;
pub mod responses;
pub mod routing;
pub mod worker;

pub use config::OfflineCacheConfig;
pub use routing::{is_audio_request, Route};
pub use worker::{FetchOutcome, OfflineCacheWorker, WorkerState};
