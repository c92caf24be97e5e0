//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the platform
//! substrate it runs on. The storage and caching core never talks to a browser
//! or an OS directly; it talks to these traits.
//!
//! ## Traits
//!
//! ### Networking & Caching
//! - [`HttpClient`](http::HttpClient) - Network fetches behind the offline cache
//! - [`CacheStorage`](cache::CacheStorage) - Named request/response caches
//!
//! ### Media
//! - [`ObjectUrlProvider`](storage::ObjectUrlProvider) - Transient playable URLs for blobs
//! - [`MediaProbe`](playback::MediaProbe) - Duration probing for playable URLs
//!
//! ### Messaging
//! - [`MessagePort`](message::MessagePort) - Fire-and-forget channel to the cache worker
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError`
//! and include context (URL, cache name) in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod cache;
pub mod error;
pub mod http;
pub mod log;
pub mod message;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use cache::CacheStorage;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RequestMode, ResponseType};
pub use message::{MessagePort, WorkerMessage};
pub use playback::MediaProbe;
pub use storage::ObjectUrlProvider;
pub use log::{LogLevel, LogRecord, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
