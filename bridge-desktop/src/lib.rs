//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts and tests.
//!
//! ## Overview
//!
//! The browser provides these capabilities natively. Outside a browser they
//! are backed by:
//! - `HttpClient` using `reqwest`
//! - `CacheStorage` as an in-process map of named caches
//! - `ObjectUrlProvider` as a registry of `blob:` URLs
//! - `MediaProbe` using `lofty` to read container headers
//! - `MessagePort` over a tokio unbounded channel
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{BlobUrlRegistry, ChannelMessagePort, LoftyMediaProbe};
//! use std::sync::Arc;
//!
//! let urls = Arc::new(BlobUrlRegistry::new());
//! let probe = LoftyMediaProbe::new(urls.clone());
//! let (port, worker_inbox) = ChannelMessagePort::new();
//! ```

mod cache_storage;
mod http;
mod media_probe;
mod message;
mod object_url;

pub use cache_storage::MemoryCacheStorage;
pub use http::ReqwestHttpClient;
pub use media_probe::LoftyMediaProbe;
pub use message::ChannelMessagePort;
pub use object_url::BlobUrlRegistry;
