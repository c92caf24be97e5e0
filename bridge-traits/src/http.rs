//! Network bridge
//!
//! Request and response values exchanged between the offline cache, the
//! host's network stack and [`CacheStorage`](crate::cache::CacheStorage).
//! Bodies are [`Bytes`], so a response can be stored and returned without
//! copying.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

/// Fetch mode of the request's initiator.
///
/// Only [`Navigate`](RequestMode::Navigate) gets an offline document when
/// the network is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute, or relative to the application origin.
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
    pub mode: RequestMode,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
            mode: RequestMode::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// A top-level page load.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::get(url).mode(RequestMode::Navigate)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Fetch API response type. Only `Basic` (same-origin) responses go into
/// the general asset cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Basic,
    Cors,
    Opaque,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub response_type: ResponseType,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: HashMap::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Header value, matched without regard to case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(key, value)| key.eq_ignore_ascii_case(name).then_some(value.as_str()))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Exactly `200 OK`. Partial content and redirects do not count.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Result<String> {
        std::str::from_utf8(&self.body)
            .map(str::to_owned)
            .map_err(|e| BridgeError::OperationFailed(format!("Body is not UTF-8: {}", e)))
    }
}

/// The network half of the offline cache.
///
/// One attempt per call. Transport failures are `Err(BridgeError::Network)`;
/// any HTTP status, including 4xx and 5xx, is a successful `Ok` response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Best-effort reachability check.
    async fn is_connected(&self) -> bool {
        true
    }
}
