//! Host log forwarding.
//!
//! Storage and cache failures are reported only through logs, never to the
//! caller. A [`LoggerSink`] lets a host collect those records in its own
//! pipeline (browser console, Logcat, a log file).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive name understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Emitting crate or module path, e.g. `core_library::repositories::track`.
    pub target: String,
    pub message: String,
    /// Structured fields such as `track_id` or `cache`.
    pub fields: BTreeMap<String, String>,
    /// Name of the innermost span active when the event fired.
    pub span: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: BTreeMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Receives records that pass the subscriber's filter.
///
/// Implementations must not log through `tracing` themselves.
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, record: LogRecord) -> Result<()>;

    /// Records below this level are dropped before they reach [`log`](Self::log).
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}
