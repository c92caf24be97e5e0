//! # Logging
//!
//! `tracing` subscriber setup for hosts embedding the library.
//!
//! Storage and offline-cache failures never surface to callers as errors;
//! they are logged at `warn`/`error` and swallowed. A host that wants to see
//! them installs a [`LoggerSink`], which receives every event that survives
//! the filter alongside the regular formatted output.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::log::LogLevel;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_logger_sink(host_sink),
//! )?;
//! ```

use crate::error::{Error, Result};

use bridge_traits::log::{LogLevel, LogRecord, LoggerSink};

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Crates that follow [`LoggingConfig::level`].
const OWN_CRATES: &[&str] = &[
    "core_runtime",
    "core_library",
    "core_playback",
    "core_service",
    "bridge_desktop",
];

/// Dependencies pinned to `warn` unless a custom filter says otherwise.
const QUIET_CRATES: &[&str] = &["h2", "hyper", "reqwest", "sqlx", "lofty"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One JSON object per line
    Json,
    /// Single line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Full `EnvFilter` directive, replacing the per-crate defaults.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// e.g. `"core_playback=trace,sqlx=info"`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    /// The `EnvFilter` directive this configuration resolves to.
    pub fn directive(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }

        let own = OWN_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, self.level));
        let quiet = QUIET_CRATES.iter().map(|krate| format!("{}=warn", krate));
        own.chain(quiet).collect::<Vec<_>>().join(",")
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// `Error::Config` if the filter directive is malformed or a global
/// subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let spans = if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };
    let threads = config.display_thread_info;

    // `Option<L>` is a no-op layer when `None`.
    let pretty = matches!(config.format, LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(spans.clone())
            .with_target(config.display_target)
            .with_thread_ids(threads)
            .with_thread_names(threads)
            .with_writer(io::stdout)
    });
    let json = matches!(config.format, LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .with_target(config.display_target)
            .with_thread_ids(threads)
            .with_thread_names(threads)
            .with_writer(io::stdout)
    });
    let compact = matches!(config.format, LogFormat::Compact).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_span_events(spans)
            .with_target(config.display_target)
            .with_thread_ids(threads)
            .with_thread_names(threads)
            .with_writer(io::stdout)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(compact)
        .with(config.logger_sink.map(SinkForwarder::new))
        .try_init()
        .map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(config.directive())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Mirrors filtered events into a host [`LoggerSink`].
struct SinkForwarder {
    sink: Arc<dyn LoggerSink>,
}

impl SinkForwarder {
    fn new(sink: Arc<dyn LoggerSink>) -> Self {
        Self { sink }
    }

    fn deliver(&self, record: LogRecord) {
        let sink = Arc::clone(&self.sink);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = sink.log(record).await {
                        eprintln!("log sink rejected record: {}", e);
                    }
                });
            }
            Err(_) => {
                if let Err(e) = futures::executor::block_on(sink.log(record)) {
                    eprintln!("log sink rejected record: {}", e);
                }
            }
        }
    }
}

impl<S> Layer<S> for SinkForwarder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut record = LogRecord::new(level, metadata.target(), message);
        record.fields = fields.values;
        record.span = ctx.lookup_current().map(|span| span.name().to_string());

        self.deliver(record);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: std::collections::BTreeMap<String, String>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    // Numbers and bools format the same through Debug.
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn log_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// File name component of an upload path.
///
/// Browsers may hand over names carrying a directory layout with either
/// separator; only the last component is kept for track names and logs.
pub fn strip_path(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
}
