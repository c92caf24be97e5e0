//! # Core Configuration Module
//!
//! Provides configuration management for the Musicist core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core.
//! It enforces fail-fast validation so a bad cache name or a missing bridge is
//! reported before anything is opened.
//!
//! ## Bridges
//!
//! - `HttpClient` - network access for the offline cache
//! - `CacheStorage` - named request/response caches
//! - `ObjectUrlProvider` - playable URL handles for stored audio
//! - `MediaProbe` - duration extraction
//!
//! When the `desktop-shims` feature is enabled, desktop defaults from
//! `bridge-desktop` are injected for any bridge that is not provided. The
//! default `MediaProbe` reads from the same `ObjectUrlProvider` the config
//! ends up with.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/musicist.db")
//!     .cache_version("v4")
//!     .precache_urls(["/", "/index.html", "/manifest.json"])
//!     .duration_probe_timeout(Duration::from_secs(5))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No database location configured
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CacheStorage, HttpClient, MediaProbe, ObjectUrlProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default prefix for offline cache names.
pub const DEFAULT_CACHE_PREFIX: &str = "musicist";

/// Default offline cache version. Changing it discards every cached response.
pub const DEFAULT_CACHE_VERSION: &str = "v3";

/// Default scope that synthetic cache URLs are rooted at.
pub const DEFAULT_SCOPE: &str = "/";

/// Default bound on duration extraction for a single upload.
pub const DEFAULT_DURATION_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

const MAX_DURATION_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the track database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk, created on first use.
    File(PathBuf),
    /// Private in-memory database. Contents are lost when the pool closes.
    InMemory,
}

/// Core configuration for the Musicist core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Track database location
    pub database: DatabaseLocation,

    /// Prefix for offline cache names
    pub cache_prefix: String,

    /// Offline cache version string
    pub cache_version: String,

    /// Scope that `cached-audio/` URLs are rooted at. Starts and ends with `/`.
    pub scope: String,

    /// URLs fetched into the general cache on install
    pub precache_urls: Vec<String>,

    /// Bound on duration extraction for one upload
    pub duration_probe_timeout: Duration,

    /// Network access for the offline cache
    pub http_client: Arc<dyn HttpClient>,

    /// Named response caches
    pub cache_storage: Arc<dyn CacheStorage>,

    /// Playable URL handles
    pub object_urls: Arc<dyn ObjectUrlProvider>,

    /// Duration extraction
    pub media_probe: Arc<dyn MediaProbe>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database", &self.database)
            .field("cache_prefix", &self.cache_prefix)
            .field("cache_version", &self.cache_version)
            .field("scope", &self.scope)
            .field("precache_urls", &self.precache_urls)
            .field("duration_probe_timeout", &self.duration_probe_timeout)
            .field("http_client", &"HttpClient { ... }")
            .field("cache_storage", &"CacheStorage { ... }")
            .field("object_urls", &"ObjectUrlProvider { ... }")
            .field("media_probe", &"MediaProbe { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The database path is not empty
    /// - Cache prefix and version are non-empty and free of whitespace
    /// - The scope starts and ends with `/`
    /// - The probe timeout is non-zero and at most 60 seconds
    pub fn validate(&self) -> Result<()> {
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        validate_cache_segment("Cache prefix", &self.cache_prefix)?;
        validate_cache_segment("Cache version", &self.cache_version)?;

        if !self.scope.starts_with('/') || !self.scope.ends_with('/') {
            return Err(Error::Config(format!(
                "Scope must start and end with '/', got '{}'",
                self.scope
            )));
        }

        if self.duration_probe_timeout.is_zero() {
            return Err(Error::Config(
                "Duration probe timeout must be greater than 0".to_string(),
            ));
        }

        if self.duration_probe_timeout > MAX_DURATION_PROBE_TIMEOUT {
            return Err(Error::Config(
                "Duration probe timeout exceeds maximum of 60 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_cache_segment(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Config(format!("{} cannot be empty", label)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::Config(format!(
            "{} cannot contain whitespace, got '{}'",
            label, value
        )));
    }
    Ok(())
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature to use the bridge-desktop default. \
             Browser: inject the host's implementation.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::BridgeSetup(format!("HTTP client: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing("HttpClient", "offline cache network access"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_cache_storage() -> Result<Arc<dyn CacheStorage>> {
    Ok(Arc::new(bridge_desktop::MemoryCacheStorage::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_cache_storage() -> Result<Arc<dyn CacheStorage>> {
    Err(capability_missing("CacheStorage", "the offline cache"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_object_urls() -> Result<Arc<dyn ObjectUrlProvider>> {
    Ok(Arc::new(bridge_desktop::BlobUrlRegistry::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_object_urls() -> Result<Arc<dyn ObjectUrlProvider>> {
    Err(capability_missing("ObjectUrlProvider", "playable track URLs"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_probe(urls: Arc<dyn ObjectUrlProvider>) -> Result<Arc<dyn MediaProbe>> {
    Ok(Arc::new(bridge_desktop::LoftyMediaProbe::new(urls)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_probe(_urls: Arc<dyn ObjectUrlProvider>) -> Result<Arc<dyn MediaProbe>> {
    Err(capability_missing("MediaProbe", "track duration extraction"))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database: Option<DatabaseLocation>,
    cache_prefix: Option<String>,
    cache_version: Option<String>,
    scope: Option<String>,
    precache_urls: Vec<String>,
    duration_probe_timeout: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    object_urls: Option<Arc<dyn ObjectUrlProvider>>,
    media_probe: Option<Arc<dyn MediaProbe>>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite database file.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/path/to/musicist.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database = Some(DatabaseLocation::File(path.into()));
        self
    }

    /// Uses a private in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.database = Some(DatabaseLocation::InMemory);
        self
    }

    /// Sets the cache name prefix.
    ///
    /// Default: `musicist`
    pub fn cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = Some(prefix.into());
        self
    }

    /// Sets the cache version.
    ///
    /// Default: `v3`. Activating a worker with a new version deletes every
    /// cache generation with a different name.
    pub fn cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = Some(version.into());
        self
    }

    /// Sets the scope synthetic cache URLs are rooted at.
    ///
    /// Default: `/`
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the URLs fetched into the general cache on install.
    pub fn precache_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the bound on duration extraction for one upload.
    ///
    /// Default: 3 seconds
    pub fn duration_probe_timeout(mut self, timeout: Duration) -> Self {
        self.duration_probe_timeout = Some(timeout);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    pub fn object_urls(mut self, urls: Arc<dyn ObjectUrlProvider>) -> Self {
        self.object_urls = Some(urls);
        self
    }

    pub fn media_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.media_probe = Some(probe);
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No database location was set
    /// - A bridge is missing and no desktop default is available
    /// - Validation fails
    pub fn build(self) -> Result<CoreConfig> {
        let database = self.database.ok_or_else(|| {
            Error::Config(
                "Database path is required. Use .database_path() or .in_memory() to set it."
                    .to_string(),
            )
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let cache_storage = match self.cache_storage {
            Some(storage) => storage,
            None => provide_default_cache_storage()?,
        };

        let object_urls = match self.object_urls {
            Some(urls) => urls,
            None => provide_default_object_urls()?,
        };

        let media_probe = match self.media_probe {
            Some(probe) => probe,
            None => provide_default_media_probe(Arc::clone(&object_urls))?,
        };

        let config = CoreConfig {
            database,
            cache_prefix: self
                .cache_prefix
                .unwrap_or_else(|| DEFAULT_CACHE_PREFIX.to_string()),
            cache_version: self
                .cache_version
                .unwrap_or_else(|| DEFAULT_CACHE_VERSION.to_string()),
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            precache_urls: self.precache_urls,
            duration_probe_timeout: self
                .duration_probe_timeout
                .unwrap_or(DEFAULT_DURATION_PROBE_TIMEOUT),
            http_client,
            cache_storage,
            object_urls,
            media_probe,
        };

        config.validate()?;

        Ok(config)
    }
}
