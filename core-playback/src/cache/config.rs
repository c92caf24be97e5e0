//! Offline cache configuration

use core_runtime::config::{CoreConfig, DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_VERSION, DEFAULT_SCOPE};

/// URL schemes owned by the browser that are never intercepted.
pub const DEFAULT_SKIPPED_SCHEMES: &[&str] = &["chrome-extension://"];

/// Configuration for the offline cache worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineCacheConfig {
    /// Prefix shared by every cache generation (default: "musicist")
    pub cache_prefix: String,

    /// Generation label; changing it invalidates every stored entry
    pub cache_version: String,

    /// Path prefix the worker controls; always ends with `/`
    pub scope: String,

    /// URLs fetched and stored during install
    pub precache_urls: Vec<String>,

    /// Request URL prefixes that bypass the worker
    pub skipped_schemes: Vec<String>,
}

impl Default for OfflineCacheConfig {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            precache_urls: Vec::new(),
            skipped_schemes: DEFAULT_SKIPPED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl OfflineCacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the worker settings from the core configuration.
    pub fn from_core(config: &CoreConfig) -> Self {
        Self::default()
            .with_prefix(config.cache_prefix.clone())
            .with_version(config.cache_version.clone())
            .with_scope(config.scope.clone())
            .with_precache_urls(config.precache_urls.clone())
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = version.into();
        self
    }

    /// Set the controlled scope. A missing trailing `/` is added.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let mut scope = scope.into();
        if !scope.ends_with('/') {
            scope.push('/');
        }
        self.scope = scope;
        self
    }

    pub fn with_precache_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skipped_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.skipped_schemes.push(scheme.into());
        self
    }

    /// Name of the general asset cache, e.g. `musicist-v3`.
    pub fn general_cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Name of the audio cache, e.g. `musicist-audio-v3`.
    pub fn audio_cache_name(&self) -> String {
        format!("{}-audio-{}", self.cache_prefix, self.cache_version)
    }

    /// Key under which a cache-audio message stores its bytes.
    pub fn cached_audio_url(&self, filename: &str) -> String {
        format!("{}cached-audio/{}", self.scope, filename)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_prefix.trim().is_empty() {
            return Err("cache_prefix cannot be empty".to_string());
        }

        if self.cache_version.trim().is_empty() {
            return Err("cache_version cannot be empty".to_string());
        }

        if !self.scope.starts_with('/') && !self.scope.contains("://") {
            return Err(format!(
                "scope must be a path or absolute URL: {}",
                self.scope
            ));
        }

        if self.general_cache_name() == self.audio_cache_name() {
            return Err("general and audio cache names must differ".to_string());
        }

        Ok(())
    }
}
