//! # Track Database
//!
//! One SQLite database holds both stores: `audio_files` (blob store) and
//! `tracks` (metadata store). Sharing a database is what lets a track's
//! audio and metadata be written and deleted in a single transaction.
//!
//! [`create_pool`] is the explicit initialization step. If it fails the
//! environment cannot host the library and the error is
//! [`LibraryError::UnsupportedEnvironment`]; failures after that point are
//! ordinary [`LibraryError::Database`] errors.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("musicist.db")).await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    /// Private to the pool that opened it; gone when the pool closes.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub target: DatabaseTarget,
    /// Upper bound for file databases. Memory databases always use one
    /// connection, since each `:memory:` connection is a separate database.
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Idle connections are closed after this long. File databases only.
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            target: DatabaseTarget::File(path.into()),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            target: DatabaseTarget::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.target == DatabaseTarget::Memory
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.target {
            DatabaseTarget::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            DatabaseTarget::Memory => SqliteConnectOptions::new().in_memory(true),
        };
        options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.target {
            // The only connection holds the data; never let it be recycled.
            DatabaseTarget::Memory => options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            DatabaseTarget::File(_) => options
                .max_connections(self.max_connections.max(1))
                .idle_timeout(self.idle_timeout),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Open the database, apply migrations and verify a round trip.
///
/// # Errors
///
/// - `UnsupportedEnvironment` if the database cannot be opened
/// - `Migration` if the schema cannot be applied
/// - `Database` if the first query fails
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool> {
    info!(target_db = ?config.target, "Opening track database");

    let pool = config
        .pool_options()
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            warn!(error = %e, "Track database unavailable");
            LibraryError::UnsupportedEnvironment(format!("cannot open {:?}: {}", config.target, e))
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        warn!(error = %e, "Schema migration failed");
        LibraryError::from(e)
    })?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    debug!(connections = pool.size(), "Track database ready");
    Ok(pool)
}

/// A fresh private in-memory database with the schema applied.
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(DatabaseConfig::in_memory()).await
}
