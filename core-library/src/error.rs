use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// A storage transaction failed and was rolled back. Never retried.
    #[error("Storage transaction failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The track database could not be opened at all.
    #[error("Storage unavailable in this environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("No audio stored for track {0}")]
    AudioMissing(String),

    #[error("Invalid track record: {0}")]
    InvalidTrack(String),

    #[error("Host bridge failed: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
