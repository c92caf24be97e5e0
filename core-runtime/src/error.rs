use thiserror::Error;

/// Setup failures, reported before any storage is opened.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No implementation was supplied for a required bridge and no desktop
    /// fallback is compiled in.
    #[error("No {capability} bridge configured: {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A fallback bridge could not be constructed.
    #[error("Bridge setup failed: {0}")]
    BridgeSetup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
