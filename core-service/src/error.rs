use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Service could not start: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// The host cannot provide durable storage; the app should tell the
    /// user offline playback is unavailable.
    pub fn is_unsupported_environment(&self) -> bool {
        matches!(self, CoreError::Library(LibraryError::UnsupportedEnvironment(_)))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
