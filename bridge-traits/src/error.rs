use thiserror::Error;

/// Failure reported by a host bridge implementation.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host cannot provide this capability at all.
    #[error("Not available on this host: {0}")]
    NotAvailable(String),

    #[error("Host operation failed: {0}")]
    OperationFailed(String),

    /// Transport-level failure. HTTP error statuses are not errors.
    #[error("Network unreachable: {0}")]
    Network(String),

    /// The receiving end of a message port is gone.
    #[error("Message port closed: {0}")]
    ChannelClosed(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
