//! Error types for the relay server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The hub task has stopped and no longer accepts commands
    #[error("Hub is not running")]
    HubUnavailable,

    /// An envelope could not be serialized or parsed
    #[error("Envelope codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Binding or serving the listener failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
