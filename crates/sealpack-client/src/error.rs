//! Error types for the client layer.

use thiserror::Error;

/// Errors that can occur while talking to the remote service or loading
/// configuration.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The device-key lookup failed.
    #[error("error during call to get device keys: {0}")]
    DeviceKeys(String),

    /// Publishing a plain packet failed.
    #[error("error during call to publish packet to user: {0}")]
    PublishToUser(String),

    /// Publishing an encrypted packet failed.
    #[error("error during call to publish an encrypted packet to user: {0}")]
    EncryptedPublishToUser(String),

    /// The configuration could not be read or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
