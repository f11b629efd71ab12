//! Error types for Sealpack.

use sealpack_client::ClientError;
use sealpack_core::CoreError;
use sealpack_jose::JoseError;
use thiserror::Error;

/// Errors that can occur while sealing, opening or publishing packets.
#[derive(Debug, Error)]
pub enum SealError {
    /// The document or envelope was absent.
    #[error("input must be provided to encrypt or decrypt the packet")]
    BadInput,

    /// A path to extract does not address a value in the document.
    #[error("a path to encrypt was provided that could not be found: {0}")]
    BadPath(String),

    /// No recipient public keys were supplied.
    #[error("public keys must be provided to encrypt a packet")]
    MissingPublicKeys,

    /// Decryption was requested without a configured private key.
    #[error("a private key must be configured during init to decrypt the packet")]
    MissingPrivateKey,

    /// No recipient could be opened, or the ciphertext failed to
    /// authenticate.
    #[error("decryption failed: {0}")]
    DecryptionFailure(String),

    /// A public or private key could not be used.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The envelope or its container is structurally invalid.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope was written by an incompatible protocol version.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(String),

    /// A reference marker does not resolve against the decrypted values.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Encryption failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Device-key lookup failed.
    #[error("error during call to get device keys: {0}")]
    DeviceKeys(String),

    /// Publishing a plain packet failed.
    #[error("error during call to publish packet to user: {0}")]
    PublishToUser(String),

    /// Publishing an encrypted packet failed.
    #[error("error during call to publish an encrypted packet to user: {0}")]
    EncryptedPublishToUser(String),

    /// Several abilities are configured and none was named.
    #[error("a config key must be provided when more than one ability is configured")]
    ConfigKeyMissing,

    /// No ability is configured under the requested name.
    #[error("no ability configured with name: {0}")]
    UnknownAbility(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<CoreError> for SealError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BadPath(path) => Self::BadPath(path),
            CoreError::UnresolvedReference(target) => Self::UnresolvedReference(target),
        }
    }
}

impl From<JoseError> for SealError {
    fn from(err: JoseError) -> Self {
        match err {
            JoseError::MissingPublicKeys => Self::MissingPublicKeys,
            JoseError::InvalidKey(msg) => Self::InvalidKey(msg),
            JoseError::MalformedJwe(msg) | JoseError::UnsupportedAlgorithm(msg) => {
                Self::MalformedEnvelope(msg)
            }
            JoseError::EncryptionError(msg) => Self::Encryption(msg),
            JoseError::DecryptionError(msg) => Self::DecryptionFailure(msg),
            JoseError::SerializationError(e) => Self::Serialization(e),
        }
    }
}

impl From<ClientError> for SealError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::DeviceKeys(msg) => Self::DeviceKeys(msg),
            ClientError::PublishToUser(msg) => Self::PublishToUser(msg),
            ClientError::EncryptedPublishToUser(msg) => Self::EncryptedPublishToUser(msg),
            ClientError::Config(msg) => Self::Config(msg),
        }
    }
}

/// Result type for Sealpack operations.
pub type Result<T> = std::result::Result<T, SealError>;
