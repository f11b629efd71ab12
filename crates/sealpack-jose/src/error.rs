//! Error types for the JOSE layer.

use thiserror::Error;

/// Errors that can occur while handling keys and JWE containers.
#[derive(Debug, Error)]
pub enum JoseError {
    /// No recipient public keys were supplied.
    #[error("public keys must be provided to encrypt a packet")]
    MissingPublicKeys,

    /// A key could not be parsed or is of an unsupported type.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The container is structurally invalid.
    #[error("malformed JWE: {0}")]
    MalformedJwe(String),

    /// An `alg` or `enc` value this crate does not implement.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Encryption failed.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Key unwrap or content authentication failed.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for JOSE operations.
pub type Result<T> = std::result::Result<T, JoseError>;
