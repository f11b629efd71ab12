//! Error types for Sealpack Core.

use thiserror::Error;

/// Errors that can occur while rewriting documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A path to extract does not address a value in the document.
    #[error("a path to encrypt was provided that could not be found: {0}")]
    BadPath(String),

    /// A reference marker could not be resolved against the extracted values.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
