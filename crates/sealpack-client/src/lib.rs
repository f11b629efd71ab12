//! # Sealpack Client
//!
//! The I/O around an ability: configuration, the remote integration API,
//! callback signature checks and redirect URLs.
//!
//! ## Key Types
//!
//! - [`AbilityConfig`] - Explicit per-ability settings, loadable from TOML
//! - [`AbilityApi`] - Device-key lookup and packet publishing
//! - [`HttpAbilityApi`] - [`AbilityApi`] over reqwest
//! - [`memory::MemoryAbilityApi`] - [`AbilityApi`] for tests
//! - [`SignatureVerifier`] - HMAC-SHA256 callback signatures
//! - [`UrlBuilder`] - Enable-flow redirect URLs

pub mod config;
pub mod error;
pub mod signature;
pub mod transport;
pub mod url;

pub use config::{AbilityConfig, EncryptionConfig};
pub use error::{ClientError, Result};
pub use signature::SignatureVerifier;
pub use transport::{memory, AbilityApi, HttpAbilityApi};
pub use url::UrlBuilder;
