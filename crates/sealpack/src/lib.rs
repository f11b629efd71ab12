//! # Sealpack
//!
//! Selective-field encryption for JSON documents.
//!
//! ## Overview
//!
//! Sealpack encrypts chosen fields of a JSON document to one or more
//! recipient devices while leaving the rest readable, so untrusted relays can
//! route and inspect packets without seeing their secrets:
//!
//! - **Extract**: the values at a list of JSON Pointers are pulled out and
//!   replaced by `{"$ref": "#/encrypted/<n>"}` markers
//! - **Seal**: the extracted values are encrypted once and the content key is
//!   wrapped to every recipient (RSA-OAEP or ECDH-ES on X25519)
//! - **Open**: general and flattened JWE containers are both accepted
//! - **Resolve**: markers are replaced by the decrypted values, restoring
//!   the original document
//!
//! ## Envelope
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "plain": {"a": {"$ref": "#/encrypted/0"}, "b": "public"},
//!   "encrypted": {"protected": "...", "recipients": [...], "iv": "...", "ciphertext": "...", "tag": "..."}
//! }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealpack::EncryptionService;
//! use serde_json::json;
//!
//! # fn main() -> sealpack::Result<()> {
//! # let device_public_pem = "";
//! # let device_private_pem = "";
//! let sender = EncryptionService::new(None)?;
//! let doc = json!({"a": "secret", "b": "public"});
//! let envelope = sender.encrypt_packet(&doc, &["/a"], &[device_public_pem])?;
//!
//! let device = EncryptionService::new(Some(device_private_pem))?;
//! assert_eq!(device.decrypt_envelope(&envelope)?, doc);
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! - `sealpack::core` - Pointers, markers, extraction and resolution
//! - `sealpack::jose` - Keys, key wrapping and JWE containers
//! - `sealpack::client` - Configuration, remote API, signatures and URLs

pub mod ability;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod service;

// Re-export component crates
pub use sealpack_client as client;
pub use sealpack_core as core;
pub use sealpack_jose as jose;

pub use ability::Ability;
pub use envelope::{Envelope, VERSION};
pub use error::{Result, SealError};
pub use registry::AbilityRegistry;
pub use service::EncryptionService;

pub use sealpack_client::{AbilityConfig, EncryptionConfig};
pub use sealpack_core::ExtractPolicy;
pub use sealpack_jose::{ContentAlgorithm, KeyAlgorithm, KeyNormalizer};
