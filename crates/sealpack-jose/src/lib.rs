//! # Sealpack JOSE
//!
//! Keys, key wrapping and multi-recipient JWE containers.
//!
//! ## Overview
//!
//! A Sealpack envelope carries its encrypted values in one JWE that every
//! recipient device can open. This crate provides the pieces to build and
//! open that container:
//!
//! - **Keys**: recipient public keys in PKCS #1 PEM, SPKI PEM or JWK form are
//!   normalized to SubjectPublicKeyInfo and identified by their RFC 7638
//!   thumbprint
//! - **Content encryption**: A256GCM (default) or A256CBC-HS512
//! - **Key wrapping**: RSA-OAEP, RSA-OAEP-256 and ECDH-ES+A256KW on X25519
//! - **Containers**: general and flattened JWE JSON serializations, with
//!   flattened input normalized to general
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealpack_jose::{encrypt, KeyNormalizer, PrivateKey, SealOptions};
//!
//! # fn main() -> sealpack_jose::Result<()> {
//! # let device_pem = "";
//! # let private_pem = "";
//! let keys = KeyNormalizer::default().normalize(&[device_pem])?;
//! let jwe = encrypt(b"[\"secret\"]", &keys, SealOptions::default())?;
//!
//! let key = PrivateKey::parse(private_pem)?;
//! let plaintext = jwe.decrypt(&key)?;
//! # Ok(())
//! # }
//! ```

mod b64;

pub mod cipher;
pub mod error;
pub mod jwe;
pub mod jwk;
pub mod keys;
pub mod wrap;

pub use cipher::ContentAlgorithm;
pub use error::{JoseError, Result};
pub use jwe::{encrypt, FlattenedJwe, GeneralJwe, Header, Recipient, SealOptions, WireJwe};
pub use jwk::{Jwk, KeyType};
pub use keys::{EncryptionKey, JwkJson, KeyEncoding, KeyNormalizer, Pkcs1Pem, PrivateKey, PublicKey, SpkiPem};
pub use wrap::KeyAlgorithm;
