//! # Sealpack Testkit
//!
//! Testing utilities for Sealpack.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Envelopes written by another JOSE implementation, with the documents they hold
//! - **Generators**: Proptest strategies for documents and locator sets
//! - **Fixtures**: Recipient keys in every accepted encoding, plus generated devices
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sealpack_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, detail) in verify_all_vectors() {
//!     assert!(passed, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealpack_testkit::{SealParams, TestFixture};
//!
//! proptest! {
//!     #[test]
//!     fn round_trip(params: SealParams) {
//!         let fixture = TestFixture::new();
//!         let envelope = fixture.sender
//!             .encrypt_packet(&params.document, &params.paths, &fixture.public_keys())
//!             .unwrap();
//!         prop_assert_eq!(fixture.rsa.decrypt_envelope(&envelope).unwrap(), params.document);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sealpack_testkit::fixtures::TestFixture;
//! use serde_json::json;
//!
//! let fixture = TestFixture::new();
//! let doc = json!({"secret": "s"});
//! let envelope = fixture.seal(&doc, &["/secret"]);
//! assert_eq!(fixture.x25519.decrypt_envelope(&envelope).unwrap(), doc);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{memory_ability, multi_device_fixtures, Device, TestFixture};
pub use generators::{document, json_value, pick_paths, SealParams};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, GoldenVector};
