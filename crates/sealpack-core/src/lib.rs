//! # Sealpack Core
//!
//! Pure document primitives for selective-field encryption: JSON pointers,
//! reference markers, field extraction and reference resolution.
//!
//! This crate contains no cryptography and no I/O. It only rewrites JSON
//! trees.
//!
//! ## Key Types
//!
//! - [`Pointer`] - A parsed RFC 6901 JSON Pointer
//! - [`Extraction`] - A marked document plus the values pulled out of it
//! - [`ExtractPolicy`] - Which existing values count as extractable
//!
//! ## Markers
//!
//! Each extracted value is replaced by a single-key object
//! `{"$ref": "#/encrypted/<n>"}` where `n` indexes the extracted values. Keys
//! in the caller's document that already look like `$ref` are escaped before
//! extraction (see [`escape`]) so they can never be mistaken for markers.
//!
//! ```rust
//! use sealpack_core::{extract, resolve, ExtractPolicy};
//! use serde_json::json;
//!
//! let doc = json!({"a": "secret", "b": "public"});
//! let extraction = extract(&doc, &["/a"], ExtractPolicy::Present).unwrap();
//!
//! assert_eq!(extraction.marked, json!({"a": {"$ref": "#/encrypted/0"}, "b": "public"}));
//! assert_eq!(extraction.values, vec![json!("secret")]);
//!
//! let restored = resolve(&extraction.marked, &extraction.values).unwrap();
//! assert_eq!(restored, doc);
//! ```

pub mod error;
pub mod escape;
pub mod extract;
pub mod marker;
pub mod pointer;
pub mod resolve;

pub use error::{CoreError, Result};
pub use escape::{escape_refs, unescape_refs};
pub use extract::{extract, ExtractPolicy, Extraction};
pub use marker::{marker, marker_indices, MarkerTarget, ENCRYPTED_PREFIX, REF_KEY};
pub use pointer::Pointer;
pub use resolve::resolve;
