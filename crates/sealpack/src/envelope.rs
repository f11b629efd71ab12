//! The Sealpack envelope.
//!
//! ```json
//! { "version": "2.0.0", "plain": { ... }, "encrypted": { <JWE> } }
//! ```
//!
//! `plain` is the document with a `{"$ref": "#/encrypted/<n>"}` marker at
//! every extracted location. `encrypted` is a JWE whose plaintext is the JSON
//! array of extracted values.

use sealpack_jose::{GeneralJwe, WireJwe};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SealError};

/// The version written into new envelopes.
pub const VERSION: &str = "2.0.0";

/// Envelopes with this major version can be opened.
pub const SUPPORTED_MAJOR: u64 = 2;

/// An encrypted packet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub plain: Value,
    pub encrypted: WireJwe,
}

impl Envelope {
    pub fn new(plain: Value, encrypted: GeneralJwe) -> Self {
        Self {
            version: VERSION.to_string(),
            plain,
            encrypted: encrypted.into(),
        }
    }

    /// Parse an envelope from JSON.
    ///
    /// The version is checked before the container so that envelopes from a
    /// future protocol report [`SealError::UnsupportedVersion`] even if their
    /// layout has changed.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = match value {
            Value::Null => return Err(SealError::BadInput),
            Value::Object(object) => object,
            _ => {
                return Err(SealError::MalformedEnvelope(
                    "envelope must be a JSON object".to_string(),
                ))
            }
        };

        match object.get("version") {
            Some(Value::String(version)) => check_version(version)?,
            Some(_) => {
                return Err(SealError::MalformedEnvelope(
                    "`version` must be a string".to_string(),
                ))
            }
            None => {
                return Err(SealError::MalformedEnvelope(
                    "missing `version`".to_string(),
                ))
            }
        }

        Self::deserialize(value).map_err(|e| SealError::MalformedEnvelope(e.to_string()))
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn check_version(&self) -> Result<()> {
        check_version(&self.version)
    }

    /// The container in general serialization.
    pub fn general(&self) -> GeneralJwe {
        self.encrypted.clone().into_general()
    }

    /// This envelope with a flattened container, if it has exactly one
    /// recipient.
    pub fn to_flattened(&self) -> Option<Self> {
        let flattened = self.general().to_flattened()?;
        Some(Self {
            version: self.version.clone(),
            plain: self.plain.clone(),
            encrypted: WireJwe::Flattened(flattened),
        })
    }
}

fn check_version(version: &str) -> Result<()> {
    let major = version.split('.').next().and_then(|m| m.parse::<u64>().ok());
    if major == Some(SUPPORTED_MAJOR) {
        Ok(())
    } else {
        Err(SealError::UnsupportedVersion(version.to_string()))
    }
}
