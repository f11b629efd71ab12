//! JSON Web Keys (RFC 7517) for the key types Sealpack can wrap to.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::b64;
use crate::error::{JoseError, Result};

/// The `kty` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// RSA.
    #[serde(rename = "RSA")]
    Rsa,
    /// Octet key pair (RFC 8037). Sealpack accepts `crv: "X25519"` only.
    #[serde(rename = "OKP")]
    Okp,
    /// Elliptic curve. Parsed so it can be rejected with a clear error.
    #[serde(rename = "EC")]
    Ec,
    /// Symmetric.
    #[serde(rename = "oct")]
    Oct,
}

/// A JSON Web Key.
///
/// Only the members needed by RSA and OKP keys are modelled; anything else
/// in an input JWK is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: KeyType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// OKP public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// RSA modulus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Private exponent (RSA) or private key (OKP).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl Jwk {
    /// A public OKP X25519 key.
    pub fn x25519(public: &[u8; 32]) -> Self {
        Self {
            kty: KeyType::Okp,
            kid: None,
            crv: Some("X25519".to_string()),
            x: Some(b64::encode(public)),
            n: None,
            e: None,
            d: None,
            p: None,
            q: None,
        }
    }

    /// A public RSA key from big-endian modulus and exponent.
    pub fn rsa(n: &[u8], e: &[u8]) -> Self {
        Self {
            kty: KeyType::Rsa,
            kid: None,
            crv: None,
            x: None,
            n: Some(b64::encode(n)),
            e: Some(b64::encode(e)),
            d: None,
            p: None,
            q: None,
        }
    }

    /// Parse a JWK from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| JoseError::InvalidKey(format!("not a JWK: {e}")))
    }

    /// Whether the key carries private material.
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// A copy with private members removed.
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            p: None,
            q: None,
            ..self.clone()
        }
    }

    /// The raw X25519 public key, checking `crv`.
    pub fn x25519_public(&self) -> Result<[u8; 32]> {
        if self.kty != KeyType::Okp || self.crv.as_deref() != Some("X25519") {
            return Err(JoseError::InvalidKey(
                "expected an OKP key on curve X25519".to_string(),
            ));
        }
        fixed_32("x", self.x.as_deref())
    }

    /// The raw X25519 private key.
    pub fn x25519_private(&self) -> Result<[u8; 32]> {
        self.x25519_public()?;
        fixed_32("d", self.d.as_deref())
    }

    /// Decode a required base64url member.
    pub fn member(&self, name: &str, value: Option<&str>) -> Result<Vec<u8>> {
        let value =
            value.ok_or_else(|| JoseError::InvalidKey(format!("JWK is missing `{name}`")))?;
        b64::decode(name, value).map_err(|e| JoseError::InvalidKey(e.to_string()))
    }

    /// RFC 7638 thumbprint: SHA-256 over the required members in
    /// lexicographic order, base64url encoded.
    pub fn thumbprint(&self) -> Result<String> {
        let missing = |name: &str| JoseError::InvalidKey(format!("JWK is missing `{name}`"));

        let canonical = match self.kty {
            KeyType::Rsa => json!({
                "e": self.e.as_deref().ok_or_else(|| missing("e"))?,
                "kty": "RSA",
                "n": self.n.as_deref().ok_or_else(|| missing("n"))?,
            }),
            KeyType::Okp => json!({
                "crv": self.crv.as_deref().ok_or_else(|| missing("crv"))?,
                "kty": "OKP",
                "x": self.x.as_deref().ok_or_else(|| missing("x"))?,
            }),
            other => {
                return Err(JoseError::InvalidKey(format!(
                    "unsupported key type {other:?}"
                )))
            }
        };

        let digest = Sha256::digest(serde_json::to_vec(&canonical)?);
        Ok(b64::encode(digest))
    }
}

fn fixed_32(name: &str, value: Option<&str>) -> Result<[u8; 32]> {
    let value = value.ok_or_else(|| JoseError::InvalidKey(format!("JWK is missing `{name}`")))?;
    let bytes = b64::decode(name, value).map_err(|e| JoseError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| JoseError::InvalidKey(format!("`{name}` must be 32 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7638_example_thumbprint() {
        // Example key from RFC 7638 section 3.1.
        let jwk = Jwk::from_json(
            r#"{
                "kty": "RSA",
                "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
                "e": "AQAB",
                "alg": "RS256",
                "kid": "2011-04-29"
            }"#,
        )
        .unwrap();

        assert_eq!(
            jwk.thumbprint().unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn test_x25519_members() {
        let jwk = Jwk::x25519(&[7u8; 32]);

        assert_eq!(jwk.x25519_public().unwrap(), [7u8; 32]);
        assert!(jwk.x25519_private().is_err());
        assert!(!jwk.is_private());
    }

    #[test]
    fn test_wrong_curve_rejected() {
        let mut jwk = Jwk::x25519(&[7u8; 32]);
        jwk.crv = Some("Ed25519".to_string());

        assert!(matches!(jwk.x25519_public(), Err(JoseError::InvalidKey(_))));
    }

    #[test]
    fn test_to_public_strips_private_members() {
        let mut jwk = Jwk::x25519(&[1u8; 32]);
        jwk.d = Some(b64::encode([2u8; 32]));

        assert!(jwk.is_private());
        assert!(!jwk.to_public().is_private());
        assert_eq!(jwk.to_public().thumbprint().unwrap(), jwk.thumbprint().unwrap());
    }
}
