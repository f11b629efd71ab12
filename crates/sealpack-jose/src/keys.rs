//! Recipient and decryption keys.
//!
//! Public keys arrive from device registries in several encodings. Each one
//! is recognized by a [`KeyEncoding`] and converted to DER-encoded
//! SubjectPublicKeyInfo, which is the canonical form every other part of the
//! crate works with. New encodings plug into a [`KeyNormalizer`] without
//! touching the encryption path.

use std::fmt;

use pem::{EncodeConfig, LineEnding, Pem};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, PrivateKeyInfo};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use spki::der::asn1::{BitString, OctetStringRef};
use spki::der::{Decode, Encode};
use spki::{
    AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef,
};
use tracing::debug;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{JoseError, Result};
use crate::jwk::{Jwk, KeyType};

/// rsaEncryption (PKCS #1).
pub const RSA_ENCRYPTION_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// id-X25519 (RFC 8410).
pub const X25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.110");

const PKCS1_PUBLIC_TAG: &str = "RSA PUBLIC KEY";
const SPKI_TAG: &str = "PUBLIC KEY";
const PKCS8_TAG: &str = "PRIVATE KEY";
const PKCS1_PRIVATE_TAG: &str = "RSA PRIVATE KEY";

fn invalid(e: impl fmt::Display) -> JoseError {
    JoseError::InvalidKey(e.to_string())
}

// ============================================================================
// Public keys
// ============================================================================

/// A parsed public key of a supported type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// RSA, wrapped to with RSA-OAEP.
    Rsa(RsaPublicKey),
    /// X25519, wrapped to with ECDH-ES+A256KW.
    X25519(X25519PublicKey),
}

impl PublicKey {
    /// Parse DER-encoded SubjectPublicKeyInfo, dispatching on the algorithm
    /// OID.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let info = SubjectPublicKeyInfoRef::try_from(der).map_err(invalid)?;
        let oid = info.algorithm.oid;

        if oid == RSA_ENCRYPTION_OID {
            RsaPublicKey::from_public_key_der(der)
                .map(Self::Rsa)
                .map_err(invalid)
        } else if oid == X25519_OID {
            let raw: [u8; 32] = info
                .subject_public_key
                .as_bytes()
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or_else(|| invalid("X25519 public key must be 32 bytes"))?;
            Ok(Self::X25519(X25519PublicKey::from(raw)))
        } else {
            Err(JoseError::InvalidKey(format!(
                "unsupported public key algorithm {oid}"
            )))
        }
    }

    /// Parse a public JWK.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        match jwk.kty {
            KeyType::Rsa => {
                let n = jwk.member("n", jwk.n.as_deref())?;
                let e = jwk.member("e", jwk.e.as_deref())?;
                RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
                    .map(Self::Rsa)
                    .map_err(invalid)
            }
            KeyType::Okp => Ok(Self::X25519(X25519PublicKey::from(jwk.x25519_public()?))),
            other => Err(JoseError::InvalidKey(format!(
                "unsupported key type {other:?}"
            ))),
        }
    }

    /// Encode as DER SubjectPublicKeyInfo.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        match self {
            Self::Rsa(key) => key
                .to_public_key_der()
                .map(|doc| doc.as_bytes().to_vec())
                .map_err(invalid),
            Self::X25519(key) => {
                let info = SubjectPublicKeyInfoOwned {
                    algorithm: AlgorithmIdentifierOwned {
                        oid: X25519_OID,
                        parameters: None,
                    },
                    subject_public_key: BitString::from_bytes(key.as_bytes()).map_err(invalid)?,
                };
                info.to_der().map_err(invalid)
            }
        }
    }

    /// The public JWK.
    pub fn to_jwk(&self) -> Jwk {
        match self {
            Self::Rsa(key) => Jwk::rsa(&key.n().to_bytes_be(), &key.e().to_bytes_be()),
            Self::X25519(key) => Jwk::x25519(key.as_bytes()),
        }
    }

    /// The RFC 7638 thumbprint of [`Self::to_jwk`].
    pub fn thumbprint(&self) -> Result<String> {
        self.to_jwk().thumbprint()
    }
}

/// A recipient public key in canonical form.
///
/// Holds the DER SubjectPublicKeyInfo, the parsed key and its `kid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    public: PublicKey,
    spki: Vec<u8>,
    kid: String,
}

impl EncryptionKey {
    /// Build from a parsed public key.
    pub fn from_public_key(public: PublicKey) -> Result<Self> {
        let spki = public.to_spki_der()?;
        let kid = public.thumbprint()?;
        Ok(Self { public, spki, kid })
    }

    /// Build from DER SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        Self::from_public_key(PublicKey::from_spki_der(der)?)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn spki_der(&self) -> &[u8] {
        &self.spki
    }

    /// The key ID written into recipient headers.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The canonical SPKI PEM text.
    pub fn to_pem(&self) -> String {
        let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
        pem::encode_config(&Pem::new(SPKI_TAG, self.spki.clone()), config)
    }
}

// ============================================================================
// Encodings
// ============================================================================

/// A textual public key encoding that can be converted to SPKI DER.
pub trait KeyEncoding: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether `raw` looks like this encoding.
    fn recognizes(&self, raw: &str) -> bool;

    /// Convert `raw` to DER SubjectPublicKeyInfo.
    fn to_spki_der(&self, raw: &str) -> Result<Vec<u8>>;
}

fn has_pem_label(raw: &str, tag: &str) -> bool {
    raw.trim_start().starts_with(&format!("-----BEGIN {tag}-----"))
}

fn parse_pem(raw: &str, tag: &str) -> Result<Pem> {
    let pem = pem::parse(raw.trim()).map_err(invalid)?;
    if pem.tag() != tag {
        return Err(JoseError::InvalidKey(format!(
            "expected a {tag} PEM block, found {}",
            pem.tag()
        )));
    }
    Ok(pem)
}

/// PKCS #1 `RSA PUBLIC KEY` PEM. Re-wrapped under an rsaEncryption
/// algorithm identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pkcs1Pem;

impl KeyEncoding for Pkcs1Pem {
    fn name(&self) -> &'static str {
        "pkcs1-pem"
    }

    fn recognizes(&self, raw: &str) -> bool {
        has_pem_label(raw, PKCS1_PUBLIC_TAG)
    }

    fn to_spki_der(&self, raw: &str) -> Result<Vec<u8>> {
        let pem = parse_pem(raw, PKCS1_PUBLIC_TAG)?;
        let key = RsaPublicKey::from_pkcs1_der(pem.contents()).map_err(invalid)?;
        PublicKey::Rsa(key).to_spki_der()
    }
}

/// SubjectPublicKeyInfo `PUBLIC KEY` PEM. Already canonical.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpkiPem;

impl KeyEncoding for SpkiPem {
    fn name(&self) -> &'static str {
        "spki-pem"
    }

    fn recognizes(&self, raw: &str) -> bool {
        has_pem_label(raw, SPKI_TAG)
    }

    fn to_spki_der(&self, raw: &str) -> Result<Vec<u8>> {
        Ok(parse_pem(raw, SPKI_TAG)?.into_contents())
    }
}

/// A public JWK as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwkJson;

impl KeyEncoding for JwkJson {
    fn name(&self) -> &'static str {
        "jwk"
    }

    fn recognizes(&self, raw: &str) -> bool {
        raw.trim_start().starts_with('{')
    }

    fn to_spki_der(&self, raw: &str) -> Result<Vec<u8>> {
        let jwk = Jwk::from_json(raw)?;
        PublicKey::from_jwk(&jwk.to_public())?.to_spki_der()
    }
}

/// Converts raw public key strings into [`EncryptionKey`]s.
pub struct KeyNormalizer {
    encodings: Vec<Box<dyn KeyEncoding>>,
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::empty()
            .with_encoding(Pkcs1Pem)
            .with_encoding(SpkiPem)
            .with_encoding(JwkJson)
    }
}

impl fmt::Debug for KeyNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.encodings.iter().map(|e| e.name()))
            .finish()
    }
}

impl KeyNormalizer {
    /// A normalizer that recognizes nothing.
    pub fn empty() -> Self {
        Self {
            encodings: Vec::new(),
        }
    }

    /// Register an additional encoding. Earlier registrations win.
    pub fn with_encoding(mut self, encoding: impl KeyEncoding + 'static) -> Self {
        self.encodings.push(Box::new(encoding));
        self
    }

    /// Normalize one key.
    pub fn normalize_one(&self, raw: &str) -> Result<EncryptionKey> {
        let encoding = self
            .encodings
            .iter()
            .find(|e| e.recognizes(raw))
            .ok_or_else(|| JoseError::InvalidKey("unrecognized public key encoding".to_string()))?;

        let key = EncryptionKey::from_spki_der(&encoding.to_spki_der(raw)?)?;
        debug!(encoding = encoding.name(), kid = key.kid(), "normalized public key");
        Ok(key)
    }

    /// Normalize every key, preserving order.
    ///
    /// Fails with [`JoseError::MissingPublicKeys`] on an empty list and with
    /// [`JoseError::InvalidKey`], naming the position, as soon as one key
    /// cannot be converted.
    pub fn normalize<K: AsRef<str>>(&self, raw: &[K]) -> Result<Vec<EncryptionKey>> {
        if raw.is_empty() {
            return Err(JoseError::MissingPublicKeys);
        }
        raw.iter()
            .enumerate()
            .map(|(index, k)| {
                self.normalize_one(k.as_ref()).map_err(|e| match e {
                    JoseError::InvalidKey(msg) => JoseError::InvalidKey(format!("key {index}: {msg}")),
                    other => other,
                })
            })
            .collect()
    }
}

// ============================================================================
// Private keys
// ============================================================================

/// A recipient's private key.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    X25519(StaticSecret),
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa(_) => f.write_str("PrivateKey::Rsa(..)"),
            Self::X25519(_) => f.write_str("PrivateKey::X25519(..)"),
        }
    }
}

impl PrivateKey {
    /// Parse PEM (PKCS #8 or PKCS #1) or JWK text.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim_start().starts_with('{') {
            Self::from_jwk(&Jwk::from_json(raw)?)
        } else {
            Self::from_pem(raw)
        }
    }

    /// Parse a `PRIVATE KEY` or `RSA PRIVATE KEY` PEM block.
    pub fn from_pem(raw: &str) -> Result<Self> {
        let pem = pem::parse(raw.trim()).map_err(invalid)?;
        match pem.tag() {
            PKCS8_TAG => Self::from_pkcs8_der(pem.contents()),
            PKCS1_PRIVATE_TAG => RsaPrivateKey::from_pkcs1_der(pem.contents())
                .map(Self::Rsa)
                .map_err(invalid),
            other => Err(JoseError::InvalidKey(format!(
                "unsupported private key PEM block {other}"
            ))),
        }
    }

    /// Parse DER PKCS #8, dispatching on the algorithm OID.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der).map_err(invalid)?;
        let oid = info.algorithm.oid;

        if oid == RSA_ENCRYPTION_OID {
            RsaPrivateKey::from_pkcs8_der(der)
                .map(Self::Rsa)
                .map_err(invalid)
        } else if oid == X25519_OID {
            // RFC 8410: the private key is itself an OCTET STRING.
            let inner = OctetStringRef::from_der(info.private_key).map_err(invalid)?;
            let raw: [u8; 32] = inner
                .as_bytes()
                .try_into()
                .map_err(|_| invalid("X25519 private key must be 32 bytes"))?;
            Ok(Self::X25519(StaticSecret::from(raw)))
        } else {
            Err(JoseError::InvalidKey(format!(
                "unsupported private key algorithm {oid}"
            )))
        }
    }

    /// Parse a private JWK.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        match jwk.kty {
            KeyType::Okp => Ok(Self::X25519(StaticSecret::from(jwk.x25519_private()?))),
            KeyType::Rsa => {
                let int = |name: &str, value: Option<&str>| {
                    jwk.member(name, value).map(|b| BigUint::from_bytes_be(&b))
                };
                let n = int("n", jwk.n.as_deref())?;
                let e = int("e", jwk.e.as_deref())?;
                let d = int("d", jwk.d.as_deref())?;
                let p = int("p", jwk.p.as_deref())?;
                let q = int("q", jwk.q.as_deref())?;
                RsaPrivateKey::from_components(n, e, d, vec![p, q])
                    .map(Self::Rsa)
                    .map_err(invalid)
            }
            other => Err(JoseError::InvalidKey(format!(
                "unsupported key type {other:?}"
            ))),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            Self::X25519(secret) => PublicKey::X25519(X25519PublicKey::from(secret)),
        }
    }

    /// The `kid` of the matching public key.
    pub fn kid(&self) -> Result<String> {
        self.public_key().thumbprint()
    }
}
