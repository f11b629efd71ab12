//! Key management (RFC 7518 section 4).
//!
//! The content encryption key is wrapped once per recipient. RSA recipients
//! use RSA-OAEP with SHA-1 or SHA-256. X25519 recipients use ECDH-ES with
//! the derived key wrapping the CEK under AES-256 Key Wrap.

use std::fmt;
use std::str::FromStr;

use aes_kw::KekAes256;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, SharedSecret};

use crate::error::{JoseError, Result};
use crate::jwk::Jwk;
use crate::keys::{PrivateKey, PublicKey};

/// A key management algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// RSAES OAEP with SHA-1 and MGF1-SHA-1.
    #[default]
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    /// RSAES OAEP with SHA-256 and MGF1-SHA-256.
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    /// ECDH-ES on X25519 with AES-256 Key Wrap.
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,
}

/// Agreement PartyUInfo and PartyVInfo (`apu` and `apv`, decoded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyInfo {
    pub apu: Vec<u8>,
    pub apv: Vec<u8>,
}

/// A wrapped CEK, plus the ephemeral key for ECDH-ES.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    pub encrypted_key: Vec<u8>,
    pub epk: Option<Jwk>,
}

impl KeyAlgorithm {
    /// The `alg` header value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::EcdhEsA256Kw => "ECDH-ES+A256KW",
        }
    }

    pub const fn is_rsa(self) -> bool {
        matches!(self, Self::RsaOaep | Self::RsaOaep256)
    }

    /// The algorithm used to wrap to `key`. RSA keys use `rsa_preference`.
    pub fn for_key(key: &PublicKey, rsa_preference: Self) -> Result<Self> {
        match key {
            PublicKey::Rsa(_) if rsa_preference.is_rsa() => Ok(rsa_preference),
            PublicKey::Rsa(_) => Err(JoseError::UnsupportedAlgorithm(format!(
                "{rsa_preference} cannot wrap to an RSA key"
            ))),
            PublicKey::X25519(_) => Ok(Self::EcdhEsA256Kw),
        }
    }

    /// Whether this algorithm can unwrap with `key`.
    pub fn accepts(self, key: &PrivateKey) -> bool {
        matches!(
            (self, key),
            (Self::RsaOaep | Self::RsaOaep256, PrivateKey::Rsa(_))
                | (Self::EcdhEsA256Kw, PrivateKey::X25519(_))
        )
    }

    /// Wrap `cek` to `key`.
    pub fn wrap_key(self, cek: &[u8], key: &PublicKey, party: &PartyInfo) -> Result<Wrapped> {
        let mut rng = rand::thread_rng();
        match (self, key) {
            (Self::RsaOaep, PublicKey::Rsa(public)) => Ok(Wrapped {
                encrypted_key: public
                    .encrypt(&mut rng, Oaep::new::<Sha1>(), cek)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?,
                epk: None,
            }),
            (Self::RsaOaep256, PublicKey::Rsa(public)) => Ok(Wrapped {
                encrypted_key: public
                    .encrypt(&mut rng, Oaep::new::<Sha256>(), cek)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?,
                epk: None,
            }),
            (Self::EcdhEsA256Kw, PublicKey::X25519(public)) => {
                let ephemeral = EphemeralSecret::random_from_rng(rng);
                let epk = X25519PublicKey::from(&ephemeral);
                let shared = ephemeral.diffie_hellman(public);
                let kek = agreed_kek(&shared, self, party)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?;
                let encrypted_key = kek
                    .wrap_vec(cek)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?;
                Ok(Wrapped {
                    encrypted_key,
                    epk: Some(Jwk::x25519(epk.as_bytes())),
                })
            }
            _ => Err(JoseError::EncryptionError(format!(
                "{self} does not match the recipient key type"
            ))),
        }
    }

    /// Recover the CEK from `encrypted_key`.
    pub fn unwrap_key(
        self,
        encrypted_key: &[u8],
        key: &PrivateKey,
        epk: Option<&Jwk>,
        party: &PartyInfo,
    ) -> Result<Vec<u8>> {
        match (self, key) {
            (Self::RsaOaep, PrivateKey::Rsa(private)) => private
                .decrypt_blinded(&mut rand::thread_rng(), Oaep::new::<Sha1>(), encrypted_key)
                .map_err(|e| unwrap_failed(self, e)),
            (Self::RsaOaep256, PrivateKey::Rsa(private)) => private
                .decrypt_blinded(&mut rand::thread_rng(), Oaep::new::<Sha256>(), encrypted_key)
                .map_err(|e| unwrap_failed(self, e)),
            (Self::EcdhEsA256Kw, PrivateKey::X25519(secret)) => {
                let epk = epk.ok_or_else(|| {
                    JoseError::MalformedJwe("ECDH-ES recipient is missing `epk`".to_string())
                })?;
                let epk = X25519PublicKey::from(epk.x25519_public()?);
                let shared = secret.diffie_hellman(&epk);
                agreed_kek(&shared, self, party)?
                    .unwrap_vec(encrypted_key)
                    .map_err(|e| unwrap_failed(self, e))
            }
            _ => Err(JoseError::DecryptionError(format!(
                "{self} does not match the private key type"
            ))),
        }
    }
}

fn unwrap_failed(alg: KeyAlgorithm, e: impl fmt::Display) -> JoseError {
    JoseError::DecryptionError(format!("{alg}: {e}"))
}

/// Derive the key-wrapping key from an X25519 agreement.
fn agreed_kek(shared: &SharedSecret, alg: KeyAlgorithm, party: &PartyInfo) -> Result<KekAes256> {
    if !shared.was_contributory() {
        return Err(JoseError::DecryptionError(
            "X25519 agreement produced a low-order result".to_string(),
        ));
    }
    Ok(KekAes256::from(concat_kdf(shared.as_bytes(), alg.as_str(), 256, party)))
}

/// Concat KDF (NIST SP 800-56A) with SHA-256, for outputs of at most 256
/// bits. Only the first `key_bits / 8` bytes of the result are meaningful.
fn concat_kdf(z: &[u8], alg: &str, key_bits: u32, party: &PartyInfo) -> [u8; 32] {
    fn length_prefixed(hasher: &mut Sha256, data: &[u8]) {
        hasher.update((data.len() as u32).to_be_bytes());
        hasher.update(data);
    }

    let mut hasher = Sha256::new();
    hasher.update(1u32.to_be_bytes());
    hasher.update(z);
    length_prefixed(&mut hasher, alg.as_bytes());
    length_prefixed(&mut hasher, &party.apu);
    length_prefixed(&mut hasher, &party.apv);
    hasher.update(key_bits.to_be_bytes());
    hasher.finalize().into()
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RSA-OAEP" => Ok(Self::RsaOaep),
            "RSA-OAEP-256" => Ok(Self::RsaOaep256),
            "ECDH-ES+A256KW" => Ok(Self::EcdhEsA256Kw),
            other => Err(JoseError::UnsupportedAlgorithm(format!("alg {other}"))),
        }
    }
}
