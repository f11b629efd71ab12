//! Content encryption (RFC 7518 section 5).
//!
//! Two `enc` values are supported: A256GCM, and A256CBC-HS512 for
//! interoperability with envelopes written by older clients.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;

use crate::error::{JoseError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha512 = Hmac<Sha512>;

/// A content encryption algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentAlgorithm {
    #[default]
    #[serde(rename = "A256GCM")]
    A256Gcm,
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
}

/// Output of content encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl ContentAlgorithm {
    /// The `enc` header value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A256Gcm => "A256GCM",
            Self::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    /// Length of the content encryption key in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::A256Gcm => 32,
            Self::A256CbcHs512 => 64,
        }
    }

    const fn iv_len(self) -> usize {
        match self {
            Self::A256Gcm => 12,
            Self::A256CbcHs512 => 16,
        }
    }

    const fn tag_len(self) -> usize {
        match self {
            Self::A256Gcm => 16,
            Self::A256CbcHs512 => 32,
        }
    }

    /// Generate a fresh random content encryption key.
    pub fn generate_cek(self) -> Vec<u8> {
        let mut cek = vec![0u8; self.key_len()];
        rand::thread_rng().fill_bytes(&mut cek);
        cek
    }

    /// Encrypt `plaintext` under `cek` with a fresh random IV.
    pub fn encrypt(self, cek: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
        self.check_key(cek)?;
        let mut iv = vec![0u8; self.iv_len()];
        rand::thread_rng().fill_bytes(&mut iv);

        match self {
            Self::A256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(cek)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?;
                let mut buffer = plaintext.to_vec();
                let tag = cipher
                    .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?;
                Ok(Sealed {
                    iv,
                    ciphertext: buffer,
                    tag: tag.to_vec(),
                })
            }
            Self::A256CbcHs512 => {
                let (mac_key, enc_key) = cek.split_at(32);
                let ciphertext = Aes256CbcEnc::new_from_slices(enc_key, &iv)
                    .map_err(|e| JoseError::EncryptionError(e.to_string()))?
                    .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
                let tag = cbc_hmac(mac_key, aad, &iv, &ciphertext)?
                    .finalize()
                    .into_bytes()[..32]
                    .to_vec();
                Ok(Sealed {
                    iv,
                    ciphertext,
                    tag,
                })
            }
        }
    }

    /// Authenticate and decrypt.
    ///
    /// Any failure, including a wrongly sized IV or tag, is reported as
    /// [`JoseError::DecryptionError`].
    pub fn decrypt(
        self,
        cek: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        if cek.len() != self.key_len() || iv.len() != self.iv_len() || tag.len() != self.tag_len() {
            return Err(JoseError::DecryptionError(format!(
                "{self}: wrong key, IV or tag length"
            )));
        }

        match self {
            Self::A256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(cek)
                    .map_err(|e| JoseError::DecryptionError(e.to_string()))?;
                let mut buffer = ciphertext.to_vec();
                cipher
                    .decrypt_in_place_detached(
                        Nonce::from_slice(iv),
                        aad,
                        &mut buffer,
                        Tag::from_slice(tag),
                    )
                    .map_err(|_| JoseError::DecryptionError("authentication failed".to_string()))?;
                Ok(buffer)
            }
            Self::A256CbcHs512 => {
                let (mac_key, enc_key) = cek.split_at(32);
                cbc_hmac(mac_key, aad, iv, ciphertext)?
                    .verify_truncated_left(tag)
                    .map_err(|_| JoseError::DecryptionError("authentication failed".to_string()))?;
                Aes256CbcDec::new_from_slices(enc_key, iv)
                    .map_err(|e| JoseError::DecryptionError(e.to_string()))?
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| JoseError::DecryptionError("bad padding".to_string()))
            }
        }
    }

    /// Check IV and tag sizes before any key is unwrapped.
    pub fn check_lengths(self, iv: &[u8], tag: &[u8]) -> Result<()> {
        if iv.len() == self.iv_len() && tag.len() == self.tag_len() {
            Ok(())
        } else {
            Err(JoseError::MalformedJwe(format!(
                "{self} expects a {}-byte IV and a {}-byte tag",
                self.iv_len(),
                self.tag_len()
            )))
        }
    }

    fn check_key(self, cek: &[u8]) -> Result<()> {
        if cek.len() == self.key_len() {
            Ok(())
        } else {
            Err(JoseError::EncryptionError(format!(
                "{self} needs a {}-byte key, got {}",
                self.key_len(),
                cek.len()
            )))
        }
    }
}

/// HMAC over `AAD || IV || ciphertext || AL`, AL being the AAD length in
/// bits as a big-endian u64.
fn cbc_hmac(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha512> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(mac_key)
        .map_err(|e| JoseError::EncryptionError(e.to_string()))?;
    let aad_bits = (aad.len() as u64) * 8;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&aad_bits.to_be_bytes());
    Ok(mac)
}

impl fmt::Display for ContentAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentAlgorithm {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A256GCM" => Ok(Self::A256Gcm),
            "A256CBC-HS512" => Ok(Self::A256CbcHs512),
            other => Err(JoseError::UnsupportedAlgorithm(format!("enc {other}"))),
        }
    }
}
