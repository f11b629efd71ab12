//! JWE JSON serializations (RFC 7516 section 7.2).
//!
//! Containers are always written in the general serialization. Either
//! serialization is accepted on input and converted to [`GeneralJwe`]
//! before anything else looks at it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::b64;
use crate::cipher::ContentAlgorithm;
use crate::error::{JoseError, Result};
use crate::jwk::Jwk;
use crate::keys::{EncryptionKey, PrivateKey};
use crate::wrap::{KeyAlgorithm, PartyInfo};

/// A JOSE header. Unknown parameters are preserved in `other`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epk: Option<Jwk>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apv: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Header {
    /// Union with `lower`. Parameters already set on `self` win.
    pub fn merged(&self, lower: Option<&Header>) -> Header {
        let mut out = self.clone();
        let Some(lower) = lower else {
            return out;
        };

        out.alg = out.alg.or_else(|| lower.alg.clone());
        out.enc = out.enc.or_else(|| lower.enc.clone());
        out.kid = out.kid.or_else(|| lower.kid.clone());
        out.epk = out.epk.or_else(|| lower.epk.clone());
        out.apu = out.apu.or_else(|| lower.apu.clone());
        out.apv = out.apv.or_else(|| lower.apv.clone());
        for (k, v) in &lower.other {
            out.other.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out
    }

    fn party_info(&self) -> Result<PartyInfo> {
        let decode = |member: &str, value: Option<&String>| {
            value.map_or(Ok(Vec::new()), |v| b64::decode(member, v))
        };
        Ok(PartyInfo {
            apu: decode("apu", self.apu.as_ref())?,
            apv: decode("apv", self.apv.as_ref())?,
        })
    }
}

/// One recipient of a general JWE.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
}

impl Recipient {
    fn kid(&self) -> Option<&str> {
        self.header.as_ref()?.kid.as_deref()
    }
}

/// General JWE JSON serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralJwe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unprotected: Option<Header>,

    pub recipients: Vec<Recipient>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,

    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Flattened JWE JSON serialization: one recipient, hoisted to the top.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlattenedJwe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unprotected: Option<Header>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,

    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

impl From<FlattenedJwe> for GeneralJwe {
    fn from(jwe: FlattenedJwe) -> Self {
        Self {
            protected: jwe.protected,
            unprotected: jwe.unprotected,
            recipients: vec![Recipient {
                header: jwe.header,
                encrypted_key: jwe.encrypted_key,
            }],
            aad: jwe.aad,
            iv: jwe.iv,
            ciphertext: jwe.ciphertext,
            tag: jwe.tag,
        }
    }
}

/// A JWE as found on the wire, in either JSON serialization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireJwe {
    General(GeneralJwe),
    Flattened(FlattenedJwe),
}

impl WireJwe {
    /// Normalize to the general serialization.
    pub fn into_general(self) -> GeneralJwe {
        match self {
            Self::General(jwe) => jwe,
            Self::Flattened(jwe) => jwe.into(),
        }
    }
}

impl From<GeneralJwe> for WireJwe {
    fn from(jwe: GeneralJwe) -> Self {
        Self::General(jwe)
    }
}

impl<'de> Deserialize<'de> for WireJwe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let object = value
            .as_object()
            .ok_or_else(|| D::Error::custom("JWE must be a JSON object"))?;

        if object.contains_key("recipients") {
            if object.contains_key("header") || object.contains_key("encrypted_key") {
                return Err(D::Error::custom(
                    "JWE mixes `recipients` with flattened members",
                ));
            }
            GeneralJwe::deserialize(value)
                .map(Self::General)
                .map_err(D::Error::custom)
        } else {
            FlattenedJwe::deserialize(value)
                .map(Self::Flattened)
                .map_err(D::Error::custom)
        }
    }
}

/// Algorithm choices for [`encrypt`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SealOptions {
    /// `enc` for the shared ciphertext.
    pub content: ContentAlgorithm,
    /// `alg` for RSA recipients. X25519 recipients always use ECDH-ES+A256KW.
    pub rsa_key_wrap: KeyAlgorithm,
}

/// Encrypt `plaintext` once and wrap the content key to every recipient.
///
/// The `enc` parameter goes in the protected header; each recipient header
/// carries `alg`, `kid` and, for ECDH-ES, `epk`.
pub fn encrypt(
    plaintext: &[u8],
    recipients: &[EncryptionKey],
    options: SealOptions,
) -> Result<GeneralJwe> {
    if recipients.is_empty() {
        return Err(JoseError::MissingPublicKeys);
    }

    let protected_header = Header {
        enc: Some(options.content.as_str().to_string()),
        ..Header::default()
    };
    let protected = b64::encode(serde_json::to_vec(&protected_header)?);

    let cek = options.content.generate_cek();
    let sealed = options.content.encrypt(&cek, plaintext, protected.as_bytes())?;

    let recipients = recipients
        .iter()
        .map(|key| {
            let alg = KeyAlgorithm::for_key(key.public_key(), options.rsa_key_wrap)?;
            let wrapped = alg.wrap_key(&cek, key.public_key(), &PartyInfo::default())?;
            Ok(Recipient {
                header: Some(Header {
                    alg: Some(alg.as_str().to_string()),
                    kid: Some(key.kid().to_string()),
                    epk: wrapped.epk,
                    ..Header::default()
                }),
                encrypted_key: Some(b64::encode(wrapped.encrypted_key)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GeneralJwe {
        protected: Some(protected),
        unprotected: None,
        recipients,
        aad: None,
        iv: b64::encode(sealed.iv),
        ciphertext: b64::encode(sealed.ciphertext),
        tag: b64::encode(sealed.tag),
    })
}

impl GeneralJwe {
    /// The single-recipient flattened form, if there is exactly one
    /// recipient.
    pub fn to_flattened(&self) -> Option<FlattenedJwe> {
        match self.recipients.as_slice() {
            [recipient] => Some(FlattenedJwe {
                protected: self.protected.clone(),
                unprotected: self.unprotected.clone(),
                header: recipient.header.clone(),
                encrypted_key: recipient.encrypted_key.clone(),
                aad: self.aad.clone(),
                iv: self.iv.clone(),
                ciphertext: self.ciphertext.clone(),
                tag: self.tag.clone(),
            }),
            _ => None,
        }
    }

    /// The `kid` of every recipient, in order.
    pub fn recipient_kids(&self) -> Vec<Option<&str>> {
        self.recipients.iter().map(Recipient::kid).collect()
    }

    /// The parsed protected header, or an empty header if there is none.
    pub fn protected_header(&self) -> Result<Header> {
        match &self.protected {
            None => Ok(Header::default()),
            Some(encoded) => {
                let bytes = b64::decode("protected", encoded)?;
                serde_json::from_slice(&bytes).map_err(|e| {
                    JoseError::MalformedJwe(format!("`protected` is not a JSON header: {e}"))
                })
            }
        }
    }

    /// Additional authenticated data for content encryption.
    fn authenticated_data(&self) -> Vec<u8> {
        let mut aad = self.protected.clone().unwrap_or_default().into_bytes();
        if let Some(extra) = &self.aad {
            aad.push(b'.');
            aad.extend_from_slice(extra.as_bytes());
        }
        aad
    }

    /// Decrypt with `key`.
    ///
    /// Recipients whose `kid` matches the key are tried first, then every
    /// other recipient whose `alg` suits the key type.
    ///
    /// # Errors
    ///
    /// [`JoseError::MalformedJwe`] or [`JoseError::UnsupportedAlgorithm`] if
    /// the container itself is unusable, [`JoseError::DecryptionError`] if no
    /// recipient opens with `key`, including when no recipient `alg` is
    /// recognised.
    pub fn decrypt(&self, key: &PrivateKey) -> Result<Vec<u8>> {
        if self.recipients.is_empty() {
            return Err(JoseError::MalformedJwe("no recipients".to_string()));
        }

        let shared = self.protected_header()?.merged(self.unprotected.as_ref());
        let payload = Payload {
            aad: self.authenticated_data(),
            iv: b64::decode("iv", &self.iv)?,
            ciphertext: b64::decode("ciphertext", &self.ciphertext)?,
            tag: b64::decode("tag", &self.tag)?,
        };

        let kid = key.kid()?;
        let (matching, others): (Vec<_>, Vec<_>) = self
            .recipients
            .iter()
            .partition(|r| r.kid() == Some(kid.as_str()));

        let mut known = 0usize;
        let mut attempted = 0usize;
        for recipient in matching.into_iter().chain(others) {
            let header = shared.merged(recipient.header.as_ref());
            let Some(Ok(alg)) = header.alg.as_deref().map(str::parse::<KeyAlgorithm>) else {
                continue;
            };
            known += 1;
            if !alg.accepts(key) {
                continue;
            }

            let enc: ContentAlgorithm = header
                .enc
                .as_deref()
                .ok_or_else(|| JoseError::MalformedJwe("missing `enc`".to_string()))?
                .parse()?;
            enc.check_lengths(&payload.iv, &payload.tag)?;

            attempted += 1;
            match open_recipient(recipient, &header, alg, enc, key, &payload) {
                Ok(plaintext) => return Ok(plaintext),
                Err(e) => tracing::warn!(%alg, error = %e, "recipient did not open"),
            }
        }

        Err(JoseError::DecryptionError(if known == 0 {
            "no recipient uses a supported `alg`".to_string()
        } else if attempted == 0 {
            "no recipient uses an algorithm for this key type".to_string()
        } else {
            format!("none of {attempted} candidate recipients opened with this key")
        }))
    }
}

/// The decoded members shared by every recipient.
struct Payload {
    aad: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

fn open_recipient(
    recipient: &Recipient,
    header: &Header,
    alg: KeyAlgorithm,
    enc: ContentAlgorithm,
    key: &PrivateKey,
    payload: &Payload,
) -> Result<Vec<u8>> {
    let encrypted_key = recipient
        .encrypted_key
        .as_deref()
        .ok_or_else(|| JoseError::MalformedJwe("missing `encrypted_key`".to_string()))?;
    let encrypted_key = b64::decode("encrypted_key", encrypted_key)?;

    let cek = alg.unwrap_key(&encrypted_key, key, header.epk.as_ref(), &header.party_info()?)?;
    enc.decrypt(
        &cek,
        &payload.iv,
        &payload.ciphertext,
        &payload.tag,
        &payload.aad,
    )
}
