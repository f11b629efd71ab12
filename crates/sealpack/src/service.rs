//! The encryption service: extract and seal, open and resolve.

use sealpack_client::{AbilityConfig, EncryptionConfig};
use sealpack_core::{extract, resolve};
use sealpack_jose::{encrypt, KeyNormalizer, PrivateKey, SealOptions};
use serde_json::Value;
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{Result, SealError};

/// Encrypts selected fields of JSON documents to recipient public keys and
/// decrypts envelopes with an optional private key.
///
/// A service holds no mutable state, so it can be shared across threads
/// behind an `Arc`.
#[derive(Debug)]
pub struct EncryptionService {
    private_key: Option<PrivateKey>,
    config: EncryptionConfig,
    normalizer: KeyNormalizer,
}

impl EncryptionService {
    /// A service with default algorithms. `private_key` is PEM or JWK; the
    /// service can only encrypt without it.
    pub fn new(private_key: Option<&str>) -> Result<Self> {
        Self::with_config(private_key, EncryptionConfig::default())
    }

    pub fn with_config(private_key: Option<&str>, config: EncryptionConfig) -> Result<Self> {
        let private_key = private_key.map(PrivateKey::parse).transpose()?;
        Self::with_private_key(private_key, config)
    }

    /// A service around an already parsed key.
    pub fn with_private_key(private_key: Option<PrivateKey>, config: EncryptionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            private_key,
            config,
            normalizer: KeyNormalizer::default(),
        })
    }

    pub fn from_ability_config(config: &AbilityConfig) -> Result<Self> {
        Self::with_config(config.private_key.as_deref(), config.encryption)
    }

    /// Replace the set of accepted public-key encodings.
    pub fn with_normalizer(mut self, normalizer: KeyNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &EncryptionConfig {
        &self.config
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Encrypt
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the values at `paths` into a JWE encrypted to every key in
    /// `public_keys`, leaving markers in their place.
    ///
    /// `paths` are JSON Pointers, resolved in order. `public_keys` may be
    /// PKCS #1 PEM, SPKI PEM or JWK JSON. The caller's document is not
    /// modified.
    #[tracing::instrument(skip_all, fields(paths = paths.len(), recipients = public_keys.len()))]
    pub fn encrypt_packet<P, K>(
        &self,
        document: &Value,
        paths: &[P],
        public_keys: &[K],
    ) -> Result<Envelope>
    where
        P: AsRef<str>,
        K: AsRef<str>,
    {
        if public_keys.is_empty() {
            return Err(SealError::MissingPublicKeys);
        }
        if document.is_null() {
            return Err(SealError::BadInput);
        }

        let extraction = extract(document, paths, self.config.extract_policy)?;
        let keys = self.normalizer.normalize(public_keys)?;
        let plaintext = serde_json::to_vec(&extraction.values)?;

        let jwe = encrypt(
            &plaintext,
            &keys,
            SealOptions {
                content: self.config.content_algorithm,
                rsa_key_wrap: self.config.rsa_key_wrap,
            },
        )?;
        debug!(enc = %self.config.content_algorithm, "sealed envelope");

        Ok(Envelope::new(extraction.marked, jwe))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decrypt
    // ─────────────────────────────────────────────────────────────────────────

    /// Parse and decrypt an envelope, returning the original document.
    ///
    /// The container may be in general or flattened serialization.
    #[tracing::instrument(skip_all)]
    pub fn decrypt_packet(&self, envelope: &Value) -> Result<Value> {
        if envelope.is_null() {
            return Err(SealError::BadInput);
        }
        if self.private_key.is_none() {
            return Err(SealError::MissingPrivateKey);
        }
        self.decrypt_envelope(&Envelope::from_value(envelope)?)
    }

    /// Decrypt an already parsed envelope.
    #[tracing::instrument(skip_all, fields(version = %envelope.version))]
    pub fn decrypt_envelope(&self, envelope: &Envelope) -> Result<Value> {
        let key = self.private_key.as_ref().ok_or(SealError::MissingPrivateKey)?;
        envelope.check_version()?;

        let jwe = envelope.general();
        debug!(recipients = jwe.recipients.len(), "opening envelope");
        let plaintext = jwe.decrypt(key)?;

        let values = match serde_json::from_slice::<Value>(&plaintext) {
            Ok(Value::Array(values)) => values,
            Ok(_) => {
                return Err(SealError::MalformedEnvelope(
                    "decrypted payload is not a JSON array".to_string(),
                ))
            }
            Err(e) => {
                return Err(SealError::MalformedEnvelope(format!(
                    "decrypted payload is not JSON: {e}"
                )))
            }
        };
        debug!(values = values.len(), "resolving references");

        Ok(resolve(&envelope.plain, &values)?)
    }
}
