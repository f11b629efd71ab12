//! An ability: one integration's encryption service and API clients.

use std::sync::Arc;

use sealpack_client::{AbilityApi, AbilityConfig, HttpAbilityApi, SignatureVerifier, UrlBuilder};
use serde_json::Value;
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::service::EncryptionService;

/// Everything one configured integration needs to talk to its users.
pub struct Ability {
    config: AbilityConfig,
    encryption: EncryptionService,
    api: Arc<dyn AbilityApi>,
    signatures: SignatureVerifier,
    urls: UrlBuilder,
}

impl std::fmt::Debug for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ability")
            .field("integration_id", &self.config.integration_id)
            .field("base_url", &self.config.base_url)
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}

impl Ability {
    /// An ability that talks to `config.base_url` over HTTPS.
    pub fn new(config: AbilityConfig) -> Result<Self> {
        let api = Arc::new(HttpAbilityApi::new(config.clone())?);
        Self::with_api(config, api)
    }

    /// An ability using `api` for remote calls.
    pub fn with_api(config: AbilityConfig, api: Arc<dyn AbilityApi>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            encryption: EncryptionService::from_ability_config(&config)?,
            signatures: SignatureVerifier::new(&config.shared_secret, &config.signing_version),
            urls: UrlBuilder::new(&config),
            api,
            config,
        })
    }

    pub fn config(&self) -> &AbilityConfig {
        &self.config
    }

    pub fn encryption(&self) -> &EncryptionService {
        &self.encryption
    }

    pub fn api(&self) -> &dyn AbilityApi {
        self.api.as_ref()
    }

    pub fn signatures(&self) -> &SignatureVerifier {
        &self.signatures
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// Check a callback's `state` signature against the local clock.
    pub fn verify_signature(&self, state: &str, timestamp: &str, signature: &str) -> bool {
        self.signatures.verify(state, timestamp, signature)
    }

    pub fn build_enable_url(&self, state: &str, error: Option<&str>) -> String {
        self.urls.build_enable_url(state, error)
    }

    pub async fn device_keys(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self.api.device_keys(user_id).await?)
    }

    pub async fn publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()> {
        Ok(self.api.publish_to_user(user_id, packet).await?)
    }

    pub async fn encrypted_publish_to_user(&self, user_id: &str, envelope: &Envelope) -> Result<()> {
        let packet = envelope.to_value()?;
        Ok(self.api.encrypted_publish_to_user(user_id, &packet).await?)
    }

    /// Encrypt `paths` of `document` to every device of `user_id` and publish
    /// the envelope through the secure endpoint.
    ///
    /// Fails with [`SealError::MissingPublicKeys`](crate::SealError) if the
    /// user has no registered devices. Nothing is published on failure.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, paths = paths.len()))]
    pub async fn encrypt_and_publish<P: AsRef<str>>(
        &self,
        user_id: &str,
        document: &Value,
        paths: &[P],
    ) -> Result<Envelope> {
        let keys = self.device_keys(user_id).await?;
        debug!(devices = keys.len(), "encrypting to user devices");

        let envelope = self.encryption.encrypt_packet(document, paths, &keys)?;
        self.encrypted_publish_to_user(user_id, &envelope).await?;
        Ok(envelope)
    }
}
