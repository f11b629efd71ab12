//! Transport abstraction for the remote integration API.
//!
//! The service exposes three calls an ability needs: looking up a user's
//! device keys and publishing a packet, either plain or encrypted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AbilityConfig;
use crate::error::{ClientError, Result};

pub const DEVICE_KEYS_PATH: &str = "/v1/api/integration/device-keys";
pub const PUBLISH_PATH: &str = "/v1/api/integration/publish-to-user";
pub const SECURE_PUBLISH_PATH: &str = "/v1/api/integration/secure/publish-to-user";

/// Calls into the remote integration API.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait AbilityApi: Send + Sync {
    /// The public keys of every device registered to `user_id`.
    async fn device_keys(&self, user_id: &str) -> Result<Vec<String>>;

    /// Deliver a plain packet to `user_id`.
    async fn publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()>;

    /// Deliver an encrypted envelope to `user_id`.
    async fn encrypted_publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest<'a> {
    api_key: &'a str,
    api_secret: &'a str,
    integration_id: &'a str,
    target_user_id: &'a str,
    packet: &'a Value,
}

/// [`AbilityApi`] over HTTPS.
pub struct HttpAbilityApi {
    client: Client,
    config: AbilityConfig,
}

impl HttpAbilityApi {
    pub fn new(config: AbilityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn fetch_device_keys(&self, user_id: &str) -> reqwest::Result<Vec<String>> {
        self.client
            .get(self.config.endpoint(DEVICE_KEYS_PATH))
            .query(&[
                ("userId", user_id),
                ("integrationId", self.config.integration_id.as_str()),
                ("apiKey", self.config.api_key.as_str()),
                ("apiSecret", self.config.api_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn post(&self, path: &str, user_id: &str, packet: &Value) -> reqwest::Result<()> {
        let body = PublishRequest {
            api_key: &self.config.api_key,
            api_secret: &self.config.api_secret,
            integration_id: &self.config.integration_id,
            target_user_id: user_id,
            packet,
        };
        self.client
            .post(self.config.endpoint(path))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl AbilityApi for HttpAbilityApi {
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn device_keys(&self, user_id: &str) -> Result<Vec<String>> {
        let keys = self
            .fetch_device_keys(user_id)
            .await
            .map_err(|e| ClientError::DeviceKeys(e.to_string()))?;

        debug!(count = keys.len(), "fetched device keys");
        Ok(keys)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()> {
        self.post(PUBLISH_PATH, user_id, packet)
            .await
            .map_err(|e| ClientError::PublishToUser(e.to_string()))?;
        debug!("published packet");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn encrypted_publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()> {
        self.post(SECURE_PUBLISH_PATH, user_id, packet)
            .await
            .map_err(|e| ClientError::EncryptedPublishToUser(e.to_string()))?;
        debug!("published encrypted packet");
        Ok(())
    }
}

/// An in-memory API for testing.
///
/// Device keys are seeded per user and every publish is recorded.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// A packet handed to the API.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Published {
        pub user_id: String,
        pub packet: Value,
        pub encrypted: bool,
    }

    /// In-memory [`AbilityApi`]. Clones share state.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryAbilityApi {
        device_keys: Arc<RwLock<HashMap<String, Vec<String>>>>,
        published: Arc<RwLock<Vec<Published>>>,
    }

    impl MemoryAbilityApi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register the device keys returned for `user_id`.
        pub async fn set_device_keys<K: Into<String>>(&self, user_id: &str, keys: Vec<K>) {
            self.device_keys
                .write()
                .await
                .insert(user_id.to_string(), keys.into_iter().map(Into::into).collect());
        }

        /// Everything published so far, oldest first.
        pub async fn published(&self) -> Vec<Published> {
            self.published.read().await.clone()
        }

        async fn record(&self, user_id: &str, packet: &Value, encrypted: bool) {
            self.published.write().await.push(Published {
                user_id: user_id.to_string(),
                packet: packet.clone(),
                encrypted,
            });
        }
    }

    #[async_trait]
    impl AbilityApi for MemoryAbilityApi {
        async fn device_keys(&self, user_id: &str) -> Result<Vec<String>> {
            Ok(self
                .device_keys
                .read()
                .await
                .get(user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()> {
            self.record(user_id, packet, false).await;
            Ok(())
        }

        async fn encrypted_publish_to_user(&self, user_id: &str, packet: &Value) -> Result<()> {
            self.record(user_id, packet, true).await;
            Ok(())
        }
    }
}
