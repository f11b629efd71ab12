//! Ability configuration.
//!
//! Every collaborator is built from an explicit [`AbilityConfig`]. Nothing is
//! read from the environment and nothing is stored globally.

use std::collections::BTreeMap;
use std::path::Path;

use sealpack_core::ExtractPolicy;
use sealpack_jose::{ContentAlgorithm, KeyAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "https://cloud.bynorth.com";
pub const DEFAULT_SIGNING_VERSION: &str = "v0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Algorithm choices for new envelopes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncryptionConfig {
    /// Content encryption for the extracted values.
    pub content_algorithm: ContentAlgorithm,
    /// Key wrap used for RSA recipients. X25519 recipients always use
    /// ECDH-ES+A256KW.
    pub rsa_key_wrap: KeyAlgorithm,
    /// Which existing values count as extractable.
    pub extract_policy: ExtractPolicy,
}

impl EncryptionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.rsa_key_wrap.is_rsa() {
            return Err(ClientError::Config(format!(
                "rsaKeyWrap must be an RSA algorithm, got {}",
                self.rsa_key_wrap
            )));
        }
        Ok(())
    }
}

/// Configuration for one named ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AbilityConfig {
    /// Secret used to sign and verify callback state.
    pub shared_secret: String,
    pub api_key: String,
    pub api_secret: String,
    /// PEM or JWK private key. Without it the ability can encrypt but not
    /// decrypt.
    pub private_key: Option<String>,
    pub integration_id: String,
    pub base_url: String,
    pub signing_version: String,
    pub request_timeout_secs: u64,
    pub encryption: EncryptionConfig,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            private_key: None,
            integration_id: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            signing_version: DEFAULT_SIGNING_VERSION.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            encryption: EncryptionConfig::default(),
        }
    }
}

impl AbilityConfig {
    /// Parse and validate a single ability from TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a single ability from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Parse a table of named abilities, one TOML table per name.
    ///
    /// ```toml
    /// [weather]
    /// apiKey = "..."
    ///
    /// [calendar]
    /// apiKey = "..."
    /// ```
    pub fn named_from_toml_str(raw: &str) -> Result<BTreeMap<String, Self>> {
        let configs: BTreeMap<String, Self> =
            toml::from_str(raw).map_err(|e| ClientError::Config(e.to_string()))?;
        for (name, config) in &configs {
            config
                .validate()
                .map_err(|e| ClientError::Config(format!("{name}: {e}")))?;
        }
        Ok(configs)
    }

    /// Read a table of named abilities from a TOML file.
    pub fn named_from_file(path: impl AsRef<Path>) -> Result<BTreeMap<String, Self>> {
        Self::named_from_toml_str(&read(path.as_ref())?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("baseUrl must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "requestTimeoutSecs must be greater than zero".into(),
            ));
        }
        self.encryption.validate()
    }

    /// `base_url` joined with `path`, which must start with `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AbilityConfig::default();
        assert_eq!(config.base_url, "https://cloud.bynorth.com");
        assert_eq!(config.signing_version, "v0");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.private_key.is_none());
        assert!(config.api_key.is_empty());
        assert_eq!(config.encryption.content_algorithm, ContentAlgorithm::A256Gcm);
        assert_eq!(config.encryption.rsa_key_wrap, KeyAlgorithm::RsaOaep);
        assert_eq!(config.encryption.extract_policy, ExtractPolicy::Present);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AbilityConfig::from_toml_str("").unwrap(), AbilityConfig::default());
    }

    #[test]
    fn test_camel_case_fields() {
        let config = AbilityConfig::from_toml_str(
            r#"
            sharedSecret = "s3cret"
            apiKey = "key"
            apiSecret = "secret"
            integrationId = "int-1"
            baseUrl = "http://localhost:8080/"
            signingVersion = "v1"
            requestTimeoutSecs = 5

            [encryption]
            contentAlgorithm = "A256CBC-HS512"
            rsaKeyWrap = "RSA-OAEP-256"
            extractPolicy = "truthy"
            "#,
        )
        .unwrap();

        assert_eq!(config.shared_secret, "s3cret");
        assert_eq!(config.integration_id, "int-1");
        assert_eq!(config.signing_version, "v1");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.encryption.content_algorithm, ContentAlgorithm::A256CbcHs512);
        assert_eq!(config.encryption.rsa_key_wrap, KeyAlgorithm::RsaOaep256);
        assert_eq!(config.encryption.extract_policy, ExtractPolicy::Truthy);
        assert_eq!(
            config.endpoint("/v1/api/integration/enable"),
            "http://localhost:8080/v1/api/integration/enable"
        );
    }

    #[test]
    fn test_rejects_non_rsa_wrap() {
        let err = AbilityConfig::from_toml_str(
            r#"
            [encryption]
            rsaKeyWrap = "ECDH-ES+A256KW"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_algorithm() {
        let err = AbilityConfig::from_toml_str(
            r#"
            [encryption]
            contentAlgorithm = "A128GCM"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(AbilityConfig::from_toml_str("requestTimeoutSecs = 0").is_err());
    }

    #[test]
    fn test_named_table() {
        let configs = AbilityConfig::named_from_toml_str(
            r#"
            [weather]
            apiKey = "w"

            [calendar]
            apiKey = "c"
            signingVersion = "v2"
            "#,
        )
        .unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs["weather"].api_key, "w");
        assert_eq!(configs["weather"].signing_version, "v0");
        assert_eq!(configs["calendar"].signing_version, "v2");
    }

    #[test]
    fn test_named_table_error_names_ability() {
        let err = AbilityConfig::named_from_toml_str(
            r#"
            [broken]
            baseUrl = ""
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ability.toml");
        std::fs::write(&path, "apiKey = \"from-file\"\n").unwrap();

        let config = AbilityConfig::from_file(&path).unwrap();
        assert_eq!(config.api_key, "from-file");

        let missing = AbilityConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ClientError::Config(_))));
    }
}
