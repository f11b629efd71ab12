//! Test fixtures and helpers.
//!
//! Fixed recipient keys in every supported encoding, plus freshly derived
//! X25519 devices for multi-party tests.

use std::sync::Arc;

use rand::rngs::OsRng;
use sealpack::{Ability, AbilityConfig, EncryptionConfig, EncryptionService, Envelope};
use sealpack_client::memory::MemoryAbilityApi;
use sealpack_jose::PrivateKey;
use serde_json::Value;
use x25519_dalek::StaticSecret;

// RSA-2048 recipient.
pub const RSA_PKCS8: &str = include_str!("../data/recipient_rsa.pem");
pub const RSA_PKCS1: &str = include_str!("../data/recipient_rsa.pkcs1.pem");
pub const RSA_PUBLIC_PKCS1: &str = include_str!("../data/recipient_rsa.pkcs1.pub.pem");
pub const RSA_PUBLIC_SPKI: &str = include_str!("../data/recipient_rsa.spki.pub.pem");
pub const RSA_PUBLIC_JWK: &str = include_str!("../data/recipient_rsa.pub.jwk.json");

// X25519 recipient.
pub const X25519_PKCS8: &str = include_str!("../data/recipient_x25519.pem");
pub const X25519_JWK: &str = include_str!("../data/recipient_x25519.jwk.json");
pub const X25519_PUBLIC_SPKI: &str = include_str!("../data/recipient_x25519.pub.pem");
pub const X25519_PUBLIC_JWK: &str = include_str!("../data/recipient_x25519.pub.jwk.json");

// An RSA key no fixture envelope is addressed to.
pub const OUTSIDER_RSA_PKCS8: &str = include_str!("../data/outsider_rsa.pem");
pub const OUTSIDER_RSA_PUBLIC_PKCS1: &str = include_str!("../data/outsider_rsa.pkcs1.pub.pem");

/// RFC 7638 thumbprints of the fixture recipients, by name.
pub const KEY_THUMBPRINTS: &str = include_str!("../data/key_thumbprints.json");

/// A sender plus one opener per fixture recipient.
pub struct TestFixture {
    pub sender: EncryptionService,
    pub rsa: EncryptionService,
    pub x25519: EncryptionService,
    pub outsider: EncryptionService,
}

impl TestFixture {
    /// Fixture services with default algorithms.
    pub fn new() -> Self {
        Self::with_config(EncryptionConfig::default())
    }

    /// Fixture services that all use `config`.
    pub fn with_config(config: EncryptionConfig) -> Self {
        let service = |key: Option<&str>| {
            EncryptionService::with_config(key, config).expect("fixture keys parse")
        };
        Self {
            sender: service(None),
            rsa: service(Some(RSA_PKCS8)),
            x25519: service(Some(X25519_PKCS8)),
            outsider: service(Some(OUTSIDER_RSA_PKCS8)),
        }
    }

    /// Public keys of the RSA and X25519 recipients.
    pub fn public_keys(&self) -> [&'static str; 2] {
        [RSA_PUBLIC_PKCS1, X25519_PUBLIC_SPKI]
    }

    /// Services holding a recipient private key.
    pub fn recipients(&self) -> [&EncryptionService; 2] {
        [&self.rsa, &self.x25519]
    }

    /// Encrypt `paths` of `document` to both recipients.
    pub fn seal(&self, document: &Value, paths: &[&str]) -> Envelope {
        self.sender
            .encrypt_packet(document, paths, &self.public_keys())
            .expect("fixture encryption")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A recipient device with an X25519 key.
#[derive(Debug, Clone)]
pub struct Device {
    pub private_key: PrivateKey,
    /// The public key as JWK JSON, as a device would register it.
    pub public_key: String,
}

impl Device {
    /// A device with a random key.
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// A device with a deterministic key.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(seed))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let private_key = PrivateKey::X25519(secret);
        let public_key = serde_json::to_string(&private_key.public_key().to_jwk())
            .expect("JWK serialization");
        Self {
            private_key,
            public_key,
        }
    }

    /// A service that decrypts with this device's key.
    pub fn service(&self) -> EncryptionService {
        EncryptionService::with_private_key(
            Some(self.private_key.clone()),
            EncryptionConfig::default(),
        )
        .expect("default config is valid")
    }
}

/// Create several devices with distinct deterministic keys.
pub fn multi_device_fixtures(count: usize) -> Vec<Device> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            Device::from_seed(seed)
        })
        .collect()
}

/// Secret shared by abilities built with [`memory_ability`].
pub const SHARED_SECRET: &str = "testkit-shared-secret";

/// An ability backed by an in-memory API where `user_id` has registered
/// `devices`. The ability itself holds no private key.
pub async fn memory_ability(user_id: &str, devices: &[Device]) -> (Ability, MemoryAbilityApi) {
    let api = MemoryAbilityApi::new();
    api.set_device_keys(user_id, devices.iter().map(|d| d.public_key.clone()).collect())
        .await;

    let config = AbilityConfig {
        shared_secret: SHARED_SECRET.to_string(),
        integration_id: "testkit".to_string(),
        ..AbilityConfig::default()
    };
    let ability = Ability::with_api(config, Arc::new(api.clone())).expect("fixture config is valid");
    (ability, api)
}
