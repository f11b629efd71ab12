//! Callback signature verification.
//!
//! The remote service signs the `state` it echoes back on callbacks as
//! `"<version>:<hex hmac>"`, where the HMAC-SHA256 input is
//! `"<version>:<timestamp>:<state>"` keyed by the shared secret.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// How far a callback timestamp may be from the local clock.
pub const TIMESTAMP_TOLERANCE_MS: f64 = 5.0 * 60.0 * 1000.0;

/// Timestamps above this are already in milliseconds.
const MILLISECONDS_THRESHOLD: f64 = 1e12;

/// Signs and verifies callback state with a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    shared_secret: Vec<u8>,
    signing_version: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_version", &self.signing_version)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(shared_secret: impl AsRef<[u8]>, signing_version: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.as_ref().to_vec(),
            signing_version: signing_version.into(),
        }
    }

    /// The signature the service would send for `state` at `timestamp`.
    pub fn sign(&self, state: &str, timestamp: &str) -> String {
        let digest = self.mac(state, timestamp).finalize().into_bytes();
        format!("{}:{}", self.signing_version, hex::encode(digest))
    }

    /// Verify against the local clock.
    pub fn verify(&self, state: &str, timestamp: &str, signature: &str) -> bool {
        self.verify_at(state, timestamp, signature, now_ms())
    }

    /// Verify as if the local clock read `now_ms` milliseconds since the
    /// Unix epoch.
    pub fn verify_at(&self, state: &str, timestamp: &str, signature: &str, now_ms: f64) -> bool {
        let Some(sent_ms) = timestamp_ms(timestamp) else {
            debug!("unparsable callback timestamp");
            return false;
        };
        if (now_ms - sent_ms).abs() > TIMESTAMP_TOLERANCE_MS {
            debug!("callback timestamp outside tolerance");
            return false;
        }

        let prefix = format!("{}:", self.signing_version);
        let Some(digest) = signature
            .strip_prefix(&prefix)
            .and_then(|h| hex::decode(h).ok())
        else {
            return false;
        };

        // verify_slice compares in constant time
        self.mac(state, timestamp).verify_slice(&digest).is_ok()
    }

    fn mac(&self, state: &str, timestamp: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.shared_secret)
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}:{timestamp}:{state}", self.signing_version).as_bytes());
        mac
    }
}

/// Parse a decimal timestamp in seconds or milliseconds into milliseconds.
fn timestamp_ms(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if value > MILLISECONDS_THRESHOLD {
        value
    } else {
        value * 1000.0
    })
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .expect("time went backwards")
}
