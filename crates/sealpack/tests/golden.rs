//! Golden envelopes written by an independent JOSE implementation.
//!
//! Every vector must open with each key it is addressed to, in the form it
//! was written (general or flattened), and resolve back to its document.

use sealpack::{EncryptionService, Envelope, SealError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const VECTORS: &str = include_str!("../../sealpack-testkit/data/golden_envelopes.json");
const RSA_PKCS8: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.pem");
const X25519_PKCS8: &str = include_str!("../../sealpack-testkit/data/recipient_x25519.pem");
const OUTSIDER_RSA: &str = include_str!("../../sealpack-testkit/data/outsider_rsa.pem");

/// A single golden envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub document: Value,
    pub paths: Vec<String>,

    // Output
    pub envelope: Value,
}

fn vectors() -> Vec<GoldenVector> {
    serde_json::from_str(VECTORS).unwrap()
}

fn services() -> Vec<EncryptionService> {
    [RSA_PKCS8, X25519_PKCS8]
        .into_iter()
        .map(|key| EncryptionService::new(Some(key)).unwrap())
        .collect()
}

#[test]
fn test_golden_envelopes_open() {
    let services = services();

    for vector in vectors() {
        let mut opened = 0;
        for service in &services {
            match service.decrypt_packet(&vector.envelope) {
                Ok(document) => {
                    assert_eq!(document, vector.document, "{}", vector.name);
                    opened += 1;
                }
                Err(SealError::DecryptionFailure(_)) => {}
                Err(e) => panic!("{}: {e}", vector.name),
            }
        }
        assert!(opened > 0, "{} opened with no fixture key", vector.name);
    }
}

#[test]
fn test_golden_markers_match_paths() {
    for vector in vectors() {
        let envelope = Envelope::from_value(&vector.envelope).unwrap();
        let mut indices = sealpack::core::marker_indices(&envelope.plain);
        indices.sort_unstable();
        assert_eq!(
            indices,
            (0..vector.paths.len()).collect::<Vec<_>>(),
            "{}",
            vector.name
        );
    }
}

#[test]
fn test_golden_envelopes_reseal() {
    let services = services();
    let public_keys = [
        include_str!("../../sealpack-testkit/data/recipient_rsa.pkcs1.pub.pem"),
        include_str!("../../sealpack-testkit/data/recipient_x25519.pub.pem"),
    ];

    for vector in vectors() {
        let envelope = services[0]
            .encrypt_packet(&vector.document, &vector.paths, &public_keys)
            .unwrap();
        let golden = Envelope::from_value(&vector.envelope).unwrap();
        assert_eq!(envelope.plain, golden.plain, "{}", vector.name);

        for service in &services {
            assert_eq!(
                service.decrypt_envelope(&envelope).unwrap(),
                vector.document,
                "{}",
                vector.name
            );
        }
    }
}

#[test]
fn test_outsider_opens_no_golden_envelope() {
    let outsider = EncryptionService::new(Some(OUTSIDER_RSA)).unwrap();

    for vector in vectors() {
        assert!(
            matches!(
                outsider.decrypt_packet(&vector.envelope),
                Err(SealError::DecryptionFailure(_))
            ),
            "{}",
            vector.name
        );
    }
}
