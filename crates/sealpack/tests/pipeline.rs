//! End-to-end encrypt and decrypt through the public API.

use std::sync::Arc;

use proptest::prelude::*;
use sealpack::{EncryptionService, Envelope, SealError};
use serde_json::{json, Value};

const RSA_PKCS8: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.pem");
const RSA_PKCS1: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.pkcs1.pem");
const RSA_PUB_PKCS1: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.pkcs1.pub.pem");
const RSA_PUB_SPKI: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.spki.pub.pem");
const RSA_PUB_JWK: &str = include_str!("../../sealpack-testkit/data/recipient_rsa.pub.jwk.json");
const X25519_PKCS8: &str = include_str!("../../sealpack-testkit/data/recipient_x25519.pem");
const X25519_JWK: &str = include_str!("../../sealpack-testkit/data/recipient_x25519.jwk.json");
const X25519_PUB: &str = include_str!("../../sealpack-testkit/data/recipient_x25519.pub.pem");
const X25519_PUB_JWK: &str = include_str!("../../sealpack-testkit/data/recipient_x25519.pub.jwk.json");
const OUTSIDER_RSA: &str = include_str!("../../sealpack-testkit/data/outsider_rsa.pem");
const OUTSIDER_PUB: &str = include_str!("../../sealpack-testkit/data/outsider_rsa.pkcs1.pub.pem");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn service(private_key: &str) -> EncryptionService {
    EncryptionService::new(Some(private_key)).unwrap()
}

fn sample() -> Value {
    json!({
        "templateId": "cc16cc5e-1623-4ba0-bacd-df1f7be9e023",
        "integrationId": "98792bcb-a936-4980-a13d-9531de88ab49",
        "actionId": "get_spec",
        "responseText": "Response Text",
        "packetId": "Id of the packet",
        "nested": {"list": [1, {"deep": true}, null], "empty": {}}
    })
}

// --- Round trips ---

#[test]
fn test_round_trip_every_public_key_encoding() {
    let doc = sample();
    let paths = ["/templateId", "/nested/list/1", "/nested/empty"];
    let rsa = service(RSA_PKCS8);
    let x25519 = service(X25519_PKCS8);

    for (public_key, opener) in [
        (RSA_PUB_PKCS1, &rsa),
        (RSA_PUB_SPKI, &rsa),
        (RSA_PUB_JWK, &rsa),
        (X25519_PUB, &x25519),
        (X25519_PUB_JWK, &x25519),
    ] {
        let envelope = rsa.encrypt_packet(&doc, &paths, &[public_key]).unwrap();
        assert_eq!(opener.decrypt_envelope(&envelope).unwrap(), doc);
    }
}

#[test]
fn test_private_key_encodings_agree() {
    let doc = sample();
    let envelope = service(RSA_PKCS8)
        .encrypt_packet(&doc, &["/actionId"], &[RSA_PUB_SPKI, X25519_PUB])
        .unwrap();

    for private_key in [RSA_PKCS8, RSA_PKCS1, X25519_PKCS8, X25519_JWK] {
        assert_eq!(service(private_key).decrypt_envelope(&envelope).unwrap(), doc);
    }
}

#[test]
fn test_caller_document_untouched() {
    let doc = json!({"$ref": "x", "a": {"b": 1}});
    let before = doc.clone();
    service(RSA_PKCS8)
        .encrypt_packet(&doc, &["/a/b"], &[RSA_PUB_SPKI])
        .unwrap();
    assert_eq!(doc, before);
}

// --- Markers ---

#[test]
fn test_markers_cover_every_path_once() {
    let paths = ["/packetId", "/templateId", "/nested/list/2", "/actionId"];
    let envelope = service(RSA_PKCS8)
        .encrypt_packet(&sample(), &paths, &[RSA_PUB_SPKI])
        .unwrap();

    assert_eq!(envelope.plain["packetId"], json!({"$ref": "#/encrypted/0"}));
    assert_eq!(envelope.plain["templateId"], json!({"$ref": "#/encrypted/1"}));
    assert_eq!(envelope.plain["nested"]["list"][2], json!({"$ref": "#/encrypted/2"}));
    assert_eq!(envelope.plain["actionId"], json!({"$ref": "#/encrypted/3"}));

    let mut indices = sealpack::core::marker_indices(&envelope.plain);
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn test_empty_paths_pass_document_through() {
    let doc = sample();
    let no_paths: [&str; 0] = [];
    let rsa = service(RSA_PKCS8);

    let envelope = rsa.encrypt_packet(&doc, &no_paths, &[RSA_PUB_SPKI]).unwrap();
    assert_eq!(envelope.plain, doc);

    let plaintext = envelope
        .general()
        .decrypt(&sealpack::jose::PrivateKey::parse(RSA_PKCS8).unwrap())
        .unwrap();
    assert_eq!(plaintext, b"[]");
    assert_eq!(rsa.decrypt_envelope(&envelope).unwrap(), doc);
}

#[test]
fn test_nested_locators() {
    let doc = json!({"outer": {"inner": "x", "other": 2}});
    let rsa = service(RSA_PKCS8);

    let envelope = rsa
        .encrypt_packet(&doc, &["/outer/inner", "/outer"], &[RSA_PUB_SPKI])
        .unwrap();
    assert_eq!(envelope.plain, json!({"outer": {"$ref": "#/encrypted/1"}}));
    assert_eq!(rsa.decrypt_envelope(&envelope).unwrap(), doc);

    let err = rsa
        .encrypt_packet(&doc, &["/outer", "/outer/inner"], &[RSA_PUB_SPKI])
        .unwrap_err();
    assert!(matches!(err, SealError::BadPath(p) if p == "/outer/inner"));
}

#[test]
fn test_literal_ref_keys_survive() {
    let doc = json!({
        "$ref": "#/encrypted/0",
        "$$ref": "already escaped",
        "inner": {"$ref": "#/encrypted/1"},
        "secret": {"$ref": "literal", "x": 1}
    });
    let rsa = service(RSA_PKCS8);

    let envelope = rsa
        .encrypt_packet(&doc, &["/secret", "/inner/$ref"], &[RSA_PUB_SPKI])
        .unwrap();
    assert_eq!(envelope.plain["$$ref"], "#/encrypted/0");
    assert_eq!(envelope.plain["$$$ref"], "already escaped");
    assert_eq!(envelope.plain["inner"]["$$ref"], json!({"$ref": "#/encrypted/1"}));
    assert_eq!(rsa.decrypt_envelope(&envelope).unwrap(), doc);
}

#[test]
fn test_bad_paths() {
    let rsa = service(RSA_PKCS8);
    for path in ["/missing", "/nested/list/7", "/templateId/deeper", "no-slash"] {
        let err = rsa
            .encrypt_packet(&sample(), &[path], &[RSA_PUB_SPKI])
            .unwrap_err();
        assert!(matches!(&err, SealError::BadPath(p) if p == path), "{path}: {err}");
    }
}

// --- Recipients ---

#[test]
fn test_multi_recipient() {
    let doc = sample();
    let envelope = service(RSA_PKCS8)
        .encrypt_packet(
            &doc,
            &["/responseText"],
            &[RSA_PUB_PKCS1, X25519_PUB, RSA_PUB_JWK],
        )
        .unwrap();
    assert_eq!(envelope.general().recipients.len(), 3);

    assert_eq!(service(RSA_PKCS8).decrypt_envelope(&envelope).unwrap(), doc);
    assert_eq!(service(X25519_PKCS8).decrypt_envelope(&envelope).unwrap(), doc);
    assert!(matches!(
        service(OUTSIDER_RSA).decrypt_envelope(&envelope),
        Err(SealError::DecryptionFailure(_))
    ));
}

#[test]
fn test_outsider_key_in_list_still_works_for_others() {
    let doc = sample();
    let envelope = service(RSA_PKCS8)
        .encrypt_packet(&doc, &["/actionId"], &[OUTSIDER_PUB, RSA_PUB_SPKI])
        .unwrap();

    assert_eq!(service(RSA_PKCS8).decrypt_envelope(&envelope).unwrap(), doc);
    assert_eq!(service(OUTSIDER_RSA).decrypt_envelope(&envelope).unwrap(), doc);
}

#[test]
fn test_invalid_public_key_names_index() {
    let err = service(RSA_PKCS8)
        .encrypt_packet(&sample(), &["/actionId"], &[RSA_PUB_SPKI, "garbage"])
        .unwrap_err();
    assert!(matches!(&err, SealError::InvalidKey(msg) if msg.contains("key 1")), "{err}");
}

// --- Wire shapes ---

#[test]
fn test_flattened_and_general_decrypt_identically() {
    let doc = sample();
    let rsa = service(RSA_PKCS8);
    let envelope = rsa
        .encrypt_packet(&doc, &["/templateId", "/actionId"], &[RSA_PUB_SPKI])
        .unwrap();

    let general = envelope.to_value().unwrap();
    let flattened = envelope.to_flattened().unwrap().to_value().unwrap();
    assert!(general["encrypted"].get("recipients").is_some());
    assert!(flattened["encrypted"].get("recipients").is_none());
    assert!(flattened["encrypted"].get("encrypted_key").is_some());

    assert_eq!(rsa.decrypt_packet(&general).unwrap(), doc);
    assert_eq!(rsa.decrypt_packet(&flattened).unwrap(), doc);
}

#[test]
fn test_multi_recipient_has_no_flattened_form() {
    let envelope = service(RSA_PKCS8)
        .encrypt_packet(&sample(), &["/actionId"], &[RSA_PUB_SPKI, X25519_PUB])
        .unwrap();
    assert!(envelope.to_flattened().is_none());
}

// --- Tampering ---

/// Change the first character of a base64url string so its first decoded
/// byte changes.
fn flip_first(field: &mut Value) {
    let original = field.as_str().unwrap().to_string();
    let first = if original.starts_with('A') { "B" } else { "A" };
    *field = Value::String(format!("{first}{}", &original[1..]));
}

#[test]
fn test_tampering_fails_authentication() {
    let rsa = service(RSA_PKCS8);
    let wire = rsa
        .encrypt_packet(&sample(), &["/templateId"], &[RSA_PUB_SPKI])
        .unwrap()
        .to_value()
        .unwrap();

    for member in ["ciphertext", "tag", "iv"] {
        let mut tampered = wire.clone();
        flip_first(&mut tampered["encrypted"][member]);
        assert!(
            matches!(rsa.decrypt_packet(&tampered), Err(SealError::DecryptionFailure(_))),
            "{member}"
        );
    }

    // {"enc":"A256GCM","cty":"json"}: still valid, but not what was authenticated
    let mut tampered = wire.clone();
    tampered["encrypted"]["protected"] = json!("eyJlbmMiOiJBMjU2R0NNIiwiY3R5IjoianNvbiJ9");
    assert!(matches!(
        rsa.decrypt_packet(&tampered),
        Err(SealError::DecryptionFailure(_))
    ));

    let mut tampered = wire;
    flip_first(&mut tampered["encrypted"]["recipients"][0]["encrypted_key"]);
    assert!(matches!(
        rsa.decrypt_packet(&tampered),
        Err(SealError::DecryptionFailure(_))
    ));
}

#[test]
fn test_structural_damage_is_malformed() {
    let rsa = service(RSA_PKCS8);
    let wire = rsa
        .encrypt_packet(&sample(), &["/templateId"], &[RSA_PUB_SPKI])
        .unwrap()
        .to_value()
        .unwrap();

    let mut bad_base64 = wire.clone();
    bad_base64["encrypted"]["iv"] = json!("not base64!");
    assert!(matches!(
        rsa.decrypt_packet(&bad_base64),
        Err(SealError::MalformedEnvelope(_))
    ));

    let mut future = wire;
    future["version"] = json!("3.0.0");
    assert!(matches!(
        rsa.decrypt_packet(&future),
        Err(SealError::UnsupportedVersion(_))
    ));
}

#[test]
fn test_no_recognised_alg_is_decryption_failure() {
    let rsa = service(RSA_PKCS8);
    let mut wire = rsa
        .encrypt_packet(&sample(), &["/templateId"], &[RSA_PUB_SPKI])
        .unwrap()
        .to_value()
        .unwrap();
    wire["encrypted"]["recipients"][0]["header"]["alg"] = json!("dir");

    assert!(matches!(
        rsa.decrypt_packet(&wire),
        Err(SealError::DecryptionFailure(_))
    ));
}

// --- Concurrency ---

#[test]
fn test_shared_service_across_threads() {
    let rsa = Arc::new(service(RSA_PKCS8));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rsa = Arc::clone(&rsa);
            std::thread::spawn(move || {
                let doc = json!({"worker": i, "secret": format!("value-{i}")});
                let envelope = rsa
                    .encrypt_packet(&doc, &["/secret"], &[RSA_PUB_SPKI])
                    .unwrap();
                let wire = envelope.to_value().unwrap();
                assert_eq!(rsa.decrypt_packet(&wire).unwrap(), doc);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[tokio::test]
async fn test_shared_service_across_tasks() {
    let x25519 = Arc::new(service(X25519_PKCS8));
    let mut tasks = Vec::new();

    for i in 0..8 {
        let x25519 = Arc::clone(&x25519);
        tasks.push(tokio::spawn(async move {
            let doc = json!({"n": i, "keep": "clear"});
            let envelope: Envelope = x25519.encrypt_packet(&doc, &["/n"], &[X25519_PUB]).unwrap();
            x25519.decrypt_envelope(&envelope).unwrap() == doc
        }));
    }

    for task in tasks {
        assert!(task.await.unwrap());
    }
}

// --- Properties ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_flat_object_round_trip(
        fields in prop::collection::btree_map("[a-z$/~]{1,6}", "[ -~]{0,12}", 1..8),
        take in prop::collection::vec(any::<bool>(), 8),
    ) {
        init_tracing();
        let doc = Value::Object(
            fields.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect(),
        );
        let paths: Vec<String> = fields
            .keys()
            .zip(take)
            .filter(|(_, take)| *take)
            .map(|(k, _)| format!("/{}", k.replace('~', "~0").replace('/', "~1")))
            .collect();

        let opener = service(X25519_PKCS8);
        let envelope = opener.encrypt_packet(&doc, &paths, &[X25519_PUB]).unwrap();
        let marked = sealpack::core::marker_indices(&envelope.plain).len();
        prop_assert_eq!(marked, paths.len());
        prop_assert_eq!(opener.decrypt_envelope(&envelope).unwrap(), doc);
    }
}
