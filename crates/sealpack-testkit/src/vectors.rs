//! Golden envelopes for cross-implementation verification.
//!
//! The envelopes in `data/golden_envelopes.json` were written by an
//! independent JOSE library. Every one must open with the fixture key it is
//! addressed to and resolve back to its document.

use std::path::Path;

use anyhow::{bail, ensure, Context};
use sealpack::{Envelope, SealError};
use sealpack_core::marker_indices;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fixtures::TestFixture;

/// The bundled golden envelopes.
pub const GOLDEN_ENVELOPES: &str = include_str!("../data/golden_envelopes.json");

/// A golden envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: String,
    pub description: String,
    /// The document before extraction.
    pub document: Value,
    /// Locators the envelope was sealed with.
    pub paths: Vec<String>,
    /// The envelope as written.
    pub envelope: Value,
}

/// Parse a JSON array of vectors.
pub fn load_vectors(raw: &str) -> anyhow::Result<Vec<GoldenVector>> {
    serde_json::from_str(raw).context("parsing golden vectors")
}

/// Read vectors from a file.
pub fn load_vectors_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<GoldenVector>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    load_vectors(&raw)
}

/// Get all bundled golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    load_vectors(GOLDEN_ENVELOPES).expect("bundled vectors parse")
}

/// Check one vector against the fixture recipients.
///
/// Returns how many recipients opened it.
pub fn verify_vector(vector: &GoldenVector, fixture: &TestFixture) -> anyhow::Result<usize> {
    let envelope = Envelope::from_value(&vector.envelope).context("parsing envelope")?;

    let mut indices = marker_indices(&envelope.plain);
    indices.sort_unstable();
    ensure!(
        indices == (0..vector.paths.len()).collect::<Vec<_>>(),
        "markers {indices:?} do not match {} paths",
        vector.paths.len()
    );

    let mut opened = 0;
    for recipient in fixture.recipients() {
        match recipient.decrypt_packet(&vector.envelope) {
            Ok(document) => {
                ensure!(document == vector.document, "resolved document differs");
                opened += 1;
            }
            Err(SealError::DecryptionFailure(_)) => {}
            Err(e) => bail!("unexpected error: {e}"),
        }
    }
    ensure!(opened > 0, "no fixture recipient could open the envelope");

    if fixture.outsider.decrypt_packet(&vector.envelope).is_ok() {
        bail!("outsider opened the envelope");
    }

    Ok(opened)
}

/// Verify all bundled vectors.
///
/// Returns `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let fixture = TestFixture::new();
    all_vectors()
        .into_iter()
        .map(|vector| match verify_vector(&vector, &fixture) {
            Ok(opened) => (vector.name, true, format!("opened by {opened}")),
            Err(e) => (vector.name, false, format!("{e:#}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_all_vectors_verify() {
        let results = verify_all_vectors();
        assert!(!results.is_empty());

        for (name, passed, detail) in results {
            assert!(passed, "{name}: {detail}");
        }
    }

    #[test]
    fn test_vector_names_are_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_altered_document_fails() {
        let fixture = TestFixture::new();
        let mut vector = all_vectors().remove(0);
        vector.document = serde_json::json!({"something": "else"});

        let err = verify_vector(&vector, &fixture).unwrap_err();
        assert!(err.to_string().contains("differs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GOLDEN_ENVELOPES.as_bytes()).unwrap();

        let vectors = load_vectors_file(file.path()).unwrap();
        assert_eq!(vectors.len(), all_vectors().len());
    }

    #[test]
    fn test_load_errors_have_context() {
        let err = load_vectors("{").unwrap_err();
        assert!(format!("{err:#}").starts_with("parsing golden vectors"));

        let err = load_vectors_file("/nonexistent/vectors.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vectors.json"));
    }
}
