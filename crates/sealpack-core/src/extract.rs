//! Field extraction.
//!
//! Extraction walks the locator list in order. Each locator is looked up in
//! the working copy as it stands after the previous replacements, so a
//! locator that passes through an earlier marker no longer finds anything.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::escape::escape_refs;
use crate::marker::marker;
use crate::pointer::Pointer;

/// Which existing values may be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractPolicy {
    /// Any node that exists, including `null`, `false`, `0` and `""`.
    #[default]
    Present,
    /// Only truthy nodes. `null`, `false`, `0` and `""` are reported as
    /// missing. Empty arrays and objects are truthy.
    Truthy,
}

impl ExtractPolicy {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Present => true,
            Self::Truthy => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
                Value::String(s) => !s.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }
}

/// The result of extracting fields from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The escaped working copy with a marker at every extracted location.
    pub marked: Value,
    /// The extracted values; `values[n]` is referenced by marker `n`.
    pub values: Vec<Value>,
}

/// Replace every addressed node of `document` with a reference marker.
///
/// `document` is not modified. The returned [`Extraction::marked`] has its
/// `$ref`-like keys escaped, and so do the extracted values.
///
/// # Errors
///
/// Returns [`CoreError::BadPath`] carrying the locator as given if it is not
/// a valid pointer, addresses nothing, or addresses a value rejected by
/// `policy`.
pub fn extract<P: AsRef<str>>(
    document: &Value,
    paths: &[P],
    policy: ExtractPolicy,
) -> Result<Extraction> {
    let mut marked = escape_refs(document);
    let mut values = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let pointer = Pointer::parse(path)?.escaped();

        let node = pointer
            .get_mut(&mut marked)
            .filter(|node| policy.accepts(node))
            .ok_or_else(|| CoreError::BadPath(path.to_string()))?;

        let index = values.len();
        values.push(std::mem::replace(node, marker(index)));
    }

    debug!(extracted = values.len(), ?policy, "extracted fields");

    Ok(Extraction { marked, values })
}
