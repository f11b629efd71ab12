//! Reference resolution.
//!
//! Reverses [`crate::extract`]: every `#/encrypted/<n>` marker is replaced
//! by `values[n]`, then the `$ref` key escaping is undone.
//!
//! Extraction only ever captures earlier markers inside later values, so
//! `values[n]` may reference indices below `n` and nothing else. Values are
//! resolved in ascending order and each index is consumed exactly once,
//! which keeps the work linear in the size of the input.

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::escape::unescape_refs;
use crate::marker::MarkerTarget;

/// Deepest nesting a resolved document may reach, matching the recursion
/// limit of `serde_json`'s parser.
pub const MAX_DEPTH: usize = 128;

/// Substitute every encrypted-value marker in `marked` and unescape keys.
///
/// Markers pointing anywhere other than `#/encrypted/` are kept verbatim.
///
/// # Errors
///
/// Returns [`CoreError::UnresolvedReference`] when:
/// - an index is out of range or malformed,
/// - `values[n]` references an index that is not below `n`,
/// - an index is referenced more than once,
/// - a value is never referenced,
/// - the resolved document nests deeper than [`MAX_DEPTH`].
pub fn resolve(marked: &Value, values: &[Value]) -> Result<Value> {
    let mut resolved: Vec<Option<Resolved>> = values.iter().map(|_| None).collect();

    for (index, value) in values.iter().enumerate() {
        let value = substitute(value, &mut resolved, index)?;
        resolved[index] = Some(value);
    }
    let document = substitute(marked, &mut resolved, values.len())?;

    if let Some(index) = resolved.iter().position(Option::is_some) {
        return Err(CoreError::UnresolvedReference(format!(
            "#/encrypted/{index} is never referenced"
        )));
    }

    Ok(unescape_refs(document.value))
}

/// A substituted subtree and its nesting depth (a scalar has depth 1).
struct Resolved {
    value: Value,
    depth: usize,
}

/// Substitute markers in `node`, which may reference indices below `limit`.
fn substitute(node: &Value, resolved: &mut [Option<Resolved>], limit: usize) -> Result<Resolved> {
    match MarkerTarget::of(node) {
        Some(MarkerTarget::Encrypted(index)) => return take(resolved, index, limit),
        Some(MarkerTarget::Malformed(target)) => {
            return Err(CoreError::UnresolvedReference(target.to_string()))
        }
        Some(MarkerTarget::Foreign(_)) | None => {}
    }

    let (value, children) = match node {
        Value::Object(map) => {
            let mut depth = 0;
            let mut out = Map::new();
            for (k, v) in map {
                let child = substitute(v, resolved, limit)?;
                depth = depth.max(child.depth);
                out.insert(k.clone(), child.value);
            }
            (Value::Object(out), depth)
        }
        Value::Array(items) => {
            let mut depth = 0;
            let mut out = Vec::with_capacity(items.len());
            for v in items {
                let child = substitute(v, resolved, limit)?;
                depth = depth.max(child.depth);
                out.push(child.value);
            }
            (Value::Array(out), depth)
        }
        other => (other.clone(), 0),
    };

    let depth = children + 1;
    if depth > MAX_DEPTH {
        return Err(CoreError::UnresolvedReference(format!(
            "resolved document nests deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(Resolved { value, depth })
}

fn take(resolved: &mut [Option<Resolved>], index: usize, limit: usize) -> Result<Resolved> {
    if index >= resolved.len() {
        return Err(CoreError::UnresolvedReference(format!(
            "#/encrypted/{index} (only {} values)",
            resolved.len()
        )));
    }
    if index >= limit {
        return Err(CoreError::UnresolvedReference(format!(
            "#/encrypted/{index} referenced from #/encrypted/{limit}"
        )));
    }
    resolved[index].take().ok_or_else(|| {
        CoreError::UnresolvedReference(format!("#/encrypted/{index} is referenced twice"))
    })
}
