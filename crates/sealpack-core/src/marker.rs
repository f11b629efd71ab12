//! Reference markers.
//!
//! A marker is an object with exactly one key, `$ref`, whose value is a
//! string. Markers written by extraction always point into the encrypted
//! values array: `#/encrypted/<n>`.

use serde_json::{Map, Value};

/// The key used by reference markers.
pub const REF_KEY: &str = "$ref";

/// Prefix of every marker target produced by extraction.
pub const ENCRYPTED_PREFIX: &str = "#/encrypted/";

/// Where a marker points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTarget<'a> {
    /// An index into the encrypted values array.
    Encrypted(usize),
    /// A target under `#/encrypted/` that is not a valid index.
    Malformed(&'a str),
    /// Anything else. Left untouched by resolution.
    Foreign(&'a str),
}

impl<'a> MarkerTarget<'a> {
    /// Classify `value` if it is marker-shaped.
    pub fn of(value: &'a Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        let target = map.get(REF_KEY)?.as_str()?;

        Some(match target.strip_prefix(ENCRYPTED_PREFIX) {
            Some(index) if is_canonical_index(index) => match index.parse() {
                Ok(i) => Self::Encrypted(i),
                Err(_) => Self::Malformed(target),
            },
            Some(_) => Self::Malformed(target),
            None => Self::Foreign(target),
        })
    }
}

/// Build the marker for encrypted value `index`.
pub fn marker(index: usize) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(
        REF_KEY.to_string(),
        Value::String(format!("{ENCRYPTED_PREFIX}{index}")),
    );
    Value::Object(map)
}

/// Collect the indices of every encrypted-value marker in `value`, in
/// document order.
pub fn marker_indices(value: &Value) -> Vec<usize> {
    let mut out = Vec::new();
    collect(value, &mut out);
    out
}

fn collect(value: &Value, out: &mut Vec<usize>) {
    if let Some(MarkerTarget::Encrypted(i)) = MarkerTarget::of(value) {
        out.push(i);
        return;
    }
    match value {
        Value::Object(map) => map.values().for_each(|v| collect(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
        _ => {}
    }
}

fn is_canonical_index(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}
