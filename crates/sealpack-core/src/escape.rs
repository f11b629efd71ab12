//! Escaping of literal `$ref` keys.
//!
//! Markers are objects with a single `$ref` key, so a caller's own `$ref`
//! keys have to be moved out of the way before extraction. Any key made of
//! one or more `$` followed by `ref` gains one extra leading `$`; unescaping
//! strips it again. The mapping is a bijection over keys, so documents that
//! already contain `$$ref` survive too.
//!
//! Only object keys are rewritten. String values are left alone.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Whether `key` is `$ref` with one or more leading dollars.
pub fn is_ref_like(key: &str) -> bool {
    match key.strip_suffix("ref") {
        Some(dollars) => !dollars.is_empty() && dollars.bytes().all(|b| b == b'$'),
        None => false,
    }
}

/// Escape a single object key.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if is_ref_like(key) {
        Cow::Owned(format!("${key}"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Reverse [`escape_key`].
pub fn unescape_key(key: &str) -> &str {
    if is_escaped(key) {
        &key[1..]
    } else {
        key
    }
}

fn is_escaped(key: &str) -> bool {
    key.starts_with("$$") && is_ref_like(key)
}

/// Build an escaped copy of `value`. The input is not modified.
pub fn escape_refs(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (escape_key(k).into_owned(), escape_refs(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(escape_refs).collect()),
        other => other.clone(),
    }
}

/// Undo [`escape_refs`], consuming the tree.
pub fn unescape_refs(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let key = if is_escaped(&k) { unescape_key(&k).to_string() } else { k };
                    (key, unescape_refs(v))
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(unescape_refs).collect()),
        other => other,
    }
}
