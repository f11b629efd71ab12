//! Proptest generators for property-based testing.

use proptest::prelude::*;
use sealpack_core::Pointer;
use serde_json::{Map, Value};

/// Generate an object key, biased towards keys that need escaping.
pub fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z_][a-zA-Z0-9_]{0,7}",
        1 => Just("$ref".to_string()),
        1 => Just("$$ref".to_string()),
        1 => Just("a/b".to_string()),
        1 => Just("m~n".to_string()),
        1 => Just(String::new()),
    ]
}

/// Any finite `f64`, subnormals and extreme exponents included.
pub fn finite_f64() -> impl Strategy<Value = f64> {
    use proptest::num::f64::{NEGATIVE, NORMAL, POSITIVE, SUBNORMAL, ZERO};
    POSITIVE | NEGATIVE | NORMAL | SUBNORMAL | ZERO
}

/// Generate a JSON leaf, including the falsy values.
pub fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        finite_f64().prop_map(Value::from),
        "[ -~]{0,16}".prop_map(Value::String),
        Just(Value::String("#/encrypted/0".to_string())),
    ]
}

/// Generate an arbitrary JSON value.
pub fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate a document with an object at the root.
pub fn document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key(), json_value(), 0..8)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

/// Pointers to every node below the root, in pre-order.
pub fn all_pointers(document: &Value) -> Vec<Pointer> {
    fn walk(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Pointer>) {
        let children: Vec<(String, &Value)> = match value {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => return,
        };
        for (segment, child) in children {
            prefix.push(segment);
            out.push(Pointer::from_segments(prefix.clone()));
            walk(child, prefix, out);
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(document, &mut Vec::new(), &mut out);
    out
}

/// Pick locators from `document` where `selector` is set, skipping any that
/// lie under an already picked locator.
pub fn pick_paths(document: &Value, selector: &[bool]) -> Vec<String> {
    let mut chosen: Vec<Pointer> = Vec::new();
    for (pointer, take) in all_pointers(document).into_iter().zip(selector.iter().copied()) {
        let covered = chosen
            .iter()
            .any(|c| pointer.segments().starts_with(c.segments()));
        if take && !covered {
            chosen.push(pointer);
        }
    }
    chosen.iter().map(|p| p.as_str().to_string()).collect()
}

/// A document and locators that all address present, non-overlapping nodes.
#[derive(Debug, Clone)]
pub struct SealParams {
    pub document: Value,
    pub paths: Vec<String>,
}

impl Arbitrary for SealParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (document(), prop::collection::vec(any::<bool>(), 0..64))
            .prop_map(|(document, selector)| {
                let paths = pick_paths(&document, &selector);
                SealParams { document, paths }
            })
            .boxed()
    }
}
