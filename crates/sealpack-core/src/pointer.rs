//! JSON Pointer (RFC 6901) parsing and traversal.
//!
//! Only the lookup half of RFC 6901 is needed: extraction replaces nodes that
//! already exist and never appends, so the `-` array token is not accepted.

use std::fmt;

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::escape::escape_key;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    raw: String,
    segments: Vec<String>,
}

impl Pointer {
    /// The pointer addressing the whole document.
    pub fn root() -> Self {
        Self {
            raw: String::new(),
            segments: Vec::new(),
        }
    }

    /// Parse a pointer string.
    ///
    /// Fails with [`CoreError::BadPath`] if the string is neither empty nor
    /// starts with `/`, or if it contains a `~` not followed by `0` or `1`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| CoreError::BadPath(raw.to_string()))?;

        let segments = rest
            .split('/')
            .map(|segment| unescape_segment(segment).ok_or_else(|| CoreError::BadPath(raw.to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Build a pointer from already-unescaped reference tokens.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let raw = segments
            .iter()
            .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
            .collect();
        Self { raw, segments }
    }

    /// The pointer as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The unescaped reference tokens.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this pointer addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The same pointer with every `$ref`-like token escaped, for traversing
    /// a document whose keys went through [`crate::escape_refs`].
    pub fn escaped(&self) -> Self {
        Self::from_segments(self.segments.iter().map(|s| escape_key(s).into_owned()))
    }

    /// Look up the addressed value.
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => array_index(segment).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Look up the addressed value mutably.
    pub fn get_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(document, |node, segment| match node {
                Value::Object(map) => map.get_mut(segment),
                Value::Array(items) => array_index(segment).and_then(move |i| items.get_mut(i)),
                _ => None,
            })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Decode `~1` and `~0`; `None` on any other `~` sequence.
fn unescape_segment(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array indices are decimal with no leading zeros.
fn array_index(segment: &str) -> Option<usize> {
    let valid = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if valid {
        segment.parse().ok()
    } else {
        None
    }
}
