//! Unpadded base64url, as used by every binary JOSE member.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{JoseError, Result};

pub(crate) fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode `value`, naming `member` in the error.
pub(crate) fn decode(member: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| JoseError::MalformedJwe(format!("`{member}` is not base64url: {e}")))
}
