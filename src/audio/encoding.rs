//! Base64 text encoding for binary audio payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{AudioError, Result};

/// Decodes standard (padded) base64 text into bytes.
///
/// Fails with `INVALID_BASE64` on characters outside the alphabet or a
/// malformed tail.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text).map_err(AudioError::invalid_base64)
}

/// Encodes bytes as standard (padded) base64 text.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
