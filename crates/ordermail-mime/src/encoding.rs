//! MIME encoding utilities.
//!
//! Supports Base64 (with RFC 2045 line wrapping) and RFC 2047 header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length for base64 bodies (RFC 2045 section 6.8).
pub const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-terminated lines of at most
/// [`MAX_LINE_LENGTH`] characters.
///
/// Every line except the last is exactly [`MAX_LINE_LENGTH`] characters long.
/// Empty input produces an empty string.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    // Base64 output is ASCII, so every byte offset is a char boundary.
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LENGTH));
        result.push_str(line);
        result.push_str("\r\n");
        rest = tail;
    }

    result
}

/// Decodes line-wrapped Base64, ignoring any whitespace between lines.
#[cfg(test)]
pub(crate) fn decode_base64_wrapped(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned)
}

/// Returns true if the text contains any character above ASCII 127.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    !text.is_ascii()
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. The value is only encoded if it
/// contains a character above ASCII 127; plain ASCII is returned verbatim.
///
/// # Arguments
///
/// * `text` - Text to encode
/// * `charset` - Character set label written into the encoded word (e.g. "UTF-8")
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}
