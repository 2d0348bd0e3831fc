use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::Engine as _;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeBase64Error;

impl fmt::Display for DecodeBase64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode base64 string")
    }
}

impl std::error::Error for DecodeBase64Error {}

/// Encode bytes with the standard alphabet and padding.
pub fn base64_encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode bytes with the URL-safe alphabet and no padding, as used by JWT segments.
pub fn base64_url_encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn base64_url_encode(input: &str) -> String {
    base64_url_encode_bytes(input.as_bytes())
}

/// Decode a base64url segment, tolerating trailing `=` padding and either alphabet.
pub fn base64_url_decode_bytes(input: &str) -> Result<Vec<u8>, DecodeBase64Error> {
    let normalized: String = input
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|_err| DecodeBase64Error)
}

/// Decode a base64url segment into UTF-8 text.
pub fn base64_url_decode(input: &str) -> Result<String, DecodeBase64Error> {
    let bytes = base64_url_decode_bytes(input)?;
    String::from_utf8(bytes).map_err(|_err| DecodeBase64Error)
}
