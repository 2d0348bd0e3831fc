use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

const VERIFIER_LENGTH: usize = 64;
const MIN_LENGTH: usize = 43;
const MAX_LENGTH: usize = 128;
const UNRESERVED_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE code verifier sent with the authorization request (as its challenge) and
/// again, in plain text, when the returned code is exchanged for tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeVerifier {
    value: String,
}

impl CodeVerifier {
    /// Generates a verifier using a cryptographically secure RNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let value = (0..VERIFIER_LENGTH)
            .map(|_| UNRESERVED_CHARSET[rng.gen_range(0..UNRESERVED_CHARSET.len())] as char)
            .collect();
        Self { value }
    }

    /// Wraps an existing verifier; it must be 43 to 128 unreserved URL characters.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&value.len()) {
            return None;
        }
        if !value.bytes().all(|byte| UNRESERVED_CHARSET.contains(&byte)) {
            return None;
        }
        Some(Self { value })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Base64url (unpadded) SHA-256 of the verifier.
    pub fn challenge(&self) -> String {
        let digest = Sha256::digest(self.value.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
    }

    pub fn method(&self) -> &'static str {
        "S256"
    }
}

impl Default for CodeVerifier {
    fn default() -> Self {
        Self::generate()
    }
}
