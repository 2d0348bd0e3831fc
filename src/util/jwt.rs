use crate::util::base64::base64_url_decode;
use crate::util::json::{json_object, JsonObject};

/// The three dot-separated segments of a compact JWS such as an OpenID Connect ID token.
#[derive(Debug, Clone, Default)]
pub struct TokenSegments {
    pub header: String,
    pub claims: String,
    pub signature: String,
}

pub fn split_token(token: &str) -> Option<TokenSegments> {
    let mut parts = token.split('.');
    let header = parts.next()?.to_string();
    let claims = parts.next()?.to_string();
    let signature = parts.next()?.to_string();
    if parts.next().is_some() || header.is_empty() || claims.is_empty() {
        return None;
    }
    Some(TokenSegments {
        header,
        claims,
        signature,
    })
}

/// Decodes a single base64url JSON segment into an object.
pub fn decode_segment(segment: &str) -> Option<JsonObject> {
    base64_url_decode(segment)
        .ok()
        .and_then(|decoded| json_object(&decoded))
}

/// Extracts `user_id` from the payload of a `signed_request` (`<signature>.<payload>`).
pub fn user_id_from_signed_request(signed_request: &str) -> Option<String> {
    let payload = signed_request.split('.').nth(1)?;
    let claims = decode_segment(payload)?;
    claims
        .get("user_id")
        .and_then(|value| value.as_str())
        .map(str::to_string)
}
