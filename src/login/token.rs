use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use url::Url;

use crate::logger::Logger;
use crate::settings::Settings;
use crate::util::json::{string_value, JsonObject};
use crate::util::jwt::{decode_segment, split_token};

const VALID_HOST: &str = "facebook.com";
const VALID_HOST_SUFFIX: &str = ".facebook.com";
const MAX_SECONDS_SINCE_ISSUED: f64 = 10.0 * 60.0;

/// Validated claims of an OpenID Connect ID token issued by the platform.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticationTokenClaims {
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub nonce: String,
    pub exp: f64,
    pub iat: f64,
    pub sub: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub family_name: Option<String>,
    /// Only present when the `email` permission was granted.
    pub email: Option<String>,
    pub picture: Option<String>,
    /// Only present when the `user_friends` permission was granted.
    pub user_friends: Option<Vec<String>>,
    pub user_birthday: Option<String>,
    pub user_age_range: Option<BTreeMap<String, i64>>,
    pub user_hometown: Option<BTreeMap<String, String>>,
    pub user_location: Option<BTreeMap<String, String>>,
    pub user_gender: Option<String>,
    pub user_link: Option<String>,
}

impl AuthenticationTokenClaims {
    /// Decodes the base64url claims segment and validates it against `expected_nonce`
    /// and `app_id`. Any failed check yields `None`.
    pub fn from_encoded(encoded: &str, expected_nonce: &str, app_id: &str) -> Option<Self> {
        let claims = decode_segment(encoded)?;
        Self::from_object(&claims, expected_nonce, app_id)
    }

    fn from_object(claims: &JsonObject, expected_nonce: &str, app_id: &str) -> Option<Self> {
        let now = Utc::now().timestamp() as f64;

        let jti = non_empty(claims, "jti")?;
        let iss = string_value(claims, "iss")?.to_string();
        let issuer = Url::parse(&iss).ok()?;
        let host = issuer.host_str()?;
        if host != VALID_HOST && !host.ends_with(VALID_HOST_SUFFIX) {
            return None;
        }
        let aud = string_value(claims, "aud")?.to_string();
        if app_id.is_empty() || aud != app_id {
            return None;
        }
        let exp = claims.get("exp").and_then(Value::as_f64)?;
        if exp <= now {
            return None;
        }
        let iat = claims.get("iat").and_then(Value::as_f64)?;
        if iat < now - MAX_SECONDS_SINCE_ISSUED {
            return None;
        }
        let nonce = non_empty(claims, "nonce")?;
        if nonce != expected_nonce {
            return None;
        }
        let sub = non_empty(claims, "sub")?;

        Some(Self {
            jti,
            iss,
            aud,
            nonce,
            exp,
            iat,
            sub,
            name: optional_string(claims, "name"),
            given_name: optional_string(claims, "given_name"),
            middle_name: optional_string(claims, "middle_name"),
            family_name: optional_string(claims, "family_name"),
            email: optional_string(claims, "email"),
            picture: optional_string(claims, "picture"),
            user_friends: string_list(claims, "user_friends"),
            user_birthday: optional_string(claims, "user_birthday"),
            user_age_range: number_map(claims, "user_age_range"),
            user_hometown: string_map(claims, "user_hometown"),
            user_location: string_map(claims, "user_location"),
            user_gender: optional_string(claims, "user_gender"),
            user_link: optional_string(claims, "user_link"),
        })
    }
}

fn non_empty(claims: &JsonObject, key: &str) -> Option<String> {
    string_value(claims, key)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn optional_string(claims: &JsonObject, key: &str) -> Option<String> {
    string_value(claims, key).map(str::to_string)
}

fn string_list(claims: &JsonObject, key: &str) -> Option<Vec<String>> {
    let values = claims.get(key)?.as_array()?;
    values
        .iter()
        .map(|value| value.as_str().map(str::to_string))
        .collect()
}

fn number_map(claims: &JsonObject, key: &str) -> Option<BTreeMap<String, i64>> {
    let map = claims.get(key)?.as_object()?;
    let parsed: BTreeMap<String, i64> = map
        .iter()
        .map(|(key, value)| value.as_i64().map(|number| (key.clone(), number)))
        .collect::<Option<_>>()?;
    (!parsed.is_empty()).then_some(parsed)
}

fn string_map(claims: &JsonObject, key: &str) -> Option<BTreeMap<String, String>> {
    let map = claims.get(key)?.as_object()?;
    let parsed: BTreeMap<String, String> = map
        .iter()
        .map(|(key, value)| value.as_str().map(|text| (key.clone(), text.to_string())))
        .collect::<Option<_>>()?;
    (!parsed.is_empty()).then_some(parsed)
}

/// An ID token together with the nonce it was requested with.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticationToken {
    pub token_string: String,
    pub nonce: String,
    pub graph_domain: Option<String>,
    pub claims: AuthenticationTokenClaims,
}

/// Turns a raw ID token string into a validated [`AuthenticationToken`].
#[async_trait]
pub trait AuthenticationTokenCreating: Send + Sync {
    async fn create_token(
        &self,
        token_string: &str,
        nonce: &str,
        graph_domain: Option<&str>,
    ) -> Option<AuthenticationToken>;
}

/// Default token creator.
///
/// Decodes and validates the claims segment. The JWS signature is not verified here;
/// deployments that need it plug in their own [`AuthenticationTokenCreating`].
pub struct AuthenticationTokenFactory {
    settings: Arc<Settings>,
    logger: Logger,
}

impl AuthenticationTokenFactory {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            logger: Logger::developer_errors(),
        }
    }
}

#[async_trait]
impl AuthenticationTokenCreating for AuthenticationTokenFactory {
    async fn create_token(
        &self,
        token_string: &str,
        nonce: &str,
        graph_domain: Option<&str>,
    ) -> Option<AuthenticationToken> {
        if token_string.is_empty() || nonce.is_empty() {
            return None;
        }
        let segments = split_token(token_string)?;
        if decode_segment(&segments.header).is_none() {
            self.logger.log_entry("Invalid ID token header.");
            return None;
        }
        let app_id = self.settings.app_id.as_deref().unwrap_or_default();
        let Some(claims) = AuthenticationTokenClaims::from_encoded(&segments.claims, nonce, app_id)
        else {
            self.logger.log_entry("ID token claims failed validation.");
            return None;
        };
        Some(AuthenticationToken {
            token_string: token_string.to_string(),
            nonce: nonce.to_string(),
            graph_domain: graph_domain.map(str::to_string),
            claims,
        })
    }
}
