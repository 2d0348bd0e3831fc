use std::collections::BTreeMap;

use chrono::NaiveDate;
use url::Url;

use crate::login::token::AuthenticationTokenClaims;

const BIRTHDAY_FORMAT: &str = "%m/%d/%Y";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserAgeRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl UserAgeRange {
    /// Reads `min`/`max`; rejects empty, negative or inverted ranges.
    pub fn from_map(map: &BTreeMap<String, i64>) -> Option<Self> {
        let min = map.get("min").copied();
        let max = map.get("max").copied();
        if min.is_none() && max.is_none() {
            return None;
        }
        if min.is_some_and(|min| min < 0) || max.is_some_and(|max| max < 0) {
            return None;
        }
        if let (Some(min), Some(max)) = (min, max) {
            if max <= min {
                return None;
            }
        }
        Some(Self { min, max })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub name: String,
}

impl Location {
    pub fn from_map(map: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            id: map.get("id")?.clone(),
            name: map.get("name")?.clone(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub link_url: Option<Url>,
    pub image_url: Option<Url>,
    pub email: Option<String>,
    pub friend_ids: Option<Vec<String>>,
    pub birthday: Option<NaiveDate>,
    pub age_range: Option<UserAgeRange>,
    pub hometown: Option<Location>,
    pub location: Option<Location>,
    pub gender: Option<String>,
    /// Built from ID token claims rather than a Graph `/me` fetch.
    pub is_limited: bool,
}

impl Profile {
    /// Limited profile derived from ID token claims; `None` when the subject is empty.
    pub fn from_claims(claims: &AuthenticationTokenClaims) -> Option<Self> {
        if claims.sub.is_empty() {
            return None;
        }
        let parse_url = |raw: &Option<String>| raw.as_deref().and_then(|raw| Url::parse(raw).ok());

        Some(Self {
            user_id: claims.sub.clone(),
            first_name: claims.given_name.clone(),
            middle_name: claims.middle_name.clone(),
            last_name: claims.family_name.clone(),
            name: claims.name.clone(),
            link_url: parse_url(&claims.user_link),
            image_url: parse_url(&claims.picture),
            email: claims.email.clone(),
            friend_ids: claims.user_friends.clone(),
            birthday: claims
                .user_birthday
                .as_deref()
                .and_then(|raw| NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT).ok()),
            age_range: claims.user_age_range.as_ref().and_then(UserAgeRange::from_map),
            hometown: claims.user_hometown.as_ref().and_then(Location::from_map),
            location: claims.user_location.as_ref().and_then(Location::from_map),
            gender: claims.user_gender.clone(),
            is_limited: true,
        })
    }
}
