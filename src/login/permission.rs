use std::collections::HashSet;
use std::fmt;

/// A validated Graph permission name such as `public_profile` or `user_actions.books`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    value: String,
}

impl Permission {
    /// Trims surrounding whitespace; returns `None` for empty names or names containing
    /// anything other than lowercase ASCII letters, underscores and dots.
    pub fn new(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        let valid = value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch == '_' || ch == '.');
        valid.then(|| Self {
            value: value.to_string(),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Parses every raw permission; a single invalid entry rejects the whole set.
pub fn permissions_from_raw<I, S>(raw: I) -> Option<HashSet<Permission>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|value| Permission::new(value.as_ref()))
        .collect()
}

/// Splits a comma separated scope string (`granted_scopes`, `denied_scopes`).
///
/// An empty string yields an empty set rather than `None`.
pub fn permissions_from_scopes(scopes: &str) -> Option<HashSet<Permission>> {
    if scopes.trim().is_empty() {
        return Some(HashSet::new());
    }
    permissions_from_raw(scopes.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_is_trimmed_and_validated() {
        assert_eq!(Permission::new("  email ").unwrap().value(), "email");
        assert_eq!(
            Permission::new("user_actions.books").unwrap().to_string(),
            "user_actions.books"
        );
        assert!(Permission::new("").is_none());
        assert!(Permission::new("Email").is_none());
        assert!(Permission::new("email address").is_none());
    }

    #[test]
    fn raw_permissions_fail_as_a_whole() {
        let parsed = permissions_from_raw(["email", "public_profile"]).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(permissions_from_raw(["email", "BAD"]).is_none());
    }

    #[test]
    fn empty_scopes_produce_empty_set() {
        assert_eq!(permissions_from_scopes(""), Some(HashSet::new()));
        let scopes = permissions_from_scopes("email,user_friends").unwrap();
        assert!(scopes.contains(&Permission::new("user_friends").unwrap()));
    }
}
