use std::fmt;

use uuid::Uuid;

/// Opaque value bound to an ID token so a replayed token can be detected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Nonce {
    value: String,
}

impl Nonce {
    /// Accepts any non-empty string without whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self { value })
    }

    pub fn generate() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
