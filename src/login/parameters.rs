use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::login::permission::Permission;
use crate::login::profile::Profile;
use crate::login::token::AuthenticationToken;
use crate::util::errors::SdkError;

/// Everything gathered while completing a login redirect.
///
/// Filled in from the redirect query first, then updated by each exchange step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoginCompletionParameters {
    pub access_token_string: Option<String>,
    pub nonce_string: Option<String>,
    pub authentication_token_string: Option<String>,
    pub code: Option<String>,
    pub authentication_token: Option<AuthenticationToken>,
    pub profile: Option<Profile>,
    pub permissions: Option<HashSet<Permission>>,
    pub declined_permissions: Option<HashSet<Permission>>,
    pub expired_permissions: Option<HashSet<Permission>>,
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub graph_domain: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub data_access_expiration_date: Option<DateTime<Utc>>,
    pub challenge: Option<String>,
    pub error: Option<SdkError>,
}

impl LoginCompletionParameters {
    /// True when nothing token-bearing was ever populated and no error occurred,
    /// which is how a user cancellation surfaces.
    pub fn is_cancelled(&self) -> bool {
        self.error.is_none()
            && self.access_token_string.is_none()
            && self.authentication_token_string.is_none()
            && self.code.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameters_read_as_cancelled() {
        let mut parameters = LoginCompletionParameters::default();
        assert!(parameters.is_cancelled());
        parameters.access_token_string = Some("token".into());
        assert!(!parameters.is_cancelled());
    }
}
