//! SDK configuration shared by the bridge, login and gaming services.

use url::Url;

use crate::util::errors::{invalid_argument, SdkResult};
use crate::util::url::{build_url, QueryParameters};

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_GRAPH_API_VERSION: &str = "v17.0";
pub const DEFAULT_DOMAIN: &str = "facebook.com";

/// Supplies the URL scheme this application registered for inbound callbacks.
pub trait AppUrlSchemeProvider: Send + Sync {
    fn app_url_scheme(&self) -> Option<String>;

    fn app_url(&self, host: &str, path: &str, query: &QueryParameters) -> SdkResult<Url>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub app_id: Option<String>,
    pub app_url_scheme_suffix: Option<String>,
    pub display_name: Option<String>,
    pub graph_api_version: String,
    /// Overrides the `facebook.com` part of platform URLs (e.g. `beta.facebook.com`).
    pub facebook_domain_part: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: None,
            app_url_scheme_suffix: None,
            display_name: None,
            graph_api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            facebook_domain_part: None,
        }
    }
}

impl Settings {
    pub fn with_app_id(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Default::default()
        }
    }

    pub fn sdk_version(&self) -> &'static str {
        SDK_VERSION
    }

    pub fn domain(&self) -> &str {
        self.facebook_domain_part
            .as_deref()
            .filter(|domain| !domain.is_empty())
            .unwrap_or(DEFAULT_DOMAIN)
    }

    /// `https://{prefix}.{domain}/{version}{path}`.
    pub fn facebook_url(
        &self,
        host_prefix: &str,
        path: &str,
        query: &QueryParameters,
    ) -> SdkResult<Url> {
        let host = if host_prefix.is_empty() {
            self.domain().to_string()
        } else {
            format!("{host_prefix}.{}", self.domain())
        };
        let path = path.trim_start_matches('/');
        let versioned = format!("{}/{path}", self.graph_api_version);
        build_url("https", &host, &versioned, query)
    }

    fn require_app_id(&self) -> SdkResult<&str> {
        self.app_id
            .as_deref()
            .filter(|app_id| !app_id.is_empty())
            .ok_or_else(|| invalid_argument("app_id", "", "App ID is not configured."))
    }
}

impl AppUrlSchemeProvider for Settings {
    fn app_url_scheme(&self) -> Option<String> {
        let app_id = self.require_app_id().ok()?;
        let suffix = self.app_url_scheme_suffix.as_deref().unwrap_or_default();
        Some(format!("fb{app_id}{suffix}"))
    }

    fn app_url(&self, host: &str, path: &str, query: &QueryParameters) -> SdkResult<Url> {
        self.require_app_id()?;
        let scheme = self
            .app_url_scheme()
            .ok_or_else(|| invalid_argument("app_id", "", "App ID is not configured."))?;
        build_url(&scheme, host, path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_url_scheme_includes_suffix() {
        let mut settings = Settings::with_app_id("123");
        assert_eq!(settings.app_url_scheme().as_deref(), Some("fb123"));
        settings.app_url_scheme_suffix = Some("lite".into());
        assert_eq!(settings.app_url_scheme().as_deref(), Some("fb123lite"));
    }

    #[test]
    fn app_url_requires_app_id() {
        let settings = Settings::default();
        assert!(settings.app_url_scheme().is_none());
        assert!(settings.app_url("authorize", "", &QueryParameters::new()).is_err());
    }

    #[test]
    fn facebook_url_is_versioned() {
        let settings = Settings::with_app_id("123");
        let url = settings
            .facebook_url("m", "/dialog/share", &QueryParameters::new())
            .unwrap();
        assert_eq!(url.as_str(), "https://m.facebook.com/v17.0/dialog/share");
    }
}
