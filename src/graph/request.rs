use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::util::errors::SdkResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Per-request switches for the connection's token bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphRequestFlags {
    /// A failure must not clear the cached access token.
    pub do_not_invalidate_token_on_error: bool,
    /// A failure must not trigger interactive error recovery.
    pub disable_error_recovery: bool,
}

impl GraphRequestFlags {
    pub const NONE: Self = Self {
        do_not_invalidate_token_on_error: false,
        disable_error_recovery: false,
    };

    /// Used by token exchanges, which run before any token is cached.
    pub const TOKEN_EXCHANGE: Self = Self {
        do_not_invalidate_token_on_error: true,
        disable_error_recovery: true,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphRequest {
    pub graph_path: String,
    pub parameters: BTreeMap<String, String>,
    pub http_method: HttpMethod,
    pub flags: GraphRequestFlags,
    pub token_string: Option<String>,
    pub version: Option<String>,
}

impl GraphRequest {
    pub fn new(graph_path: impl Into<String>) -> Self {
        Self {
            graph_path: graph_path.into(),
            parameters: BTreeMap::new(),
            http_method: HttpMethod::Get,
            flags: GraphRequestFlags::NONE,
            token_string: None,
            version: None,
        }
    }

    pub fn with_parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in parameters {
            self.parameters.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_flags(mut self, flags: GraphRequestFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_http_method(mut self, method: HttpMethod) -> Self {
        self.http_method = method;
        self
    }

    pub fn with_token_string(mut self, token: impl Into<String>) -> Self {
        self.token_string = Some(token.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Executes Graph API requests.
///
/// Implementations resolve with the decoded JSON body on success. Graph errors are
/// surfaced as [`crate::util::SdkError`] values and passed through untouched by callers.
#[async_trait]
pub trait GraphRequestConnection: Send + Sync {
    async fn start(&self, request: GraphRequest) -> SdkResult<Value>;
}
