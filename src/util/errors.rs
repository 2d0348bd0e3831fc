use std::collections::BTreeMap;
use std::fmt;

pub type ErrorData = BTreeMap<String, String>;
pub type SdkResult<T> = Result<T, SdkError>;

pub const CORE_ERROR_DOMAIN: &str = "com.facebook.sdk.core";
pub const LOGIN_ERROR_DOMAIN: &str = "com.facebook.sdk.login";
pub const AUTHENTICATION_SESSION_ERROR_DOMAIN: &str =
    "com.apple.AuthenticationServices.WebAuthenticationSession";

/// User-info keys attached to errors surfaced by the Graph API and the login flow.
pub const ERROR_DEVELOPER_MESSAGE_KEY: &str = "developer_message";
pub const ERROR_LOCALIZED_DESCRIPTION_KEY: &str = "localized_description";
pub const ERROR_ARGUMENT_NAME_KEY: &str = "argument_name";
pub const ERROR_ARGUMENT_VALUE_KEY: &str = "argument_value";
pub const GRAPH_REQUEST_ERROR_KEY: &str = "graph_request_error";
pub const GRAPH_ERROR_CODE_KEY: &str = "graph_error_code";
pub const GRAPH_ERROR_SUBCODE_KEY: &str = "graph_error_subcode";
pub const GRAPH_ERROR_TYPE_KEY: &str = "error_type";
pub const GRAPH_ERROR_TRACE_ID_KEY: &str = "fbtrace_id";
pub const HTTP_STATUS_CODE_KEY: &str = "http_status_code";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum CoreErrorCode {
    Reserved = 0,
    Encryption = 1,
    InvalidArgument = 2,
    Unknown = 3,
    Network = 4,
    GraphRequestProtocolMismatch = 7,
    GraphRequestGraphApi = 8,
    DialogUnavailable = 9,
    AccessTokenRequired = 10,
    AppVersionUnsupported = 11,
    BrowserUnavailable = 12,
    BridgeApiInterruption = 13,
    BridgeApiResponse = 14,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum LoginErrorCode {
    Reserved = 300,
    Unknown = 301,
    PasswordChanged = 302,
    UserCheckpointed = 303,
    UserMismatch = 304,
    UnconfirmedUser = 305,
    SystemAccountAppDisabled = 306,
    SystemAccountUnavailable = 307,
    BadChallengeString = 308,
    InvalidIdToken = 309,
    MissingAccessToken = 310,
}

/// Category attached to Graph API failures, mirroring the recovery hint the
/// server-side error classification would produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphRequestErrorKind {
    Other,
    Transient,
    Recoverable,
}

impl GraphRequestErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphRequestErrorKind::Other => "other",
            GraphRequestErrorKind::Transient => "transient",
            GraphRequestErrorKind::Recoverable => "recoverable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdkError {
    pub domain: String,
    pub code: i64,
    pub message: Option<String>,
    pub user_info: ErrorData,
}

impl SdkError {
    pub fn new(domain: impl Into<String>, code: i64, message: Option<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message,
            user_info: ErrorData::new(),
        }
    }

    pub fn with_user_info<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.user_info.insert(key.into(), value.into());
        }
        self
    }

    pub fn user_info_value(&self, key: &str) -> Option<&str> {
        self.user_info.get(key).map(String::as_str)
    }

    pub fn is_core(&self, code: CoreErrorCode) -> bool {
        self.domain == CORE_ERROR_DOMAIN && self.code == code as i64
    }

    pub fn is_login(&self, code: LoginErrorCode) -> bool {
        self.domain == LOGIN_ERROR_DOMAIN && self.code == code as i64
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message} ({}/{})", self.domain, self.code),
            None => write!(f, "{}/{}", self.domain, self.code),
        }
    }
}

impl std::error::Error for SdkError {}

/// Builds [`SdkError`] values bound to a single error domain.
#[derive(Clone, Debug)]
pub struct ErrorFactory {
    domain: &'static str,
}

impl ErrorFactory {
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub const fn core() -> Self {
        Self::new(CORE_ERROR_DOMAIN)
    }

    pub const fn login() -> Self {
        Self::new(LOGIN_ERROR_DOMAIN)
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn error(&self, code: i64, message: impl Into<String>) -> SdkError {
        SdkError::new(self.domain, code, Some(message.into()))
    }

    /// Error whose message is also exposed as the localized description.
    pub fn described_error(&self, code: i64, message: impl Into<String>) -> SdkError {
        let message = message.into();
        SdkError::new(self.domain, code, Some(message.clone()))
            .with_user_info([(ERROR_LOCALIZED_DESCRIPTION_KEY, message)])
    }

    pub fn invalid_argument(
        &self,
        name: &str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> SdkError {
        SdkError::new(
            self.domain,
            CoreErrorCode::InvalidArgument as i64,
            Some(message.into()),
        )
        .with_user_info([
            (ERROR_ARGUMENT_NAME_KEY, name.to_string()),
            (ERROR_ARGUMENT_VALUE_KEY, value.into()),
        ])
    }

    pub fn unknown(&self, message: impl Into<String>) -> SdkError {
        SdkError::new(self.domain, CoreErrorCode::Unknown as i64, Some(message.into()))
    }
}

pub fn core_error(code: CoreErrorCode, message: impl Into<String>) -> SdkError {
    ErrorFactory::core().error(code as i64, message)
}

pub fn login_error(code: LoginErrorCode, message: impl Into<String>) -> SdkError {
    ErrorFactory::login().error(code as i64, message)
}

pub fn invalid_argument(name: &str, value: impl Into<String>, message: impl Into<String>) -> SdkError {
    ErrorFactory::core().invalid_argument(name, value, message)
}
