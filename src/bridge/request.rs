use std::fmt;
use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::bridge::platform::InternalUrlOpener;
use crate::bridge::protocol::{BridgeApiProtocol, NativeV1Protocol, WebV1Protocol};
use crate::settings::Settings;
use crate::util::errors::{core_error, CoreErrorCode, SdkResult};
use crate::util::json::JsonObject;

/// Version suffix of the native app-switch scheme (`fbapi20130214`).
const NATIVE_PROTOCOL_VERSION: &str = "20130214";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BridgeApiProtocolType {
    /// App switch into an installed companion app.
    Native,
    /// Mobile web dialog.
    Web,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlScheme {
    FacebookApi,
    MessengerApp,
    Https,
    Http,
}

impl UrlScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlScheme::FacebookApi => "fbapi",
            UrlScheme::MessengerApp => "fb-messenger-share-api",
            UrlScheme::Https => "https",
            UrlScheme::Http => "http",
        }
    }

    pub fn is_http(self) -> bool {
        self.as_str().starts_with("http")
    }
}

/// One outgoing cross-process call. Immutable once built; `action_id` correlates the
/// callback with the request.
#[derive(Clone)]
pub struct BridgeApiRequest {
    pub protocol_type: BridgeApiProtocolType,
    pub scheme: UrlScheme,
    pub method_name: String,
    pub parameters: JsonObject,
    pub user_info: JsonObject,
    pub action_id: String,
    protocol: Arc<dyn BridgeApiProtocol>,
}

impl BridgeApiRequest {
    /// Returns `None` when no protocol serves `protocol_type` over `scheme`.
    pub fn new(
        protocol_type: BridgeApiProtocolType,
        scheme: UrlScheme,
        method_name: impl Into<String>,
        parameters: JsonObject,
        user_info: JsonObject,
        settings: Arc<Settings>,
    ) -> Option<Self> {
        let protocol: Arc<dyn BridgeApiProtocol> = match (protocol_type, scheme) {
            (BridgeApiProtocolType::Native, UrlScheme::FacebookApi | UrlScheme::MessengerApp) => {
                Arc::new(NativeV1Protocol::new(
                    format!("{}{NATIVE_PROTOCOL_VERSION}", scheme.as_str()),
                    settings,
                ))
            }
            (BridgeApiProtocolType::Web, UrlScheme::Https) => Arc::new(WebV1Protocol::new(settings)),
            _ => return None,
        };
        Some(Self::with_protocol(
            protocol_type,
            scheme,
            method_name,
            parameters,
            user_info,
            protocol,
        ))
    }

    /// Builds a request around an explicit protocol strategy.
    pub fn with_protocol(
        protocol_type: BridgeApiProtocolType,
        scheme: UrlScheme,
        method_name: impl Into<String>,
        parameters: JsonObject,
        user_info: JsonObject,
        protocol: Arc<dyn BridgeApiProtocol>,
    ) -> Self {
        Self {
            protocol_type,
            scheme,
            method_name: method_name.into(),
            parameters,
            user_info,
            action_id: Uuid::new_v4().to_string(),
            protocol,
        }
    }

    pub fn protocol(&self) -> &Arc<dyn BridgeApiProtocol> {
        &self.protocol
    }

    /// The URL to open for this request; fails when the destination cannot be opened.
    pub fn request_url(&self, opener: &dyn InternalUrlOpener) -> SdkResult<Url> {
        let url = self.protocol.request_url(
            &self.action_id,
            self.scheme.as_str(),
            &self.method_name,
            &self.parameters,
        )?;
        if !opener.can_open_url(&url) {
            let code = if self.scheme.is_http() {
                CoreErrorCode::BrowserUnavailable
            } else {
                CoreErrorCode::AppVersionUnsupported
            };
            return Err(core_error(code, format!("Unable to open request URL: {url}")));
        }
        Ok(url)
    }
}

impl fmt::Debug for BridgeApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeApiRequest")
            .field("protocol_type", &self.protocol_type)
            .field("scheme", &self.scheme)
            .field("method_name", &self.method_name)
            .field("action_id", &self.action_id)
            .finish()
    }
}

impl PartialEq for BridgeApiRequest {
    fn eq(&self, other: &Self) -> bool {
        self.action_id == other.action_id
    }
}
