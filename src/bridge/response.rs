use std::sync::Arc;

use url::Url;

use crate::bridge::platform::{OperatingSystemVersion, OperatingSystemVersionComparing};
use crate::bridge::request::{BridgeApiProtocolType, BridgeApiRequest};
use crate::util::errors::{core_error, CoreErrorCode, SdkError, SdkResult};
use crate::util::json::JsonObject;
use crate::util::url::query_parameters;

/// OS releases from this major version on no longer report the source application.
const SOURCE_APPLICATION_CHECK_CUTOFF: u32 = 13;

const NATIVE_SOURCE_PREFIXES: [&str; 2] = ["com.facebook.", ".com.facebook."];
const WEB_SOURCES: [&str; 2] = ["com.apple.mobilesafari", "com.apple.SafariViewService"];

/// Outcome of a bridge call. Consumers check `error`, then `is_cancelled`, then
/// `response_parameters`.
#[derive(Clone, Debug)]
pub struct BridgeApiResponse {
    pub request: BridgeApiRequest,
    pub error: Option<SdkError>,
    pub response_parameters: Option<JsonObject>,
    pub is_cancelled: bool,
}

impl BridgeApiResponse {
    pub fn with_error(request: BridgeApiRequest, error: SdkError) -> Self {
        Self {
            request,
            error: Some(error),
            response_parameters: None,
            is_cancelled: false,
        }
    }

    pub fn cancelled(request: BridgeApiRequest) -> Self {
        Self {
            request,
            error: None,
            response_parameters: None,
            is_cancelled: true,
        }
    }
}

pub trait BridgeApiResponseCreating: Send + Sync {
    fn create_response_with_error(&self, request: BridgeApiRequest, error: SdkError) -> BridgeApiResponse;

    fn create_cancelled_response(&self, request: BridgeApiRequest) -> BridgeApiResponse;

    /// Builds the response carried by `response_url`. Fails when the source application
    /// cannot be trusted for the request's protocol, or the protocol rejects the callback.
    fn create_response(
        &self,
        request: BridgeApiRequest,
        response_url: &Url,
        source_application: Option<&str>,
    ) -> SdkResult<BridgeApiResponse>;
}

pub struct BridgeApiResponseFactory {
    os_version: Arc<dyn OperatingSystemVersionComparing>,
}

impl Default for BridgeApiResponseFactory {
    fn default() -> Self {
        Self::new(Arc::new(OperatingSystemVersion::default()))
    }
}

impl BridgeApiResponseFactory {
    pub fn new(os_version: Arc<dyn OperatingSystemVersionComparing>) -> Self {
        Self { os_version }
    }

    fn is_valid_source(&self, protocol_type: BridgeApiProtocolType, source: Option<&str>) -> bool {
        if self.os_version.is_at_least(SOURCE_APPLICATION_CHECK_CUTOFF) {
            return true;
        }
        let Some(source) = source else {
            return false;
        };
        let source = source.to_ascii_lowercase();
        match protocol_type {
            BridgeApiProtocolType::Native => NATIVE_SOURCE_PREFIXES
                .iter()
                .any(|prefix| source.starts_with(prefix)),
            BridgeApiProtocolType::Web => WEB_SOURCES
                .iter()
                .any(|candidate| source == candidate.to_ascii_lowercase()),
        }
    }
}

impl BridgeApiResponseCreating for BridgeApiResponseFactory {
    fn create_response_with_error(&self, request: BridgeApiRequest, error: SdkError) -> BridgeApiResponse {
        BridgeApiResponse::with_error(request, error)
    }

    fn create_cancelled_response(&self, request: BridgeApiRequest) -> BridgeApiResponse {
        BridgeApiResponse::cancelled(request)
    }

    fn create_response(
        &self,
        request: BridgeApiRequest,
        response_url: &Url,
        source_application: Option<&str>,
    ) -> SdkResult<BridgeApiResponse> {
        if !self.is_valid_source(request.protocol_type, source_application) {
            return Err(core_error(
                CoreErrorCode::BridgeApiResponse,
                format!(
                    "Unexpected source application {} for a bridge response.",
                    source_application.unwrap_or("<none>")
                ),
            ));
        }

        let query = query_parameters(response_url);
        let protocol_response = request
            .protocol()
            .response_parameters(&request.action_id, &query)?;

        Ok(BridgeApiResponse {
            request,
            error: None,
            response_parameters: Some(protocol_response.parameters),
            is_cancelled: protocol_response.is_cancelled,
        })
    }
}
