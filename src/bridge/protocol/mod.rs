//! Wire formats of bridge requests and their callbacks.

mod native_v1;
mod web_v1;

pub use native_v1::NativeV1Protocol;
pub use web_v1::WebV1Protocol;

use url::Url;

use crate::util::errors::SdkResult;
use crate::util::json::JsonObject;
use crate::util::url::QueryParameters;

pub const BRIDGE_ARGS_KEY: &str = "bridge_args";
pub const ACTION_ID_KEY: &str = "action_id";
pub const COMPLETION_GESTURE_KEY: &str = "completionGesture";
pub const CANCEL_GESTURE: &str = "cancel";

/// Parameters decoded from a bridge callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtocolResponse {
    pub parameters: JsonObject,
    pub is_cancelled: bool,
}

/// Encodes requests into URLs and decodes callback query parameters for one
/// protocol version.
pub trait BridgeApiProtocol: Send + Sync {
    fn request_url(
        &self,
        action_id: &str,
        scheme: &str,
        method_name: &str,
        parameters: &JsonObject,
    ) -> SdkResult<Url>;

    fn response_parameters(
        &self,
        action_id: &str,
        query_parameters: &QueryParameters,
    ) -> SdkResult<ProtocolResponse>;
}
