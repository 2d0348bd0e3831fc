use std::sync::Arc;

use serde_json::{json, Value};
use url::Url;

use crate::bridge::protocol::{
    BridgeApiProtocol, ProtocolResponse, ACTION_ID_KEY, BRIDGE_ARGS_KEY, CANCEL_GESTURE,
    COMPLETION_GESTURE_KEY,
};
use crate::settings::Settings;
use crate::util::errors::{
    invalid_argument, CoreErrorCode, SdkError, SdkResult, CORE_ERROR_DOMAIN,
};
use crate::util::json::{json_object, stringify, JsonObject};
use crate::util::url::{build_url, QueryParameters};

const METHOD_ARGS_KEY: &str = "method_args";
const METHOD_RESULTS_KEY: &str = "method_results";
const ERROR_KEY: &str = "error";
const DIALOG_HOST: &str = "dialog";

/// App-switch protocol: `{app_scheme}://dialog/{method}?bridge_args=..&method_args=..`.
pub struct NativeV1Protocol {
    app_scheme: String,
    settings: Arc<Settings>,
}

impl NativeV1Protocol {
    pub fn new(app_scheme: impl Into<String>, settings: Arc<Settings>) -> Self {
        Self {
            app_scheme: app_scheme.into(),
            settings,
        }
    }

    fn bridge_parameters(&self, action_id: &str) -> Value {
        let mut bridge = json!({
            ACTION_ID_KEY: action_id,
            "sdk_version": self.settings.sdk_version(),
        });
        if let Some(name) = &self.settings.display_name {
            bridge["app_name"] = Value::String(name.clone());
        }
        bridge
    }
}

impl BridgeApiProtocol for NativeV1Protocol {
    fn request_url(
        &self,
        action_id: &str,
        _scheme: &str,
        method_name: &str,
        parameters: &JsonObject,
    ) -> SdkResult<Url> {
        let mut query = QueryParameters::new();
        if !parameters.is_empty() {
            let encoded = stringify(&Value::Object(parameters.clone()))
                .map_err(|err| invalid_argument(METHOD_ARGS_KEY, "", err.to_string()))?;
            query.insert(METHOD_ARGS_KEY.to_string(), encoded.replace('&', "%26"));
        }
        let bridge = stringify(&self.bridge_parameters(action_id))
            .map_err(|err| invalid_argument(BRIDGE_ARGS_KEY, "", err.to_string()))?;
        query.insert(BRIDGE_ARGS_KEY.to_string(), bridge);

        build_url(&self.app_scheme, DIALOG_HOST, &format!("/{method_name}"), &query)
    }

    fn response_parameters(
        &self,
        action_id: &str,
        query_parameters: &QueryParameters,
    ) -> SdkResult<ProtocolResponse> {
        let bridge_json = query_parameters
            .get(BRIDGE_ARGS_KEY)
            .map(String::as_str)
            .unwrap_or_default();
        let bridge = match serde_json::from_str::<Value>(bridge_json) {
            Ok(Value::Object(bridge)) => bridge,
            Ok(_) => return Ok(ProtocolResponse::default()),
            Err(_) => {
                return Err(invalid_argument(BRIDGE_ARGS_KEY, bridge_json, "Invalid bridge_args."))
            }
        };
        if bridge.get(ACTION_ID_KEY).and_then(Value::as_str) != Some(action_id) {
            return Ok(ProtocolResponse::default());
        }

        if let Some(error) = bridge.get(ERROR_KEY).and_then(Value::as_object) {
            return Err(error_from(error));
        }

        let results_json = query_parameters
            .get(METHOD_RESULTS_KEY)
            .map(String::as_str)
            .unwrap_or_default();
        if results_json.is_empty() {
            return Ok(ProtocolResponse::default());
        }
        let Some(parameters) = json_object(results_json) else {
            if serde_json::from_str::<Value>(results_json).is_ok() {
                return Ok(ProtocolResponse::default());
            }
            return Err(invalid_argument(
                METHOD_RESULTS_KEY,
                results_json,
                "Invalid method_results.",
            ));
        };
        let is_cancelled = parameters
            .get(COMPLETION_GESTURE_KEY)
            .and_then(Value::as_str)
            .is_some_and(|gesture| gesture == CANCEL_GESTURE);

        Ok(ProtocolResponse {
            parameters,
            is_cancelled,
        })
    }
}

fn error_from(error: &JsonObject) -> SdkError {
    let domain = error
        .get("domain")
        .and_then(Value::as_str)
        .unwrap_or(CORE_ERROR_DOMAIN);
    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .unwrap_or(CoreErrorCode::Unknown as i64);
    let user_info = error
        .get("user_info")
        .and_then(Value::as_object)
        .map(|info| {
            info.iter()
                .map(|(key, value)| {
                    let text = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    (key.clone(), text)
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    SdkError::new(domain, code, None).with_user_info(user_info)
}
