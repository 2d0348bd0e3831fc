use std::sync::Arc;

use serde_json::{json, Value};
use url::Url;

use crate::bridge::protocol::{
    BridgeApiProtocol, ProtocolResponse, ACTION_ID_KEY, BRIDGE_ARGS_KEY, CANCEL_GESTURE,
    COMPLETION_GESTURE_KEY,
};
use crate::settings::{AppUrlSchemeProvider, Settings};
use crate::util::errors::{
    core_error, invalid_argument, CoreErrorCode, ErrorFactory, SdkResult,
};
use crate::util::json::{json_object, stringify, JsonObject};
use crate::util::url::QueryParameters;

const CANCELLATION_ERROR_CODE: i64 = 4201;
const ERROR_CODE_KEY: &str = "error_code";
const ERROR_MESSAGE_KEY: &str = "error_message";

/// Mobile web dialog protocol: `https://m.{domain}/{version}/dialog/{method}`, returning
/// through `{app_scheme}://bridge/{method}`.
pub struct WebV1Protocol {
    settings: Arc<Settings>,
}

impl WebV1Protocol {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

impl BridgeApiProtocol for WebV1Protocol {
    fn request_url(
        &self,
        action_id: &str,
        _scheme: &str,
        method_name: &str,
        parameters: &JsonObject,
    ) -> SdkResult<Url> {
        let bridge = stringify(&json!({ ACTION_ID_KEY: action_id }))
            .map_err(|err| invalid_argument(BRIDGE_ARGS_KEY, "", err.to_string()))?;
        let redirect = self.settings.app_url(
            "bridge",
            method_name,
            &QueryParameters::from([(BRIDGE_ARGS_KEY.to_string(), bridge)]),
        )?;

        let mut query: QueryParameters = parameters
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();
        query.insert("display".to_string(), "touch".to_string());
        query.insert("redirect_uri".to_string(), redirect.to_string());

        self.settings
            .facebook_url("m", &format!("/dialog/{method_name}"), &query)
    }

    fn response_parameters(
        &self,
        action_id: &str,
        query_parameters: &QueryParameters,
    ) -> SdkResult<ProtocolResponse> {
        let error_code = query_parameters
            .get(ERROR_CODE_KEY)
            .and_then(|code| code.trim().parse::<i64>().ok())
            .unwrap_or_default();
        match error_code {
            0 => {}
            CANCELLATION_ERROR_CODE => {
                let mut parameters = JsonObject::new();
                parameters.insert(
                    COMPLETION_GESTURE_KEY.to_string(),
                    Value::String(CANCEL_GESTURE.to_string()),
                );
                return Ok(ProtocolResponse {
                    parameters,
                    is_cancelled: true,
                });
            }
            code => {
                let message = query_parameters
                    .get(ERROR_MESSAGE_KEY)
                    .cloned()
                    .unwrap_or_else(|| "The web dialog returned an error.".to_string());
                return Err(ErrorFactory::core().error(code, message));
            }
        }

        let bridge_json = query_parameters
            .get(BRIDGE_ARGS_KEY)
            .map(String::as_str)
            .unwrap_or_default();
        let Some(bridge) = json_object(bridge_json) else {
            return Err(invalid_argument(BRIDGE_ARGS_KEY, bridge_json, "Invalid bridge_args."));
        };
        if bridge.get(ACTION_ID_KEY).and_then(Value::as_str) != Some(action_id) {
            return Err(core_error(
                CoreErrorCode::BridgeApiResponse,
                "The bridge response does not match the pending request.",
            ));
        }

        let mut parameters = JsonObject::new();
        parameters.insert("didComplete".to_string(), json!(1));
        Ok(ProtocolResponse {
            parameters,
            is_cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::url::query_parameters;

    fn protocol() -> WebV1Protocol {
        WebV1Protocol::new(Arc::new(Settings::with_app_id("123")))
    }

    fn bridge_args(action_id: &str) -> String {
        json!({ ACTION_ID_KEY: action_id }).to_string()
    }

    fn query(pairs: &[(&str, &str)]) -> QueryParameters {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn request_url_points_at_mobile_dialog() {
        let parameters = json!({"a": "b"}).as_object().cloned().unwrap();
        let url = protocol()
            .request_url("123", "https", "open", &parameters)
            .unwrap();

        assert_eq!(url.host_str(), Some("m.facebook.com"));
        assert_eq!(url.path(), "/v17.0/dialog/open");
        let query = query_parameters(&url);
        assert_eq!(query["a"], "b");
        assert_eq!(query["display"], "touch");
        let redirect = Url::parse(&query["redirect_uri"]).unwrap();
        assert_eq!(redirect.scheme(), "fb123");
        assert_eq!(redirect.host_str(), Some("bridge"));
        assert_eq!(redirect.path(), "/open");
        assert_eq!(query_parameters(&redirect)[BRIDGE_ARGS_KEY], bridge_args("123"));
    }

    #[test]
    fn matching_action_id_completes() {
        let args = bridge_args("123");
        let response = protocol()
            .response_parameters("123", &query(&[(BRIDGE_ARGS_KEY, &args)]))
            .unwrap();
        assert_eq!(response.parameters["didComplete"], json!(1));
        assert!(!response.is_cancelled);
    }

    #[test]
    fn cancellation_code_is_a_cancel_gesture() {
        let args = bridge_args("123");
        let response = protocol()
            .response_parameters("123", &query(&[(ERROR_CODE_KEY, "4201"), (BRIDGE_ARGS_KEY, &args)]))
            .unwrap();
        assert!(response.is_cancelled);
        assert_eq!(response.parameters[COMPLETION_GESTURE_KEY], json!(CANCEL_GESTURE));
    }

    #[test]
    fn other_failures_are_errors() {
        let args = bridge_args("123");
        let unknown_code = protocol()
            .response_parameters("123", &query(&[(ERROR_CODE_KEY, "123"), (BRIDGE_ARGS_KEY, &args)]))
            .unwrap_err();
        assert_eq!(unknown_code.code, 123);

        assert!(protocol().response_parameters("123", &query(&[])).is_err());
        assert!(protocol()
            .response_parameters("123", &query(&[(BRIDGE_ARGS_KEY, "")]))
            .is_err());

        let mismatched = bridge_args("foo");
        let error = protocol()
            .response_parameters("123", &query(&[(BRIDGE_ARGS_KEY, &mismatched)]))
            .unwrap_err();
        assert!(error.is_core(CoreErrorCode::BridgeApiResponse));
    }
}
