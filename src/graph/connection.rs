use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::graph::request::{GraphRequest, GraphRequestConnection, HttpMethod};
use crate::logger::{Logger, LoggingBehavior};
use crate::settings::Settings;
use crate::util::errors::{
    core_error, CoreErrorCode, GraphRequestErrorKind, SdkError, SdkResult,
    ERROR_DEVELOPER_MESSAGE_KEY, GRAPH_ERROR_CODE_KEY, GRAPH_ERROR_SUBCODE_KEY,
    GRAPH_ERROR_TRACE_ID_KEY, GRAPH_ERROR_TYPE_KEY, GRAPH_REQUEST_ERROR_KEY, HTTP_STATUS_CODE_KEY,
};

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<i64>,
    error_subcode: Option<i64>,
    fbtrace_id: Option<String>,
    is_transient: Option<bool>,
}

/// [`GraphRequestConnection`] backed by `reqwest`.
pub struct HttpGraphRequestConnection {
    client: Client,
    settings: Arc<Settings>,
    base_url: Option<String>,
    logger: Logger,
}

impl HttpGraphRequestConnection {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            client: Client::new(),
            settings,
            base_url: None,
            logger: Logger::new(LoggingBehavior::NetworkRequests),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides `https://graph.{domain}`; used to target emulators and mock servers.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn request_url(&self, request: &GraphRequest) -> String {
        let base = match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://graph.{}", self.settings.domain()),
        };
        let version = request
            .version
            .as_deref()
            .unwrap_or(&self.settings.graph_api_version);
        format!("{base}/{version}/{}", request.graph_path.trim_start_matches('/'))
    }

    fn request_parameters(&self, request: &GraphRequest) -> Vec<(String, String)> {
        let mut parameters: Vec<(String, String)> = request
            .parameters
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        parameters.push(("format".into(), "json".into()));
        parameters.push(("sdk".into(), "rust".into()));
        if let Some(token) = &request.token_string {
            parameters.push(("access_token".into(), token.clone()));
        }
        parameters
    }
}

#[async_trait]
impl GraphRequestConnection for HttpGraphRequestConnection {
    async fn start(&self, request: GraphRequest) -> SdkResult<Value> {
        let url = self.request_url(&request);
        let parameters = self.request_parameters(&request);

        self.logger.append(format!("FBSDKGraphRequestConnection {}\n", request.http_method.as_str()));
        self.logger.append_key_value("URL", &url);
        self.logger.flush();

        let builder = match request.http_method {
            HttpMethod::Get => self.client.get(&url).query(&parameters),
            HttpMethod::Delete => self.client.delete(&url).query(&parameters),
            HttpMethod::Post => self.client.post(&url).form(&parameters),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| core_error(CoreErrorCode::Network, err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| core_error(CoreErrorCode::Network, err.to_string()))?;

        if let Some(error) = map_graph_error(status, &body) {
            return Err(error);
        }

        if !status.is_success() {
            return Err(core_error(
                CoreErrorCode::Network,
                format!("Graph request failed with status {status}"),
            )
            .with_user_info([(HTTP_STATUS_CODE_KEY, status.as_u16().to_string())]));
        }

        serde_json::from_str::<Value>(&body).map_err(|err| {
            core_error(
                CoreErrorCode::GraphRequestProtocolMismatch,
                format!("Response is not valid JSON: {err}"),
            )
        })
    }
}

fn map_graph_error(status: StatusCode, body: &str) -> Option<SdkError> {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok()?;
    let error = parsed.error?;
    let kind = if error.is_transient.unwrap_or(false) {
        GraphRequestErrorKind::Transient
    } else {
        GraphRequestErrorKind::Other
    };

    let mut sdk_error = core_error(
        CoreErrorCode::GraphRequestGraphApi,
        error
            .message
            .clone()
            .unwrap_or_else(|| "Graph API request failed".to_string()),
    )
    .with_user_info([
        (HTTP_STATUS_CODE_KEY, status.as_u16().to_string()),
        (GRAPH_REQUEST_ERROR_KEY, kind.as_str().to_string()),
    ]);

    if let Some(message) = error.message {
        sdk_error = sdk_error.with_user_info([(ERROR_DEVELOPER_MESSAGE_KEY, message)]);
    }
    if let Some(code) = error.code {
        sdk_error = sdk_error.with_user_info([(GRAPH_ERROR_CODE_KEY, code.to_string())]);
    }
    if let Some(subcode) = error.error_subcode {
        sdk_error = sdk_error.with_user_info([(GRAPH_ERROR_SUBCODE_KEY, subcode.to_string())]);
    }
    if let Some(error_type) = error.error_type {
        sdk_error = sdk_error.with_user_info([(GRAPH_ERROR_TYPE_KEY, error_type)]);
    }
    if let Some(trace_id) = error.fbtrace_id {
        sdk_error = sdk_error.with_user_info([(GRAPH_ERROR_TRACE_ID_KEY, trace_id)]);
    }
    Some(sdk_error)
}
