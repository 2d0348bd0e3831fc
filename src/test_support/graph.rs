use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::graph::{GraphRequest, GraphRequestConnection};
use crate::login::{AuthenticationToken, AuthenticationTokenCreating};
use crate::util::errors::SdkResult;

/// Records every started request and answers from a queue of canned results.
///
/// An exhausted queue answers with an empty JSON object.
#[derive(Default)]
pub struct RecordingGraphConnection {
    requests: Mutex<Vec<GraphRequest>>,
    responses: Mutex<VecDeque<SdkResult<Value>>>,
}

impl RecordingGraphConnection {
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = SdkResult<Value>>,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn requests(&self) -> Vec<GraphRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphRequestConnection for RecordingGraphConnection {
    async fn start(&self, request: GraphRequest) -> SdkResult<Value> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

/// Token creator that always answers with the configured token.
#[derive(Default)]
pub struct StaticTokenCreator {
    pub token: Option<AuthenticationToken>,
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AuthenticationTokenCreating for StaticTokenCreator {
    async fn create_token(
        &self,
        token_string: &str,
        nonce: &str,
        _graph_domain: Option<&str>,
    ) -> Option<AuthenticationToken> {
        self.calls
            .lock()
            .unwrap()
            .push((token_string.to_string(), nonce.to_string()));
        self.token.clone()
    }
}
