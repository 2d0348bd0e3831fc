use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use crate::graph::{GraphRequest, GraphRequestConnection, GraphRequestFlags};
use crate::logger::{Logger, LoggingBehavior};
use crate::login::parameters::LoginCompletionParameters;
use crate::login::permission::permissions_from_scopes;
use crate::login::profile::Profile;
use crate::login::token::AuthenticationTokenCreating;
use crate::platform::runtime::spawn_detached;
use crate::settings::AppUrlSchemeProvider;
use crate::util::errors::{
    invalid_argument, login_error, CoreErrorCode, ErrorFactory, GraphRequestErrorKind,
    LoginErrorCode, SdkError, ERROR_DEVELOPER_MESSAGE_KEY, GRAPH_ERROR_CODE_KEY,
    GRAPH_REQUEST_ERROR_KEY,
};
use crate::util::json::{json_object, number_value, string_value, JsonObject};
use crate::util::jwt::user_id_from_signed_request;
use crate::util::url::{percent_decode, QueryParameters};

const ACCESS_TOKEN_PATH: &str = "oauth/access_token";
const MISSING_EXCHANGE_PARAMETERS: &str =
    "Missing required parameters to exchange nonce for access token.";

/// Moment used when the server gives no usable expiration (January 1st, 4001).
pub fn distant_future() -> DateTime<Utc> {
    DateTime::from_timestamp(64_092_211_200, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Completes a login once the redirect query has been parsed.
#[async_trait]
pub trait LoginCompleting: Send + Sync {
    async fn complete_login(
        &self,
        nonce: Option<&str>,
        code_verifier: Option<&str>,
    ) -> LoginCompletionParameters;
}

#[derive(Clone)]
pub struct LoginUrlCompleterDependencies {
    pub graph_connection: Arc<dyn GraphRequestConnection>,
    pub token_creator: Arc<dyn AuthenticationTokenCreating>,
    pub url_hosting: Arc<dyn AppUrlSchemeProvider>,
}

/// Next step of a completion, derived from what has been populated so far.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CompletionStage {
    ExchangeCode,
    ExchangeNonce,
    MissingNonce,
    FetchClaims(String),
    Terminal,
}

impl CompletionStage {
    fn of(parameters: &LoginCompletionParameters, nonce: Option<&str>) -> Self {
        if parameters.code.is_some() {
            CompletionStage::ExchangeCode
        } else if parameters.nonce_string.is_some() {
            CompletionStage::ExchangeNonce
        } else if parameters.authentication_token_string.is_some() {
            match nonce {
                Some(nonce) => CompletionStage::FetchClaims(nonce.to_string()),
                None => CompletionStage::MissingNonce,
            }
        } else {
            CompletionStage::Terminal
        }
    }
}

/// Outcome of an exchange step.
enum StepOutcome {
    /// Re-derive the stage from the updated parameters.
    Continue,
    /// Resolve the ID token with the given nonce, then finish.
    FetchClaims,
    Finish,
}

/// Turns the query of a login redirect into [`LoginCompletionParameters`], running
/// the code exchange, nonce exchange and ID token validation the redirect calls for.
///
/// Redirect shapes:
/// * `access_token` present: populated as-is.
/// * any one of `code`, `nonce`, `id_token`: populated.
/// * `error` / `error_message`: converted into a Graph API error.
/// * `id_token` together with `code` or `nonce`: rejected as an invalid server response.
pub struct LoginUrlCompleter {
    parameters: LoginCompletionParameters,
    dependencies: LoginUrlCompleterDependencies,
    logger: Logger,
}

impl LoginUrlCompleter {
    pub fn new(
        url_parameters: &QueryParameters,
        app_id: &str,
        dependencies: LoginUrlCompleterDependencies,
    ) -> Self {
        let values: JsonObject = url_parameters
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        let non_empty = |key: &str| string_value(&values, key).is_some_and(|value| !value.is_empty());
        let has_nonce = non_empty("nonce");
        let has_id_token = non_empty("id_token");
        let has_access_token = non_empty("access_token");
        let has_code = non_empty("code");

        // An ID token is never issued together with a code or a nonce to exchange.
        let is_conflicting = has_id_token && (has_code || has_nonce);

        let mut parameters = LoginCompletionParameters::default();
        if has_access_token || ((has_code || has_nonce || has_id_token) && !is_conflicting) {
            populate(&mut parameters, &values, app_id);
        } else if values.contains_key("error") || values.contains_key("error_message") {
            parameters.error = Some(error_from(&values));
        } else if is_conflicting {
            parameters.error = Some(login_error(
                LoginErrorCode::Unknown,
                "Invalid server response. Please try to login again",
            ));
        }

        Self {
            parameters,
            dependencies,
            logger: Logger::new(LoggingBehavior::Informational),
        }
    }

    pub fn parameters(&self) -> &LoginCompletionParameters {
        &self.parameters
    }

    /// Runs [`LoginCompleting::complete_login`] in the background and hands the result
    /// to `handler`.
    pub fn complete_login_with_handler<F>(
        self,
        nonce: Option<String>,
        code_verifier: Option<String>,
        handler: F,
    ) where
        F: FnOnce(LoginCompletionParameters) + Send + 'static,
    {
        spawn_detached(async move {
            let parameters = self
                .complete_login(nonce.as_deref(), code_verifier.as_deref())
                .await;
            handler(parameters);
        });
    }

    async fn exchange_code(
        &self,
        parameters: &mut LoginCompletionParameters,
        code_verifier: Option<&str>,
    ) -> StepOutcome {
        let code = parameters.code.clone().unwrap_or_default();
        let app_id = parameters.app_id.clone().unwrap_or_default();
        let code_verifier = code_verifier.filter(|verifier| !verifier.is_empty());

        let Some(code_verifier) = code_verifier.filter(|_| !code.is_empty() && !app_id.is_empty())
        else {
            parameters.error = Some(invalid_argument("code", "", MISSING_EXCHANGE_PARAMETERS));
            return StepOutcome::Finish;
        };

        let mut request = GraphRequest::new(ACCESS_TOKEN_PATH)
            .with_parameters([
                ("client_id", app_id.as_str()),
                ("code_verifier", code_verifier),
                ("code", code.as_str()),
            ])
            .with_flags(GraphRequestFlags::TOKEN_EXCHANGE);
        match self
            .dependencies
            .url_hosting
            .app_url("authorize", "", &QueryParameters::new())
        {
            Ok(redirect) => request = request.with_parameters([("redirect_uri", redirect.to_string())]),
            Err(err) => self.logger.log_entry(format!("Unable to build redirect URI: {err}")),
        }

        parameters.code = None;
        let result = self.dependencies.graph_connection.start(request).await;

        match result {
            Err(err) => parameters.error = Some(err),
            Ok(Value::Object(result)) => {
                if result.contains_key("error") {
                    parameters.error = Some(invalid_argument(
                        "code",
                        "",
                        "Failed to exchange code for Access Token",
                    ));
                } else {
                    parameters.access_token_string = string_value(&result, "access_token").map(str::to_string);
                    parameters.expiration_date = Some(expiration_date_from(&result));
                    parameters.authentication_token_string = string_value(&result, "id_token").map(str::to_string);
                }
            }
            Ok(_) => {}
        }
        StepOutcome::Continue
    }

    async fn exchange_nonce(&self, parameters: &mut LoginCompletionParameters) -> StepOutcome {
        let nonce = parameters.nonce_string.clone().unwrap_or_default();
        let app_id = parameters.app_id.clone().unwrap_or_default();

        if nonce.is_empty() || app_id.is_empty() {
            parameters.error = Some(invalid_argument("nonce", nonce, MISSING_EXCHANGE_PARAMETERS));
            return StepOutcome::Finish;
        }

        let request = GraphRequest::new(ACCESS_TOKEN_PATH)
            .with_parameters([
                ("grant_type", "fb_exchange_nonce"),
                ("fb_exchange_nonce", nonce.as_str()),
                ("client_id", app_id.as_str()),
                ("fields", ""),
            ])
            .with_flags(GraphRequestFlags::TOKEN_EXCHANGE);

        match self.dependencies.graph_connection.start(request).await {
            Err(err) => {
                parameters.error = Some(err);
                return StepOutcome::Finish;
            }
            Ok(Value::Object(result)) => {
                parameters.access_token_string = string_value(&result, "access_token").map(str::to_string);
                parameters.expiration_date = Some(expiration_date_from(&result));
                parameters.data_access_expiration_date = Some(data_access_expiration_date_from(&result));
                parameters.authentication_token_string = string_value(&result, "id_token").map(str::to_string);
            }
            Ok(_) => {}
        }

        if parameters.authentication_token_string.is_some() {
            StepOutcome::FetchClaims
        } else {
            StepOutcome::Finish
        }
    }

    async fn fetch_claims(&self, parameters: &mut LoginCompletionParameters, nonce: &str) {
        let token_string = parameters.authentication_token_string.clone().unwrap_or_default();
        let token = self
            .dependencies
            .token_creator
            .create_token(&token_string, nonce, parameters.graph_domain.as_deref())
            .await;

        match token {
            Some(token) => {
                parameters.profile = Profile::from_claims(&token.claims);
                parameters.authentication_token = Some(token);
            }
            None => {
                parameters.error = Some(login_error(
                    LoginErrorCode::InvalidIdToken,
                    "Invalid ID token from login response.",
                ));
            }
        }
    }
}

#[async_trait]
impl LoginCompleting for LoginUrlCompleter {
    async fn complete_login(
        &self,
        nonce: Option<&str>,
        code_verifier: Option<&str>,
    ) -> LoginCompletionParameters {
        let mut parameters = self.parameters.clone();
        let mut code_verifier = code_verifier;

        loop {
            match CompletionStage::of(&parameters, nonce) {
                CompletionStage::ExchangeCode => {
                    let outcome = self.exchange_code(&mut parameters, code_verifier.take()).await;
                    if matches!(outcome, StepOutcome::Finish) {
                        return parameters;
                    }
                }
                CompletionStage::ExchangeNonce => {
                    match self.exchange_nonce(&mut parameters).await {
                        StepOutcome::FetchClaims => {
                            self.fetch_claims(&mut parameters, nonce.unwrap_or_default()).await;
                        }
                        StepOutcome::Continue | StepOutcome::Finish => {}
                    }
                    return parameters;
                }
                CompletionStage::MissingNonce => {
                    parameters.error = Some(login_error(
                        LoginErrorCode::Unknown,
                        "Please try to login again",
                    ));
                    return parameters;
                }
                CompletionStage::FetchClaims(nonce) => {
                    self.fetch_claims(&mut parameters, &nonce).await;
                    return parameters;
                }
                CompletionStage::Terminal => return parameters,
            }
        }
    }
}

fn populate(parameters: &mut LoginCompletionParameters, values: &JsonObject, app_id: &str) {
    let text = |key: &str| string_value(values, key).map(str::to_string);

    parameters.access_token_string = text("access_token");
    parameters.nonce_string = text("nonce");
    parameters.authentication_token_string = text("id_token");
    parameters.code = text("code");

    parameters.permissions = permissions_from_scopes(string_value(values, "granted_scopes").unwrap_or_default());
    parameters.declined_permissions =
        permissions_from_scopes(string_value(values, "denied_scopes").unwrap_or_default());
    parameters.expired_permissions = Some(Default::default());
    parameters.app_id = Some(app_id.to_string());

    let user_id = text("user_id");
    let signed_request = string_value(values, "signed_request").filter(|value| !value.is_empty());
    parameters.user_id = match (user_id, signed_request) {
        (Some(user_id), Some(signed_request)) if user_id.is_empty() => {
            user_id_from_signed_request(signed_request)
        }
        (user_id, _) => user_id,
    };

    parameters.graph_domain = text("graph_domain").filter(|domain| !domain.is_empty());
    parameters.expiration_date = Some(expiration_date_from(values));
    parameters.data_access_expiration_date = Some(data_access_expiration_date_from(values));
    parameters.challenge = challenge_from(values);
}

/// `expires` or `expires_at` (absolute epoch seconds), else `expires_in` (seconds from
/// now). Non-positive values count as absent; nothing usable gives [`distant_future`].
pub fn expiration_date_from(values: &JsonObject) -> DateTime<Utc> {
    let absolute = usable_seconds(values, "expires").or_else(|| usable_seconds(values, "expires_at"));
    if let Some(seconds) = absolute {
        return from_epoch_seconds(seconds);
    }
    if let Some(seconds) = usable_seconds(values, "expires_in") {
        return TimeDelta::try_milliseconds((seconds * 1000.0) as i64)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or_else(distant_future);
    }
    distant_future()
}

pub fn data_access_expiration_date_from(values: &JsonObject) -> DateTime<Utc> {
    usable_seconds(values, "data_access_expiration_time")
        .map(from_epoch_seconds)
        .unwrap_or_else(distant_future)
}

/// The percent-decoded `challenge` carried inside the JSON `state` parameter.
pub fn challenge_from(values: &JsonObject) -> Option<String> {
    let state = json_object(string_value(values, "state")?)?;
    let challenge = string_value(&state, "challenge").filter(|challenge| !challenge.is_empty())?;
    Some(percent_decode(challenge))
}

/// Graph API error described by the redirect's `error*` parameters.
pub fn error_from(values: &JsonObject) -> SdkError {
    let developer_message = ["error_message", "error", "error_reason"]
        .iter()
        .find_map(|key| string_value(values, key))
        .unwrap_or_default()
        .to_string();

    let mut error = ErrorFactory::core()
        .error(CoreErrorCode::GraphRequestGraphApi as i64, developer_message.clone())
        .with_user_info([
            (ERROR_DEVELOPER_MESSAGE_KEY, developer_message),
            (GRAPH_REQUEST_ERROR_KEY, GraphRequestErrorKind::Other.as_str().to_string()),
        ]);
    if let Some(code) = string_value(values, "error_code") {
        error = error.with_user_info([(GRAPH_ERROR_CODE_KEY, code)]);
    }
    error
}

/// A finite, positive number of seconds under `key`.
fn usable_seconds(values: &JsonObject, key: &str) -> Option<f64> {
    number_value(values, key).filter(|seconds| seconds.is_finite() && *seconds > 0.0)
}

fn from_epoch_seconds(seconds: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64).unwrap_or_else(distant_future)
}
