use std::sync::{Arc, Mutex, MutexGuard, Weak};

use url::Url;

use crate::bridge::platform::{
    AuthenticationCompletionHandler, AuthenticationSession, AuthenticationSessionProvider,
    BridgeApiRequestOpening, BridgeApiResponseHandler, InAppBrowser, InAppBrowserDelegate,
    InAppBrowserLoader, InternalUrlOpener, SuccessHandler, UrlOpener, UrlOpening, ViewController,
    ViewControllerProvider,
};
use crate::bridge::request::{BridgeApiRequest, UrlScheme};
use crate::bridge::response::{BridgeApiResponseCreating, BridgeApiResponseFactory};
use crate::logger::Logger;
use crate::settings::AppUrlSchemeProvider;
use crate::util::errors::{
    CoreErrorCode, ErrorFactory, SdkError, AUTHENTICATION_SESSION_ERROR_DOMAIN,
};
use crate::util::url::{append_query_item, has_http_scheme};

/// Source application reported when a finished authentication session is replayed as an
/// inbound URL.
const SESSION_SOURCE_APPLICATION: &str = "com.apple";
const BRIDGE_RESPONSE_HOST: &str = "bridge";
const IN_APP_BROWSER_QUERY_ITEM: (&str, &str) = ("sfvc", "1");
const SYSTEM_CANCELLED_SESSION_CODE: i64 = 1;

/// Progress of a web authentication session as observed through app lifecycle events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthenticationSessionState {
    #[default]
    None,
    Started,
    /// The system consent alert is on screen (the app resigned active).
    ShowAlert,
    /// The user accepted the alert and the session's browser is showing.
    ShowWebBrowser,
    /// The app went to the background while the alert was up.
    CanceledBySystem,
}

impl AuthenticationSessionState {
    fn is_requesting(self) -> bool {
        !matches!(
            self,
            AuthenticationSessionState::None | AuthenticationSessionState::CanceledBySystem
        )
    }
}

/// Collaborators of [`BridgeApi`]. Optional capabilities model platform features that may be
/// missing on the host, such as an in-app browser or a web authentication session.
pub struct BridgeApiDependencies {
    pub url_opener: Arc<dyn InternalUrlOpener>,
    pub response_factory: Arc<dyn BridgeApiResponseCreating>,
    pub app_url_scheme_provider: Arc<dyn AppUrlSchemeProvider>,
    pub in_app_browser_loader: Option<Arc<dyn InAppBrowserLoader>>,
    pub authentication_session_provider: Option<Arc<dyn AuthenticationSessionProvider>>,
    pub view_controller_provider: Option<Arc<dyn ViewControllerProvider>>,
}

impl BridgeApiDependencies {
    pub fn new(
        url_opener: Arc<dyn InternalUrlOpener>,
        app_url_scheme_provider: Arc<dyn AppUrlSchemeProvider>,
    ) -> Self {
        Self {
            url_opener,
            response_factory: Arc::new(BridgeApiResponseFactory::default()),
            app_url_scheme_provider,
            in_app_browser_loader: None,
            authentication_session_provider: None,
            view_controller_provider: None,
        }
    }

    pub fn with_response_factory(mut self, factory: Arc<dyn BridgeApiResponseCreating>) -> Self {
        self.response_factory = factory;
        self
    }

    pub fn with_in_app_browser_loader(mut self, loader: Arc<dyn InAppBrowserLoader>) -> Self {
        self.in_app_browser_loader = Some(loader);
        self
    }

    pub fn with_authentication_session_provider(
        mut self,
        provider: Arc<dyn AuthenticationSessionProvider>,
    ) -> Self {
        self.authentication_session_provider = Some(provider);
        self
    }

    pub fn with_view_controller_provider(mut self, provider: Arc<dyn ViewControllerProvider>) -> Self {
        self.view_controller_provider = Some(provider);
        self
    }
}

#[derive(Default)]
struct BridgeState {
    pending_request: Option<BridgeApiRequest>,
    pending_request_completion: Option<BridgeApiResponseHandler>,
    pending_url_opener: Option<Arc<dyn UrlOpening>>,
    authentication_session: Option<Arc<dyn AuthenticationSession>>,
    authentication_session_completion: Option<AuthenticationCompletionHandler>,
    authentication_session_state: AuthenticationSessionState,
    is_expecting_background: bool,
    in_app_browser: Option<Arc<dyn InAppBrowser>>,
    is_dismissing_in_app_browser: bool,
    is_active: bool,
}

/// Routes outgoing cross-app calls and correlates the callbacks the platform delivers later
/// (inbound URLs, lifecycle events, browser and authentication session completions) with the
/// single call in flight.
///
/// One instance is owned by the composition root and handed to the platform adapter, which
/// forwards lifecycle callbacks to it. Completions are never invoked while internal state is
/// locked, so they may call back into the bridge.
pub struct BridgeApi {
    self_ref: Weak<BridgeApi>,
    url_opener: Arc<dyn InternalUrlOpener>,
    response_factory: Arc<dyn BridgeApiResponseCreating>,
    app_url_scheme_provider: Arc<dyn AppUrlSchemeProvider>,
    in_app_browser_loader: Option<Arc<dyn InAppBrowserLoader>>,
    authentication_session_provider: Option<Arc<dyn AuthenticationSessionProvider>>,
    view_controller_provider: Option<Arc<dyn ViewControllerProvider>>,
    logger: Logger,
    state: Mutex<BridgeState>,
}

impl BridgeApi {
    pub fn new(dependencies: BridgeApiDependencies) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| BridgeApi {
            self_ref: self_ref.clone(),
            url_opener: dependencies.url_opener,
            response_factory: dependencies.response_factory,
            app_url_scheme_provider: dependencies.app_url_scheme_provider,
            in_app_browser_loader: dependencies.in_app_browser_loader,
            authentication_session_provider: dependencies.authentication_session_provider,
            view_controller_provider: dependencies.view_controller_provider,
            logger: Logger::developer_errors(),
            state: Mutex::new(BridgeState::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap()
    }

    pub fn pending_request(&self) -> Option<BridgeApiRequest> {
        self.state().pending_request.clone()
    }

    pub fn authentication_session_state(&self) -> AuthenticationSessionState {
        self.state().authentication_session_state
    }

    pub fn has_authentication_session(&self) -> bool {
        self.state().authentication_session.is_some()
    }

    pub fn authentication_session_completion_handler(&self) -> Option<AuthenticationCompletionHandler> {
        self.state().authentication_session_completion.clone()
    }

    pub fn has_in_app_browser(&self) -> bool {
        self.state().in_app_browser.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active
    }

    pub fn is_expecting_background(&self) -> bool {
        self.state().is_expecting_background
    }

    /// Platform callback for an inbound URL. Returns true when the URL was consumed by the
    /// pending sender or resolved the pending bridge request.
    pub fn application_open_url(
        &self,
        url: &Url,
        source_application: Option<&str>,
        annotation: Option<&str>,
    ) -> bool {
        let opener = self.state().pending_url_opener.clone();

        if let Some(opener) = &opener {
            if opener.should_stop_propagation(url) {
                return true;
            }
        }

        let can_open = opener
            .as_ref()
            .is_some_and(|opener| opener.can_open_url(url, source_application, annotation));

        let browser = {
            let mut state = self.state();
            let browser = state.in_app_browser.take();
            if browser.is_some() {
                state.is_dismissing_in_app_browser = true;
            }
            browser
        };

        match browser {
            Some(browser) => {
                let weak = self.self_ref.clone();
                let url = url.clone();
                let source_application = source_application.map(str::to_string);
                let annotation = annotation.map(str::to_string);
                browser.dismiss(Box::new(move || {
                    if let Some(api) = weak.upgrade() {
                        api.complete_pending_open(
                            opener,
                            &url,
                            source_application.as_deref(),
                            annotation.as_deref(),
                        );
                    }
                }));
            }
            None => {
                let (session, interrupted_handler) = {
                    let mut state = self.state();
                    let session = state.authentication_session.take();
                    let handler = if session.is_some() && !can_open {
                        state.authentication_session_completion.take()
                    } else {
                        None
                    };
                    (session, handler)
                };
                if let Some(session) = session {
                    session.cancel();
                    // Another app opened us mid-login: the session browser is gone without
                    // reporting back, so its handler has to hear about it here.
                    if let Some(handler) = interrupted_handler {
                        handler(Some(url.clone()), Some(interruption_error(url)));
                    }
                }
                self.complete_pending_open(opener, url, source_application, annotation);
            }
        }

        if can_open {
            return true;
        }
        self.handle_bridge_api_response(url, source_application)
    }

    fn complete_pending_open(
        &self,
        opener: Option<Arc<dyn UrlOpening>>,
        url: &Url,
        source_application: Option<&str>,
        annotation: Option<&str>,
    ) {
        self.state().pending_url_opener = None;
        if let Some(opener) = opener {
            opener.application_open_url(Some(url), source_application, annotation);
        }
        self.state().is_dismissing_in_app_browser = false;
    }

    fn handle_bridge_api_response(&self, url: &Url, source_application: Option<&str>) -> bool {
        let (request, completion) = {
            let mut state = self.state();
            (
                state.pending_request.take(),
                state.pending_request_completion.take(),
            )
        };
        let Some(request) = request else {
            return false;
        };

        let is_bridge_response = self
            .app_url_scheme_provider
            .app_url_scheme()
            .is_some_and(|scheme| url.scheme().eq_ignore_ascii_case(&scheme))
            && url.host_str() == Some(BRIDGE_RESPONSE_HOST);
        if !is_bridge_response {
            self.restore_pending_request(request, completion);
            return false;
        }

        let Some(completion) = completion else {
            return true;
        };

        match self
            .response_factory
            .create_response(request.clone(), url, source_application)
        {
            Ok(response) => {
                completion(response);
                true
            }
            Err(error) if error.is_core(CoreErrorCode::BridgeApiResponse) => {
                self.logger
                    .log_entry(format!("Ignoring bridge response: {error}"));
                self.restore_pending_request(request, Some(completion));
                false
            }
            Err(error) => {
                completion(self.response_factory.create_response_with_error(request, error));
                true
            }
        }
    }

    /// Puts back a request whose callback turned out to belong to someone else.
    fn restore_pending_request(
        &self,
        request: BridgeApiRequest,
        completion: Option<BridgeApiResponseHandler>,
    ) {
        let mut state = self.state();
        if state.pending_request.is_none() {
            state.pending_request = Some(request);
            state.pending_request_completion = completion;
        }
    }

    /// Resolves the pending request, if any, as cancelled.
    pub fn cancel_bridge_request(&self) {
        let (request, completion) = {
            let mut state = self.state();
            (
                state.pending_request.take(),
                state.pending_request_completion.take(),
            )
        };
        if let (Some(request), Some(completion)) = (request, completion) {
            completion(self.response_factory.create_cancelled_response(request));
        }
    }

    /// Arms the session completion: `handler` hears `(did_succeed, error)`, and a successful
    /// callback URL is replayed through [`BridgeApi::application_open_url`] before the session
    /// is cleared.
    pub fn set_session_completion_handler(&self, handler: SuccessHandler) {
        let weak = self.self_ref.clone();
        let completion: AuthenticationCompletionHandler = Arc::new(move |url: Option<Url>, error: Option<SdkError>| {
            let did_succeed = error.is_none() && url.is_some();
            handler(did_succeed, error);

            let Some(api) = weak.upgrade() else {
                return;
            };
            if did_succeed {
                if let Some(url) = &url {
                    api.application_open_url(url, Some(SESSION_SOURCE_APPLICATION), None);
                }
            }
            api.clear_session();
        });
        self.state().authentication_session_completion = Some(completion);
    }

    /// Starts a system authentication session for `url`, replacing any running one.
    pub fn open_url_with_authentication_session(&self, url: &Url) {
        let previous = self.state().authentication_session.take();
        if let Some(previous) = previous {
            self.logger.log_entry(
                "There is already a request for authenticated session. Cancelling active \
                 authentication session before starting the new one.",
            );
            previous.cancel();
        }

        let Some(provider) = &self.authentication_session_provider else {
            self.logger
                .log_entry("Authentication sessions are not available on this platform.");
            return;
        };

        let completion = self
            .state()
            .authentication_session_completion
            .clone()
            .unwrap_or_else(|| {
                let weak = self.self_ref.clone();
                Arc::new(move |_: Option<Url>, _: Option<SdkError>| {
                    if let Some(api) = weak.upgrade() {
                        api.clear_session();
                    }
                })
            });
        let scheme = self.app_url_scheme_provider.app_url_scheme();
        let session = provider.create_session(url, scheme.as_deref(), completion);
        {
            let mut state = self.state();
            state.authentication_session = Some(session.clone());
            state.authentication_session_state = AuthenticationSessionState::Started;
        }
        session.start();
    }

    /// The session finished on its own: drop it and reset its state.
    pub fn clear_session(&self) {
        let mut state = self.state();
        state.authentication_session = None;
        state.authentication_session_completion = None;
        state.authentication_session_state = AuthenticationSessionState::None;
    }

    /// Tears down a running session that a newer call supersedes, telling its
    /// handler it was interrupted.
    fn interrupt_authentication_session(&self, url: &Url) {
        let (session, handler) = {
            let mut state = self.state();
            (
                state.authentication_session.take(),
                state.authentication_session_completion.take(),
            )
        };
        let Some(session) = session else {
            return;
        };
        self.logger
            .log_entry("Cancelling the running authentication session for a new request.");
        session.cancel();
        if let Some(handler) = handler {
            handler(Some(url.clone()), Some(interruption_error(url)));
        }
    }

    /// Takes down a presented in-app browser whose flow is being replaced. Its sender hears
    /// about it the same way as when the user closes the browser.
    fn dismiss_in_app_browser(&self) {
        let (browser, opener) = {
            let mut state = self.state();
            let Some(browser) = state.in_app_browser.take() else {
                return;
            };
            state.is_dismissing_in_app_browser = true;
            (browser, state.pending_url_opener.take())
        };
        self.logger
            .log_entry("Dismissing the in-app browser for a new request.");
        if let Some(opener) = opener {
            opener.application_open_url(None, None, None);
        }
        let weak = self.self_ref.clone();
        browser.dismiss(Box::new(move || {
            if let Some(api) = weak.upgrade() {
                api.state().is_dismissing_in_app_browser = false;
            }
        }));
    }

    pub fn application_will_resign_active(&self) {
        let mut state = self.state();
        if state.authentication_session.is_some()
            && state.authentication_session_state == AuthenticationSessionState::Started
        {
            state.authentication_session_state = AuthenticationSessionState::ShowAlert;
        }
    }

    pub fn application_did_enter_background(&self) {
        let mut state = self.state();
        state.is_active = false;
        state.is_expecting_background = false;
        if state.authentication_session.is_some()
            && state.authentication_session_state == AuthenticationSessionState::ShowAlert
        {
            state.authentication_session_state = AuthenticationSessionState::CanceledBySystem;
        }
    }

    /// Returning to the app without a callback cancels the pending request, unless the app
    /// is still expected to leave, a browser is up, or a session is in progress.
    pub fn application_did_become_active(&self) {
        let cancelled_session = {
            let mut state = self.state();
            if state.authentication_session.is_none() {
                None
            } else {
                match state.authentication_session_state {
                    AuthenticationSessionState::ShowAlert => {
                        state.authentication_session_state =
                            AuthenticationSessionState::ShowWebBrowser;
                        None
                    }
                    AuthenticationSessionState::CanceledBySystem => Some((
                        state.authentication_session.take(),
                        state.authentication_session_completion.clone(),
                    )),
                    _ => None,
                }
            }
        };

        let mut is_requesting_session = false;
        if let Some((session, handler)) = cancelled_session {
            if let Some(session) = session {
                session.cancel();
            }
            if let Some(handler) = handler {
                let error = SdkError::new(
                    AUTHENTICATION_SESSION_ERROR_DOMAIN,
                    SYSTEM_CANCELLED_SESSION_CODE,
                    None,
                );
                handler(None, Some(error));
            }
            is_requesting_session = self.state().authentication_session_state.is_requesting();
        }

        let opener = {
            let mut state = self.state();
            if state.is_expecting_background
                || state.in_app_browser.is_some()
                || state.is_dismissing_in_app_browser
                || is_requesting_session
            {
                return;
            }
            state.is_active = true;
            state.pending_url_opener.clone()
        };

        if let Some(opener) = opener {
            opener.application_did_become_active();
        }
        self.cancel_bridge_request();
    }

    fn resolve_view_controller(
        &self,
        from_view_controller: Option<Arc<dyn ViewController>>,
    ) -> Option<Arc<dyn ViewController>> {
        from_view_controller.or_else(|| {
            self.view_controller_provider
                .as_ref()
                .and_then(|provider| provider.top_most_view_controller())
        })
    }

    fn available_browser_loader(&self) -> Option<Arc<dyn InAppBrowserLoader>> {
        self.in_app_browser_loader
            .clone()
            .filter(|loader| loader.is_available())
    }

    fn present_in_app_browser(
        &self,
        loader: &dyn InAppBrowserLoader,
        url: &Url,
        parent: &dyn ViewController,
    ) {
        let delegate: Weak<dyn InAppBrowserDelegate> = self.self_ref.clone();
        let browser = loader.create(url, delegate);
        self.state().in_app_browser = Some(browser.clone());
        parent.present(browser);
    }

    fn open_failure_handler(&self, request: &BridgeApiRequest) -> SuccessHandler {
        let weak = self.self_ref.clone();
        let action_id = request.action_id.clone();
        let scheme = request.scheme;
        Arc::new(move |opened: bool, _: Option<SdkError>| {
            if opened {
                return;
            }
            let Some(api) = weak.upgrade() else {
                return;
            };
            let (request, completion) = {
                let mut state = api.state();
                let is_same_request = state
                    .pending_request
                    .as_ref()
                    .is_some_and(|pending| pending.action_id == action_id);
                if !is_same_request {
                    return;
                }
                (
                    state.pending_request.take(),
                    state.pending_request_completion.take(),
                )
            };
            if let (Some(request), Some(completion)) = (request, completion) {
                let error = open_failure_error(scheme);
                completion(api.response_factory.create_response_with_error(request, error));
            }
        })
    }
}

fn interruption_error(url: &Url) -> SdkError {
    ErrorFactory::core().described_error(
        CoreErrorCode::BridgeApiInterruption as i64,
        format!("Login attempt cancelled by alternate call to openURL from: {url}"),
    )
}

fn open_failure_error(scheme: UrlScheme) -> SdkError {
    let (code, message) = if scheme.is_http() {
        (
            CoreErrorCode::BrowserUnavailable,
            "the app switch failed because the browser is unavailable",
        )
    } else {
        (
            CoreErrorCode::AppVersionUnsupported,
            "the app switch failed because the destination app is out of date",
        )
    };
    ErrorFactory::core().error(code as i64, message)
}

impl UrlOpener for BridgeApi {
    fn open_url(&self, url: &Url, sender: Option<Arc<dyn UrlOpening>>, handler: SuccessHandler) {
        {
            let mut state = self.state();
            state.is_expecting_background = true;
            state.pending_url_opener = sender;
        }
        self.url_opener
            .open(url, Box::new(move |success: bool| handler(success, None)));
    }

    fn open_url_with_in_app_browser(
        &self,
        url: &Url,
        sender: Option<Arc<dyn UrlOpening>>,
        from_view_controller: Option<Arc<dyn ViewController>>,
        handler: SuccessHandler,
    ) {
        if !has_http_scheme(url) {
            return self.open_url(url, sender, handler);
        }

        {
            let mut state = self.state();
            state.is_expecting_background = false;
            state.pending_url_opener = sender.clone();
        }

        let is_authentication_url = sender
            .as_ref()
            .is_some_and(|sender| sender.is_authentication_url(url));
        if is_authentication_url && self.authentication_session_provider.is_some() {
            self.interrupt_authentication_session(url);
            self.set_session_completion_handler(handler);
            self.open_url_with_authentication_session(url);
            return;
        }

        let Some(loader) = self.available_browser_loader() else {
            return self.open_url(url, sender, handler);
        };

        let Some(parent) = self.resolve_view_controller(from_view_controller) else {
            self.logger
                .log_entry("There are no valid view controllers to present the in-app browser with");
            return;
        };

        let (name, value) = IN_APP_BROWSER_QUERY_ITEM;
        let browser_url = append_query_item(url, name, value);

        match parent.transition_coordinator() {
            Some(coordinator) => {
                let weak = self.self_ref.clone();
                let parent = parent.clone();
                coordinator.animate_alongside_transition(Box::new(move || {
                    if let Some(api) = weak.upgrade() {
                        api.present_in_app_browser(loader.as_ref(), &browser_url, parent.as_ref());
                    }
                }));
            }
            None => self.present_in_app_browser(loader.as_ref(), &browser_url, parent.as_ref()),
        }
        handler(true, None);
    }
}

impl BridgeApiRequestOpening for BridgeApi {
    fn open_request(
        &self,
        request: BridgeApiRequest,
        use_in_app_browser: bool,
        from_view_controller: Option<Arc<dyn ViewController>>,
        completion: BridgeApiResponseHandler,
    ) {
        let url = match request.request_url(self.url_opener.as_ref()) {
            Ok(url) => url,
            Err(error) => {
                completion(self.response_factory.create_response_with_error(request, error));
                return;
            }
        };

        let interrupted = {
            let mut state = self.state();
            state
                .pending_request
                .take()
                .zip(state.pending_request_completion.take())
        };
        if let Some((previous, previous_completion)) = interrupted {
            let error = ErrorFactory::core().described_error(
                CoreErrorCode::BridgeApiInterruption as i64,
                format!(
                    "Bridge request {} was interrupted by a newer request.",
                    previous.method_name
                ),
            );
            previous_completion(self.response_factory.create_response_with_error(previous, error));
        }

        self.interrupt_authentication_session(&url);
        self.dismiss_in_app_browser();

        let handler = self.open_failure_handler(&request);
        {
            let mut state = self.state();
            state.pending_request = Some(request);
            state.pending_request_completion = Some(completion);
        }

        if use_in_app_browser && self.available_browser_loader().is_some() {
            match self.resolve_view_controller(from_view_controller) {
                Some(parent) => {
                    return self.open_url_with_in_app_browser(&url, None, Some(parent), handler)
                }
                None => self.logger.log_entry(
                    "There are no valid view controllers to present the in-app browser with; \
                     opening the request URL directly",
                ),
            }
        }
        self.open_url(&url, None, handler);
    }
}

impl InAppBrowserDelegate for BridgeApi {
    /// The user tapped "Done"; treated as a cancellation.
    fn browser_did_finish(&self) {
        let opener = self.state().pending_url_opener.take();
        if let Some(opener) = opener {
            opener.application_open_url(None, None, None);
        }
        self.cancel_bridge_request();
        self.state().in_app_browser = None;
    }

    fn container_did_disappear(&self) {
        if !self.has_in_app_browser() {
            return;
        }
        self.logger.log_entry(
            "**ERROR**: The in-app browser's parent view controller was dismissed. This can \
             happen if you are triggering login from an alert controller. Make sure your \
             topmost view controller will not be prematurely dismissed.",
        );
        self.browser_did_finish();
    }
}
