use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use url::Url;

use crate::bridge::{SuccessHandler, UrlOpener, UrlOpening};
use crate::settings::Settings;
use crate::util::errors::{ErrorFactory, SdkError, SdkResult};
use crate::util::json::JsonObject;
use crate::util::url::{build_url, QueryParameters};

const GAMING_SERVICES_HOST: &str = "fb.gg";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamingServiceType {
    FriendFinder,
    MediaAsset,
    Community,
}

impl GamingServiceType {
    /// Path segment of the service, also the host of its callback URL.
    pub fn as_str(self) -> &'static str {
        match self {
            GamingServiceType::FriendFinder => "friendfinder",
            GamingServiceType::MediaAsset => "media_asset",
            GamingServiceType::Community => "community",
        }
    }
}

impl fmt::Display for GamingServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(success, result, error)`.
pub type GamingServiceCompletion =
    Box<dyn FnOnce(bool, Option<JsonObject>, Option<SdkError>) + Send>;

/// Opens one gaming service page and waits for the app to be called back.
///
/// The controller registers itself as the bridge's sender, so the bridge forwards the
/// inbound callback URL (or the app becoming active) to it. The completion fires at most
/// once.
pub struct GamingServiceController {
    self_ref: Weak<GamingServiceController>,
    service_type: GamingServiceType,
    pending_result: JsonObject,
    url_opener: Arc<dyn UrlOpener>,
    settings: Arc<Settings>,
    completion: Mutex<Option<GamingServiceCompletion>>,
}

impl GamingServiceController {
    pub fn new(
        service_type: GamingServiceType,
        pending_result: JsonObject,
        url_opener: Arc<dyn UrlOpener>,
        settings: Arc<Settings>,
        completion: GamingServiceCompletion,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            service_type,
            pending_result,
            url_opener,
            settings,
            completion: Mutex::new(Some(completion)),
        })
    }

    pub fn service_type(&self) -> GamingServiceType {
        self.service_type
    }

    /// `https://fb.gg/me/{service}/{argument}`.
    pub fn service_url(&self, argument: &str) -> SdkResult<Url> {
        let path = format!("/me/{}/{argument}", self.service_type);
        build_url("https", GAMING_SERVICES_HOST, &path, &QueryParameters::new())
    }

    pub fn call_with_argument(&self, argument: &str) {
        let url = match self.service_url(argument) {
            Ok(url) => url,
            Err(error) => return self.handle_bridge_api_error(Some(error)),
        };

        let weak = self.self_ref.clone();
        let handler: SuccessHandler = Arc::new(move |success: bool, error: Option<SdkError>| {
            if success {
                return;
            }
            if let Some(controller) = weak.upgrade() {
                controller.handle_bridge_api_error(error);
            }
        });
        let sender = self
            .self_ref
            .upgrade()
            .map(|controller| controller as Arc<dyn UrlOpening>);
        self.url_opener.open_url(&url, sender, handler);
    }

    /// Completes with `error`, or with a generic failure when the opener gave none.
    pub fn handle_bridge_api_error(&self, error: Option<SdkError>) {
        let error = error.unwrap_or_else(|| {
            ErrorFactory::core().unknown(
                "Error occured while interacting with Gaming Services, Failed to open bridge.",
            )
        });
        self.complete(false, None, Some(error));
    }

    /// A callback is ours when it targets the app's scheme and the service's host.
    pub fn is_valid_callback_url(&self, url: &Url, service: &str) -> bool {
        let Some(app_id) = self.settings.app_id.as_deref().filter(|id| !id.is_empty()) else {
            return false;
        };
        url.scheme().starts_with(&format!("fb{app_id}")) && url.host_str() == Some(service)
    }

    fn complete_successfully(&self) {
        self.complete(true, Some(self.pending_result.clone()), None);
    }

    fn complete(&self, success: bool, result: Option<JsonObject>, error: Option<SdkError>) {
        let completion = self.completion.lock().unwrap().take();
        if let Some(completion) = completion {
            completion(success, result, error);
        }
    }
}

impl UrlOpening for GamingServiceController {
    fn application_open_url(
        &self,
        url: Option<&Url>,
        _source_application: Option<&str>,
        _annotation: Option<&str>,
    ) -> bool {
        let is_gaming_url = url
            .is_some_and(|url| self.is_valid_callback_url(url, self.service_type.as_str()));
        if is_gaming_url {
            self.complete_successfully();
        }
        is_gaming_url
    }

    fn can_open_url(
        &self,
        url: &Url,
        _source_application: Option<&str>,
        _annotation: Option<&str>,
    ) -> bool {
        self.is_valid_callback_url(url, self.service_type.as_str())
    }

    fn application_did_become_active(&self) {
        self.complete_successfully();
    }

    fn is_authentication_url(&self, _url: &Url) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ViewController;
    use serde_json::json;

    #[derive(Default)]
    struct CapturingOpener {
        requests: Mutex<Vec<(Url, bool, SuccessHandler)>>,
    }

    impl CapturingOpener {
        fn last_handler(&self) -> SuccessHandler {
            self.requests.lock().unwrap().last().unwrap().2.clone()
        }
    }

    impl UrlOpener for CapturingOpener {
        fn open_url(&self, url: &Url, sender: Option<Arc<dyn UrlOpening>>, handler: SuccessHandler) {
            self.requests
                .lock()
                .unwrap()
                .push((url.clone(), sender.is_some(), handler));
        }

        fn open_url_with_in_app_browser(
            &self,
            url: &Url,
            sender: Option<Arc<dyn UrlOpening>>,
            _from_view_controller: Option<Arc<dyn ViewController>>,
            handler: SuccessHandler,
        ) {
            self.open_url(url, sender, handler);
        }
    }

    type Outcomes = Arc<Mutex<Vec<(bool, Option<JsonObject>, Option<SdkError>)>>>;

    fn make_controller(
        service_type: GamingServiceType,
    ) -> (Arc<GamingServiceController>, Arc<CapturingOpener>, Outcomes) {
        let opener = Arc::new(CapturingOpener::default());
        let outcomes: Outcomes = Arc::default();
        let sink = outcomes.clone();
        let controller = GamingServiceController::new(
            service_type,
            json!({"id": "42"}).as_object().cloned().unwrap(),
            opener.clone(),
            Arc::new(Settings::with_app_id("123")),
            Box::new(move |success: bool, result: Option<JsonObject>, error: Option<SdkError>| {
                sink.lock().unwrap().push((success, result, error))
            }),
        );
        (controller, opener, outcomes)
    }

    fn callback(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn matching_callback_completes_successfully() {
        let (controller, _, outcomes) = make_controller(GamingServiceType::Community);

        assert!(controller.application_open_url(Some(&callback("fb123://community/")), Some(""), None));

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].0);
        assert_eq!(outcomes[0].1.as_ref().unwrap()["id"], json!("42"));
        assert!(outcomes[0].2.is_none());
    }

    #[test]
    fn foreign_callbacks_are_ignored() {
        let (controller, _, outcomes) = make_controller(GamingServiceType::FriendFinder);

        assert!(!controller.application_open_url(Some(&callback("f://c/")), None, None));
        assert!(!controller.application_open_url(Some(&callback("fb123://community/")), None, None));
        assert!(!controller.application_open_url(None, None, None));
        assert!(outcomes.lock().unwrap().is_empty());
    }

    #[test]
    fn callback_validation() {
        let (controller, _, _) = make_controller(GamingServiceType::Community);
        let url = callback("fb123://community/");

        assert!(controller.is_valid_callback_url(&url, "community"));
        assert!(controller.is_valid_callback_url(&callback("fb123lite://community/"), "community"));
        assert!(!controller.is_valid_callback_url(&url, "{}{}{}"));
        assert!(!controller.is_valid_callback_url(&callback("https://antsarecool.com"), ""));
        assert!(!controller.is_authentication_url(&url));
    }

    #[test]
    fn call_opens_service_url_with_controller_as_sender() {
        let (controller, opener, outcomes) = make_controller(GamingServiceType::MediaAsset);

        controller.call_with_argument("987");

        let requests = opener.requests.lock().unwrap();
        assert_eq!(requests[0].0.as_str(), "https://fb.gg/me/media_asset/987");
        assert!(requests[0].1);
        drop(requests);

        opener.last_handler()(true, Some(ErrorFactory::core().unknown("ignored")));
        assert!(outcomes.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_open_completes_with_error() {
        let (controller, opener, outcomes) = make_controller(GamingServiceType::Community);
        controller.call_with_argument("");
        opener.last_handler()(false, None);

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].0);
        assert!(outcomes[0].2.is_some());

        let (controller, opener, outcomes) = make_controller(GamingServiceType::FriendFinder);
        controller.call_with_argument("");
        let error = ErrorFactory::core().unknown("boom");
        opener.last_handler()(false, Some(error.clone()));
        assert_eq!(outcomes.lock().unwrap()[0].2, Some(error));
    }

    #[test]
    fn completion_fires_once() {
        let (controller, _, outcomes) = make_controller(GamingServiceType::Community);

        controller.application_did_become_active();
        controller.handle_bridge_api_error(Some(ErrorFactory::core().unknown("late")));
        controller.application_open_url(Some(&callback("fb123://community/")), None, None);

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].0);
        assert!(outcomes[0].2.is_none());
    }
}
