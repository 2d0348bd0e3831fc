use std::sync::{Arc, Mutex};

use facebook_rs_sdk::bridge::{
    BridgeApi, BridgeApiDependencies, BridgeApiProtocolType, BridgeApiRequest,
    BridgeApiRequestOpening, BridgeApiResponse, InternalUrlOpener, UrlScheme,
};
use facebook_rs_sdk::settings::Settings;
use facebook_rs_sdk::util::json::JsonObject;
use facebook_rs_sdk::util::url::{build_url, query_parameters, QueryParameters};
use serde_json::json;
use url::Url;

/// Launcher that accepts web URLs only, like a device without the native app.
#[derive(Default)]
struct BrowserOnlyLauncher {
    opened: Mutex<Vec<Url>>,
}

impl InternalUrlOpener for BrowserOnlyLauncher {
    fn can_open_url(&self, url: &Url) -> bool {
        url.scheme() == "https"
    }

    fn open(&self, url: &Url, completion: Box<dyn FnOnce(bool) + Send>) {
        self.opened.lock().unwrap().push(url.clone());
        completion(true);
    }
}

struct Fixture {
    api: Arc<BridgeApi>,
    launcher: Arc<BrowserOnlyLauncher>,
    settings: Arc<Settings>,
    responses: Arc<Mutex<Vec<BridgeApiResponse>>>,
}

fn fixture() -> Fixture {
    let settings = Arc::new(Settings::with_app_id("123"));
    let launcher = Arc::new(BrowserOnlyLauncher::default());
    let api = BridgeApi::new(BridgeApiDependencies::new(launcher.clone(), settings.clone()));
    Fixture {
        api,
        launcher,
        settings,
        responses: Arc::default(),
    }
}

impl Fixture {
    fn open(&self, protocol_type: BridgeApiProtocolType, scheme: UrlScheme) -> BridgeApiRequest {
        let parameters = json!({"href": "https://example.com"})
            .as_object()
            .cloned()
            .unwrap();
        let request = BridgeApiRequest::new(
            protocol_type,
            scheme,
            "share",
            parameters,
            JsonObject::new(),
            self.settings.clone(),
        )
        .expect("protocol for request");
        let sink = self.responses.clone();
        self.api.open_request(
            request.clone(),
            false,
            None,
            Box::new(move |response: BridgeApiResponse| sink.lock().unwrap().push(response)),
        );
        request
    }

    /// The callback the web dialog redirects to, with extra query items.
    fn callback(&self, extra: &[(&str, &str)]) -> Url {
        let opened = self.launcher.opened.lock().unwrap().last().cloned().unwrap();
        let redirect = Url::parse(&query_parameters(&opened)["redirect_uri"]).unwrap();
        let mut query: QueryParameters = query_parameters(&redirect);
        for (key, value) in extra {
            query.insert(key.to_string(), value.to_string());
        }
        build_url(redirect.scheme(), redirect.host_str().unwrap(), redirect.path(), &query).unwrap()
    }
}

#[test]
fn web_dialog_round_trip() {
    let fixture = fixture();
    fixture.open(BridgeApiProtocolType::Web, UrlScheme::Https);

    let opened = fixture.launcher.opened.lock().unwrap()[0].clone();
    assert_eq!(opened.host_str(), Some("m.facebook.com"));
    assert_eq!(opened.path(), "/v17.0/dialog/share");
    assert_eq!(query_parameters(&opened)["href"], "https://example.com");

    let callback = fixture.callback(&[]);
    assert_eq!(callback.scheme(), "fb123");
    assert!(fixture
        .api
        .application_open_url(&callback, Some("com.apple.mobilesafari"), None));

    let responses = fixture.responses.lock().unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].error.is_none());
    assert!(!responses[0].is_cancelled);
    assert_eq!(
        responses[0].response_parameters.as_ref().unwrap()["didComplete"],
        json!(1)
    );
    assert!(fixture.api.pending_request().is_none());
}

#[test]
fn web_dialog_cancellation() {
    let fixture = fixture();
    fixture.open(BridgeApiProtocolType::Web, UrlScheme::Https);

    let callback = fixture.callback(&[("error_code", "4201")]);
    assert!(fixture.api.application_open_url(&callback, None, None));

    let responses = fixture.responses.lock().unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].is_cancelled);
}

#[test]
fn web_dialog_error_is_delivered() {
    let fixture = fixture();
    fixture.open(BridgeApiProtocolType::Web, UrlScheme::Https);

    let callback = fixture.callback(&[("error_code", "190"), ("error_message", "expired")]);
    assert!(fixture.api.application_open_url(&callback, None, None));

    let responses = fixture.responses.lock().unwrap();
    let error = responses[0].error.as_ref().unwrap();
    assert_eq!(error.code, 190);
    assert_eq!(error.message.as_deref(), Some("expired"));
}

#[test]
fn missing_native_app_fails_fast() {
    let fixture = fixture();
    fixture.open(BridgeApiProtocolType::Native, UrlScheme::FacebookApi);

    let responses = fixture.responses.lock().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].error.as_ref().unwrap().code, 11);
    assert!(fixture.launcher.opened.lock().unwrap().is_empty());
    assert!(fixture.api.pending_request().is_none());
}

#[test]
fn returning_to_the_app_cancels_the_dialog() {
    let fixture = fixture();
    fixture.open(BridgeApiProtocolType::Web, UrlScheme::Https);

    fixture.api.application_will_resign_active();
    fixture.api.application_did_enter_background();
    fixture.api.application_did_become_active();

    let responses = fixture.responses.lock().unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].is_cancelled);
}
