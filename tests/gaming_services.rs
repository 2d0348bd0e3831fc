use std::sync::{Arc, Mutex};

use facebook_rs_sdk::bridge::{BridgeApi, BridgeApiDependencies, InternalUrlOpener, UrlOpening};
use facebook_rs_sdk::gaming::{GamingServiceController, GamingServiceType};
use facebook_rs_sdk::settings::Settings;
use facebook_rs_sdk::util::errors::SdkError;
use facebook_rs_sdk::util::json::JsonObject;
use url::Url;

struct Launcher {
    accept: bool,
    opened: Mutex<Vec<Url>>,
}

impl InternalUrlOpener for Launcher {
    fn can_open_url(&self, _url: &Url) -> bool {
        true
    }

    fn open(&self, url: &Url, completion: Box<dyn FnOnce(bool) + Send>) {
        self.opened.lock().unwrap().push(url.clone());
        completion(self.accept);
    }
}

type Outcomes = Arc<Mutex<Vec<(bool, Option<SdkError>)>>>;

fn start(
    accept: bool,
) -> (Arc<BridgeApi>, Arc<Launcher>, Arc<GamingServiceController>, Outcomes) {
    let settings = Arc::new(Settings::with_app_id("123"));
    let launcher = Arc::new(Launcher {
        accept,
        opened: Mutex::new(Vec::new()),
    });
    let api = BridgeApi::new(BridgeApiDependencies::new(launcher.clone(), settings.clone()));
    let outcomes: Outcomes = Arc::default();
    let sink = outcomes.clone();
    let controller = GamingServiceController::new(
        GamingServiceType::FriendFinder,
        JsonObject::new(),
        api.clone(),
        settings,
        Box::new(move |success: bool, _: Option<JsonObject>, error: Option<SdkError>| {
            sink.lock().unwrap().push((success, error))
        }),
    );
    controller.call_with_argument("");
    (api, launcher, controller, outcomes)
}

#[test]
fn callback_through_bridge_completes_service() {
    let (api, launcher, controller, outcomes) = start(true);
    assert_eq!(
        launcher.opened.lock().unwrap()[0].as_str(),
        "https://fb.gg/me/friendfinder/"
    );

    let callback = Url::parse("fb123://friendfinder").unwrap();
    assert!(controller.can_open_url(&callback, None, None));
    assert!(api.application_open_url(&callback, None, None));

    assert_eq!(*outcomes.lock().unwrap(), vec![(true, None)]);
}

#[test]
fn rejected_open_completes_with_error() {
    let (_, _, _, outcomes) = start(false);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].0);
    assert!(outcomes[0].1.is_some());
}

#[test]
fn returning_without_callback_completes_once() {
    let (api, _, _, outcomes) = start(true);

    api.application_did_enter_background();
    api.application_did_become_active();
    api.application_did_become_active();

    assert_eq!(*outcomes.lock().unwrap(), vec![(true, None)]);
}
