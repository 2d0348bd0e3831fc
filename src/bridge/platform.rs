//! Capabilities the bridge needs from the host platform.
//!
//! The host application adapts its URL handling, view hierarchy, in-app browser and
//! web authentication session to these traits and hands them to
//! [`crate::bridge::BridgeApi`].

use std::sync::{Arc, Weak};

use url::Url;

use crate::bridge::request::BridgeApiRequest;
use crate::bridge::response::BridgeApiResponse;
use crate::util::errors::SdkError;

/// `(did_succeed, error)` callback of an open attempt. May be invoked more than once
/// by an authentication session (success followed by cleanup).
pub type SuccessHandler = Arc<dyn Fn(bool, Option<SdkError>) + Send + Sync>;

/// Raw completion of a web authentication session.
pub type AuthenticationCompletionHandler = Arc<dyn Fn(Option<Url>, Option<SdkError>) + Send + Sync>;

pub type BridgeApiResponseHandler = Box<dyn FnOnce(BridgeApiResponse) + Send>;

/// The operating system's URL launcher.
pub trait InternalUrlOpener: Send + Sync {
    fn can_open_url(&self, url: &Url) -> bool;

    /// Opens `url`; `completion` receives whether the system accepted it.
    fn open(&self, url: &Url, completion: Box<dyn FnOnce(bool) + Send>);
}

/// A component that started a flow through the bridge and wants its inbound URL.
pub trait UrlOpening: Send + Sync {
    /// Handles the inbound URL. `None` means the flow ended without a callback
    /// (the in-app browser was closed).
    fn application_open_url(
        &self,
        url: Option<&Url>,
        source_application: Option<&str>,
        annotation: Option<&str>,
    ) -> bool;

    fn can_open_url(
        &self,
        url: &Url,
        source_application: Option<&str>,
        annotation: Option<&str>,
    ) -> bool;

    fn application_did_become_active(&self);

    /// URLs for which a web authentication session should be used instead of a browser.
    fn is_authentication_url(&self, url: &Url) -> bool;

    /// Returning true claims `url` entirely; the bridge stops processing it.
    fn should_stop_propagation(&self, _url: &Url) -> bool {
        false
    }
}

/// URL opening surface the bridge offers to login and gaming flows.
pub trait UrlOpener: Send + Sync {
    fn open_url(&self, url: &Url, sender: Option<Arc<dyn UrlOpening>>, handler: SuccessHandler);

    fn open_url_with_in_app_browser(
        &self,
        url: &Url,
        sender: Option<Arc<dyn UrlOpening>>,
        from_view_controller: Option<Arc<dyn ViewController>>,
        handler: SuccessHandler,
    );
}

/// Bridge request surface offered to dialogs.
pub trait BridgeApiRequestOpening: Send + Sync {
    fn open_request(
        &self,
        request: BridgeApiRequest,
        use_in_app_browser: bool,
        from_view_controller: Option<Arc<dyn ViewController>>,
        completion: BridgeApiResponseHandler,
    );
}

pub trait TransitionCoordinator: Send + Sync {
    /// Runs `completion` once the in-flight transition animation ends.
    fn animate_alongside_transition(&self, completion: Box<dyn FnOnce() + Send>);
}

pub trait ViewController: Send + Sync {
    fn transition_coordinator(&self) -> Option<Arc<dyn TransitionCoordinator>>;

    fn present(&self, browser: Arc<dyn InAppBrowser>);
}

pub trait ViewControllerProvider: Send + Sync {
    fn top_most_view_controller(&self) -> Option<Arc<dyn ViewController>>;
}

/// A presented in-app browser (a Safari view controller on iOS).
pub trait InAppBrowser: Send + Sync {
    fn url(&self) -> Url;

    /// Dismisses the browser; `completion` runs when the dismissal has finished.
    fn dismiss(&self, completion: Box<dyn FnOnce() + Send>);
}

/// Receives the browser's own lifecycle events.
pub trait InAppBrowserDelegate: Send + Sync {
    /// The user closed the browser.
    fn browser_did_finish(&self);

    /// The view controller hosting the browser went away.
    fn container_did_disappear(&self);
}

pub trait InAppBrowserLoader: Send + Sync {
    fn is_available(&self) -> bool;

    fn create(&self, url: &Url, delegate: Weak<dyn InAppBrowserDelegate>) -> Arc<dyn InAppBrowser>;
}

/// A system web authentication session.
pub trait AuthenticationSession: Send + Sync {
    fn start(&self) -> bool;

    fn cancel(&self);
}

pub trait AuthenticationSessionProvider: Send + Sync {
    fn create_session(
        &self,
        url: &Url,
        callback_url_scheme: Option<&str>,
        completion: AuthenticationCompletionHandler,
    ) -> Arc<dyn AuthenticationSession>;
}

pub trait OperatingSystemVersionComparing: Send + Sync {
    fn is_at_least(&self, major_version: u32) -> bool;
}

/// Fixed operating system version, defaulting to a current release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperatingSystemVersion {
    pub major: u32,
}

impl Default for OperatingSystemVersion {
    fn default() -> Self {
        Self { major: 17 }
    }
}

impl OperatingSystemVersionComparing for OperatingSystemVersion {
    fn is_at_least(&self, major_version: u32) -> bool {
        self.major >= major_version
    }
}
