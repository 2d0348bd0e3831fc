use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use url::Url;

use crate::bridge::{
    AuthenticationCompletionHandler, AuthenticationSession, AuthenticationSessionProvider,
    InAppBrowser, InAppBrowserDelegate, InAppBrowserLoader, InternalUrlOpener,
    TransitionCoordinator, UrlOpening, ViewController, ViewControllerProvider,
};
use crate::util::errors::SdkError;

/// OS URL launcher double: answers `can_open_url` from a flag and reports `open_result`
/// to every open completion.
pub struct RecordingInternalUrlOpener {
    can_open: bool,
    open_result: AtomicBool,
    opened: Mutex<Vec<Url>>,
}

impl RecordingInternalUrlOpener {
    pub fn new(can_open: bool) -> Self {
        Self {
            can_open,
            open_result: AtomicBool::new(true),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn with_open_result(self, open_result: bool) -> Self {
        self.open_result.store(open_result, Ordering::SeqCst);
        self
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

impl InternalUrlOpener for RecordingInternalUrlOpener {
    fn can_open_url(&self, _url: &Url) -> bool {
        self.can_open
    }

    fn open(&self, url: &Url, completion: Box<dyn FnOnce(bool) + Send>) {
        self.opened.lock().unwrap().push(url.clone());
        completion(self.open_result.load(Ordering::SeqCst));
    }
}

/// Sender double recording every inbound call.
#[derive(Default)]
pub struct RecordingSender {
    pub can_open: bool,
    pub stop_propagation: bool,
    pub authentication_url: bool,
    pub can_open_calls: AtomicUsize,
    pub opened: Mutex<Vec<Option<Url>>>,
    pub did_become_active_calls: AtomicUsize,
}

impl RecordingSender {
    pub fn can_open(can_open: bool) -> Self {
        Self {
            can_open,
            ..Default::default()
        }
    }

    pub fn authenticating() -> Self {
        Self {
            authentication_url: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<Option<Url>> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlOpening for RecordingSender {
    fn application_open_url(
        &self,
        url: Option<&Url>,
        _source_application: Option<&str>,
        _annotation: Option<&str>,
    ) -> bool {
        self.opened.lock().unwrap().push(url.cloned());
        self.can_open
    }

    fn can_open_url(
        &self,
        _url: &Url,
        _source_application: Option<&str>,
        _annotation: Option<&str>,
    ) -> bool {
        self.can_open_calls.fetch_add(1, Ordering::SeqCst);
        self.can_open
    }

    fn application_did_become_active(&self) {
        self.did_become_active_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn is_authentication_url(&self, _url: &Url) -> bool {
        self.authentication_url
    }

    fn should_stop_propagation(&self, _url: &Url) -> bool {
        self.stop_propagation
    }
}

#[derive(Default)]
pub struct RecordingAuthenticationSession {
    pub start_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl RecordingAuthenticationSession {
    pub fn cancel_count(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

impl AuthenticationSession for RecordingAuthenticationSession {
    fn start(&self) -> bool {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn cancel(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out recording sessions and keeps their completions so tests can play the system.
#[derive(Default)]
pub struct RecordingSessionProvider {
    pub sessions: Mutex<Vec<Arc<RecordingAuthenticationSession>>>,
    pub requests: Mutex<Vec<(Url, Option<String>)>>,
    completions: Mutex<Vec<AuthenticationCompletionHandler>>,
}

impl RecordingSessionProvider {
    pub fn last_session(&self) -> Option<Arc<RecordingAuthenticationSession>> {
        self.sessions.lock().unwrap().last().cloned()
    }

    /// Invokes the completion captured for the most recent session.
    pub fn complete(&self, url: Option<Url>, error: Option<SdkError>) {
        let completion = self.completions.lock().unwrap().last().cloned();
        if let Some(completion) = completion {
            completion(url, error);
        }
    }
}

impl AuthenticationSessionProvider for RecordingSessionProvider {
    fn create_session(
        &self,
        url: &Url,
        callback_url_scheme: Option<&str>,
        completion: AuthenticationCompletionHandler,
    ) -> Arc<dyn AuthenticationSession> {
        let session = Arc::new(RecordingAuthenticationSession::default());
        self.sessions.lock().unwrap().push(session.clone());
        self.requests
            .lock()
            .unwrap()
            .push((url.clone(), callback_url_scheme.map(str::to_string)));
        self.completions.lock().unwrap().push(completion);
        session
    }
}

/// Browser double; dismissal completes synchronously.
pub struct RecordingBrowser {
    url: Url,
    pub delegate: Weak<dyn InAppBrowserDelegate>,
    pub dismiss_calls: AtomicUsize,
}

impl InAppBrowser for RecordingBrowser {
    fn url(&self) -> Url {
        self.url.clone()
    }

    fn dismiss(&self, completion: Box<dyn FnOnce() + Send>) {
        self.dismiss_calls.fetch_add(1, Ordering::SeqCst);
        completion();
    }
}

pub struct RecordingBrowserLoader {
    available: bool,
    pub created: Mutex<Vec<Arc<RecordingBrowser>>>,
}

impl RecordingBrowserLoader {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn last_browser(&self) -> Option<Arc<RecordingBrowser>> {
        self.created.lock().unwrap().last().cloned()
    }
}

impl InAppBrowserLoader for RecordingBrowserLoader {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&self, url: &Url, delegate: Weak<dyn InAppBrowserDelegate>) -> Arc<dyn InAppBrowser> {
        let browser = Arc::new(RecordingBrowser {
            url: url.clone(),
            delegate,
            dismiss_calls: AtomicUsize::new(0),
        });
        self.created.lock().unwrap().push(browser.clone());
        browser
    }
}

/// Transition coordinator holding its completions until `finish` is called.
#[derive(Default)]
pub struct PendingTransition {
    completions: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl PendingTransition {
    pub fn finish(&self) {
        let completions = std::mem::take(&mut *self.completions.lock().unwrap());
        for completion in completions {
            completion();
        }
    }
}

impl TransitionCoordinator for PendingTransition {
    fn animate_alongside_transition(&self, completion: Box<dyn FnOnce() + Send>) {
        self.completions.lock().unwrap().push(completion);
    }
}

#[derive(Default)]
pub struct RecordingViewController {
    pub transition: Option<Arc<PendingTransition>>,
    pub presented: Mutex<Vec<Url>>,
}

impl RecordingViewController {
    pub fn in_transition(transition: Arc<PendingTransition>) -> Self {
        Self {
            transition: Some(transition),
            presented: Mutex::new(Vec::new()),
        }
    }

    pub fn presented(&self) -> Vec<Url> {
        self.presented.lock().unwrap().clone()
    }
}

impl ViewController for RecordingViewController {
    fn transition_coordinator(&self) -> Option<Arc<dyn TransitionCoordinator>> {
        self.transition
            .clone()
            .map(|transition| transition as Arc<dyn TransitionCoordinator>)
    }

    fn present(&self, browser: Arc<dyn InAppBrowser>) {
        self.presented.lock().unwrap().push(browser.url());
    }
}

pub struct StaticViewControllerProvider(pub Option<Arc<dyn ViewController>>);

impl ViewControllerProvider for StaticViewControllerProvider {
    fn top_most_view_controller(&self) -> Option<Arc<dyn ViewController>> {
        self.0.clone()
    }
}
