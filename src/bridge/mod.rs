//! Cross-app bridge: requests that leave the app through a URL and come back through one.
//!
//! [`BridgeApi`] holds the single call in flight, [`BridgeApiResponseFactory`] turns a
//! callback URL into a [`BridgeApiResponse`], and the traits in `platform` describe what the
//! host application must provide.

mod api;
mod platform;
mod protocol;
mod request;
mod response;

pub use api::{AuthenticationSessionState, BridgeApi, BridgeApiDependencies};
pub use platform::{
    AuthenticationCompletionHandler, AuthenticationSession, AuthenticationSessionProvider,
    BridgeApiRequestOpening, BridgeApiResponseHandler, InAppBrowser, InAppBrowserDelegate,
    InAppBrowserLoader, InternalUrlOpener, OperatingSystemVersion,
    OperatingSystemVersionComparing, SuccessHandler, TransitionCoordinator, UrlOpener,
    UrlOpening, ViewController, ViewControllerProvider,
};
pub use protocol::{BridgeApiProtocol, NativeV1Protocol, ProtocolResponse, WebV1Protocol};
pub use request::{BridgeApiProtocolType, BridgeApiRequest, UrlScheme};
pub use response::{BridgeApiResponse, BridgeApiResponseCreating, BridgeApiResponseFactory};
