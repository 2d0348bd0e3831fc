//! Client SDK plumbing for apps integrating with Facebook.
//!
//! - [`bridge`]: the cross-app bridge that opens requests in another app, an in-app browser or a
//!   web authentication session and correlates the callback with the call in flight.
//! - [`login`]: completion of the OAuth redirect, including code and nonce exchange and
//!   OpenID Connect token claims.
//! - [`gaming`]: gaming service pages opened through the bridge.
//! - [`graph`]: Graph API requests and their HTTP transport.
//!
//! Platform integration happens through traits: the host application implements the
//! capabilities in [`bridge`] (URL launcher, view controllers, browser, authentication
//! session) and forwards its lifecycle callbacks to a [`bridge::BridgeApi`].

pub mod bridge;
pub mod gaming;
pub mod graph;
pub mod logger;
pub mod login;
pub mod platform;
pub mod settings;
pub mod util;

#[cfg(test)]
pub mod test_support;
