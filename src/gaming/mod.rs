//! Gaming service pages (friend finder, media assets, community) opened through the bridge.

mod service;

pub use service::{GamingServiceCompletion, GamingServiceController, GamingServiceType};
