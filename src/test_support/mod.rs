//! Test doubles shared by the crate's unit tests.

pub mod bridge;
pub mod graph;
pub mod http;

pub use http::start_mock_server;
