mod connection;
mod request;

pub use connection::HttpGraphRequestConnection;
pub use request::{GraphRequest, GraphRequestConnection, GraphRequestFlags, HttpMethod};
