//! Adapters implementing the outbound ports.

pub mod http;

pub use http::HttpTransport;
