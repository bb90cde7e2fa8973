//! HTTP transport shared by every call to the optimizer service.

mod http;

pub use http::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Other(String),
}
