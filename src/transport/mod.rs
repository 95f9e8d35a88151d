//! Transport Module
//! 
//! HTTP delivery of encoded metric bodies.

pub mod http;
pub mod sender;

pub use http::HttpTransport;
pub use sender::MetricSender;

use std::time::Duration;

/// One POST to issue
#[derive(Debug, Clone, Copy)]
pub struct PostRequest<'a> {
    pub endpoint: &'a str,
    pub body: &'a [u8],
    pub content_type: Option<&'static str>,
}

/// Failures below the HTTP status line
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unable to initialize HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Issues a single HTTP POST and reports the response status
///
/// Implementations must not retry. Anything that prevents a status code from
/// being read is a [`TransportError`].
pub trait Transport: Send + Sync {
    fn post(&self, request: &PostRequest<'_>) -> Result<u16, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&self, request: &PostRequest<'_>) -> Result<u16, TransportError> {
        (**self).post(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn post(&self, request: &PostRequest<'_>) -> Result<u16, TransportError> {
        (**self).post(request)
    }
}
