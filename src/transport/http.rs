//! Blocking HTTP transport

use super::{PostRequest, Transport, TransportError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

/// POSTs metric bodies with `reqwest`'s blocking client
///
/// A fresh client is built for every request, so no connection is reused
/// between metrics and the transport can be dropped from any thread. The
/// connect timeout and the total request timeout are both `timeout`.
///
/// Certificate and hostname verification are disabled. Stats collectors are
/// commonly internal hosts with self-signed certificates; this transport is
/// not a security boundary.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self) -> Result<Client, TransportError> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(TransportError::Client)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(error_chain(&err))
        } else {
            TransportError::Request(err)
        }
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: &PostRequest<'_>) -> Result<u16, TransportError> {
        let url = Url::parse(request.endpoint).map_err(|e| TransportError::InvalidEndpoint {
            endpoint: request.endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let client = self.client()?;
        let mut builder = client.post(url).body(request.body.to_vec());
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        let response = builder.send().map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        debug!(endpoint = %request.endpoint, status, "POST completed");
        Ok(status)
    }
}

/// Render an error with its sources, e.g. `error sending request: tcp connect error: refused`
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let transport = HttpTransport::new(Duration::from_secs(1));
        let result = transport.post(&PostRequest {
            endpoint: "",
            body: b"x",
            content_type: None,
        });

        assert!(matches!(
            result,
            Err(TransportError::InvalidEndpoint { .. })
        ));
    }
}
