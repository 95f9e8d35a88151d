//! InfluxDB stand-ins built on `wiremock`

#![allow(dead_code)]

use std::net::TcpListener;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mock server answering every POST with `status`
pub async fn influx_answering(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// Endpoint on `server`, `path` may carry a query string
pub fn endpoint(server: &MockServer, path: &str) -> String {
    format!("{}{}", server.uri(), path)
}

/// Bodies of every request the server has seen, in arrival order
pub async fn received_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(body_text)
        .collect()
}

pub fn body_text(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

/// JSON-point body for one metric
pub fn json_point(name: &str, value: i64) -> String {
    format!(r#"[{{"name":"{}","columns":["value"],"points":[[{}]]}}]"#, name, value)
}

/// An address nothing is listening on
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let addr = listener.local_addr().expect("free port address");
    drop(listener);
    format!("http://{}/write", addr)
}
