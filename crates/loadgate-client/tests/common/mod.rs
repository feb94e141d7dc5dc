// crates/loadgate-client/tests/common/mod.rs
// ============================================================================
// Module: Client Test Fixtures
// Description: Local scripted HTTP server for client tests.
// Purpose: Exercise the HTTP client against canned responses without network access.
// Dependencies: tiny_http
// ============================================================================

//! ## Overview
//! [`serve`] starts a `tiny_http` server on a loopback port that answers each
//! incoming request with the next scripted response and reports what it saw.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use std::thread;
use std::thread::JoinHandle;

use loadgate_client::HttpClientConfig;
use loadgate_client::HttpMetricsClient;
use tiny_http::Response;
use tiny_http::Server;

/// Header name used by the local fixtures.
pub const KEY_HEADER: &str = "loaderio-auth";

/// Request observed by the scripted server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub method: String,
    pub url: String,
    pub key: Option<String>,
}

/// Serves the scripted `(status, body)` responses in order.
pub fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<SeenRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let Ok(request) = server.recv() else {
                break;
            };
            let key = request
                .headers()
                .iter()
                .find(|header| header.field.equiv(KEY_HEADER))
                .map(|header| header.value.as_str().to_string());
            seen.push(SeenRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                key,
            });
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
        seen
    });
    (format!("http://{addr}/v2"), handle)
}

/// Builds a client against a local base URL.
pub fn local_client(base_url: &str) -> HttpMetricsClient {
    HttpMetricsClient::new(local_config(base_url)).unwrap()
}

/// Returns a configuration allowing cleartext loopback access.
pub fn local_config(base_url: &str) -> HttpClientConfig {
    HttpClientConfig {
        base_url: base_url.to_string(),
        allow_http: true,
        timeout_ms: 5_000,
        ..HttpClientConfig::default()
    }
}
