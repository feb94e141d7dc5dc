// crates/loadgate-client/src/http.rs
// ============================================================================
// Module: HTTP Metrics Client
// Description: Blocking HTTP client for the remote load-testing service.
// Purpose: Start runs, poll run status, and read summary metrics with strict limits.
// Dependencies: loadgate-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`HttpMetricsClient`] maps the remote service's REST endpoints onto
//! [`MetricsClient`]. Every request carries the API key in a single
//! configured header, redirects are never followed, and responses are read
//! under a hard byte limit. Remote payloads are untrusted; anything that does
//! not match the expected shape is reported as [`ClientError::Malformed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

use loadgate_core::ClientError;
use loadgate_core::MetricsClient;
use loadgate_core::RunId;
use loadgate_core::RunState;
use loadgate_core::RunStatus;
use loadgate_core::SecretKey;
use loadgate_core::SummaryMetrics;
use loadgate_core::TestId;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Smallest accepted request timeout.
const MIN_TIMEOUT_MS: u64 = 100;
/// Largest accepted request timeout.
const MAX_TIMEOUT_MS: u64 = 300_000;
/// Largest accepted response size limit.
const MAX_RESPONSE_LIMIT: u64 = 16 * 1024 * 1024;
/// Start-call statuses that mean the test or key is not recognized.
const REJECTED_START_STATUSES: [u16; 4] = [401, 403, 404, 422];
/// Listing statuses that mean the key is not recognized.
const REJECTED_KEY_STATUSES: [u16; 2] = [401, 403];

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP metrics client.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` base URLs.
/// - `max_response_bytes` is enforced as a hard upper bound on response bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Base URL of the remote API; endpoint paths are appended to it.
    pub base_url: String,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Header carrying the API key.
    pub api_key_header: String,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.loader.io/v2".to_string(),
            allow_http: false,
            timeout_ms: 10_000,
            max_response_bytes: 1024 * 1024,
            api_key_header: "loaderio-auth".to_string(),
            user_agent: "loadgate/0.1".to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Validates the base URL, limits, and header name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientConfigError`] for the first invalid setting.
    pub fn validate(&self) -> Result<(), ClientConfigError> {
        self.base()?;
        self.header_name()?;
        check_range("timeout_ms", self.timeout_ms, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)?;
        let max_bytes = u64::try_from(self.max_response_bytes).unwrap_or(u64::MAX);
        check_range("max_response_bytes", max_bytes, 1, MAX_RESPONSE_LIMIT)
    }

    /// Parses the base URL and enforces scheme policy.
    fn base(&self) -> Result<Url, ClientConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ClientConfigError::InvalidBaseUrl(err.to_string()))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            other => return Err(ClientConfigError::UnsupportedScheme(other.to_string())),
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ClientConfigError::InvalidBaseUrl(
                "url credentials are not allowed".to_string(),
            ));
        }
        if url.cannot_be_a_base() {
            return Err(ClientConfigError::InvalidBaseUrl("url cannot carry a path".to_string()));
        }
        Ok(url)
    }

    /// Parses the API key header name.
    fn header_name(&self) -> Result<HeaderName, ClientConfigError> {
        HeaderName::from_bytes(self.api_key_header.trim().as_bytes())
            .map_err(|_| ClientConfigError::InvalidHeader(self.api_key_header.clone()))
    }
}

/// Rejects values outside `[min, max]`.
const fn check_range(
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<(), ClientConfigError> {
    if value < min || value > max {
        return Err(ClientConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Client configuration failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientConfigError {
    /// Base URL does not parse or carries credentials.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// Base URL scheme is not allowed.
    #[error("unsupported base url scheme: {0}")]
    UnsupportedScheme(String),
    /// A numeric limit is out of bounds.
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Lower bound.
        min: u64,
        /// Upper bound.
        max: u64,
        /// Offending value.
        value: u64,
    },
    /// API key header name is not a valid HTTP header.
    #[error("invalid api key header name: {0}")]
    InvalidHeader(String),
    /// HTTP client construction failed.
    #[error("http client build failed")]
    Build,
}

// ============================================================================
// SECTION: Wire Payloads
// ============================================================================

/// Body returned by the run start endpoint.
#[derive(Debug, Deserialize)]
struct StartResponse {
    /// Identifier of the started run.
    #[serde(default, alias = "result_id")]
    run_id: Option<String>,
}

/// Body returned by the run status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    /// Remote status label.
    status: String,
    /// Declared run duration in seconds.
    #[serde(default)]
    duration: u64,
}

/// Body returned by the run summary endpoint.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    /// Average response time in milliseconds.
    avg_response_time: i64,
    /// Average error rate in percent.
    avg_error_rate: f64,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking HTTP implementation of [`MetricsClient`].
///
/// # Invariants
/// - Redirects are not followed.
/// - Responses exceeding configured limits fail closed.
pub struct HttpMetricsClient {
    /// Client configuration, including limits and policy.
    config: HttpClientConfig,
    /// Parsed base URL.
    base: Url,
    /// Header carrying the API key.
    key_header: HeaderName,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpMetricsClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientConfigError`] when the configuration is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientConfigError> {
        config.validate()?;
        let base = config.base()?;
        let key_header = config.header_name()?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| ClientConfigError::Build)?;
        Ok(Self {
            config,
            base,
            key_header,
            client,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Malformed("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attaches the API key header and sends the request.
    fn send(&self, request: RequestBuilder, key: &SecretKey) -> Result<Response, ClientError> {
        let mut value = HeaderValue::from_str(key.expose()).map_err(|_| {
            ClientError::Rejected("api key contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        request.header(self.key_header.clone(), value).send().map_err(|err| {
            let reason = if err.is_timeout() {
                "http request timed out"
            } else if err.is_connect() {
                "http connection failed"
            } else {
                "http request failed"
            };
            ClientError::Transport(reason.to_string())
        })
    }

    /// Reads and decodes a JSON body under the size limit.
    fn read_json<T: DeserializeOwned>(
        &self,
        response: &mut Response,
        what: &str,
    ) -> Result<T, ClientError> {
        let body = read_response_limited(response, self.config.max_response_bytes)?;
        serde_json::from_slice(&body)
            .map_err(|err| ClientError::Malformed(format!("invalid {what} payload: {err}")))
    }
}

impl MetricsClient for HttpMetricsClient {
    fn start_run(&self, test_id: &TestId, key: &SecretKey) -> Result<RunId, ClientError> {
        let url = self.endpoint(&["tests", test_id.as_str(), "run"])?;
        let mut response = self.send(self.client.post(url), key)?;
        let status = response.status().as_u16();
        if REJECTED_START_STATUSES.contains(&status) {
            return Err(ClientError::Rejected(format!(
                "test '{test_id}' or api key not accepted (http {status})"
            )));
        }
        ensure_success(&response)?;
        let body: StartResponse = self.read_json(&mut response, "run start")?;
        match body.run_id {
            Some(run_id) if !run_id.trim().is_empty() => Ok(RunId::new(run_id)),
            _ => Err(ClientError::Rejected(format!("no run id returned for test '{test_id}'"))),
        }
    }

    fn run_status(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<RunStatus, ClientError> {
        let url = self.endpoint(&["tests", test_id.as_str(), "runs", run_id.as_str()])?;
        let mut response = self.send(self.client.get(url), key)?;
        ensure_success(&response)?;
        let body: StatusResponse = self.read_json(&mut response, "run status")?;
        Ok(RunStatus {
            run_id: run_id.clone(),
            state: RunState::from_label(&body.status),
            declared_duration_sec: body.duration,
        })
    }

    fn summary(
        &self,
        test_id: &TestId,
        run_id: &RunId,
        key: &SecretKey,
    ) -> Result<SummaryMetrics, ClientError> {
        let url =
            self.endpoint(&["tests", test_id.as_str(), "runs", run_id.as_str(), "summary"])?;
        let mut response = self.send(self.client.get(url), key)?;
        ensure_success(&response)?;
        let body: SummaryResponse = self.read_json(&mut response, "summary")?;
        if !body.avg_error_rate.is_finite() {
            return Err(ClientError::Malformed("avg_error_rate is not finite".to_string()));
        }
        Ok(SummaryMetrics {
            avg_response_time_ms: body.avg_response_time,
            avg_error_rate_pct: body.avg_error_rate,
        })
    }

    fn list_tests(&self, key: &SecretKey) -> Result<BTreeMap<TestId, String>, ClientError> {
        let url = self.endpoint(&["tests"])?;
        let mut response = self.send(self.client.get(url), key)?;
        let status = response.status().as_u16();
        if REJECTED_KEY_STATUSES.contains(&status) {
            return Err(ClientError::Rejected("invalid api key".to_string()));
        }
        ensure_success(&response)?;
        let body: BTreeMap<String, String> = self.read_json(&mut response, "test list")?;
        Ok(body.into_iter().map(|(id, name)| (TestId::new(id), name)).collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps non-2xx statuses onto [`ClientError::HttpStatus`].
fn ensure_success(response: &Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::HttpStatus {
            status: status.as_u16(),
        })
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, ClientError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ClientError::Malformed("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(ClientError::Malformed("http response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|_| ClientError::Transport("failed to read response".to_string()))?;
    if buf.len() > max_bytes {
        return Err(ClientError::Malformed("http response exceeds size limit".to_string()));
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| ClientError::Malformed("invalid response length".to_string()))?;
        if buf.len() < expected {
            return Err(ClientError::Transport("http response truncated".to_string()));
        }
    }
    Ok(buf)
}
