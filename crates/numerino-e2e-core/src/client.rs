// crates/numerino-e2e-core/src/client.rs
// ============================================================================
// Module: Backend API Client
// Description: HTTP client used by every phase to call the backend.
// Purpose: Issue requests and fold transport failures into status-0 results.
// Dependencies: numerino-e2e-config, reqwest, serde_json, tracing, url
// ============================================================================

//! ## Overview
//! [`ApiClient::send`] never returns an error: connection failures, timeouts,
//! and unreadable bodies become an [`ApiResponse`] carrying status `0` (or the
//! real status when only the body failed) plus a `transport_error` message.
//! Phases then report them as ordinary failed checks.
//!
//! Responses are bounded by the configured body size limit and redirects are
//! never followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use std::time::Instant;

use numerino_e2e_config::TargetConfig;
use reqwest::Client;
use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::warn;
use url::Url;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type used for every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Object keys searched by [`ApiResponse::extract_id`] besides the top level.
const ID_SCOPES: &[&str] = &["/data", "/user", "/userInfo", "/data/user", "/data/userInfo"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API client errors.
///
/// # Invariants
/// - String payloads are user-facing and may include untrusted server text.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("api client config error: {0}")]
    Config(String),
    /// Transport error.
    #[error("api transport error: {0}")]
    Transport(String),
    /// Response size exceeds limits.
    #[error("api response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document.
    Json(Value),
    /// Raw text sent as `application/json` (used for malformed-body checks).
    Raw(String),
}

impl RequestBody {
    /// Returns the wire text of the body.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// A single backend call.
#[derive(Clone)]
pub struct ApiRequest {
    /// HTTP method.
    method: Method,
    /// Path relative to the API base.
    path: String,
    /// Query parameters, URL-encoded on send.
    query: Vec<(String, String)>,
    /// Optional body.
    body: Option<RequestBody>,
    /// Optional bearer token.
    bearer: Option<String>,
}

impl ApiRequest {
    /// Creates a request without body or query.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attaches a raw body sent verbatim with a JSON content type.
    #[must_use]
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    /// Attaches a bearer token.
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Returns the path relative to the API base.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns the encoded query string without the leading `?`.
    #[must_use]
    pub fn encoded_query(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(self.query.iter());
        Some(serializer.finish())
    }

    /// Renders `METHOD /path?query` for reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.encoded_query() {
            Some(query) => format!("{} {}?{query}", self.method, self.path),
            None => format!("{} {}", self.method, self.path),
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Outcome of a backend call.
///
/// # Invariants
/// - `status == 0` means no HTTP response was received.
/// - `json` is populated only when the body parses as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status, or `0` on transport failure.
    pub status: u16,
    /// Body text (lossy UTF-8).
    pub body: String,
    /// Parsed JSON body.
    pub json: Option<Value>,
    /// Wall time spent on the call.
    pub elapsed: Duration,
    /// Transport or body-read failure message.
    pub transport_error: Option<String>,
}

impl ApiResponse {
    /// Builds a status-0 response for a failed call.
    #[must_use]
    pub const fn transport_failure(message: String, elapsed: Duration) -> Self {
        Self {
            status: 0,
            body: String::new(),
            json: None,
            elapsed,
            transport_error: Some(message),
        }
    }

    /// Builds a response from a status and body text.
    #[must_use]
    pub fn from_body(status: u16, body: String, elapsed: Duration) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            body,
            json,
            elapsed,
            transport_error: None,
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200 .. 300).contains(&self.status)
    }

    /// Looks up a JSON pointer in the body.
    #[must_use]
    pub fn json_pointer(&self, pointer: &str) -> Option<&Value> {
        self.json.as_ref().and_then(|json| json.pointer(pointer))
    }

    /// Finds the first integer id under `keys`, searching the top level and
    /// common envelopes (`data`, `user`, `userInfo`).
    #[must_use]
    pub fn extract_id(&self, keys: &[&str]) -> Option<i64> {
        let json = self.json.as_ref()?;
        let scopes =
            std::iter::once(json).chain(ID_SCOPES.iter().filter_map(|scope| json.pointer(scope)));
        for scope in scopes {
            for key in keys {
                if let Some(id) = scope.get(*key).and_then(value_as_i64) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Returns the server or transport message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if let Some(error) = &self.transport_error {
            return Some(error.clone());
        }
        ["message", "error"].iter().find_map(|key| {
            self.json.as_ref()?.get(*key)?.as_str().map(ToString::to_string)
        })
    }

    /// Renders the observed status for reports.
    #[must_use]
    pub fn status_label(&self) -> String {
        match (&self.transport_error, self.status) {
            (Some(error), 0) => format!("0 ({error})"),
            (_, status) => status.to_string(),
        }
    }
}

/// Converts a JSON number or numeric string into an `i64`.
fn value_as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Underlying reqwest client.
    client: Client,
    /// Base URL joined with the API prefix.
    api_base: String,
    /// Maximum response body size in bytes.
    max_response_bytes: usize,
}

impl ApiClient {
    /// Builds a client from target settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(target: &TargetConfig) -> Result<Self, ClientError> {
        let api_base = target.api_base_url();
        Url::parse(&api_base)
            .map_err(|err| ClientError::Config(format!("invalid api base {api_base}: {err}")))?;
        let client = Client::builder()
            .timeout(target.request_timeout())
            .redirect(Policy::none())
            .user_agent(target.user_agent.clone())
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_base,
            max_response_bytes: target.max_response_bytes,
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Resolves the absolute URL for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the joined URL does not parse.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.api_base, request.path);
        let mut url = Url::parse(&raw)
            .map_err(|err| ClientError::Config(format!("invalid url {raw}: {err}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    /// Sends `request`, converting every failure into an [`ApiResponse`].
    pub async fn send(&self, request: &ApiRequest) -> ApiResponse {
        let started = Instant::now();
        let url = match self.url_for(request) {
            Ok(url) => url,
            Err(err) => return ApiResponse::transport_failure(err.to_string(), started.elapsed()),
        };
        let headers = match request_headers(request) {
            Ok(headers) => headers,
            Err(err) => return ApiResponse::transport_failure(err.to_string(), started.elapsed()),
        };
        let mut builder = self.client.request(request.method.clone(), url.clone()).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.to_wire());
        }
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let message = error_chain(&err);
                warn!(method = %request.method, url = %url, error = %message, "request failed");
                return ApiResponse::transport_failure(message, started.elapsed());
            }
        };
        let status = response.status().as_u16();
        let result = match read_response_body_with_limit(response, self.max_response_bytes).await {
            Ok(bytes) => ApiResponse::from_body(
                status,
                String::from_utf8_lossy(&bytes).into_owned(),
                started.elapsed(),
            ),
            Err(err) => ApiResponse {
                status,
                body: String::new(),
                json: None,
                elapsed: started.elapsed(),
                transport_error: Some(err.to_string()),
            },
        };
        debug!(
            method = %request.method,
            url = %url,
            status,
            elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the headers for `request`.
fn request_headers(request: &ApiRequest) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
    if request.body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    if let Some(token) = &request.bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::Config("bearer token is not a valid header".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Reads a response body while enforcing a size limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ClientError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| ClientError::Transport(error_chain(&err)))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(ClientError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(ClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}

/// Joins an error with its source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// ============================================================================
// SECTION: Tests
// ============================================================================
