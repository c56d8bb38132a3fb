// crates/numerino-e2e-core/tests/common/mod.rs
// ============================================================================
// Module: Stub Backend
// Description: In-process HTTP stub of the Numerino API for core tests.
// Purpose: Serve scripted responses and capture requests for assertions.
// Dependencies: axum, numerino-e2e-config, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`StubBackend`] answers scripted `(method, path)` routes under `/api` and
//! returns `404` for everything else. Every request is recorded.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use numerino_e2e_config::E2eConfig;
use serde_json::Value;
use serde_json::json;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Types
// ============================================================================

/// API prefix served by the stub.
pub const API_PREFIX: &str = "/api";

/// Captured request metadata.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path relative to [`API_PREFIX`].
    pub path: String,
    /// Raw query string.
    pub query: Option<String>,
    /// Authorization header value.
    pub authorization: Option<String>,
    /// Content-Type header value.
    pub content_type: Option<String>,
    /// Body text.
    pub body: String,
}

/// Shared stub state.
#[derive(Clone, Default)]
struct StubState {
    /// Scripted responses keyed by method and relative path.
    routes: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    /// Requests seen so far.
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Handle for a running stub backend.
pub struct StubBackend {
    /// Scheme, host, and port.
    base_url: String,
    /// Server task.
    join: JoinHandle<()>,
    /// Shared state.
    state: StubState,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.join.abort();
    }
}

// ============================================================================
// SECTION: Stub Backend
// ============================================================================

impl StubBackend {
    /// Binds an ephemeral port and starts serving.
    pub async fn spawn() -> Self {
        let state = StubState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let join = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url,
            join,
            state,
        }
    }

    /// Returns the base URL without the API prefix.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scripts a JSON response for `method` on `path` (relative to the prefix).
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, body.to_string());
    }

    /// Scripts a raw body response.
    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: String) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body));
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Returns requests for one relative path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|request| request.path == path).collect()
    }

    /// Builds a config targeting this stub with fast, retry-free settings.
    pub fn config(&self, data_file: &Path) -> E2eConfig {
        let mut config = E2eConfig::default();
        config.target.base_url = self.base_url.clone();
        config.target.api_prefix = API_PREFIX.to_string();
        config.target.request_timeout_secs = 5;
        config.target.retries = 0;
        config.data.data_file = data_file.to_path_buf();
        config
    }
}

/// Serves scripted routes and records every request.
async fn handle(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path()).to_string();
    let header = |name: HeaderName| {
        headers.get(name).and_then(|value| value.to_str().ok()).map(String::from)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(String::from),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    let scripted = state.routes.lock().unwrap().get(&(method.to_string(), path)).cloned();
    match scripted {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, [(CONTENT_TYPE, "application/json")], body).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "route not stubbed"})),
        )
            .into_response(),
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Login payload in the backend's `data` envelope.
pub fn login_payload(access_token: &str, refresh_token: &str, user_id: i64) -> Value {
    json!({
        "success": true,
        "data": {
            "accessToken": access_token,
            "refreshToken": refresh_token,
            "expiresIn": 3600,
            "userInfo": {"userId": user_id}
        }
    })
}

/// Health document carrying every expected field.
pub fn health_payload() -> Value {
    json!({"service": "numerino", "status": "ok", "timestamp": "2026-01-01T00:00:00Z"})
}
