// crates/numerino-e2e-core/tests/http_client.rs
// ============================================================================
// Module: HTTP Client Tests
// Description: ApiClient behavior against an in-process stub backend.
// Purpose: Validate URL building, headers, bodies, and failure mapping.
// Dependencies: numerino-e2e-core, axum, tokio
// ============================================================================

//! ## Overview
//! Exercises [`ApiClient::send`] end to end over loopback HTTP.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
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

mod common;

use common::StubBackend;
use numerino_e2e_core::ApiClient;
use numerino_e2e_core::ApiRequest;
use numerino_e2e_core::Endpoint;
use numerino_e2e_core::auth::AuthError;
use numerino_e2e_core::auth::Credentials;
use numerino_e2e_core::auth::login;
use numerino_e2e_core::auth::login_first;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Starts a stub and a client pointed at it.
async fn stub_client() -> (StubBackend, ApiClient, TempDir) {
    let stub = StubBackend::spawn().await;
    let dir = TempDir::new().unwrap();
    let config = stub.config(&dir.path().join("shared.json"));
    let client = ApiClient::new(&config.target).unwrap();
    (stub, client, dir)
}

// ============================================================================
// SECTION: Requests
// ============================================================================

#[tokio::test]
async fn json_request_carries_body_and_content_type() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("POST", "/institutions", 201, json!({"success": true, "data": {"id": 9}}));

    let response = client
        .send(&ApiRequest::post(Endpoint::Institutions.path()).json(json!({"name": "Colegio"})))
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.extract_id(&["institutionId", "id"]), Some(9));
    let seen = stub.requests_to("/institutions");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(seen[0].body, r#"{"name":"Colegio"}"#);
}

#[tokio::test]
async fn query_values_are_percent_encoded() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("GET", "/institutions/search", 200, json!({"data": []}));

    let request = ApiRequest::get(Endpoint::InstitutionSearch.path())
        .query("query", "José María & Co.")
        .query("limit", "5");
    let response = client.send(&request).await;

    assert_eq!(response.status, 200);
    let query = stub.requests_to("/institutions/search")[0].query.clone().unwrap();
    assert!(query.contains("%26"), "ampersand must be encoded: {query}");
    assert!(query.contains("Jos%C3%A9"), "non-ascii must be encoded: {query}");
    assert!(query.ends_with("&limit=5"));
}

#[tokio::test]
async fn bearer_token_and_raw_body_are_sent_verbatim() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("POST", "/register/guardians", 400, json!({"message": "bad json"}));

    let raw = r#"{"name": "Test", "invalid": }"#;
    let response = client
        .send(&ApiRequest::post(Endpoint::RegisterGuardian.path()).raw_body(raw).bearer("tok"))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.message().as_deref(), Some("bad json"));
    let seen = &stub.requests_to("/register/guardians")[0];
    assert_eq!(seen.body, raw);
    assert_eq!(seen.authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn unstubbed_route_reports_not_found() {
    let (_stub, client, _dir) = stub_client().await;
    let response = client.send(&ApiRequest::get(Endpoint::InstitutionById.with_id("a113"))).await;
    assert_eq!(response.status, 404);
    assert!(response.transport_error.is_none());
    assert!(!response.is_success());
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[tokio::test]
async fn unreachable_backend_is_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let mut config = numerino_e2e_config::E2eConfig::default();
    config.target.base_url = format!("http://{addr}");
    config.target.request_timeout_secs = 2;
    let client = ApiClient::new(&config.target).unwrap();

    let response = client.send(&ApiRequest::get(Endpoint::AuthHealth.path())).await;

    assert_eq!(response.status, 0);
    assert!(response.transport_error.is_some());
    assert!(response.status_label().starts_with("0 ("));
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let stub = StubBackend::spawn().await;
    let dir = TempDir::new().unwrap();
    let mut config = stub.config(&dir.path().join("shared.json"));
    config.target.max_response_bytes = 64;
    let client = ApiClient::new(&config.target).unwrap();
    stub.respond_raw("GET", "/institutions", 200, format!("\"{}\"", "x".repeat(512)));

    let response = client.send(&ApiRequest::get(Endpoint::Institutions.path())).await;

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
    assert!(response.transport_error.unwrap().contains("64"));
}

// ============================================================================
// SECTION: Login
// ============================================================================

#[tokio::test]
async fn login_extracts_tokens_from_envelope() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("POST", "/auth/login", 200, common::login_payload("access", "refresh", 41));

    let session = login(&client, &Credentials::email("ana@example.com", "pw")).await.unwrap();

    assert_eq!(session.access_token, "access");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
    assert_eq!(session.user_id(), Some(41));
    let body: serde_json::Value =
        serde_json::from_str(&stub.requests_to("/auth/login")[0].body).unwrap();
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["rememberMe"], true);
}

#[tokio::test]
async fn login_rejection_keeps_status_and_message() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("POST", "/auth/login", 401, json!({"success": false, "message": "nope"}));

    let err = login(&client, &Credentials::email("ana@example.com", "bad")).await.unwrap_err();

    match err {
        AuthError::Rejected {
            status,
            message,
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn login_first_falls_through_to_next_candidate() {
    let (stub, client, _dir) = stub_client().await;
    stub.respond("POST", "/auth/login", 200, common::login_payload("teacher-token", "r", 5));

    let candidates = [
        Credentials::student("ana.student", "pw"),
        Credentials::email("teacher@example.com", "pw"),
    ];
    let (session, used) = login_first(&client, &candidates).await.unwrap();

    assert_eq!(session.access_token, "teacher-token");
    assert_eq!(used, candidates[1]);
    assert_eq!(stub.requests_to("/auth/student-login").len(), 1);
}

#[tokio::test]
async fn login_first_without_candidates_is_missing_token() {
    let (_stub, client, _dir) = stub_client().await;
    let err = login_first(&client, &[]).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingToken));
}
