// crates/numerino-e2e-core/src/auth.rs
// ============================================================================
// Module: Authentication Helper
// Description: Login flows and bearer-token sessions for phases and the CLI.
// Purpose: Obtain access tokens from the backend with uniform error handling.
// Dependencies: serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The backend exposes two login endpoints: email login for every role and a
//! username login for students. Both may wrap the token payload in a
//! `{success, message, data}` envelope; [`login`] accepts either shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use numerino_e2e_config::AccountsConfig;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::client::ApiClient;
use crate::client::ApiRequest;
use crate::client::ApiResponse;
use crate::endpoints::Endpoint;
use crate::shared_data::AccountRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Device label sent with login requests.
pub const DEVICE_INFO: &str = "numerino-e2e test device";
/// Client label sent with login requests.
pub const CLIENT_AGENT: &str = "numerino-e2e test browser";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Login failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No HTTP response was received.
    #[error("login transport error: {0}")]
    Transport(String),
    /// The backend rejected the credentials.
    #[error("login rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Server message or body preview.
        message: String,
    },
    /// The response did not carry an access token.
    #[error("login response did not include an access token")]
    MissingToken,
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Login identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginId {
    /// Email for `/auth/login`.
    Email(String),
    /// Username for `/auth/student-login`.
    StudentUsername(String),
}

/// Credentials for one login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login identifier.
    pub id: LoginId,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Email/password credentials.
    #[must_use]
    pub fn email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: LoginId::Email(email.into()),
            password: password.into(),
        }
    }

    /// Student username/password credentials.
    #[must_use]
    pub fn student(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: LoginId::StudentUsername(username.into()),
            password: password.into(),
        }
    }

    /// Returns the login endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self.id {
            LoginId::Email(_) => Endpoint::AuthLogin,
            LoginId::StudentUsername(_) => Endpoint::AuthStudentLogin,
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match &self.id {
            LoginId::Email(value) | LoginId::StudentUsername(value) => value,
        }
    }

    /// Builds the login request body.
    #[must_use]
    pub fn body(&self) -> Value {
        let mut body = json!({
            "password": self.password,
            "rememberMe": true,
            "deviceInfo": DEVICE_INFO,
            "userAgent": CLIENT_AGENT,
        });
        let key = match self.id {
            LoginId::Email(_) => "email",
            LoginId::StudentUsername(_) => "username",
        };
        if let Some(object) = body.as_object_mut() {
            object.insert(key.to_string(), Value::String(self.identifier().to_string()));
        }
        body
    }

    /// Builds the login request.
    #[must_use]
    pub fn request(&self) -> ApiRequest {
        ApiRequest::post(self.endpoint().path()).json(self.body())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session.
#[derive(Clone, PartialEq)]
pub struct AuthSession {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token, when issued.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds, when reported.
    pub expires_in: Option<i64>,
    /// Server session id, when reported.
    pub session_id: Option<i64>,
    /// User summary returned by the backend.
    pub user: Option<Value>,
}

impl AuthSession {
    /// Extracts a session from a login response body.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Option<Self> {
        let json = response.json.as_ref()?;
        if json.get("success").and_then(Value::as_bool) == Some(false) {
            return None;
        }
        let payload = json.get("data").filter(|data| data.is_object()).unwrap_or(json);
        let access_token = payload.get("accessToken")?.as_str()?.to_string();
        if access_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            refresh_token: payload
                .get("refreshToken")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            expires_in: payload.get("expiresIn").and_then(Value::as_i64),
            session_id: payload.get("sessionId").and_then(Value::as_i64),
            user: payload.get("userInfo").or_else(|| payload.get("user")).cloned(),
        })
    }

    /// Returns the user id from the session's user summary.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        let user = self.user.as_ref()?;
        ["userId", "id"].iter().find_map(|key| user.get(*key)?.as_i64())
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Login
// ============================================================================

/// Logs in and returns the session.
///
/// # Errors
///
/// Returns [`AuthError`] on transport failure, a non-2xx status, or a
/// response without an access token.
pub async fn login(
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<AuthSession, AuthError> {
    let response = client.send(&credentials.request()).await;
    session_from_login_response(&response).inspect(|_| {
        info!(identifier = credentials.identifier(), "login succeeded");
    })
}

/// Interprets a login response.
///
/// # Errors
///
/// Returns [`AuthError`] describing why no session could be extracted.
pub fn session_from_login_response(response: &ApiResponse) -> Result<AuthSession, AuthError> {
    if response.status == 0 {
        return Err(AuthError::Transport(response.message().unwrap_or_default()));
    }
    if !response.is_success() {
        return Err(AuthError::Rejected {
            status: response.status,
            message: response.message().unwrap_or_else(|| response.body.clone()),
        });
    }
    AuthSession::from_response(response).ok_or(AuthError::MissingToken)
}

// ============================================================================
// SECTION: Fixture Accounts
// ============================================================================

/// Role of a fixture account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Student.
    Student,
    /// Teacher.
    Teacher,
    /// Guardian.
    Guardian,
}

impl Role {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Guardian => "guardian",
        }
    }
}

/// Returns the configured fixture credentials for `role`.
#[must_use]
pub fn fixture_credentials(role: Role, accounts: &AccountsConfig) -> Credentials {
    let fixture = match role {
        Role::Student => &accounts.student,
        Role::Teacher => &accounts.teacher,
        Role::Guardian => &accounts.guardian,
    };
    Credentials::email(fixture.email.clone(), fixture.password.clone())
}

/// Returns the fixture student's username credentials.
#[must_use]
pub fn fixture_student_username(accounts: &AccountsConfig) -> Credentials {
    Credentials::student(accounts.student_username.clone(), accounts.student.password.clone())
}

/// Returns login candidates for `role`: the identity stored in shared data
/// first (when complete), then the configured fixture.
#[must_use]
pub fn login_candidates(
    role: Role,
    accounts: &AccountsConfig,
    stored: &AccountRecord,
) -> Vec<Credentials> {
    let fixture = fixture_credentials(role, accounts);
    let mut candidates = Vec::with_capacity(2);
    if let (Some(email), Some(password)) = (&stored.email, &stored.password) {
        let stored = Credentials::email(email.clone(), password.clone());
        if stored != fixture {
            candidates.push(stored);
        }
    }
    candidates.push(fixture);
    candidates
}

/// Tries `candidates` in order and returns the first session obtained.
///
/// # Errors
///
/// Returns the last [`AuthError`] when every candidate fails, or
/// [`AuthError::MissingToken`] when `candidates` is empty.
pub async fn login_first(
    client: &ApiClient,
    candidates: &[Credentials],
) -> Result<(AuthSession, Credentials), AuthError> {
    let mut last_error = AuthError::MissingToken;
    for credentials in candidates {
        match login(client, credentials).await {
            Ok(session) => return Ok((session, credentials.clone())),
            Err(err) => {
                warn!(identifier = credentials.identifier(), error = %err, "login attempt failed");
                last_error = err;
            }
        }
    }
    Err(last_error)
}

// ============================================================================
// SECTION: Usage Examples
// ============================================================================

/// Renders curl examples that use `token` against `api_base`.
#[must_use]
pub fn token_usage_examples(api_base: &str, token: &str) -> Vec<String> {
    let header = format!("-H \"Authorization: Bearer {token}\"");
    vec![
        format!("curl {header} {api_base}{}", Endpoint::UserProfile.path()),
        format!(
            "curl {header} \"{api_base}{}?searchTerm=test&limit=10\"",
            Endpoint::UserSearch.path()
        ),
        format!("curl {header} {api_base}{}", Endpoint::Sessions.path()),
        format!(
            "curl -X POST {header} -H \"Content-Type: application/json\" \
             -d '{{\"refreshToken\":\"<refresh-token>\"}}' {api_base}{}",
            Endpoint::AuthLogout.path()
        ),
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
