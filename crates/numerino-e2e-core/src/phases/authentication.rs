// crates/numerino-e2e-core/src/phases/authentication.rs
// ============================================================================
// Module: Authentication Phase
// Description: Login, token, verification, and password-reset flows.
// Purpose: Exercise every public auth route with valid and invalid input.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Logins use the configured fixture accounts. When the teacher login
//! yields a refresh token, the refresh check uses it; otherwise a
//! placeholder token is sent and `401` is accepted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use serde_json::json;

use super::PhaseContext;
use super::PhaseError;
use super::PhaseKind;
use super::health;
use crate::auth::AuthSession;
use crate::auth::Credentials;
use crate::auth::Role;
use crate::auth::fixture_credentials;
use crate::auth::fixture_student_username;
use crate::client::ApiRequest;
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::report::PhaseTally;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Refresh token sent when no real one was issued.
const PLACEHOLDER_REFRESH_TOKEN: &str = "valid_refresh_token_here";
/// Address used by verification and reset requests.
const PROBE_EMAIL: &str = "test@example.com";
/// Password used by reset requests.
const RESET_PASSWORD: &str = "NewPassword123!";

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the authentication phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::Authentication)?;
    if ctx.options.full {
        health::run_checks(ctx).await?;
    }

    ctx.reporter.section("Login")?;
    let teacher = fixture_credentials(Role::Teacher, &ctx.config.accounts);
    let response = ctx
        .check("Teacher/Guardian Login Success", ExpectedStatus::one(200), teacher.request())
        .await?;
    let session = AuthSession::from_response(&response);

    ctx.check(
        "Login Invalid Credentials",
        ExpectedStatus::one(401),
        Credentials::email("invalid@example.com", "wrongpassword").request(),
    )
    .await?;
    ctx.check(
        "Login Validation Errors",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::AuthLogin.path()).json(json!({"email": "", "password": ""})),
    )
    .await?;
    let student_username = fixture_student_username(&ctx.config.accounts);
    ctx.check("Student Login Success", ExpectedStatus::one(200), student_username.request()).await?;
    let student_email = fixture_credentials(Role::Student, &ctx.config.accounts);
    ctx.check("Student Login Via Email", ExpectedStatus::one(200), student_email.request()).await?;

    ctx.reporter.section("Tokens")?;
    let refresh_token = session
        .as_ref()
        .and_then(|session| session.refresh_token.clone())
        .unwrap_or_else(|| PLACEHOLDER_REFRESH_TOKEN.to_string());
    ctx.check(
        "Refresh Token",
        ExpectedStatus::any_of(&[200, 401]),
        ApiRequest::post(Endpoint::AuthRefreshToken.path())
            .json(json!({"refreshToken": refresh_token})),
    )
    .await?;
    ctx.check(
        "Logout Success",
        ExpectedStatus::one(200),
        ApiRequest::post(Endpoint::AuthLogout.path()).json(json!({"refreshToken": "some_token"})),
    )
    .await?;

    ctx.reporter.section("Email Verification")?;
    ctx.check(
        "Email Verification",
        ExpectedStatus::any_of(&[200, 400]),
        ApiRequest::post(Endpoint::AuthVerifyEmail.path())
            .json(json!({"token": "valid_verification_token"})),
    )
    .await?;
    ctx.check(
        "Resend Verification Email",
        ExpectedStatus::one(200),
        ApiRequest::post(Endpoint::AuthResendVerification.path())
            .json(json!({"email": PROBE_EMAIL})),
    )
    .await?;

    ctx.reporter.section("Password Management")?;
    ctx.check(
        "Forgot Password Request",
        ExpectedStatus::one(200),
        ApiRequest::post(Endpoint::AuthForgotPassword.path()).json(json!({"email": PROBE_EMAIL})),
    )
    .await?;
    ctx.check(
        "Reset Password Success",
        ExpectedStatus::any_of(&[200, 400]),
        ApiRequest::post(Endpoint::AuthResetPassword.path()).json(json!({
            "token": "valid_reset_token",
            "newPassword": RESET_PASSWORD,
            "confirmPassword": RESET_PASSWORD,
        })),
    )
    .await?;
    ctx.check(
        "Reset Password Mismatch",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::AuthResetPassword.path()).json(json!({
            "token": "valid_reset_token",
            "newPassword": RESET_PASSWORD,
            "confirmPassword": "DifferentPassword123!",
        })),
    )
    .await?;

    ctx.finish(PhaseKind::Authentication)
}
