// crates/numerino-e2e-core/src/phases/users_auth.rs
// ============================================================================
// Module: Authenticated User Phase
// Description: User routes exercised with real student and teacher tokens.
// Purpose: Verify profile access, updates, and role boundaries with a bearer.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The student login is mandatory: when it fails the failure is reported as
//! a check and the phase ends. The teacher login is optional and only gates
//! the search check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use serde_json::json;

use super::PhaseContext;
use super::PhaseError;
use super::PhaseKind;
use crate::auth::AuthSession;
use crate::auth::Role;
use crate::auth::login_candidates;
use crate::auth::login_first;
use crate::client::ApiRequest;
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::report::CheckRecord;
use crate::report::PhaseTally;

/// Teacher the student must not be able to read.
const FOREIGN_TEACHER_ID: i64 = 999;

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the authenticated user phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::UsersAuth)?;
    ctx.reporter.section("Sign In")?;

    let candidates = login_candidates(Role::Student, &ctx.config.accounts, &ctx.store.student());
    let student = match login_first(&ctx.client, &candidates).await {
        Ok((session, credentials)) => {
            ctx.record(&CheckRecord::new(
                "Student Login",
                true,
                "access token",
                format!("token issued for {}", credentials.identifier()),
            ))?;
            session
        }
        Err(err) => {
            ctx.record(&CheckRecord::new("Student Login", false, "access token", err.to_string()))?;
            return ctx.finish(PhaseKind::UsersAuth);
        }
    };

    let candidates = login_candidates(Role::Teacher, &ctx.config.accounts, &ctx.store.teacher());
    let teacher: Option<AuthSession> = match login_first(&ctx.client, &candidates).await {
        Ok((session, _)) => Some(session),
        Err(err) => {
            ctx.reporter.warn(&format!("teacher login failed, search check skipped: {err}"))?;
            None
        }
    };
    let token = student.access_token.clone();

    ctx.reporter.section("Profile")?;
    let profile = ctx
        .check(
            "Get Current Student Profile",
            ExpectedStatus::one(200),
            ApiRequest::get(Endpoint::UserProfile.path()).bearer(token.clone()),
        )
        .await?;
    let student_id = if profile.is_success() {
        profile.extract_id(&["id", "userId"]).or_else(|| student.user_id())
    } else {
        None
    };

    match student_id {
        Some(student_id) => {
            ctx.reporter.note(&format!("student user id {student_id}"))?;
            ctx.check(
                "Get Specific Student Profile",
                ExpectedStatus::one(200),
                ApiRequest::get(Endpoint::UserStudent.with_id(student_id)).bearer(token.clone()),
            )
            .await?;

            ctx.reporter.section("Profile Updates")?;
            ctx.check(
                "Update Student Profile",
                ExpectedStatus::one(200),
                ApiRequest::put(Endpoint::UserStudent.with_id(student_id))
                    .bearer(token.clone())
                    .json(json!({
                        "firstName": "Ana Actualizada",
                        "lastName": "Estudiante Test",
                        "profilePictureUrl": "https://example.com/new-avatar.jpg",
                    })),
            )
            .await?;
            ctx.check(
                "Update Profile Picture",
                ExpectedStatus::one(200),
                ApiRequest::put(Endpoint::UserProfilePicture.with_id(student_id))
                    .bearer(token.clone())
                    .json(json!("https://example.com/updated-avatar.jpg")),
            )
            .await?;
        }
        None => ctx.reporter.warn("student id unavailable, profile checks skipped")?,
    }

    ctx.reporter.section("Search")?;
    if let Some(teacher) = &teacher {
        ctx.check(
            "Search Users (Teacher)",
            ExpectedStatus::success(),
            ApiRequest::get(Endpoint::UserSearch.path())
                .query("searchTerm", "test")
                .query("limit", "10")
                .bearer(teacher.access_token.clone()),
        )
        .await?;
    }

    ctx.reporter.section("Authorization")?;
    ctx.check(
        "Unauthorized Access Test",
        ExpectedStatus::any_of(&[403, 404]),
        ApiRequest::get(Endpoint::UserTeacher.with_id(FOREIGN_TEACHER_ID)).bearer(token),
    )
    .await?;

    ctx.finish(PhaseKind::UsersAuth)
}
