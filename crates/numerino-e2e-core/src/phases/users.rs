// crates/numerino-e2e-core/src/phases/users.rs
// ============================================================================
// Module: User Management Phase
// Description: Unauthenticated profile, search, update, and deactivation calls.
// Purpose: Confirm user routes answer and reject anonymous callers cleanly.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! No bearer token is sent, so most checks also accept `401`. Reads target
//! accounts from shared data when present; writes and deactivations always
//! target fixture ids so harness-created accounts stay usable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use serde_json::json;

use super::PhaseContext;
use super::PhaseError;
use super::PhaseKind;
use crate::client::ApiRequest;
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::report::PhaseTally;

// ============================================================================
// SECTION: Fixture Ids
// ============================================================================

/// Student read when none was registered.
const FIXTURE_STUDENT_ID: i64 = 31;
/// Student updated by the write checks.
const FIXTURE_STUDENT_UPDATE_ID: i64 = 32;
/// Teacher read and updated.
const FIXTURE_TEACHER_ID: i64 = 789;
/// Guardian read and updated.
const FIXTURE_GUARDIAN_ID: i64 = 321;
/// Guardian whose students are listed.
const FIXTURE_GUARDIAN_STUDENTS_ID: i64 = 123;
/// Student profile used by the association check.
const FIXTURE_STUDENT_PROFILE_ID: i64 = 18;
/// Guardian profile used by the association check.
const FIXTURE_GUARDIAN_PROFILE_ID: i64 = 789;
/// User whose password, picture, and status are changed.
const FIXTURE_MUTABLE_USER_ID: i64 = 18;
/// User id that does not exist.
const MISSING_USER_ID: i64 = 99_999;

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the user management phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::Users)?;
    let data = ctx.store.data().clone();
    let read_or_auth = ExpectedStatus::any_of(&[200, 401, 404]);

    ctx.reporter.section("Profiles")?;
    ctx.check(
        "Get Current User Profile",
        ExpectedStatus::any_of(&[200, 401]),
        ApiRequest::get(Endpoint::UserProfile.path()),
    )
    .await?;
    ctx.check(
        "Get Student Profile",
        read_or_auth.clone(),
        ApiRequest::get(
            Endpoint::UserStudent.with_id(data.student_id.unwrap_or(FIXTURE_STUDENT_ID)),
        ),
    )
    .await?;
    ctx.check(
        "Get Teacher Profile",
        read_or_auth.clone(),
        ApiRequest::get(
            Endpoint::UserTeacher.with_id(data.teacher_id.unwrap_or(FIXTURE_TEACHER_ID)),
        ),
    )
    .await?;
    ctx.check(
        "Get Guardian Profile",
        read_or_auth.clone(),
        ApiRequest::get(
            Endpoint::UserGuardian.with_id(data.guardian_id.unwrap_or(FIXTURE_GUARDIAN_ID)),
        ),
    )
    .await?;

    ctx.reporter.section("Search")?;
    ctx.check(
        "Search Users Success",
        ExpectedStatus::any_of(&[200, 401]),
        ApiRequest::get(Endpoint::UserSearch.path())
            .query("searchTerm", "María")
            .query("roleFilter", "STUDENT")
            .query("limit", "10"),
    )
    .await?;
    ctx.check(
        "Search Users Missing Term",
        ExpectedStatus::any_of(&[400, 401]),
        ApiRequest::get(Endpoint::UserSearch.path()),
    )
    .await?;
    ctx.check(
        "Search Users Default Values",
        ExpectedStatus::any_of(&[200, 401]),
        ApiRequest::get(Endpoint::UserSearch.path()).query("searchTerm", "test"),
    )
    .await?;

    ctx.reporter.section("Guardian Relations")?;
    ctx.check(
        "Get Students by Guardian",
        read_or_auth.clone(),
        ApiRequest::get(
            Endpoint::UserGuardianStudents
                .with_id(data.guardian_id.unwrap_or(FIXTURE_GUARDIAN_STUDENTS_ID)),
        ),
    )
    .await?;
    ctx.check(
        "Associate Student to Guardian",
        ExpectedStatus::any_of(&[200, 401, 400]),
        ApiRequest::post(Endpoint::UserAssociateStudent.path()).json(json!({
            "studentProfileId": FIXTURE_STUDENT_PROFILE_ID,
            "guardianProfileId": FIXTURE_GUARDIAN_PROFILE_ID,
        })),
    )
    .await?;

    ctx.reporter.section("Profile Updates")?;
    ctx.check(
        "Update Student Profile",
        read_or_auth.clone(),
        ApiRequest::put(Endpoint::UserStudent.with_id(FIXTURE_STUDENT_UPDATE_ID)).json(json!({
            "firstName": "María Actualizada",
            "lastName": "González Actualizada",
            "username": "maria_gonzalez_new",
            "profilePictureUrl": "https://example.com/new-picture.jpg",
        })),
    )
    .await?;
    ctx.check(
        "Update Teacher Profile",
        read_or_auth.clone(),
        ApiRequest::put(Endpoint::UserTeacher.with_id(FIXTURE_TEACHER_ID)).json(json!({
            "firstName": "Carlos Actualizado",
            "lastName": "Ramírez Actualizado",
            "stemAreaId": 2,
            "profilePictureUrl": "https://example.com/teacher-picture.jpg",
        })),
    )
    .await?;
    ctx.check(
        "Update Guardian Profile",
        read_or_auth.clone(),
        ApiRequest::put(Endpoint::UserGuardian.with_id(FIXTURE_GUARDIAN_ID)).json(json!({
            "firstName": "Ana Actualizada",
            "lastName": "Martínez Actualizada",
            "phone": "+57-300-7654321",
            "profilePictureUrl": "https://example.com/guardian-picture.jpg",
        })),
    )
    .await?;
    ctx.check(
        "Update Password",
        ExpectedStatus::any_of(&[200, 401, 400]),
        ApiRequest::put(Endpoint::UserPassword.with_id(FIXTURE_MUTABLE_USER_ID)).json(json!({
            "currentPassword": "OldPassword123!",
            "newPassword": "NewPassword123!",
            "confirmPassword": "NewPassword123!",
        })),
    )
    .await?;
    ctx.check(
        "Update Profile Picture",
        ExpectedStatus::any_of(&[200, 401, 400]),
        ApiRequest::put(Endpoint::UserProfilePicture.with_id(FIXTURE_MUTABLE_USER_ID))
            .json(json!("https://example.com/new-profile-picture.jpg")),
    )
    .await?;
    ctx.check(
        "Update Profile Picture Invalid URL",
        ExpectedStatus::any_of(&[400, 401]),
        ApiRequest::put(Endpoint::UserProfilePicture.with_id(FIXTURE_MUTABLE_USER_ID))
            .json(json!("not-a-valid-url")),
    )
    .await?;

    ctx.reporter.section("Deactivation")?;
    ctx.check(
        "Deactivate User Account",
        read_or_auth,
        ApiRequest::delete(Endpoint::UserDeactivate.with_id(FIXTURE_MUTABLE_USER_ID)),
    )
    .await?;
    ctx.check(
        "Deactivate Non-existent User",
        ExpectedStatus::any_of(&[404, 401]),
        ApiRequest::delete(Endpoint::UserDeactivate.with_id(MISSING_USER_ID)),
    )
    .await?;

    ctx.finish(PhaseKind::Users)
}
