// crates/numerino-e2e-core/src/phases/registration.rs
// ============================================================================
// Module: Registration Phase
// Description: Availability checks, role registration, and maintenance routes.
// Purpose: Create fresh student, teacher, and guardian accounts for later use.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Every registration uses a fresh [`crate::generate::unique_identity`] and
//! the institution recorded in shared data. Accounts the backend accepts are
//! written back to shared data together with their passwords.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use serde_json::json;

use super::MALFORMED_JSON;
use super::PhaseContext;
use super::PhaseError;
use super::PhaseKind;
use crate::client::ApiRequest;
use crate::client::ApiResponse;
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::generate::GUARDIAN_PASSWORD;
use crate::generate::STUDENT_PASSWORD;
use crate::generate::TEACHER_PASSWORD;
use crate::generate::UniqueIdentity;
use crate::generate::guardian_registration;
use crate::generate::remove_field;
use crate::generate::set_field;
use crate::generate::student_registration;
use crate::generate::teacher_registration;
use crate::generate::unique_identity;
use crate::report::PhaseTally;
use crate::shared_data::AccountRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Student profile used when none was registered.
const FIXTURE_STUDENT_PROFILE_ID: i64 = 21;
/// Guardian profile used when none was registered.
const FIXTURE_GUARDIAN_PROFILE_ID: i64 = 34;
/// User inspected by the debug route when none was registered.
const FIXTURE_DEBUG_USER_ID: i64 = 1;
/// Institution id that does not exist.
const MISSING_INSTITUTION_ID: i64 = 99_999;

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the registration phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::Registration)?;
    let institution_id = ctx.store.data().institution_id;
    ctx.reporter.note(&format!("using institution {institution_id}"))?;

    ctx.reporter.section("Availability")?;
    let probe = unique_identity();
    ctx.check(
        "Check Email Availability",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::RegisterCheckEmail.path()).query("email", probe.email),
    )
    .await?;
    ctx.check(
        "Check Username Availability",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::RegisterCheckUsername.path()).query("username", probe.username),
    )
    .await?;
    ctx.check(
        "Check Email Missing Parameter",
        ExpectedStatus::one(400),
        ApiRequest::get(Endpoint::RegisterCheckEmail.path()),
    )
    .await?;

    ctx.reporter.section("Students")?;
    let student = unique_identity();
    let response = ctx
        .check(
            "Register Student Valid Data",
            ExpectedStatus::any_of(&[200, 400]),
            ApiRequest::post(Endpoint::RegisterStudent.path())
                .json(student_registration(&student, institution_id)),
        )
        .await?;
    if response.is_success() {
        let record = account_record(&response, &student, STUDENT_PASSWORD, "studentProfileId");
        let saved = ctx.store.set_student(AccountRecord {
            username: Some(student.username.clone()),
            ..record
        });
        ctx.persist(saved)?;
    }
    ctx.check(
        "Register Student Missing Fields",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterStudent.path())
            .json(json!({"firstName": "Juan", "email": unique_identity().email})),
    )
    .await?;
    ctx.check(
        "Register Student Invalid Password",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterStudent.path()).json(set_field(
            student_registration(&unique_identity(), institution_id),
            "password",
            json!("weak"),
        )),
    )
    .await?;

    ctx.reporter.section("Teachers")?;
    let teacher = unique_identity();
    let response = ctx
        .check(
            "Register Teacher Valid Data",
            ExpectedStatus::any_of(&[200, 400]),
            ApiRequest::post(Endpoint::RegisterTeacher.path())
                .json(teacher_registration(&teacher, institution_id)),
        )
        .await?;
    if response.is_success() {
        let record = account_record(&response, &teacher, TEACHER_PASSWORD, "teacherProfileId");
        let saved = ctx.store.set_teacher(record);
        ctx.persist(saved)?;
    }
    ctx.check(
        "Register Teacher Missing Fields",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterTeacher.path())
            .json(json!({"firstName": "Carlos", "lastName": "Ramírez"})),
    )
    .await?;

    ctx.reporter.section("Guardians")?;
    let guardian = unique_identity();
    let response = ctx
        .check(
            "Register Guardian Valid Data",
            ExpectedStatus::any_of(&[200, 400]),
            ApiRequest::post(Endpoint::RegisterGuardian.path())
                .json(guardian_registration(&guardian)),
        )
        .await?;
    if response.is_success() {
        let record = account_record(&response, &guardian, GUARDIAN_PASSWORD, "guardianProfileId");
        let saved = ctx.store.set_guardian(record);
        ctx.persist(saved)?;
    }
    ctx.check(
        "Register Guardian Missing Phone",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterGuardian.path())
            .json(remove_field(guardian_registration(&unique_identity()), "phone")),
    )
    .await?;
    ctx.check(
        "Register Guardian Invalid Phone",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterGuardian.path()).json(set_field(
            guardian_registration(&unique_identity()),
            "phone",
            json!("123"),
        )),
    )
    .await?;

    ctx.reporter.section("Associations & Maintenance")?;
    let data = ctx.store.data().clone();
    ctx.check(
        "Associate Student to Guardian",
        ExpectedStatus::any_of(&[200, 400, 500]),
        ApiRequest::post(Endpoint::RegisterAssociateStudentToGuardian.path()).json(json!({
            "studentId": data.student_profile_id.unwrap_or(FIXTURE_STUDENT_PROFILE_ID),
            "guardianId": data.guardian_profile_id.unwrap_or(FIXTURE_GUARDIAN_PROFILE_ID),
        })),
    )
    .await?;
    ctx.check(
        "Debug User Information",
        ExpectedStatus::any_of(&[200, 500]),
        ApiRequest::get(
            Endpoint::RegisterDebugUser.with_id(data.student_id.unwrap_or(FIXTURE_DEBUG_USER_ID)),
        ),
    )
    .await?;
    ctx.check(
        "Fix Student Profile",
        ExpectedStatus::any_of(&[200, 400]),
        ApiRequest::get(Endpoint::RegisterFixStudentProfile.path()),
    )
    .await?;
    ctx.check(
        "Alter Student Profile Table",
        ExpectedStatus::any_of(&[200, 500]),
        ApiRequest::post(Endpoint::RegisterAlterStudentProfileTable.path()),
    )
    .await?;

    ctx.reporter.section("Edge Cases")?;
    ctx.check(
        "Register Student Duplicate Username",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterStudent.path()).json(set_field(
            student_registration(&unique_identity(), institution_id),
            "username",
            json!("admin"),
        )),
    )
    .await?;
    ctx.check(
        "Register Teacher Invalid Institution",
        ExpectedStatus::any_of(&[400, 500]),
        ApiRequest::post(Endpoint::RegisterTeacher.path())
            .json(teacher_registration(&unique_identity(), MISSING_INSTITUTION_ID)),
    )
    .await?;
    ctx.check(
        "Register Guardian Malformed JSON",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::RegisterGuardian.path()).raw_body(MALFORMED_JSON),
    )
    .await?;

    ctx.finish(PhaseKind::Registration)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the shared-data record for an accepted registration.
fn account_record(
    response: &ApiResponse,
    identity: &UniqueIdentity,
    password: &str,
    profile_key: &str,
) -> AccountRecord {
    AccountRecord {
        user_id: response.extract_id(&["userId", "id"]),
        profile_id: response.extract_id(&[profile_key, "profileId"]),
        email: Some(identity.email.clone()),
        password: Some(password.to_string()),
        username: None,
    }
}
