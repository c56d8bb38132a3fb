// crates/numerino-e2e-core/src/phases/institutions.rs
// ============================================================================
// Module: Institution Phase
// Description: Listing, lookup, search, and registration of institutions.
// Purpose: Exercise the institution API and record a usable institution id.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A successful full registration stores the new institution id in shared
//! data so the registration phase can attach users to it.

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
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::generate::institution_full;
use crate::generate::institution_minimal;
use crate::generate::set_field;
use crate::report::PhaseTally;
use crate::shared_data::now_millis;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name most backends already hold.
const EXISTING_NAME: &str = "Universidad Nacional";
/// Query containing reserved URL characters.
const SPECIAL_QUERY: &str = "José María & Co. (Institución)";
/// Query length for the long-query check.
const LONG_QUERY_CHARS: usize = 500;
/// Name length for the long-name check.
const LONG_NAME_CHARS: usize = 200;

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the institution phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::Institutions)?;
    let institution_id = ctx.store.data().institution_id;

    ctx.reporter.section("Queries")?;
    ctx.check(
        "Get All Active Institutions",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::Institutions.path()),
    )
    .await?;
    ctx.check(
        "Get Institution by Valid ID",
        ExpectedStatus::any_of(&[200, 404]),
        ApiRequest::get(Endpoint::InstitutionById.with_id(institution_id)),
    )
    .await?;
    ctx.check(
        "Get Institution by Invalid ID",
        ExpectedStatus::one(404),
        ApiRequest::get(Endpoint::InstitutionById.with_id("a113")),
    )
    .await?;

    ctx.reporter.section("Search")?;
    ctx.check(
        "Search Institutions Valid Query",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::InstitutionSearch.path())
            .query("query", "Universidad")
            .query("limit", "5"),
    )
    .await?;
    ctx.check(
        "Search Institutions Default Limit",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::InstitutionSearch.path()).query("query", "Test"),
    )
    .await?;
    ctx.check(
        "Search Institutions Missing Query",
        ExpectedStatus::one(400),
        ApiRequest::get(Endpoint::InstitutionSearch.path()),
    )
    .await?;
    ctx.check(
        "Search Institutions No Results",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::InstitutionSearch.path())
            .query("query", "NonExistentInstitution12345"),
    )
    .await?;

    ctx.reporter.section("Registration")?;
    let timestamp = now_millis();
    let response = ctx
        .check(
            "Register Institution Valid Data",
            ExpectedStatus::any_of(&[200, 201, 400]),
            ApiRequest::post(Endpoint::Institutions.path()).json(institution_full(timestamp)),
        )
        .await?;
    if response.is_success()
        && let Some(created) = response.extract_id(&["institutionId", "id"])
    {
        ctx.reporter.note(&format!("institution {created} stored for later phases"))?;
        let saved = ctx.store.set_institution_id(created);
        ctx.persist(saved)?;
    }
    ctx.check(
        "Register Institution Minimal Fields",
        ExpectedStatus::any_of(&[200, 201, 400]),
        ApiRequest::post(Endpoint::Institutions.path()).json(institution_minimal(timestamp)),
    )
    .await?;

    ctx.reporter.section("Validation")?;
    ctx.check(
        "Register Institution Missing Fields",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::Institutions.path())
            .json(json!({"name": "Instituto Incompleto"})),
    )
    .await?;
    ctx.check(
        "Register Institution Invalid Email",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::Institutions.path()).json(set_field(
            institution_full(timestamp),
            "email",
            json!("invalid-email-format"),
        )),
    )
    .await?;
    ctx.check(
        "Register Institution Invalid Website",
        ExpectedStatus::any_of(&[400, 200]),
        ApiRequest::post(Endpoint::Institutions.path()).json(set_field(
            institution_full(timestamp),
            "website",
            json!("not-a-valid-url"),
        )),
    )
    .await?;
    ctx.check(
        "Register Institution Duplicate Name",
        ExpectedStatus::any_of(&[400, 409]),
        ApiRequest::post(Endpoint::Institutions.path()).json(set_field(
            institution_full(timestamp),
            "name",
            json!(EXISTING_NAME),
        )),
    )
    .await?;

    ctx.reporter.section("Edge Cases")?;
    ctx.check(
        "Search Institutions Long Query",
        ExpectedStatus::any_of(&[200, 400]),
        ApiRequest::get(Endpoint::InstitutionSearch.path())
            .query("query", "A".repeat(LONG_QUERY_CHARS)),
    )
    .await?;
    ctx.check(
        "Search Institutions Special Characters",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::InstitutionSearch.path()).query("query", SPECIAL_QUERY),
    )
    .await?;
    ctx.check(
        "Register Institution Long Name",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::Institutions.path()).json(set_field(
            institution_full(timestamp),
            "name",
            json!("A".repeat(LONG_NAME_CHARS)),
        )),
    )
    .await?;
    ctx.check(
        "Get Institution Non-numeric ID",
        ExpectedStatus::any_of(&[400, 404]),
        ApiRequest::get(Endpoint::InstitutionById.with_id("invalid-id")),
    )
    .await?;
    ctx.check(
        "Register Institution Malformed JSON",
        ExpectedStatus::one(400),
        ApiRequest::post(Endpoint::Institutions.path()).raw_body(MALFORMED_JSON),
    )
    .await?;

    ctx.finish(PhaseKind::Institutions)
}
