// crates/numerino-e2e-core/src/phases/health.rs
// ============================================================================
// Module: Health Phase
// Description: Readiness probe plus service, database, and procedure checks.
// Purpose: Fail fast when the backend is down before other phases run.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! The readiness probe polls `/auth/health` up to `retries + 1` times with
//! doubling backoff. It never records a check; the checks that follow report
//! the real state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::info;
use tracing::warn;

use super::PhaseContext;
use super::PhaseError;
use super::PhaseKind;
use crate::client::ApiClient;
use crate::client::ApiRequest;
use crate::endpoints::Endpoint;
use crate::expect::ExpectedStatus;
use crate::report::CheckRecord;
use crate::report::PhaseTally;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// First readiness backoff.
const PROBE_BACKOFF: Duration = Duration::from_millis(250);
/// Longest readiness backoff.
const PROBE_BACKOFF_CAP: Duration = Duration::from_secs(4);
/// Fields the health document must carry.
const HEALTH_FIELDS: [&str; 3] = ["service", "status", "timestamp"];

// ============================================================================
// SECTION: Phase
// ============================================================================

/// Runs the health phase.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run<W: Write>(ctx: &mut PhaseContext<W>) -> Result<PhaseTally, PhaseError> {
    ctx.banner(PhaseKind::Health)?;
    run_checks(ctx).await?;
    ctx.finish(PhaseKind::Health)
}

/// Runs the probe and health checks without banner or summary.
///
/// # Errors
///
/// Returns [`PhaseError`] when output fails.
pub async fn run_checks<W: Write>(ctx: &mut PhaseContext<W>) -> Result<(), PhaseError> {
    let attempts = ctx.config.target.retries.saturating_add(1);
    if wait_for_ready(&ctx.client, attempts).await {
        ctx.reporter.note("backend is responding")?;
    } else {
        ctx.reporter.warn(&format!("backend not ready after {attempts} attempts"))?;
    }
    ctx.reporter.section("Health & Connectivity")?;

    let response = ctx
        .check(
            "Health Check Status",
            ExpectedStatus::one(200),
            ApiRequest::get(Endpoint::AuthHealth.path()),
        )
        .await?;
    let missing: Vec<&str> = HEALTH_FIELDS
        .iter()
        .copied()
        .filter(|field| response.json_pointer(&format!("/{field}")).is_none_or(Value::is_null))
        .collect();
    let actual = if missing.is_empty() {
        "all fields present".to_string()
    } else {
        format!("missing {}", missing.join(", "))
    };
    ctx.record(&CheckRecord::new(
        "Health Check Fields",
        missing.is_empty(),
        HEALTH_FIELDS.join(", "),
        actual,
    ))?;

    ctx.check(
        "Database Connection Test",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::AuthDbTest.path()),
    )
    .await?;
    ctx.check(
        "Stored Procedures Test",
        ExpectedStatus::one(200),
        ApiRequest::get(Endpoint::AuthSpTest.path()),
    )
    .await?;

    if !ctx.options.health_only {
        ctx.check(
            "API Reachable",
            ExpectedStatus::any_response(),
            ApiRequest::get(Endpoint::Institutions.path()),
        )
        .await?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Readiness
// ============================================================================

/// Polls the health endpoint until it answers 2xx or attempts run out.
pub async fn wait_for_ready(client: &ApiClient, attempts: u32) -> bool {
    let request = ApiRequest::get(Endpoint::AuthHealth.path());
    let mut backoff = PROBE_BACKOFF;
    for attempt in 1 ..= attempts.max(1) {
        let response = client.send(&request).await;
        if response.is_success() {
            info!(attempt, "backend ready");
            return true;
        }
        warn!(attempt, status = %response.status_label(), "backend not ready");
        if attempt < attempts {
            sleep(backoff).await;
            backoff = (backoff * 2).min(PROBE_BACKOFF_CAP);
        }
    }
    false
}
