// crates/numerino-e2e-core/src/lib.rs
// ============================================================================
// Module: Numerino E2E Core Library
// Description: HTTP client, test phases, shared data, reporting, and runner.
// Purpose: Drive the Numerino backend through ordered end-to-end phases.
// Dependencies: numerino-e2e-config, reqwest, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! `numerino-e2e-core` exercises a running Numerino backend over HTTP.
//! Each [`PhaseKind`] is a self-contained group of checks that reports on
//! stdout and tallies pass/fail counts. The [`runner`] executes phases as
//! child processes in a fixed order and aggregates their scraped tallies.
//! Invariants:
//! - A check passes only when the response status is in its expected set.
//! - Phases share created ids through a JSON file ([`SharedDataStore`]).
//! - A failing required phase stops the run; optional phases never do.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifacts;
pub mod auth;
pub mod client;
pub mod endpoints;
pub mod expect;
pub mod generate;
pub mod logging;
pub mod phases;
pub mod report;
pub mod runner;
pub mod scrape;
pub mod shared_data;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifacts::ArtifactError;
pub use artifacts::RunArtifacts;
pub use artifacts::RunSummary;
pub use auth::AuthError;
pub use auth::AuthSession;
pub use auth::Credentials;
pub use auth::Role;
pub use client::ApiClient;
pub use client::ApiRequest;
pub use client::ApiResponse;
pub use client::ClientError;
pub use endpoints::Endpoint;
pub use endpoints::Namespace;
pub use expect::ExpectedStatus;
pub use logging::LoggingConfig;
pub use logging::init_logging;
pub use phases::PhaseContext;
pub use phases::PhaseError;
pub use phases::PhaseKind;
pub use phases::PhaseOptions;
pub use phases::run_phase;
pub use report::ColorMode;
pub use report::Palette;
pub use report::PhaseReporter;
pub use report::PhaseTally;
pub use runner::PHASE_SEQUENCE;
pub use runner::PhaseLauncher;
pub use runner::PhaseOutcome;
pub use runner::PhaseSpec;
pub use runner::ProcessLauncher;
pub use runner::RunObserver;
pub use runner::RunOptions;
pub use runner::RunReport;
pub use runner::run_sequence;
pub use scrape::parse_phase_output;
pub use shared_data::SharedDataError;
pub use shared_data::SharedDataStore;
pub use shared_data::SharedTestData;
