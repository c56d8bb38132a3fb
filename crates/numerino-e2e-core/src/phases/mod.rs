// crates/numerino-e2e-core/src/phases/mod.rs
// ============================================================================
// Module: Test Phases
// Description: Phase context, phase registry, and shared check plumbing.
// Purpose: Run one group of backend checks and print a scrapeable summary.
// Dependencies: numerino-e2e-config, thiserror, tracing
// ============================================================================

//! ## Overview
//! A phase is an async function over a [`PhaseContext`]. It prints a banner,
//! runs its checks in order (one in-flight request at a time), and finishes
//! with the summary block the runner scrapes. Identities created by earlier
//! phases are read from the shared data store, and new ones are written back
//! immediately.
//!
//! Invariants:
//! - Every check goes through [`PhaseContext::check`] or
//!   [`PhaseContext::record`], so the tally matches the printed markers.
//! - Shared-data save failures are warnings, never phase errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod authentication;
pub mod health;
pub mod institutions;
pub mod registration;
pub mod users;
pub mod users_auth;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;

use numerino_e2e_config::E2eConfig;
use thiserror::Error;
use tracing::warn;

use crate::client::ApiClient;
use crate::client::ApiRequest;
use crate::client::ApiResponse;
use crate::client::ClientError;
use crate::expect::ExpectedStatus;
use crate::report::CheckRecord;
use crate::report::Palette;
use crate::report::PhaseReporter;
use crate::report::PhaseTally;
use crate::shared_data::SharedDataError;
use crate::shared_data::SharedDataStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that stop a phase before its summary is printed.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// Output could not be written.
    #[error("phase output error: {0}")]
    Io(String),
    /// The HTTP client could not be built.
    #[error("phase client error: {0}")]
    Client(String),
}

impl From<io::Error> for PhaseError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<ClientError> for PhaseError {
    fn from(err: ClientError) -> Self {
        Self::Client(err.to_string())
    }
}

// ============================================================================
// SECTION: Phase Registry
// ============================================================================

/// Phases the binary can run individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Health and connectivity.
    Health,
    /// Institution setup.
    Institutions,
    /// User registration.
    Registration,
    /// Unauthenticated user management.
    Users,
    /// Authenticated user management.
    UsersAuth,
    /// Authentication flows.
    Authentication,
}

impl PhaseKind {
    /// Every phase, in display order.
    pub const ALL: &'static [Self] = &[
        Self::Health,
        Self::Institutions,
        Self::Registration,
        Self::Users,
        Self::UsersAuth,
        Self::Authentication,
    ];

    /// Returns the CLI key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Institutions => "institutions",
            Self::Registration => "registration",
            Self::Users => "users",
            Self::UsersAuth => "users-auth",
            Self::Authentication => "authentication",
        }
    }

    /// Parses a CLI key.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == value)
    }

    /// Returns the banner title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Health => "Health & Connectivity",
            Self::Institutions => "Institution Setup",
            Self::Registration => "User Registration",
            Self::Users => "User Management",
            Self::UsersAuth => "Authenticated User Management",
            Self::Authentication => "Authentication",
        }
    }
}

/// Per-invocation phase switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseOptions {
    /// Health phase: skip the extra reachability check.
    pub health_only: bool,
    /// Authentication phase: run the health checks first.
    pub full: bool,
}

/// Runs `kind` against `ctx`.
///
/// # Errors
///
/// Returns [`PhaseError`] when output cannot be written.
pub async fn run_phase<W: Write>(
    kind: PhaseKind,
    ctx: &mut PhaseContext<W>,
) -> Result<PhaseTally, PhaseError> {
    match kind {
        PhaseKind::Health => health::run(ctx).await,
        PhaseKind::Institutions => institutions::run(ctx).await,
        PhaseKind::Registration => registration::run(ctx).await,
        PhaseKind::Users => users::run(ctx).await,
        PhaseKind::UsersAuth => users_auth::run(ctx).await,
        PhaseKind::Authentication => authentication::run(ctx).await,
    }
}

// ============================================================================
// SECTION: Phase Context
// ============================================================================

/// Everything a phase needs.
pub struct PhaseContext<W: Write> {
    /// Loaded configuration.
    pub config: E2eConfig,
    /// Backend client.
    pub client: ApiClient,
    /// Shared test data.
    pub store: SharedDataStore,
    /// Output and tally.
    pub reporter: PhaseReporter<W>,
    /// Phase switches.
    pub options: PhaseOptions,
}

impl<W: Write> PhaseContext<W> {
    /// Builds a context writing to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Client`] when the HTTP client cannot be built.
    pub fn new(
        config: E2eConfig,
        out: W,
        palette: Palette,
        options: PhaseOptions,
    ) -> Result<Self, PhaseError> {
        let client = ApiClient::new(&config.target)?;
        let store =
            SharedDataStore::open(&config.data.data_file, config.data.fallback_institution_id);
        let reporter = PhaseReporter::new(out, palette, config.output.response_preview_chars);
        Ok(Self {
            config,
            client,
            store,
            reporter,
            options,
        })
    }

    /// Prints the banner for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Io`] when output fails.
    pub fn banner(&mut self, kind: PhaseKind) -> Result<(), PhaseError> {
        self.reporter.banner(kind.title(), self.client.api_base())?;
        Ok(())
    }

    /// Prints the summary for `kind` and returns the tally.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Io`] when output fails.
    pub fn finish(&mut self, kind: PhaseKind) -> Result<PhaseTally, PhaseError> {
        Ok(self.reporter.finish(kind.title())?)
    }

    /// Sends `request` and reports its status against `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Io`] when output fails.
    pub async fn check(
        &mut self,
        name: &str,
        expected: ExpectedStatus,
        request: ApiRequest,
    ) -> Result<ApiResponse, PhaseError> {
        self.reporter.test_header(&request.describe())?;
        let response = self.client.send(&request).await;
        self.reporter.check_status(name, &expected, &request, &response)?;
        Ok(response)
    }

    /// Reports a check that is not a plain status comparison.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Io`] when output fails.
    pub fn record(&mut self, record: &CheckRecord) -> Result<(), PhaseError> {
        self.reporter.record(record)?;
        Ok(())
    }

    /// Downgrades a shared-data save failure to a warning.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::Io`] when output fails.
    pub fn persist(&mut self, saved: Result<(), SharedDataError>) -> Result<(), PhaseError> {
        if let Err(err) = saved {
            warn!(path = %self.store.path().display(), error = %err, "shared data not saved");
            self.reporter.warn(&format!("shared data not saved: {err}"))?;
        }
        Ok(())
    }
}

/// Malformed JSON document used by negative checks.
pub const MALFORMED_JSON: &str = r#"{"name": "Test", "invalid": }"#;
