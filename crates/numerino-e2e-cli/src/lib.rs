// crates/numerino-e2e-cli/src/lib.rs
// ============================================================================
// Module: Numerino E2E CLI Library
// Description: Shared helpers for the numerino-e2e command-line interface.
// Purpose: Provide reusable components (i18n) for the CLI binary and tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library houses the localized message catalog. The binary entry point
//! (`src/main.rs`) routes every user-facing line through it, except the phase
//! reports, which stay in English so the runner can scrape them.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;
