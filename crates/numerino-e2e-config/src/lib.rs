// crates/numerino-e2e-config/src/lib.rs
// ============================================================================
// Module: Numerino E2E Config Library
// Description: Canonical configuration model for the E2E harness.
// Purpose: Single source of truth for numerino-e2e.toml semantics.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `numerino-e2e-config` defines the harness configuration model: backend
//! target, phase orchestration, shared data location, output options, and
//! fixture accounts. Loading is strict and fail-closed; environment
//! overrides are applied before validation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::E2eEnv;
