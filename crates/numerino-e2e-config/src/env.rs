// crates/numerino-e2e-config/src/env.rs
// ============================================================================
// Module: E2E Environment Overrides
// Description: Environment keys and strict parsers for harness overrides.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values override the TOML configuration. They are parsed with
//! strict UTF-8 enforcement to avoid silent misconfiguration: invalid UTF-8,
//! empty values, and malformed numbers fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum E2eEnv {
    /// Config file path override.
    ConfigPath,
    /// Backend base URL (scheme + host + port).
    BaseUrl,
    /// API path prefix appended to the base URL.
    ApiPrefix,
    /// Per-request timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Per-phase timeout in seconds (positive integer).
    PhaseTimeoutSeconds,
    /// Readiness probe retry count.
    Retries,
    /// Fallback institution identifier.
    InstitutionId,
    /// Shared test data file path.
    DataFile,
    /// Artifact root directory.
    ArtifactsDir,
    /// Toggle artifact writing (`true`/`false` or `1`/`0`).
    SaveArtifacts,
    /// Diagnostic log level.
    LogLevel,
    /// CLI output language.
    Lang,
}

impl E2eEnv {
    /// Every recognized key, in documentation order.
    pub const ALL: &'static [Self] = &[
        Self::ConfigPath,
        Self::BaseUrl,
        Self::ApiPrefix,
        Self::TimeoutSeconds,
        Self::PhaseTimeoutSeconds,
        Self::Retries,
        Self::InstitutionId,
        Self::DataFile,
        Self::ArtifactsDir,
        Self::SaveArtifacts,
        Self::LogLevel,
        Self::Lang,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "NUMERINO_E2E_CONFIG",
            Self::BaseUrl => "NUMERINO_E2E_BASE_URL",
            Self::ApiPrefix => "NUMERINO_E2E_API_PREFIX",
            Self::TimeoutSeconds => "NUMERINO_E2E_TIMEOUT_SEC",
            Self::PhaseTimeoutSeconds => "NUMERINO_E2E_PHASE_TIMEOUT_SEC",
            Self::Retries => "NUMERINO_E2E_RETRIES",
            Self::InstitutionId => "NUMERINO_E2E_INSTITUTION_ID",
            Self::DataFile => "NUMERINO_E2E_DATA_FILE",
            Self::ArtifactsDir => "NUMERINO_E2E_ARTIFACTS_DIR",
            Self::SaveArtifacts => "NUMERINO_E2E_SAVE_ARTIFACTS",
            Self::LogLevel => "NUMERINO_E2E_LOG_LEVEL",
            Self::Lang => "NUMERINO_E2E_LANG",
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
pub fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a positive number of seconds.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
pub fn parse_positive_seconds(name: &str, raw: &str) -> Result<u64, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(secs)
}

/// Parses an integer value of any [`FromStr`] integer type.
///
/// # Errors
///
/// Returns an error when the value does not parse.
pub fn parse_integer<T: FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim().parse().map_err(|_| format!("{name} must be an integer"))
}

/// Parses a boolean value (`true`/`false`, `1`/`0`, case-insensitive).
///
/// # Errors
///
/// Returns an error for any other value.
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(format!("{name} must be true/false or 1/0")),
    }
}
