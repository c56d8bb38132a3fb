// crates/numerino-e2e-config/src/config.rs
// ============================================================================
// Module: Numerino E2E Configuration
// Description: Configuration loading and validation for the E2E harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from an optional TOML file, then overridden by
//! `NUMERINO_E2E_*` environment variables, then validated. A missing default
//! file yields built-in defaults; a missing explicit file is an error.
//!
//! ## Invariants
//! - `base_url` and `api_prefix` carry no trailing slash after validation.
//! - Timeouts are positive and bounded.
//! - Unknown TOML keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::env::E2eEnv;
use crate::env::parse_bool;
use crate::env::parse_integer;
use crate::env::parse_positive_seconds;
use crate::env::read_env_nonempty;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "numerino-e2e.toml";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Default API path prefix.
pub const DEFAULT_API_PREFIX: &str = "/api";
/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default per-phase timeout in seconds.
const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 60;
/// Default pause between phases in milliseconds.
const DEFAULT_PHASE_PAUSE_MS: u64 = 1_000;
/// Upper bound for any timeout in seconds.
const MAX_TIMEOUT_SECS: u64 = 3_600;
/// Upper bound for the inter-phase pause in milliseconds.
const MAX_PHASE_PAUSE_MS: u64 = 60_000;
/// Default readiness retry count.
const DEFAULT_RETRIES: u32 = 2;
/// Upper bound for readiness retries.
const MAX_RETRIES: u32 = 20;
/// Default institution identifier used before one is created.
pub const DEFAULT_INSTITUTION_ID: i64 = 3;
/// Default shared test data file.
const DEFAULT_DATA_FILE: &str = ".numerino-e2e/test-data.json";
/// Default artifact root.
const DEFAULT_ARTIFACTS_DIR: &str = "target/numerino-e2e";
/// Default maximum response body size in bytes.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Upper bound for the response body size limit.
const MAX_RESPONSE_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Default number of characters shown in response previews.
const DEFAULT_PREVIEW_CHARS: usize = 200;
/// Preview length bounds (inclusive).
const PREVIEW_CHARS_RANGE: (usize, usize) = (16, 10_000);
/// Accepted diagnostic log levels.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
/// Default diagnostic log level.
const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Root harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct E2eConfig {
    /// Backend target settings.
    pub target: TargetConfig,
    /// Phase orchestration settings.
    pub runner: RunnerConfig,
    /// Shared test data settings.
    pub data: DataConfig,
    /// Logging and artifact settings.
    pub output: OutputConfig,
    /// Fixture accounts expected to exist on the backend.
    pub accounts: AccountsConfig,
    /// Path the config was loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Backend target settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Scheme, host, and port of the backend.
    pub base_url: String,
    /// Path prefix shared by every endpoint (may be empty).
    pub api_prefix: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Readiness probe retry count.
    pub retries: u32,
    /// Maximum accepted response body size.
    pub max_response_bytes: usize,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: format!("numerino-e2e/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TargetConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the base URL joined with the API prefix.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        format!("{}{}", self.base_url, self.api_prefix)
    }

    /// Normalizes and validates target settings.
    fn validate(&mut self) -> Result<(), ConfigError> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let rest = self
            .base_url
            .strip_prefix("http://")
            .or_else(|| self.base_url.strip_prefix("https://"))
            .ok_or_else(|| {
                ConfigError::Invalid("target.base_url must start with http:// or https://".into())
            })?;
        if rest.is_empty() || rest.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("target.base_url must include a host".into()));
        }
        if rest.contains(['?', '#']) {
            return Err(ConfigError::Invalid(
                "target.base_url must not carry a query or fragment".into(),
            ));
        }
        self.api_prefix = self.api_prefix.trim().trim_end_matches('/').to_string();
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("target.api_prefix must start with '/'".into()));
        }
        if self.api_prefix.contains(['?', '#']) || self.api_prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::Invalid("target.api_prefix must be a plain path".into()));
        }
        validate_timeout("target.request_timeout_secs", self.request_timeout_secs)?;
        if self.retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "target.retries must be at most {MAX_RETRIES}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "target.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_LIMIT}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("target.user_agent must be non-empty".into()));
        }
        Ok(())
    }
}

/// Phase orchestration settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Timeout for a single phase process in seconds.
    pub phase_timeout_secs: u64,
    /// Pause between consecutive phases in milliseconds.
    pub phase_pause_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            phase_timeout_secs: DEFAULT_PHASE_TIMEOUT_SECS,
            phase_pause_ms: DEFAULT_PHASE_PAUSE_MS,
        }
    }
}

impl RunnerConfig {
    /// Returns the per-phase timeout.
    #[must_use]
    pub const fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_secs)
    }

    /// Returns the pause between phases.
    #[must_use]
    pub const fn phase_pause(&self) -> Duration {
        Duration::from_millis(self.phase_pause_ms)
    }

    /// Validates runner settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("runner.phase_timeout_secs", self.phase_timeout_secs)?;
        if self.phase_pause_ms > MAX_PHASE_PAUSE_MS {
            return Err(ConfigError::Invalid(format!(
                "runner.phase_pause_ms must be at most {MAX_PHASE_PAUSE_MS}"
            )));
        }
        Ok(())
    }
}

/// Shared test data settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// JSON file shared between phases.
    pub data_file: PathBuf,
    /// Institution identifier used until a phase creates one.
    pub fallback_institution_id: i64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            fallback_institution_id: DEFAULT_INSTITUTION_ID,
        }
    }
}

impl DataConfig {
    /// Validates data settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("data.data_file", &self.data_file)?;
        if self.fallback_institution_id <= 0 {
            return Err(ConfigError::Invalid(
                "data.fallback_institution_id must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Logging and artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Diagnostic log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit diagnostics as JSON lines.
    pub log_json: bool,
    /// Write per-run artifacts.
    pub save_artifacts: bool,
    /// Root directory for run artifacts.
    pub artifacts_dir: PathBuf,
    /// Maximum characters of request/response detail shown per check.
    pub response_preview_chars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            save_artifacts: true,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            response_preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl OutputConfig {
    /// Normalizes and validates output settings.
    fn validate(&mut self) -> Result<(), ConfigError> {
        self.log_level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "output.log_level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        validate_path_string("output.artifacts_dir", &self.artifacts_dir)?;
        let (min, max) = PREVIEW_CHARS_RANGE;
        if !(min ..= max).contains(&self.response_preview_chars) {
            return Err(ConfigError::Invalid(format!(
                "output.response_preview_chars must be between {min} and {max}"
            )));
        }
        Ok(())
    }
}

/// Email/password account expected to exist on the backend.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
}

impl AccountConfig {
    /// Builds an account from borrowed credentials.
    fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Validates the account under the given field label.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if !self.email.contains('@') {
            return Err(ConfigError::Invalid(format!("{field}.email must be an email address")));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Invalid(format!("{field}.password must be non-empty")));
        }
        Ok(())
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fixture accounts used by login-dependent phases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountsConfig {
    /// Student account (email login).
    pub student: AccountConfig,
    /// Student username for the student login endpoint.
    pub student_username: String,
    /// Teacher account.
    pub teacher: AccountConfig,
    /// Guardian account.
    pub guardian: AccountConfig,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            student: AccountConfig::new("sstring@example.com", "Spassword1!"),
            student_username: "4chan".to_string(),
            teacher: AccountConfig::new("tstring@example.com", "Tpassword1!"),
            guardian: AccountConfig::new("maria.guardian@example.com", "GuardianPass123!"),
        }
    }
}

impl AccountsConfig {
    /// Validates every fixture account.
    fn validate(&self) -> Result<(), ConfigError> {
        self.student.validate("accounts.student")?;
        self.teacher.validate("accounts.teacher")?;
        self.guardian.validate("accounts.guardian")?;
        if self.student_username.trim().is_empty() {
            return Err(ConfigError::Invalid("accounts.student_username must be non-empty".into()));
        }
        Ok(())
    }
}

/// Where the config path came from.
enum ConfigSource {
    /// Path supplied by the caller or the env override; must exist.
    Explicit(PathBuf),
    /// Default filename; optional.
    Default(PathBuf),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl E2eConfig {
    /// Loads configuration from disk and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file, an override, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match resolve_path(path)? {
            ConfigSource::Explicit(path) => Self::from_file(&path)?,
            ConfigSource::Default(path) if path.is_file() => Self::from_file(&path)?,
            ConfigSource::Default(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file with size and encoding guards.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Applies `NUMERINO_E2E_*` overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(E2eEnv::BaseUrl)? {
            self.target.base_url = value;
        }
        if let Some(value) = read_env(E2eEnv::ApiPrefix)? {
            self.target.api_prefix = value;
        }
        if let Some(value) = read_env(E2eEnv::TimeoutSeconds)? {
            self.target.request_timeout_secs =
                parse_positive_seconds(E2eEnv::TimeoutSeconds.as_str(), &value)
                    .map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = read_env(E2eEnv::PhaseTimeoutSeconds)? {
            self.runner.phase_timeout_secs =
                parse_positive_seconds(E2eEnv::PhaseTimeoutSeconds.as_str(), &value)
                    .map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = read_env(E2eEnv::Retries)? {
            self.target.retries = parse_integer(E2eEnv::Retries.as_str(), &value)
                .map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = read_env(E2eEnv::InstitutionId)? {
            self.data.fallback_institution_id =
                parse_integer(E2eEnv::InstitutionId.as_str(), &value)
                    .map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = read_env(E2eEnv::DataFile)? {
            self.data.data_file = PathBuf::from(value);
        }
        if let Some(value) = read_env(E2eEnv::ArtifactsDir)? {
            self.output.artifacts_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env(E2eEnv::SaveArtifacts)? {
            self.output.save_artifacts = parse_bool(E2eEnv::SaveArtifacts.as_str(), &value)
                .map_err(ConfigError::Invalid)?;
        }
        if let Some(value) = read_env(E2eEnv::LogLevel)? {
            self.output.log_level = value;
        }
        Ok(())
    }

    /// Normalizes and validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.target.validate()?;
        self.runner.validate()?;
        self.data.validate()?;
        self.output.validate()?;
        self.accounts.validate()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a non-empty override for `key`.
fn read_env(key: E2eEnv) -> Result<Option<String>, ConfigError> {
    read_env_nonempty(key.as_str()).map_err(ConfigError::Invalid)
}

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource::Explicit(path.to_path_buf()));
    }
    if let Some(env_path) = read_env(E2eEnv::ConfigPath)? {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource::Explicit(PathBuf::from(env_path)));
    }
    Ok(ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_NAME)))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path field.
fn validate_path_string(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout in seconds.
fn validate_timeout(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_TIMEOUT_SECS}"
        )));
    }
    Ok(())
}
