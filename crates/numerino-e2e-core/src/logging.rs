// crates/numerino-e2e-core/src/logging.rs
// ============================================================================
// Module: Logging
// Description: Tracing subscriber setup for the harness binaries.
// Purpose: Route diagnostics to stderr so phase output on stdout stays clean.
// Dependencies: numerino-e2e-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! Diagnostics go to stderr. Stdout is reserved for the phase report, which
//! the orchestrator scrapes for pass/fail counts. `RUST_LOG` overrides the
//! configured level when set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use numerino_e2e_config::OutputConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Crates whose events pass the configured level.
const HARNESS_TARGETS: [&str; 3] = ["numerino_e2e_core", "numerino_e2e_config", "numerino_e2e_cli"];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level directive (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

impl From<&OutputConfig> for LoggingConfig {
    fn from(output: &OutputConfig) -> Self {
        Self {
            level: output.log_level.clone(),
            json_format: output.log_json,
        }
    }
}

impl LoggingConfig {
    /// Returns the filter directive applied when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(&self) -> String {
        HARNESS_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// SECTION: Init
// ============================================================================

/// Installs the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing one
/// is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init().is_ok()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use numerino_e2e_config::E2eConfig;

    use super::LoggingConfig;
    use super::init_logging;

    #[test]
    fn directive_covers_every_harness_crate() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            json_format: false,
        };
        assert_eq!(
            config.directive(),
            "numerino_e2e_core=debug,numerino_e2e_config=debug,numerino_e2e_cli=debug"
        );
    }

    #[test]
    fn output_config_drives_logging() {
        let mut config = E2eConfig::default();
        config.output.log_level = "info".to_string();
        config.output.log_json = true;
        let logging = LoggingConfig::from(&config.output);
        assert_eq!(logging.level, "info");
        assert!(logging.json_format);
    }

    #[test]
    fn second_init_keeps_existing_subscriber() {
        init_logging(&LoggingConfig::default());
        assert!(!init_logging(&LoggingConfig::default()));
    }
}
