// crates/numerino-e2e-core/src/artifacts.rs
// ============================================================================
// Module: Run Artifacts
// Description: Per-run directories with phase logs and run summaries.
// Purpose: Keep a reviewable record of every orchestrated run.
// Dependencies: regex, serde, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! A run writes into `<artifacts_dir>/run_<testRunId>/`:
//! - `<phase>.stdout.log` and `<phase>.stderr.log` for every executed phase
//! - `summary.json` (canonical JSON via `serde_jcs`)
//! - `summary.md`
//!
//! Passwords from shared data are never written; the summary lists ids only.
//! Phase logs echo request bodies, so every JSON `*password` value in them is
//! replaced with `"***"` before it reaches disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::report::PhaseTally;
use crate::runner::PhaseOutcome;
use crate::runner::RunReport;
use crate::shared_data::SharedTestData;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact write failures.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem failure.
    #[error("artifact io error at {path}: {message}")]
    Io {
        /// File or directory involved.
        path: String,
        /// Underlying error.
        message: String,
    },
    /// Serialization failure.
    #[error("artifact json error: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Ids created during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIds {
    /// Institution used by registration.
    pub institution_id: i64,
    /// Teacher user id.
    pub teacher_id: Option<i64>,
    /// Guardian user id.
    pub guardian_id: Option<i64>,
    /// Student user id.
    pub student_id: Option<i64>,
}

impl From<&SharedTestData> for CreatedIds {
    fn from(data: &SharedTestData) -> Self {
        Self {
            institution_id: data.institution_id,
            teacher_id: data.teacher_id,
            guardian_id: data.guardian_id,
            student_id: data.student_id,
        }
    }
}

/// Machine-readable run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run id (unix millis at start).
    pub test_run_id: u64,
    /// API base the run targeted.
    pub target: String,
    /// `passed`, `failed`, or `aborted`.
    pub status: String,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Aggregated counts.
    pub totals: PhaseTally,
    /// Phase that stopped the run.
    pub aborted_by: Option<String>,
    /// Executed phases.
    pub phases: Vec<PhaseOutcome>,
    /// Created ids.
    pub created: CreatedIds,
}

impl RunSummary {
    /// Builds a summary from a finished run.
    #[must_use]
    pub fn new(test_run_id: u64, target: &str, report: &RunReport, data: &SharedTestData) -> Self {
        let status = if report.aborted_by.is_some() {
            "aborted"
        } else if report.success() {
            "passed"
        } else {
            "failed"
        };
        Self {
            test_run_id,
            target: target.to_string(),
            status: status.to_string(),
            duration_ms: report.duration_ms,
            totals: report.totals,
            aborted_by: report.aborted_by.clone(),
            phases: report.phases.clone(),
            created: CreatedIds::from(data),
        }
    }
}

// ============================================================================
// SECTION: Artifact Directory
// ============================================================================

/// Artifact directory for one run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Run directory.
    root: PathBuf,
}

impl RunArtifacts {
    /// Creates `<base>/run_<test_run_id>/`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] when the directory cannot be created.
    pub fn create(base: &Path, test_run_id: u64) -> Result<Self, ArtifactError> {
        let root = base.join(format!("run_{test_run_id}"));
        fs::create_dir_all(&root).map_err(|err| io_error(&root, &err))?;
        Ok(Self {
            root,
        })
    }

    /// Returns the run directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when serialization or the write fails.
    pub fn write_json<T: Serialize>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, ArtifactError> {
        let bytes = serde_jcs::to_vec(value).map_err(|err| ArtifactError::Json(err.to_string()))?;
        self.write_bytes(name, &bytes)
    }

    /// Writes a text artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] when the write fails.
    pub fn write_text(&self, name: &str, value: &str) -> Result<PathBuf, ArtifactError> {
        self.write_bytes(name, value.as_bytes())
    }

    /// Writes the captured output of every phase.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] when a write fails.
    pub fn write_phase_logs(&self, phases: &[PhaseOutcome]) -> Result<Vec<PathBuf>, ArtifactError> {
        let mut written = Vec::with_capacity(phases.len() * 2);
        for phase in phases {
            let stdout = redact_passwords(&phase.stdout);
            let stderr = redact_passwords(&phase.stderr);
            written.push(self.write_text(&format!("{}.stdout.log", phase.key), &stdout)?);
            written.push(self.write_text(&format!("{}.stderr.log", phase.key), &stderr)?);
        }
        Ok(written)
    }

    /// Writes `summary.json` and `summary.md`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when a write fails.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<(), ArtifactError> {
        self.write_json("summary.json", summary)?;
        self.write_text("summary.md", &summary_markdown(summary))?;
        Ok(())
    }

    /// Writes raw bytes under the run directory.
    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let path = self.root.join(name);
        fs::write(&path, bytes).map_err(|err| io_error(&path, &err))?;
        Ok(path)
    }
}

/// Maps an I/O error to [`ArtifactError::Io`].
fn io_error(path: &Path, err: &std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Returns the lazily compiled password-field pattern.
fn password_field() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)("[a-z_]*password"\s*:\s*)"(?:[^"\\]|\\.)*""#).ok())
        .as_ref()
}

/// Replaces the value of every JSON string field whose name ends in
/// `password` (any case) with `"***"`.
#[must_use]
pub fn redact_passwords(text: &str) -> String {
    match password_field() {
        Some(pattern) => pattern.replace_all(text, r#"${1}"***""#).into_owned(),
        None => text.to_string(),
    }
}

/// Renders the Markdown summary.
fn summary_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("# E2E Run Summary\n\n");
    out.push_str("## Status\n\n");
    out.push_str(&format!("- Run: {}\n", summary.test_run_id));
    out.push_str(&format!("- Target: {}\n", summary.target));
    out.push_str(&format!("- Status: {}\n", summary.status));
    out.push_str(&format!("- Duration (ms): {}\n", summary.duration_ms));
    out.push_str(&format!(
        "- Checks: {} total, {} passed, {} failed ({:.2}%)\n",
        summary.totals.total,
        summary.totals.passed,
        summary.totals.failed,
        summary.totals.success_rate()
    ));
    if let Some(phase) = &summary.aborted_by {
        out.push_str(&format!("- Aborted by: {phase}\n"));
    }
    out.push_str("\n## Phases\n\n");
    out.push_str("| Phase | Required | Result | Passed | Failed | Duration (ms) |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for phase in &summary.phases {
        let result = if phase.timed_out {
            "timeout"
        } else if phase.success {
            "pass"
        } else {
            "fail"
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            phase.title,
            if phase.required { "yes" } else { "no" },
            result,
            phase.tally.passed,
            phase.tally.failed,
            phase.duration_ms
        ));
    }
    out.push_str("\n## Created Data\n\n");
    let created = &summary.created;
    out.push_str(&format!("- Institution: {}\n", created.institution_id));
    for (label, id) in [
        ("Teacher", created.teacher_id),
        ("Guardian", created.guardian_id),
        ("Student", created.student_id),
    ] {
        match id {
            Some(id) => out.push_str(&format!("- {label}: {id}\n")),
            None => out.push_str(&format!("- {label}: none\n")),
        }
    }
    out
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

    use std::fs;

    use tempfile::TempDir;

    use super::RunArtifacts;
    use super::RunSummary;
    use super::redact_passwords;
    use crate::report::PhaseTally;
    use crate::runner::PhaseOutcome;
    use crate::runner::RunReport;
    use crate::shared_data::SharedTestData;

    /// Builds a finished phase outcome.
    fn outcome(key: &str, success: bool) -> PhaseOutcome {
        PhaseOutcome {
            key: key.to_string(),
            title: key.to_uppercase(),
            required: true,
            success,
            timed_out: false,
            exit_code: Some(i32::from(!success)),
            duration_ms: 10,
            tally: PhaseTally {
                total: 2,
                passed: if success { 2 } else { 1 },
                failed: u32::from(!success),
            },
            stdout: format!("{key} out"),
            stderr: String::new(),
        }
    }

    #[test]
    fn writes_logs_and_summaries() {
        let dir = TempDir::new().unwrap();
        let artifacts = RunArtifacts::create(dir.path(), 42).unwrap();
        assert!(artifacts.root().ends_with("run_42"));

        let report = RunReport {
            phases: vec![outcome("health", true), outcome("institutions", false)],
            totals: PhaseTally {
                total: 4,
                passed: 3,
                failed: 1,
            },
            aborted_by: Some("institutions".to_string()),
            duration_ms: 20,
        };
        let mut data = SharedTestData::with_fallback(3);
        data.teacher_id = Some(9);
        data.teacher_password = Some("secret".to_string());
        let summary = RunSummary::new(42, "http://localhost:8080/api", &report, &data);
        assert_eq!(summary.status, "aborted");

        let logs = artifacts.write_phase_logs(&report.phases).unwrap();
        assert_eq!(logs.len(), 4);
        let stdout = fs::read_to_string(artifacts.root().join("health.stdout.log")).unwrap();
        assert_eq!(stdout, "health out");

        artifacts.write_summary(&summary).unwrap();
        let json = fs::read_to_string(artifacts.root().join("summary.json")).unwrap();
        assert!(json.starts_with("{\"aborted_by\":\"institutions\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("health out"));
        let markdown = fs::read_to_string(artifacts.root().join("summary.md")).unwrap();
        assert!(markdown.contains("- Aborted by: institutions"));
        assert!(markdown.contains("| INSTITUTIONS | yes | fail | 1 | 1 | 10 |"));
        assert!(markdown.contains("- Teacher: 9"));
        assert!(markdown.contains("- Student: none"));
    }

    #[test]
    fn redaction_masks_every_password_field() {
        let body = r#"{"email":"a@example.com","password":"Secret1!","newPassword": "N3w\"pw",
  "current_password" : "old","passwordHint":"keep","username":"ana"}"#;
        let redacted = redact_passwords(body);
        assert!(!redacted.contains("Secret1!"));
        assert!(!redacted.contains("N3w"));
        assert!(!redacted.contains("old"));
        assert!(redacted.contains(r#""password":"***""#));
        assert!(redacted.contains(r#""newPassword": "***""#));
        assert!(redacted.contains(r#""passwordHint":"keep""#));
        assert!(redacted.contains(r#""username":"ana""#));
    }

    #[test]
    fn phase_logs_never_contain_request_passwords() {
        let dir = TempDir::new().unwrap();
        let artifacts = RunArtifacts::create(dir.path(), 7).unwrap();
        let mut phase = outcome("registration", true);
        phase.stdout = "📋 Request body:\n{\n  \"password\": \"TestPass123!\"\n}".to_string();
        phase.stderr = r#"{"newPassword":"TeacherPass123!"}"#.to_string();

        artifacts.write_phase_logs(&[phase]).unwrap();

        let root = artifacts.root();
        let stdout = fs::read_to_string(root.join("registration.stdout.log")).unwrap();
        let stderr = fs::read_to_string(root.join("registration.stderr.log")).unwrap();
        assert!(!stdout.contains("TestPass123!"));
        assert!(stdout.contains(r#""password": "***""#));
        assert_eq!(stderr, r#"{"newPassword":"***"}"#);
    }
}
