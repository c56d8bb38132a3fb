// crates/numerino-e2e-core/src/runner.rs
// ============================================================================
// Module: Phase Runner
// Description: Sequential orchestration of phase processes with timeouts.
// Purpose: Run every phase in order, aggregate counts, and decide the verdict.
// Dependencies: async-trait, serde, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! Each phase runs as a child process of the harness binary. Its output is
//! teed to the console and captured, then scraped for pass/fail counts with
//! [`parse_phase_output`]. A failed required phase stops the run; a failed
//! optional phase is reported and the run continues.
//!
//! Invariants:
//! - Phases run strictly one at a time, separated by a fixed pause.
//! - A phase succeeds only when it exits `0` within its timeout.
//! - Timed-out children are killed before the next phase starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use numerino_e2e_config::RunnerConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::report::ColorMode;
use crate::report::PhaseTally;
use crate::scrape::parse_phase_output;

// ============================================================================
// SECTION: Phase Sequence
// ============================================================================

/// One entry of the run sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    /// Phase key passed to `phase <key>`.
    pub key: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Extra phase arguments.
    pub args: &'static [&'static str],
    /// Whether a failure aborts the run.
    pub required: bool,
}

/// Phases executed by a full run, in order.
pub const PHASE_SEQUENCE: &[PhaseSpec] = &[
    PhaseSpec {
        key: "health",
        title: "Health Checks",
        args: &["--health-only"],
        required: true,
    },
    PhaseSpec {
        key: "institutions",
        title: "Institution Setup",
        args: &[],
        required: true,
    },
    PhaseSpec {
        key: "registration",
        title: "User Registration",
        args: &[],
        required: true,
    },
    PhaseSpec {
        key: "users",
        title: "User Management",
        args: &[],
        required: false,
    },
    PhaseSpec {
        key: "authentication",
        title: "Authentication",
        args: &["--full"],
        required: false,
    },
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that prevent a phase from producing an execution record.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The phase process could not be started.
    #[error("failed to start phase {phase}: {message}")]
    Spawn {
        /// Phase key.
        phase: String,
        /// Underlying error.
        message: String,
    },
    /// Waiting on or killing the process failed.
    #[error("phase process error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Launching
// ============================================================================

/// Raw result of one phase process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhaseExecution {
    /// Exit code, `None` when killed or terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall time.
    pub duration: Duration,
    /// True when the phase exceeded its timeout and was killed.
    pub timed_out: bool,
}

impl PhaseExecution {
    /// Returns true when the process exited `0` in time.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Starts phases and waits for them.
#[async_trait]
pub trait PhaseLauncher: Send + Sync {
    /// Runs `spec` to completion or until `limit` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the phase cannot be started or awaited.
    async fn launch(
        &self,
        spec: &PhaseSpec,
        limit: Duration,
    ) -> Result<PhaseExecution, RunnerError>;
}

/// Launches phases as child processes of the harness binary.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    /// Executable to run.
    program: PathBuf,
    /// Config file forwarded with `--config`.
    config_path: Option<PathBuf>,
    /// Color mode forwarded with `--color`.
    color: ColorMode,
    /// Locale forwarded with `--lang`.
    lang: Option<String>,
    /// Whether child output is echoed live.
    echo: bool,
}

impl ProcessLauncher {
    /// Creates a launcher for `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_path: None,
            color: ColorMode::Never,
            lang: None,
            echo: true,
        }
    }

    /// Forwards a config path.
    #[must_use]
    pub fn with_config(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Forwards a color mode. `Auto` is resolved here because the child's
    /// stdout is a pipe.
    #[must_use]
    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = if color.enabled() { ColorMode::Always } else { ColorMode::Never };
        self
    }

    /// Forwards a locale.
    #[must_use]
    pub fn with_lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang;
        self
    }

    /// Enables or disables live echo.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Returns the child arguments for `spec`.
    #[must_use]
    pub fn command_args(&self, spec: &PhaseSpec) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(path) = &self.config_path {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        if let Some(lang) = &self.lang {
            args.push("--lang".to_string());
            args.push(lang.clone());
        }
        args.push("--color".to_string());
        args.push(self.color.as_str().to_string());
        args.push("phase".to_string());
        args.push(spec.key.to_string());
        args.extend(spec.args.iter().map(|arg| (*arg).to_string()));
        args
    }
}

#[async_trait]
impl PhaseLauncher for ProcessLauncher {
    async fn launch(
        &self,
        spec: &PhaseSpec,
        limit: Duration,
    ) -> Result<PhaseExecution, RunnerError> {
        let started = Instant::now();
        let mut command = Command::new(&self.program);
        command.args(self.command_args(spec));
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|err| RunnerError::Spawn {
            phase: spec.key.to_string(),
            message: err.to_string(),
        })?;
        debug!(phase = spec.key, pid = child.id(), "phase process started");

        let stdout_task = child.stdout.take().map(|stdout| {
            let echo = self.echo.then(tokio::io::stdout);
            tokio::spawn(pump(stdout, echo))
        });
        let stderr_task = child.stderr.take().map(|stderr| {
            let echo = self.echo.then(tokio::io::stderr);
            tokio::spawn(pump(stderr, echo))
        });

        let (exit_code, timed_out) = match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => (status.code(), false),
            Ok(Err(err)) => return Err(RunnerError::Io(err.to_string())),
            Err(_) => {
                warn!(phase = spec.key, limit_secs = limit.as_secs(), "phase timed out, killing");
                child.kill().await.map_err(|err| RunnerError::Io(err.to_string()))?;
                (None, true)
            }
        };

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        Ok(PhaseExecution {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: started.elapsed(),
            timed_out,
        })
    }
}

/// Copies `reader` into a buffer, echoing to `sink` while it accepts writes.
async fn pump<R, W>(mut reader: R, mut sink: Option<W>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = Vec::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = match reader.read(&mut buffer).await {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        let chunk = &buffer[.. read];
        captured.extend_from_slice(chunk);
        if let Some(out) = sink.as_mut() {
            let echoed = out.write_all(chunk).await.is_ok() && out.flush().await.is_ok();
            if !echoed {
                sink = None;
            }
        }
    }
    captured
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one phase within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Phase key.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Whether the phase was required.
    pub required: bool,
    /// Exit `0` within the timeout.
    pub success: bool,
    /// Killed on timeout.
    pub timed_out: bool,
    /// Exit code when the process exited.
    pub exit_code: Option<i32>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Counts scraped from stdout.
    pub tally: PhaseTally,
    /// Captured stdout.
    #[serde(skip)]
    pub stdout: String,
    /// Captured stderr.
    #[serde(skip)]
    pub stderr: String,
}

impl PhaseOutcome {
    /// Builds an outcome from a finished execution.
    #[must_use]
    pub fn from_execution(spec: &PhaseSpec, execution: PhaseExecution) -> Self {
        Self {
            key: spec.key.to_string(),
            title: spec.title.to_string(),
            required: spec.required,
            success: execution.succeeded(),
            timed_out: execution.timed_out,
            exit_code: execution.exit_code,
            duration_ms: u64::try_from(execution.duration.as_millis()).unwrap_or(u64::MAX),
            tally: parse_phase_output(&execution.stdout),
            stdout: execution.stdout,
            stderr: execution.stderr,
        }
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A required phase failed.
    RequiredPhaseFailed,
    /// A phase, required or not, hit the timeout.
    PhaseTimedOut,
    /// A phase could not be launched.
    LaunchFailed(String),
}

/// Aggregated result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Executed phases, in order.
    pub phases: Vec<PhaseOutcome>,
    /// Sum of scraped counts.
    pub totals: PhaseTally,
    /// Key of the phase that stopped the run.
    pub aborted_by: Option<String>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Returns true when nothing failed and the run was not aborted.
    #[must_use]
    pub fn success(&self) -> bool {
        self.aborted_by.is_none()
            && self.phases.iter().all(|phase| phase.success)
            && self.totals.failed == 0
    }
}

// ============================================================================
// SECTION: Orchestration
// ============================================================================

/// Receives run progress.
pub trait RunObserver {
    /// A phase is about to start (`index` is zero-based).
    fn phase_started(&mut self, index: usize, count: usize, spec: &PhaseSpec);
    /// A phase exited `0` in time.
    fn phase_finished(&mut self, outcome: &PhaseOutcome);
    /// A phase failed or timed out.
    fn phase_failed(&mut self, outcome: &PhaseOutcome);
    /// The run stopped at `spec`.
    fn run_aborted(&mut self, spec: &PhaseSpec, reason: &AbortReason);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {
    fn phase_started(&mut self, _index: usize, _count: usize, _spec: &PhaseSpec) {}

    fn phase_finished(&mut self, _outcome: &PhaseOutcome) {}

    fn phase_failed(&mut self, _outcome: &PhaseOutcome) {}

    fn run_aborted(&mut self, _spec: &PhaseSpec, _reason: &AbortReason) {}
}

/// Timing options for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Per-phase timeout.
    pub phase_timeout: Duration,
    /// Pause between phases.
    pub phase_pause: Duration,
}

impl RunOptions {
    /// Builds options from runner settings.
    #[must_use]
    pub const fn from_config(config: &RunnerConfig) -> Self {
        Self {
            phase_timeout: config.phase_timeout(),
            phase_pause: config.phase_pause(),
        }
    }
}

/// Runs `phases` in order and aggregates the results.
pub async fn run_sequence(
    phases: &[PhaseSpec],
    launcher: &dyn PhaseLauncher,
    observer: &mut dyn RunObserver,
    options: &RunOptions,
) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::default();
    for (index, spec) in phases.iter().enumerate() {
        if index > 0 && !options.phase_pause.is_zero() {
            sleep(options.phase_pause).await;
        }
        observer.phase_started(index, phases.len(), spec);
        info!(phase = spec.key, required = spec.required, "phase starting");

        let execution = match launcher.launch(spec, options.phase_timeout).await {
            Ok(execution) => execution,
            Err(err) => {
                warn!(phase = spec.key, error = %err, "phase launch failed");
                observer.run_aborted(spec, &AbortReason::LaunchFailed(err.to_string()));
                report.aborted_by = Some(spec.key.to_string());
                break;
            }
        };

        let outcome = PhaseOutcome::from_execution(spec, execution);
        report.totals.absorb(outcome.tally);
        info!(
            phase = spec.key,
            success = outcome.success,
            passed = outcome.tally.passed,
            failed = outcome.tally.failed,
            "phase finished"
        );
        if outcome.success {
            observer.phase_finished(&outcome);
        } else {
            observer.phase_failed(&outcome);
        }
        let abort = if outcome.timed_out {
            Some(AbortReason::PhaseTimedOut)
        } else if !outcome.success && spec.required {
            Some(AbortReason::RequiredPhaseFailed)
        } else {
            None
        };
        report.phases.push(outcome);
        if let Some(reason) = abort {
            observer.run_aborted(spec, &reason);
            report.aborted_by = Some(spec.key.to_string());
            break;
        }
    }
    report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
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

    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::AbortReason;
    use super::PHASE_SEQUENCE;
    use super::PhaseExecution;
    use super::PhaseLauncher;
    use super::PhaseOutcome;
    use super::PhaseSpec;
    use super::ProcessLauncher;
    use super::RunObserver;
    use super::RunOptions;
    use super::RunnerError;
    use super::SilentObserver;
    use super::run_sequence;
    use crate::phases::PhaseKind;
    use crate::report::ColorMode;

    /// Launcher returning scripted executions per phase key.
    struct ScriptedLauncher {
        /// Result per phase key; unlisted phases pass with one check.
        results: HashMap<&'static str, Result<PhaseExecution, String>>,
        /// Keys launched so far.
        launched: Mutex<Vec<String>>,
    }

    impl ScriptedLauncher {
        fn new(results: Vec<(&'static str, Result<PhaseExecution, String>)>) -> Self {
            Self {
                results: results.into_iter().collect(),
                launched: Mutex::new(Vec::new()),
            }
        }

        fn launched(&self) -> Vec<String> {
            self.launched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PhaseLauncher for ScriptedLauncher {
        async fn launch(
            &self,
            spec: &PhaseSpec,
            _limit: Duration,
        ) -> Result<PhaseExecution, RunnerError> {
            self.launched.lock().unwrap().push(spec.key.to_string());
            match self.results.get(spec.key) {
                Some(Ok(execution)) => Ok(execution.clone()),
                Some(Err(message)) => Err(RunnerError::Spawn {
                    phase: spec.key.to_string(),
                    message: message.clone(),
                }),
                None => Ok(passing(1)),
            }
        }
    }

    /// Observer recording events as text.
    #[derive(Default)]
    struct Events(Vec<String>);

    impl RunObserver for Events {
        fn phase_started(&mut self, index: usize, count: usize, spec: &PhaseSpec) {
            self.0.push(format!("start {}/{} {}", index + 1, count, spec.key));
        }

        fn phase_finished(&mut self, outcome: &PhaseOutcome) {
            self.0.push(format!("ok {}", outcome.key));
        }

        fn phase_failed(&mut self, outcome: &PhaseOutcome) {
            self.0.push(format!("fail {}", outcome.key));
        }

        fn run_aborted(&mut self, spec: &PhaseSpec, reason: &AbortReason) {
            let label = match reason {
                AbortReason::RequiredPhaseFailed => "required",
                AbortReason::PhaseTimedOut => "timeout",
                AbortReason::LaunchFailed(_) => "launch",
            };
            self.0.push(format!("abort {} {label}", spec.key));
        }
    }

    fn passing(checks: u32) -> PhaseExecution {
        PhaseExecution {
            exit_code: Some(0),
            stdout: format!("Total Tests: {checks}\nPassed: {checks}\nFailed: 0\n"),
            ..PhaseExecution::default()
        }
    }

    fn failing(passed: u32, failed: u32) -> PhaseExecution {
        PhaseExecution {
            exit_code: Some(1),
            stdout: format!(
                "Total Tests: {}\nPassed: {passed}\nFailed: {failed}\n",
                passed + failed
            ),
            ..PhaseExecution::default()
        }
    }

    /// Execution killed at the limit after one passing check.
    fn timed_out_execution() -> PhaseExecution {
        PhaseExecution {
            timed_out: true,
            stdout: "✅ PASS - partial\n".to_string(),
            ..PhaseExecution::default()
        }
    }

    const OPTIONS: RunOptions = RunOptions {
        phase_timeout: Duration::from_secs(5),
        phase_pause: Duration::ZERO,
    };

    #[tokio::test]
    async fn all_phases_pass() {
        let launcher = ScriptedLauncher::new(vec![("health", Ok(passing(4)))]);
        let mut events = Events::default();
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut events, &OPTIONS).await;
        assert!(report.success());
        assert_eq!(report.phases.len(), PHASE_SEQUENCE.len());
        assert_eq!(report.totals.total, 8);
        assert_eq!(report.totals.passed, 8);
        assert_eq!(events.0.first().unwrap(), "start 1/5 health");
        assert_eq!(events.0.last().unwrap(), "ok authentication");
    }

    #[tokio::test]
    async fn required_failure_aborts() {
        let launcher = ScriptedLauncher::new(vec![("institutions", Ok(failing(10, 8)))]);
        let mut events = Events::default();
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut events, &OPTIONS).await;
        assert!(!report.success());
        assert_eq!(report.aborted_by.as_deref(), Some("institutions"));
        assert_eq!(launcher.launched(), vec!["health", "institutions"]);
        assert_eq!(report.totals.failed, 8);
        assert_eq!(events.0.last().unwrap(), "abort institutions required");
    }

    #[tokio::test]
    async fn optional_failure_continues_but_fails_run() {
        let launcher = ScriptedLauncher::new(vec![("users", Ok(failing(15, 2)))]);
        let mut events = Events::default();
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut events, &OPTIONS).await;
        assert_eq!(report.aborted_by, None);
        assert_eq!(launcher.launched().len(), PHASE_SEQUENCE.len());
        assert!(events.0.contains(&"fail users".to_string()));
        assert!(!report.success());
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        let launcher = ScriptedLauncher::new(vec![("health", Ok(timed_out_execution()))]);
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut SilentObserver, &OPTIONS).await;
        assert_eq!(report.aborted_by.as_deref(), Some("health"));
        assert!(report.phases[0].timed_out);
        assert_eq!(report.phases[0].tally.passed, 1);
        assert!(!report.success());
    }

    #[tokio::test]
    async fn optional_timeout_aborts_run() {
        let launcher = ScriptedLauncher::new(vec![("users", Ok(timed_out_execution()))]);
        let mut events = Events::default();
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut events, &OPTIONS).await;
        assert_eq!(report.aborted_by.as_deref(), Some("users"));
        assert_eq!(launcher.launched(), vec!["health", "institutions", "registration", "users"]);
        assert_eq!(report.phases.len(), 4);
        assert_eq!(events.0.last().unwrap(), "abort users timeout");
        assert!(!report.success());
    }

    #[tokio::test]
    async fn launch_error_aborts_even_for_optional_phase() {
        let launcher =
            ScriptedLauncher::new(vec![("users", Err("no such file".to_string()))]);
        let mut events = Events::default();
        let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut events, &OPTIONS).await;
        assert_eq!(report.aborted_by.as_deref(), Some("users"));
        assert_eq!(report.phases.len(), 3);
        assert_eq!(events.0.last().unwrap(), "abort users launch");
    }

    #[test]
    fn sequence_keys_are_runnable_phases() {
        for spec in PHASE_SEQUENCE {
            assert!(PhaseKind::parse(spec.key).is_some(), "unknown phase {}", spec.key);
        }
        let required: Vec<&str> =
            PHASE_SEQUENCE.iter().filter(|spec| spec.required).map(|spec| spec.key).collect();
        assert_eq!(required, vec!["health", "institutions", "registration"]);
    }

    #[test]
    fn process_arguments_forward_globals() {
        let launcher = ProcessLauncher::new("numerino-e2e")
            .with_config(Some(PathBuf::from("e2e.toml")))
            .with_lang(Some("es".to_string()))
            .with_color(ColorMode::Always);
        assert_eq!(launcher.command_args(&PHASE_SEQUENCE[4]), vec![
            "--config",
            "e2e.toml",
            "--lang",
            "es",
            "--color",
            "always",
            "phase",
            "authentication",
            "--full",
        ]);
        let plain = ProcessLauncher::new("numerino-e2e").with_color(ColorMode::Never);
        assert_eq!(plain.command_args(&PHASE_SEQUENCE[1]), vec![
            "--color",
            "never",
            "phase",
            "institutions",
        ]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_launcher_kills_child_at_limit_and_keeps_output() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("phase.sh");
        std::fs::write(&script, "#!/bin/sh\necho '✅ PASS - early'\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let launcher = ProcessLauncher::new(&script).with_echo(false);

        let started = Instant::now();
        let execution = launcher.launch(&PHASE_SEQUENCE[0], Duration::from_secs(1)).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(execution.timed_out);
        assert_eq!(execution.exit_code, None);
        assert!(!execution.succeeded());
        assert!(execution.stdout.contains("✅ PASS - early"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_launcher_reports_exit_code() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("phase.sh");
        std::fs::write(&script, "#!/bin/sh\necho \"$@\"\necho oops >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let launcher = ProcessLauncher::new(&script).with_echo(false);

        let execution = launcher.launch(&PHASE_SEQUENCE[1], Duration::from_secs(10)).await.unwrap();

        assert!(!execution.timed_out);
        assert_eq!(execution.exit_code, Some(1));
        assert_eq!(execution.stdout.trim(), "--color never phase institutions");
        assert_eq!(execution.stderr.trim(), "oops");
    }
}
