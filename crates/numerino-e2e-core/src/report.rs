// crates/numerino-e2e-core/src/report.rs
// ============================================================================
// Module: Phase Reporter
// Description: Human-readable PASS/FAIL output and per-phase tallies.
// Purpose: Render check results and the summary block the runner scrapes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`PhaseReporter`] writes everything a phase prints: banner, sections,
//! per-check results, and the closing summary. The summary labels
//! (`Total Tests:`, `Passed:`, `Failed:`) are a stable contract with
//! [`crate::scrape::parse_phase_output`] and are never localized.
//!
//! ## Invariants
//! - Every recorded check increments exactly one of `passed` or `failed`.
//! - Colors are applied per line and never inside summary labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::IsTerminal;
use std::io::Write;

use serde::Deserialize;
use serde::Serialize;

use crate::client::ApiRequest;
use crate::client::ApiResponse;
use crate::expect::ExpectedStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Width of banner rules.
const RULE_WIDTH: usize = 80;
/// Label preceding the total check count.
pub const TOTAL_LABEL: &str = "Total Tests:";
/// Label preceding the passed check count.
pub const PASSED_LABEL: &str = "Passed:";
/// Label preceding the failed check count.
pub const FAILED_LABEL: &str = "Failed:";
/// Marker prefix of a passing check line.
pub const PASS_MARKER: &str = "✅ PASS";
/// Marker prefix of a failing check line.
pub const FAIL_MARKER: &str = "❌ FAIL";

// ============================================================================
// SECTION: Colors
// ============================================================================

/// Color selection for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl ColorMode {
    /// Returns the CLI label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        }
    }

    /// Resolves the mode against the current stdout.
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Self::Auto => io::stdout().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Terminal colors used by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Failures.
    Red,
    /// Passes.
    Green,
    /// Warnings.
    Yellow,
    /// Section headers.
    Blue,
    /// Test headers.
    Magenta,
    /// Expectations and banners.
    Cyan,
    /// Emphasis.
    Bold,
}

impl Color {
    /// Returns the ANSI SGR sequence.
    const fn code(self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Magenta => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::Bold => "\x1b[1m",
        }
    }
}

/// ANSI reset sequence.
const RESET: &str = "\x1b[0m";

/// Applies colors when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Whether escape sequences are emitted.
    enabled: bool,
}

impl Palette {
    /// Creates a palette.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
        }
    }

    /// Creates a palette for the given mode.
    #[must_use]
    pub fn for_mode(mode: ColorMode) -> Self {
        Self::new(mode.enabled())
    }

    /// Returns true when colors are emitted.
    #[must_use]
    pub const fn enabled(self) -> bool {
        self.enabled
    }

    /// Wraps `text` in `color`.
    #[must_use]
    pub fn paint(self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("{}{text}{RESET}", color.code())
        } else {
            text.to_string()
        }
    }
}

// ============================================================================
// SECTION: Tally
// ============================================================================

/// Pass/fail counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseTally {
    /// Checks executed.
    pub total: u32,
    /// Checks passed.
    pub passed: u32,
    /// Checks failed.
    pub failed: u32,
}

impl PhaseTally {
    /// Records one outcome.
    pub const fn record(&mut self, passed: bool) {
        self.total = self.total.saturating_add(1);
        if passed {
            self.passed = self.passed.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
    }

    /// Adds another tally into this one.
    pub const fn absorb(&mut self, other: Self) {
        self.total = self.total.saturating_add(other.total);
        self.passed = self.passed.saturating_add(other.passed);
        self.failed = self.failed.saturating_add(other.failed);
    }

    /// Returns true when nothing failed.
    #[must_use]
    pub const fn is_clean(self) -> bool {
        self.failed == 0
    }

    /// Returns the pass percentage, or `0.0` when nothing ran.
    #[must_use]
    pub fn success_rate(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.passed) * 100.0 / f64::from(self.total)
    }
}

/// Picks the color for a success rate.
#[must_use]
pub fn rate_color(rate: f64) -> Color {
    if rate >= 90.0 {
        Color::Green
    } else if rate >= 70.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

// ============================================================================
// SECTION: Check Records
// ============================================================================

/// One reported check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    /// Check name.
    pub name: String,
    /// Outcome.
    pub passed: bool,
    /// Expected value (rendered).
    pub expected: String,
    /// Actual value (rendered).
    pub actual: String,
    /// Request summary.
    pub request: Option<String>,
    /// Response preview.
    pub response: Option<String>,
    /// Free-form details.
    pub details: Option<String>,
}

impl CheckRecord {
    /// Creates a record without request/response context.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        passed: bool,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            passed,
            expected: expected.into(),
            actual: actual.into(),
            request: None,
            response: None,
            details: None,
        }
    }

    /// Adds free-form details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Truncates `text` to `max_chars` characters with a `...` suffix.
#[must_use]
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Writes phase output and tallies outcomes.
pub struct PhaseReporter<W: Write> {
    /// Output sink (stdout in production).
    out: W,
    /// Color palette.
    palette: Palette,
    /// Running tally.
    tally: PhaseTally,
    /// Maximum characters of request/response detail.
    preview_chars: usize,
}

impl<W: Write> PhaseReporter<W> {
    /// Creates a reporter.
    pub const fn new(out: W, palette: Palette, preview_chars: usize) -> Self {
        Self {
            out,
            palette,
            tally: PhaseTally {
                total: 0,
                passed: 0,
                failed: 0,
            },
            preview_chars,
        }
    }

    /// Returns the current tally.
    #[must_use]
    pub const fn tally(&self) -> PhaseTally {
        self.tally
    }

    /// Consumes the reporter and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the phase banner.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn banner(&mut self, title: &str, target: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "{}", self.palette.paint(Color::Cyan, &rule))?;
        writeln!(self.out, "{}", self.palette.paint(Color::Bold, &format!("🚀 {title}")))?;
        writeln!(self.out, "   Target: {target}")?;
        writeln!(self.out, "{}", self.palette.paint(Color::Cyan, &rule))?;
        writeln!(self.out)
    }

    /// Prints a section header.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(self.out, "{}", self.palette.paint(Color::Blue, &rule))?;
        writeln!(self.out, "{}", self.palette.paint(Color::Blue, &format!("📂 {title}")))?;
        writeln!(self.out, "{}", self.palette.paint(Color::Blue, &rule))
    }

    /// Prints a test header.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn test_header(&mut self, description: &str) -> io::Result<()> {
        let header = format!("📋 Test: {description}");
        writeln!(self.out, "{}", self.palette.paint(Color::Magenta, &header))
    }

    /// Prints an informational note.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn note(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "   {message}")
    }

    /// Prints a warning.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.paint(Color::Yellow, &format!("⚠️  {message}")))
    }

    /// Prints and tallies one check.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn record(&mut self, record: &CheckRecord) -> io::Result<()> {
        self.tally.record(record.passed);
        let (marker, color) =
            if record.passed { (PASS_MARKER, Color::Green) } else { (FAIL_MARKER, Color::Red) };
        writeln!(self.out, "{} - {}", self.palette.paint(color, marker), record.name)?;
        writeln!(self.out, "   Expected: {}", self.palette.paint(Color::Cyan, &record.expected))?;
        writeln!(self.out, "   Actual: {}", self.palette.paint(color, &record.actual))?;
        if let Some(request) = &record.request {
            writeln!(self.out, "   Request: {}", truncate_preview(request, self.preview_chars))?;
        }
        if let Some(response) = &record.response {
            writeln!(self.out, "   Response: {}", truncate_preview(response, self.preview_chars))?;
        }
        if let Some(details) = &record.details {
            writeln!(self.out, "   Details: {}", truncate_preview(details, self.preview_chars))?;
        }
        writeln!(self.out)
    }

    /// Compares `response` to `expected`, then prints and tallies the result.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn check_status(
        &mut self,
        name: &str,
        expected: &ExpectedStatus,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> io::Result<bool> {
        let passed = expected.matches(response.status);
        let mut record = CheckRecord::new(
            name,
            passed,
            format!("Status {expected}"),
            format!("Status {}", response.status_label()),
        );
        record.request = Some(match request.body() {
            Some(body) => format!("{} {}", request.describe(), body.to_wire()),
            None => request.describe(),
        });
        if !response.body.is_empty() {
            record.response = Some(response.body.clone());
        }
        self.record(&record)?;
        Ok(passed)
    }

    /// Prints the summary block and returns the final tally.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the sink fails.
    pub fn finish(&mut self, title: &str) -> io::Result<PhaseTally> {
        let rule = "=".repeat(RULE_WIDTH);
        let tally = self.tally;
        let rate = tally.success_rate();
        writeln!(self.out, "{}", self.palette.paint(Color::Cyan, &rule))?;
        let heading = format!("📊 SUMMARY - {title}");
        writeln!(self.out, "{}", self.palette.paint(Color::Bold, &heading))?;
        writeln!(self.out, "{}", self.palette.paint(Color::Cyan, &rule))?;
        writeln!(self.out, "{TOTAL_LABEL} {}", tally.total)?;
        let passed = format!("{PASSED_LABEL} {}", tally.passed);
        writeln!(self.out, "{}", self.palette.paint(Color::Green, &passed))?;
        let failed = format!("{FAILED_LABEL} {}", tally.failed);
        writeln!(self.out, "{}", self.palette.paint(Color::Red, &failed))?;
        writeln!(
            self.out,
            "{}",
            self.palette.paint(rate_color(rate), &format!("Success Rate: {rate:.2}%"))
        )?;
        let verdict = if tally.is_clean() {
            self.palette.paint(Color::Green, "🎉 All checks passed")
        } else {
            self.palette.paint(Color::Red, "⚠️  Some checks failed")
        };
        writeln!(self.out, "{verdict}")?;
        self.out.flush()?;
        Ok(tally)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
