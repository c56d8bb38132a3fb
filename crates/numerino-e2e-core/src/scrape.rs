// crates/numerino-e2e-core/src/scrape.rs
// ============================================================================
// Module: Phase Output Scraper
// Description: Recovers pass/fail counts from a phase's console output.
// Purpose: Let the runner aggregate results from independent processes.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Phases print a summary block (see [`crate::report`]). The runner only sees
//! their text output, so counts are recovered by pattern matching:
//!
//! 1. The last `Total Tests: N`, `Passed: N`, and `Failed: N` values win.
//! 2. When result markers are present, `passed` is raised to the number of
//!    `✅` glyphs and `failed` to the number of lines matching `❌.*FAIL`.
//! 3. A zero total with non-zero outcomes becomes `passed + failed`.
//!
//! ANSI color sequences are stripped first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;

use crate::report::PhaseTally;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Compiled scraping patterns.
struct Patterns {
    /// ANSI SGR escape sequences.
    ansi: Regex,
    /// `Total Tests: N`.
    total: Regex,
    /// `Passed: N`.
    passed: Regex,
    /// `Failed: N`.
    failed: Regex,
    /// A failing result line.
    fail_line: Regex,
}

/// Returns the lazily compiled patterns, or `None` if compilation failed.
fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                ansi: Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").ok()?,
                total: Regex::new(r"Total Tests:\s*(\d+)").ok()?,
                passed: Regex::new(r"Passed:\s*(\d+)").ok()?,
                failed: Regex::new(r"Failed:\s*(\d+)").ok()?,
                fail_line: Regex::new(r"❌.*FAIL").ok()?,
            })
        })
        .as_ref()
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Extracts pass/fail counts from phase output.
#[must_use]
pub fn parse_phase_output(output: &str) -> PhaseTally {
    let Some(patterns) = patterns() else {
        return PhaseTally::default();
    };
    let text = patterns.ansi.replace_all(output, "");
    let mut tally = PhaseTally {
        total: last_count(&patterns.total, &text),
        passed: last_count(&patterns.passed, &text),
        failed: last_count(&patterns.failed, &text),
    };

    if text.lines().any(|line| line.contains("✅ PASS") || line.contains("PASS:")) {
        let glyphs = u32::try_from(text.matches('✅').count()).unwrap_or(u32::MAX);
        tally.passed = tally.passed.max(glyphs);
    }
    if text.lines().any(|line| line.contains("❌ FAIL") || line.contains("FAIL:")) {
        let lines = text.lines().filter(|line| patterns.fail_line.is_match(line)).count();
        tally.failed = tally.failed.max(u32::try_from(lines).unwrap_or(u32::MAX));
    }
    if tally.total == 0 {
        tally.total = tally.passed.saturating_add(tally.failed);
    }
    tally
}

/// Returns the last captured count for `pattern`, or zero.
fn last_count(pattern: &Regex, text: &str) -> u32 {
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1)?.as_str().parse().ok())
        .last()
        .unwrap_or(0)
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

    use proptest::prelude::*;

    use super::parse_phase_output;
    use crate::report::PhaseTally;

    #[test]
    fn summary_block_wins() {
        let output = "✅ PASS - a\n✅ PASS - b\n❌ FAIL - c\nTotal Tests: 3\nPassed: 2\nFailed: 1\n";
        assert_eq!(parse_phase_output(output), PhaseTally {
            total: 3,
            passed: 2,
            failed: 1
        });
    }

    #[test]
    fn colored_summary_is_parsed() {
        let output = "\x1b[32mPassed: 4\x1b[0m\n\x1b[31mFailed: 0\x1b[0m\nTotal Tests: 4\n";
        assert_eq!(parse_phase_output(output), PhaseTally {
            total: 4,
            passed: 4,
            failed: 0
        });
    }

    #[test]
    fn markers_raise_counts_without_summary() {
        let output = "\x1b[32m✅ PASS\x1b[0m - one\n✅ PASS - two\n\x1b[31m❌ FAIL\x1b[0m - three\n";
        assert_eq!(parse_phase_output(output), PhaseTally {
            total: 3,
            passed: 2,
            failed: 1
        });
    }

    #[test]
    fn last_summary_wins_when_repeated() {
        let output = "Total Tests: 1\nPassed: 1\nFailed: 0\nTotal Tests: 5\nPassed: 3\nFailed: 2\n";
        assert_eq!(parse_phase_output(output), PhaseTally {
            total: 5,
            passed: 3,
            failed: 2
        });
    }

    #[test]
    fn silent_output_yields_zero() {
        assert_eq!(parse_phase_output("connection refused\n"), PhaseTally::default());
    }

    proptest! {
        #[test]
        fn arbitrary_output_never_undercounts_total(output in ".{0,400}") {
            let tally = parse_phase_output(&output);
            if tally.total == 0 {
                prop_assert_eq!(tally.passed.saturating_add(tally.failed), 0);
            }
        }

        #[test]
        fn rendered_summary_round_trips(passed in 0u32..500, failed in 0u32..500) {
            let total = passed + failed;
            let output = format!("Total Tests: {total}\nPassed: {passed}\nFailed: {failed}\n");
            prop_assert_eq!(parse_phase_output(&output), PhaseTally { total, passed, failed });
        }
    }
}
