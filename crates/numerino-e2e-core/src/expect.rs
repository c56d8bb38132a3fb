// crates/numerino-e2e-core/src/expect.rs
// ============================================================================
// Module: Status Expectations
// Description: Acceptable HTTP status sets for a single check.
// Purpose: Compare observed status codes and render expectations for humans.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A check passes when the observed status is in its [`ExpectedStatus`] set.
//! Status `0` stands for a transport failure and never matches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Set of acceptable HTTP status codes.
///
/// # Invariants
/// - An empty set means "any HTTP response"; it still rejects status `0`.
/// - Codes keep declaration order for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedStatus {
    /// Accepted codes.
    codes: Vec<u16>,
}

impl ExpectedStatus {
    /// Accepts exactly one status.
    #[must_use]
    pub fn one(code: u16) -> Self {
        Self {
            codes: vec![code],
        }
    }

    /// Accepts any of the listed statuses.
    #[must_use]
    pub fn any_of(codes: &[u16]) -> Self {
        let mut unique = Vec::with_capacity(codes.len());
        for code in codes {
            if !unique.contains(code) {
                unique.push(*code);
            }
        }
        Self {
            codes: unique,
        }
    }

    /// Accepts any status the server actually returned.
    #[must_use]
    pub const fn any_response() -> Self {
        Self {
            codes: Vec::new(),
        }
    }

    /// Accepts any 2xx status.
    #[must_use]
    pub fn success() -> Self {
        Self::any_of(&[200, 201, 202, 204])
    }

    /// Returns the accepted codes.
    #[must_use]
    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    /// Returns true when `status` satisfies the expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        if status == 0 {
            return false;
        }
        self.codes.is_empty() || self.codes.contains(&status)
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codes.as_slice() {
            [] => f.write_str("any HTTP response"),
            [only] => write!(f, "{only}"),
            [head @ .., last] => {
                let head = head.iter().map(u16::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "{head} or {last}")
            }
        }
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
        clippy::use_debug,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::ExpectedStatus;

    #[test]
    fn display_reads_like_prose() {
        assert_eq!(ExpectedStatus::one(200).to_string(), "200");
        assert_eq!(ExpectedStatus::any_of(&[200, 404]).to_string(), "200 or 404");
        assert_eq!(ExpectedStatus::any_of(&[200, 201, 400]).to_string(), "200, 201 or 400");
        assert_eq!(ExpectedStatus::any_response().to_string(), "any HTTP response");
    }

    #[test]
    fn transport_failures_never_match() {
        assert!(!ExpectedStatus::any_response().matches(0));
        assert!(!ExpectedStatus::any_of(&[0, 200]).matches(0));
        assert!(ExpectedStatus::any_response().matches(503));
    }

    #[test]
    fn any_of_deduplicates() {
        assert_eq!(ExpectedStatus::any_of(&[401, 401, 404]).codes(), &[401, 404]);
        assert!(ExpectedStatus::any_of(&[401, 404]).matches(404));
        assert!(!ExpectedStatus::any_of(&[401, 404]).matches(200));
    }
}
