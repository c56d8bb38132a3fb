// crates/numerino-e2e-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and console rendering.
// Purpose: Ensure flags map onto harness types and summaries render stably.
// Dependencies: numerino-e2e-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap parsing, locale resolution, token credential selection,
//! and the final summary and endpoint listings.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use numerino_e2e_cli::i18n::Locale;
use numerino_e2e_config::AccountsConfig;
use numerino_e2e_core::Palette;
use numerino_e2e_core::PhaseKind;
use numerino_e2e_core::PhaseOutcome;
use numerino_e2e_core::PhaseTally;
use numerino_e2e_core::RunReport;
use numerino_e2e_core::SharedTestData;
use numerino_e2e_core::auth::LoginId;

use super::Cli;
use super::ColorArg;
use super::Commands;
use super::DataCommand;
use super::LangArg;
use super::PhaseArg;
use super::TokenCommand;
use super::endpoint_lines;
use super::resolve_locale;
use super::summary_lines;
use super::token_credentials;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a command line, panicking on clap errors.
fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("numerino-e2e").chain(args.iter().copied())).unwrap()
}

/// Token flags with nothing set.
const fn empty_token() -> TokenCommand {
    TokenCommand {
        email: None,
        password: None,
        username: None,
        teacher: false,
    }
}

/// Outcome for a phase that ran to completion.
fn outcome(title: &str, success: bool, passed: u32, failed: u32) -> PhaseOutcome {
    PhaseOutcome {
        key: title.to_lowercase(),
        title: title.to_string(),
        required: true,
        success,
        timed_out: false,
        exit_code: Some(i32::from(!success)),
        duration_ms: 1_250,
        tally: PhaseTally {
            total: passed + failed,
            passed,
            failed,
        },
        stdout: String::new(),
        stderr: String::new(),
    }
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn no_subcommand_runs_everything() {
    let cli = parse(&[]);
    assert!(cli.command.is_none());
    assert!(!cli.cleanup);
    assert_eq!(cli.color, ColorArg::Auto);
}

#[test]
fn global_flags_follow_subcommands() {
    let cli = parse(&["phase", "users-auth", "--color", "never", "--config", "e2e.toml"]);
    assert_eq!(cli.color, ColorArg::Never);
    assert_eq!(cli.config.unwrap().to_str(), Some("e2e.toml"));
    match cli.command {
        Some(Commands::Phase(command)) => {
            assert_eq!(command.phase, PhaseArg::UsersAuth);
            assert_eq!(PhaseKind::from(command.phase), PhaseKind::UsersAuth);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn phase_switches_parse() {
    let cli = parse(&["phase", "health", "--health-only"]);
    let Some(Commands::Phase(command)) = cli.command else {
        panic!("expected phase command");
    };
    assert!(command.health_only);
    assert!(!command.full);

    let cli = parse(&["phase", "authentication", "--full"]);
    let Some(Commands::Phase(command)) = cli.command else {
        panic!("expected phase command");
    };
    assert!(command.full);
}

#[test]
fn unknown_phase_is_rejected() {
    let result = Cli::try_parse_from(["numerino-e2e", "phase", "grades"]);
    assert!(result.is_err());
}

#[test]
fn token_email_requires_password() {
    let result = Cli::try_parse_from(["numerino-e2e", "token", "--email", "a@example.com"]);
    assert!(result.is_err());
}

#[test]
fn token_email_conflicts_with_username() {
    let result = Cli::try_parse_from([
        "numerino-e2e",
        "token",
        "--email",
        "a@example.com",
        "--password",
        "pw",
        "--username",
        "ana",
    ]);
    assert!(result.is_err());
}

#[test]
fn data_and_cleanup_parse() {
    let cli = parse(&["data", "reset"]);
    assert!(matches!(
        cli.command,
        Some(Commands::Data {
            command: DataCommand::Reset
        })
    ));
    let cli = parse(&["--cleanup"]);
    assert!(cli.cleanup);
}

// ============================================================================
// SECTION: Locale
// ============================================================================

#[test]
fn locale_flag_wins_over_environment() {
    let locale = resolve_locale(Some(LangArg::En), Some("es")).unwrap();
    assert_eq!(locale, Locale::En);
}

#[test]
fn locale_reads_environment_tags() {
    assert_eq!(resolve_locale(None, Some("es_MX.UTF-8")).unwrap(), Locale::Es);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
}

#[test]
fn invalid_environment_locale_is_an_error() {
    let err = resolve_locale(None, Some("klingon")).unwrap_err();
    assert!(err.to_string().contains("NUMERINO_E2E_LANG"));
    assert!(err.to_string().contains("klingon"));
}

// ============================================================================
// SECTION: Token Credentials
// ============================================================================

#[test]
fn token_defaults_to_student_fixture() {
    let accounts = AccountsConfig::default();
    let credentials = token_credentials(&empty_token(), &accounts);
    assert_eq!(credentials.id, LoginId::Email(accounts.student.email.clone()));
    assert_eq!(credentials.password, accounts.student.password);
}

#[test]
fn token_teacher_flag_uses_teacher_fixture() {
    let accounts = AccountsConfig::default();
    let command = TokenCommand {
        teacher: true,
        ..empty_token()
    };
    let credentials = token_credentials(&command, &accounts);
    assert_eq!(credentials.id, LoginId::Email(accounts.teacher.email.clone()));
}

#[test]
fn token_username_borrows_fixture_password() {
    let accounts = AccountsConfig::default();
    let command = TokenCommand {
        username: Some("ana.student".to_string()),
        ..empty_token()
    };
    let credentials = token_credentials(&command, &accounts);
    assert_eq!(credentials.id, LoginId::StudentUsername("ana.student".to_string()));
    assert_eq!(credentials.password, accounts.student.password);
}

#[test]
fn token_email_uses_given_password() {
    let command = TokenCommand {
        email: Some("ana@example.com".to_string()),
        password: Some("secret".to_string()),
        ..empty_token()
    };
    let credentials = token_credentials(&command, &AccountsConfig::default());
    assert_eq!(credentials.identifier(), "ana@example.com");
    assert_eq!(credentials.password, "secret");
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

#[test]
fn summary_lists_phases_and_created_ids() {
    let phases = vec![outcome("Health", true, 5, 0), outcome("Users", false, 3, 1)];
    let report = RunReport {
        totals: PhaseTally {
            total: 9,
            passed: 8,
            failed: 1,
        },
        phases,
        aborted_by: None,
        duration_ms: 2_500,
    };
    let mut data = SharedTestData::with_fallback(3);
    data.teacher_id = Some(12);

    let text = summary_lines(&report, &data, Palette::new(false)).join("\n");

    assert!(text.contains("Total checks: 9"));
    assert!(text.contains("Success rate: 88.89%"));
    assert!(text.contains("✅ Health: 5/5 passed in 1.25s"));
    assert!(text.contains("❌ Users: 3/4 passed in 1.25s"));
    assert!(text.contains("Institution: 3"));
    assert!(text.contains("Teacher: 12"));
    assert!(text.contains("Student: none"));
    assert!(text.ends_with("Some checks or phases failed."));
}

#[test]
fn summary_reports_timeouts_and_aborts() {
    let mut timed_out = outcome("Registration", false, 0, 0);
    timed_out.timed_out = true;
    timed_out.exit_code = None;
    let report = RunReport {
        totals: PhaseTally::default(),
        phases: vec![timed_out],
        aborted_by: Some("registration".to_string()),
        duration_ms: 1_250,
    };

    let lines = summary_lines(&report, &SharedTestData::with_fallback(1), Palette::new(false));

    assert!(lines.iter().any(|line| line.contains("❌ Registration: timed out after 1.25s")));
    assert!(lines.iter().any(|line| line == "Run aborted by phase registration."));
}

#[test]
fn endpoint_listing_resolves_urls() {
    let lines = endpoint_lines("http://localhost:8080/api");
    assert_eq!(lines[0], "Endpoints under http://localhost:8080/api:");
    let health = "- [auth] AuthHealth: http://localhost:8080/api/auth/health";
    assert!(lines.iter().any(|line| line == health));
    assert!(lines.iter().any(|line| line.ends_with("/api/users/{id}/profile-picture")));
}
