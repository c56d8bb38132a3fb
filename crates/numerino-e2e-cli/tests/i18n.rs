// crates/numerino-e2e-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalogs and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable i18n helpers.
// Dependencies: numerino-e2e-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the harness CLI i18n catalog behavior:
//! - Message arguments capture key/value substitutions.
//! - Translation falls back to English, then to the key.
//! - Both catalogs carry the same keys.

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

use std::collections::BTreeSet;

use numerino_e2e_cli::i18n::Locale;
use numerino_e2e_cli::i18n::MessageArg;
use numerino_e2e_cli::i18n::SUPPORTED_LOCALES;
use numerino_e2e_cli::i18n::catalog_keys;
use numerino_e2e_cli::i18n::translate;
use numerino_e2e_cli::i18n::translate_in;
use numerino_e2e_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms message arguments capture key/value pairs.
#[test]
fn message_arg_new_captures_key_and_value() {
    let arg = MessageArg::new("path", "/tmp/shared.json");
    assert_eq!(arg.key, "path");
    assert_eq!(arg.value, "/tmp/shared.json");
}

/// Confirms catalog entries resolve and replace placeholders.
#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("path", "/tmp/shared.json")];
    let result = translate("data.reset.ok", args);
    assert_eq!(result, "Shared test data reset at /tmp/shared.json");
}

/// Confirms missing keys fall back to the key string.
#[test]
fn translate_falls_back_to_key() {
    let result = translate("missing.key", Vec::new());
    assert_eq!(result, "missing.key");
}

/// Confirms the t! macro formats named arguments.
#[test]
fn t_macro_formats_message() {
    let rendered = t!("run.phase.start", index = 2, count = 5, title = "Users", requirement = "x");
    assert_eq!(rendered, "[2/5] Users (x)");
}

/// Confirms Spanish lookups substitute the same placeholders.
#[test]
fn translate_in_spanish() {
    let args = vec![MessageArg::new("target", "http://localhost:8080/api")];
    let result = translate_in(Locale::Es, "run.target", args);
    assert_eq!(result, "Destino: http://localhost:8080/api");
}

/// Confirms both catalogs define the same keys.
#[test]
fn catalogs_share_keys() {
    let english: BTreeSet<_> = catalog_keys(Locale::En).into_iter().collect();
    let spanish: BTreeSet<_> = catalog_keys(Locale::Es).into_iter().collect();
    let missing: Vec<_> = english.difference(&spanish).collect();
    let extra: Vec<_> = spanish.difference(&english).collect();
    assert!(missing.is_empty(), "keys missing from es: {missing:?}");
    assert!(extra.is_empty(), "keys only in es: {extra:?}");
    assert_eq!(SUPPORTED_LOCALES.len(), 2);
}

/// Confirms locale tags normalize case and region suffixes.
#[test]
fn locale_parse_accepts_region_tags() {
    assert_eq!(Locale::parse("es-MX"), Some(Locale::Es));
    assert_eq!(Locale::parse("EN_us"), Some(Locale::En));
    assert_eq!(Locale::parse(" es.UTF-8 "), Some(Locale::Es));
    assert_eq!(Locale::parse("fr"), None);
    assert_eq!(Locale::as_str(Locale::Es), "es");
}
