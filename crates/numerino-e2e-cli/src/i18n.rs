// crates/numerino-e2e-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings in English and Spanish.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! Orchestrator and utility output is routed through the [`t!`](crate::t)
//! macro. Phase reports are not: check names, markers, and the summary block
//! stay in English because the runner scrapes them.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_', '.']).next().unwrap_or("") {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Es];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces (for example, `path`).
    pub key: &'static str,
    /// Preformatted value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("client.init_failed", "Failed to build the HTTP client: {error}"),
    ("phase.failed", "Phase {phase} stopped: {error}"),
    ("data.show.failed", "Failed to render shared test data: {error}"),
    ("data.reset.ok", "Shared test data reset at {path}"),
    ("data.reset.failed", "Failed to reset shared test data: {error}"),
    ("run.header", "NUMERINO E2E TEST SUITE"),
    ("run.target", "Target: {target}"),
    ("run.id", "Test run id: {id}"),
    ("run.init_failed", "Failed to initialize shared test data: {error}"),
    ("run.exe_failed", "Failed to locate the harness executable: {error}"),
    ("run.phase.start", "[{index}/{count}] {title} ({requirement})"),
    ("run.phase.required", "required"),
    ("run.phase.optional", "optional"),
    ("run.phase.passed", "{title} completed in {duration}s"),
    ("run.phase.failed", "{title} failed with exit code {code} after {duration}s"),
    ("run.phase.timeout", "{title} timed out after {duration}s"),
    ("run.phase.continue", "Optional phase failed; continuing with the next phase."),
    ("run.aborted.required", "Required phase {title} failed; stopping the run."),
    ("run.aborted.timeout", "Phase {title} timed out; stopping the run."),
    ("run.aborted.launch", "Could not launch {title}: {error}"),
    ("summary.header", "FINAL SUMMARY"),
    ("summary.total", "Total checks: {count}"),
    ("summary.passed", "Passed: {count}"),
    ("summary.failed", "Failed: {count}"),
    ("summary.rate", "Success rate: {rate}%"),
    ("summary.duration", "Total time: {duration}s"),
    ("summary.phases", "Phases:"),
    ("summary.phase_line", "{marker} {title}: {passed}/{total} passed in {duration}s"),
    ("summary.phase_timeout", "{marker} {title}: timed out after {duration}s"),
    ("summary.created", "Created data:"),
    ("summary.institution", "Institution: {id}"),
    ("summary.teacher", "Teacher: {id}"),
    ("summary.guardian", "Guardian: {id}"),
    ("summary.student", "Student: {id}"),
    ("summary.none", "none"),
    ("summary.aborted", "Run aborted by phase {phase}."),
    ("summary.result.pass", "All phases passed."),
    ("summary.result.fail", "Some checks or phases failed."),
    ("artifacts.written", "Artifacts written to {path}"),
    ("artifacts.failed", "Failed to write artifacts: {error}"),
    ("token.failed", "Login failed for {identifier}: {error}"),
    ("token.header", "Bearer token for {identifier}:"),
    ("token.refresh", "Refresh token: {token}"),
    ("token.expires", "Expires in: {seconds}s"),
    ("token.usage", "Usage examples:"),
    ("token.profile.ok", "Profile check: status {status}"),
    ("token.profile.failed", "Profile check failed: status {status}"),
    ("endpoints.header", "Endpoints under {base}:"),
    ("endpoints.entry", "- [{namespace}] {name}: {url}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'es'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be inaccurate.",
    ),
];

/// Spanish catalog.
const CATALOG_ES: &[(&str, &str)] = &[
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "salida"),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("config.load_failed", "No se pudo cargar la configuración: {error}"),
    ("client.init_failed", "No se pudo crear el cliente HTTP: {error}"),
    ("phase.failed", "La fase {phase} se detuvo: {error}"),
    ("data.show.failed", "No se pudieron mostrar los datos compartidos: {error}"),
    ("data.reset.ok", "Datos compartidos reiniciados en {path}"),
    ("data.reset.failed", "No se pudieron reiniciar los datos compartidos: {error}"),
    ("run.header", "SUITE DE PRUEBAS E2E DE NUMERINO"),
    ("run.target", "Destino: {target}"),
    ("run.id", "Id de ejecución: {id}"),
    ("run.init_failed", "No se pudieron inicializar los datos compartidos: {error}"),
    ("run.exe_failed", "No se pudo localizar el ejecutable del arnés: {error}"),
    ("run.phase.start", "[{index}/{count}] {title} ({requirement})"),
    ("run.phase.required", "obligatoria"),
    ("run.phase.optional", "opcional"),
    ("run.phase.passed", "{title} completada en {duration}s"),
    ("run.phase.failed", "{title} falló con código {code} tras {duration}s"),
    ("run.phase.timeout", "{title} excedió el tiempo límite tras {duration}s"),
    ("run.phase.continue", "Falló una fase opcional; se continúa con la siguiente."),
    ("run.aborted.required", "Falló la fase obligatoria {title}; se detiene la ejecución."),
    ("run.aborted.timeout", "La fase {title} excedió el tiempo límite; se detiene la ejecución."),
    ("run.aborted.launch", "No se pudo iniciar {title}: {error}"),
    ("summary.header", "RESUMEN FINAL"),
    ("summary.total", "Comprobaciones totales: {count}"),
    ("summary.passed", "Aprobadas: {count}"),
    ("summary.failed", "Fallidas: {count}"),
    ("summary.rate", "Tasa de éxito: {rate}%"),
    ("summary.duration", "Tiempo total: {duration}s"),
    ("summary.phases", "Fases:"),
    ("summary.phase_line", "{marker} {title}: {passed}/{total} aprobadas en {duration}s"),
    ("summary.phase_timeout", "{marker} {title}: tiempo agotado tras {duration}s"),
    ("summary.created", "Datos creados:"),
    ("summary.institution", "Institución: {id}"),
    ("summary.teacher", "Docente: {id}"),
    ("summary.guardian", "Tutor: {id}"),
    ("summary.student", "Estudiante: {id}"),
    ("summary.none", "ninguno"),
    ("summary.aborted", "Ejecución detenida por la fase {phase}."),
    ("summary.result.pass", "Todas las fases aprobaron."),
    ("summary.result.fail", "Algunas comprobaciones o fases fallaron."),
    ("artifacts.written", "Artefactos escritos en {path}"),
    ("artifacts.failed", "No se pudieron escribir los artefactos: {error}"),
    ("token.failed", "Falló el inicio de sesión de {identifier}: {error}"),
    ("token.header", "Token bearer de {identifier}:"),
    ("token.refresh", "Token de refresco: {token}"),
    ("token.expires", "Expira en: {seconds}s"),
    ("token.usage", "Ejemplos de uso:"),
    ("token.profile.ok", "Comprobación de perfil: estado {status}"),
    ("token.profile.failed", "Falló la comprobación de perfil: estado {status}"),
    ("endpoints.header", "Endpoints bajo {base}:"),
    ("endpoints.entry", "- [{namespace}] {name}: {url}"),
    ("i18n.lang.invalid_env", "Valor no válido para {env}: {value}. Se esperaba 'en' o 'es'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la salida que no está en inglés se tradujo automáticamente y puede ser inexacta.",
    ),
];

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

/// Returns the catalog keys for `locale`, in declaration order.
#[must_use]
pub fn catalog_keys(locale: Locale) -> Vec<&'static str> {
    let catalog = match locale {
        Locale::En => CATALOG_EN,
        Locale::Es => CATALOG_ES,
    };
    catalog.iter().map(|(key, _)| *key).collect()
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` in the current locale.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` in `locale` while substituting `args`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
