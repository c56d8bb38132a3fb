// crates/numerino-e2e-cli/src/main.rs
// ============================================================================
// Module: Numerino E2E CLI Entry Point
// Description: Command dispatcher for the end-to-end harness.
// Purpose: Run the full phase sequence, single phases, and helper utilities.
// Dependencies: clap, numerino-e2e-config, numerino-e2e-core, thiserror, tokio
// ============================================================================

//! ## Overview
//! Without a subcommand the binary runs every phase in order. It re-invokes
//! itself with `phase <key>` for each one so a crashing or hanging phase
//! cannot take the orchestrator down with it. The helper subcommands cover
//! bearer tokens, shared test data, and the endpoint table.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use numerino_e2e_cli::i18n::Locale;
use numerino_e2e_cli::i18n::set_locale;
use numerino_e2e_cli::t;
use numerino_e2e_config::AccountsConfig;
use numerino_e2e_config::E2eConfig;
use numerino_e2e_core::ApiClient;
use numerino_e2e_core::ApiRequest;
use numerino_e2e_core::ColorMode;
use numerino_e2e_core::Endpoint;
use numerino_e2e_core::LoggingConfig;
use numerino_e2e_core::PHASE_SEQUENCE;
use numerino_e2e_core::Palette;
use numerino_e2e_core::PhaseContext;
use numerino_e2e_core::PhaseKind;
use numerino_e2e_core::PhaseOptions;
use numerino_e2e_core::PhaseOutcome;
use numerino_e2e_core::PhaseSpec;
use numerino_e2e_core::ProcessLauncher;
use numerino_e2e_core::RunArtifacts;
use numerino_e2e_core::RunObserver;
use numerino_e2e_core::RunOptions;
use numerino_e2e_core::RunReport;
use numerino_e2e_core::RunSummary;
use numerino_e2e_core::SharedDataStore;
use numerino_e2e_core::SharedTestData;
use numerino_e2e_core::auth::Credentials;
use numerino_e2e_core::auth::Role;
use numerino_e2e_core::auth::fixture_credentials;
use numerino_e2e_core::auth::login;
use numerino_e2e_core::auth::token_usage_examples;
use numerino_e2e_core::init_logging;
use numerino_e2e_core::report::Color;
use numerino_e2e_core::report::rate_color;
use numerino_e2e_core::runner::AbortReason;
use numerino_e2e_core::run_phase;
use numerino_e2e_core::run_sequence;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "NUMERINO_E2E_LANG";
/// Width of the orchestrator banners.
const RULE_WIDTH: usize = 60;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "numerino-e2e", about = "End-to-end HTTP test harness for the Numerino API")]
struct Cli {
    /// Config file (overrides `NUMERINO_E2E_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Preferred output language (overrides `NUMERINO_E2E_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Terminal color mode.
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorArg::Auto, global = true)]
    color: ColorArg,
    /// Reset shared test data and exit.
    #[arg(long)]
    cleanup: bool,
    /// Selected subcommand; runs every phase when absent.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single test phase.
    Phase(PhaseCommand),
    /// Log in and print a bearer token with usage examples.
    Token(TokenCommand),
    /// Inspect or reset shared test data.
    Data {
        /// Selected data subcommand.
        #[command(subcommand)]
        command: DataCommand,
    },
    /// List backend endpoints with resolved URLs.
    Endpoints,
}

/// Arguments for `phase`.
#[derive(Args, Debug)]
struct PhaseCommand {
    /// Phase to run.
    #[arg(value_enum)]
    phase: PhaseArg,
    /// Health phase: skip the extra reachability check.
    #[arg(long)]
    health_only: bool,
    /// Authentication phase: run the health checks first.
    #[arg(long)]
    full: bool,
}

/// Arguments for `token`.
#[derive(Args, Debug)]
struct TokenCommand {
    /// Log in with this email.
    #[arg(long, value_name = "EMAIL", conflicts_with = "username", requires = "password")]
    email: Option<String>,
    /// Password for `--email` or `--username`.
    #[arg(long, value_name = "PASSWORD")]
    password: Option<String>,
    /// Log in as a student with this username.
    #[arg(long, value_name = "USERNAME")]
    username: Option<String>,
    /// Use the teacher fixture account.
    #[arg(long, conflicts_with_all = ["email", "username"])]
    teacher: bool,
}

/// Shared data subcommands.
#[derive(Subcommand, Debug)]
enum DataCommand {
    /// Print shared test data.
    Show,
    /// Reset shared test data.
    Reset,
}

/// Phase selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum PhaseArg {
    /// Health and connectivity.
    Health,
    /// Institution setup.
    Institutions,
    /// User registration.
    Registration,
    /// User management.
    Users,
    /// Authenticated user management.
    UsersAuth,
    /// Authentication.
    Authentication,
}

impl From<PhaseArg> for PhaseKind {
    fn from(value: PhaseArg) -> Self {
        match value {
            PhaseArg::Health => Self::Health,
            PhaseArg::Institutions => Self::Institutions,
            PhaseArg::Registration => Self::Registration,
            PhaseArg::Users => Self::Users,
            PhaseArg::UsersAuth => Self::UsersAuth,
            PhaseArg::Authentication => Self::Authentication,
        }
    }
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Spanish.
    Es,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Es => Self::Es,
        }
    }
}

/// Color selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorArg {
    /// Color when stdout is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl From<ColorArg> for ColorMode {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone)]
struct GlobalOptions {
    /// Explicit config path.
    config: Option<PathBuf>,
    /// Resolved locale.
    locale: Locale,
    /// Requested color mode.
    color: ColorMode,
}

impl GlobalOptions {
    /// Returns the palette for this process's stdout.
    fn palette(&self) -> Palette {
        Palette::for_mode(self.color)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    let is_phase = matches!(cli.command, Some(Commands::Phase(_)));
    if locale != Locale::En && !is_phase {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let global = GlobalOptions {
        config: cli.config,
        locale,
        color: cli.color.into(),
    };

    if cli.cleanup {
        return command_data(&global, &DataCommand::Reset);
    }
    match cli.command {
        None => command_run(&global).await,
        Some(Commands::Phase(command)) => command_phase(&global, &command).await,
        Some(Commands::Token(command)) => command_token(&global, &command).await,
        Some(Commands::Data {
            command,
        }) => command_data(&global, &command),
        Some(Commands::Endpoints) => command_endpoints(&global),
    }
}

/// Loads the config and installs logging.
fn load_config(global: &GlobalOptions) -> CliResult<E2eConfig> {
    let config = E2eConfig::load(global.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    init_logging(&LoggingConfig::from(&config.output));
    Ok(config)
}

/// Opens the shared data store named by `config`.
fn open_store(config: &E2eConfig) -> SharedDataStore {
    SharedDataStore::open(&config.data.data_file, config.data.fallback_institution_id)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Runs every phase and prints the final summary.
async fn command_run(global: &GlobalOptions) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let palette = global.palette();
    let mut store = open_store(&config);
    let run_id = store
        .initialize_run()
        .map_err(|err| CliError::new(t!("run.init_failed", error = err)))?;
    let rule = "=".repeat(RULE_WIDTH);
    stdout_lines(&[
        palette.paint(Color::Cyan, &rule),
        palette.paint(Color::Bold, &t!("run.header")),
        t!("run.target", target = config.target.api_base_url()),
        t!("run.id", id = run_id),
        palette.paint(Color::Cyan, &rule),
    ])?;

    let program = std::env::current_exe()
        .map_err(|err| CliError::new(t!("run.exe_failed", error = err)))?;
    let launcher = ProcessLauncher::new(program)
        .with_config(global.config.clone())
        .with_color(global.color)
        .with_lang(Some(global.locale.as_str().to_string()))
        .with_echo(true);
    let mut observer = ConsoleObserver {
        palette,
    };
    let options = RunOptions::from_config(&config.runner);
    let report = run_sequence(PHASE_SEQUENCE, &launcher, &mut observer, &options).await;
    info!(success = report.success(), duration_ms = report.duration_ms, "run finished");

    store.reload();
    stdout_lines(&summary_lines(&report, store.data(), palette))?;
    if config.output.save_artifacts {
        let summary =
            RunSummary::new(run_id, &config.target.api_base_url(), &report, store.data());
        match write_artifacts(&config.output.artifacts_dir, &summary) {
            Ok(path) => stdout_lines(&[t!("artifacts.written", path = path.display())])?,
            Err(message) => {
                write_stderr_line(&t!("artifacts.failed", error = message))
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
        }
    }
    Ok(if report.success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Writes phase logs and summaries, returning the run directory.
fn write_artifacts(base: &Path, summary: &RunSummary) -> Result<PathBuf, String> {
    let artifacts =
        RunArtifacts::create(base, summary.test_run_id).map_err(|err| err.to_string())?;
    artifacts.write_phase_logs(&summary.phases).map_err(|err| err.to_string())?;
    artifacts.write_summary(summary).map_err(|err| err.to_string())?;
    Ok(artifacts.root().to_path_buf())
}

/// Renders orchestration progress on the console.
struct ConsoleObserver {
    /// Output colors.
    palette: Palette,
}

impl RunObserver for ConsoleObserver {
    fn phase_started(&mut self, index: usize, count: usize, spec: &PhaseSpec) {
        let requirement =
            if spec.required { t!("run.phase.required") } else { t!("run.phase.optional") };
        let line = t!(
            "run.phase.start",
            index = index + 1,
            count = count,
            title = spec.title,
            requirement = requirement
        );
        let _ = stdout_lines(&[String::new(), self.palette.paint(Color::Blue, &line)]);
    }

    fn phase_finished(&mut self, outcome: &PhaseOutcome) {
        let line = t!("run.phase.passed", title = outcome.title, duration = seconds(outcome));
        let _ = stdout_lines(&[self.palette.paint(Color::Green, &line)]);
    }

    fn phase_failed(&mut self, outcome: &PhaseOutcome) {
        let line = if outcome.timed_out {
            t!("run.phase.timeout", title = outcome.title, duration = seconds(outcome))
        } else {
            let code = outcome.exit_code.map_or_else(|| "-".to_string(), |code| code.to_string());
            t!("run.phase.failed", title = outcome.title, code = code, duration = seconds(outcome))
        };
        let mut lines = vec![self.palette.paint(Color::Red, &line)];
        if !outcome.required {
            lines.push(self.palette.paint(Color::Yellow, &t!("run.phase.continue")));
        }
        let _ = stdout_lines(&lines);
    }

    fn run_aborted(&mut self, spec: &PhaseSpec, reason: &AbortReason) {
        let line = match reason {
            AbortReason::RequiredPhaseFailed => t!("run.aborted.required", title = spec.title),
            AbortReason::PhaseTimedOut => t!("run.aborted.timeout", title = spec.title),
            AbortReason::LaunchFailed(error) => {
                t!("run.aborted.launch", title = spec.title, error = error)
            }
        };
        let _ = stdout_lines(&[self.palette.paint(Color::Red, &line)]);
    }
}

/// Formats a phase duration in seconds.
fn seconds(outcome: &PhaseOutcome) -> String {
    format!("{:.2}", Duration::from_millis(outcome.duration_ms).as_secs_f64())
}

/// Renders the final summary.
fn summary_lines(report: &RunReport, data: &SharedTestData, palette: Palette) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let totals = report.totals;
    let rate = totals.success_rate();
    let mut lines = vec![
        String::new(),
        palette.paint(Color::Cyan, &rule),
        palette.paint(Color::Bold, &t!("summary.header")),
        palette.paint(Color::Cyan, &rule),
        t!("summary.total", count = totals.total),
        palette.paint(Color::Green, &t!("summary.passed", count = totals.passed)),
        palette.paint(Color::Red, &t!("summary.failed", count = totals.failed)),
        palette.paint(rate_color(rate), &t!("summary.rate", rate = format!("{rate:.2}"))),
        t!(
            "summary.duration",
            duration = format!("{:.2}", Duration::from_millis(report.duration_ms).as_secs_f64())
        ),
        String::new(),
        t!("summary.phases"),
    ];
    for outcome in &report.phases {
        let (marker, color) =
            if outcome.success { ("✅", Color::Green) } else { ("❌", Color::Red) };
        let line = if outcome.timed_out {
            t!(
                "summary.phase_timeout",
                marker = marker,
                title = outcome.title,
                duration = seconds(outcome)
            )
        } else {
            t!(
                "summary.phase_line",
                marker = marker,
                title = outcome.title,
                passed = outcome.tally.passed,
                total = outcome.tally.total,
                duration = seconds(outcome)
            )
        };
        lines.push(format!("  {}", palette.paint(color, &line)));
    }
    lines.push(String::new());
    lines.push(t!("summary.created"));
    let id_label = |id: Option<i64>| id.map_or_else(|| t!("summary.none"), |id| id.to_string());
    lines.push(format!("  {}", t!("summary.institution", id = data.institution_id)));
    lines.push(format!("  {}", t!("summary.teacher", id = id_label(data.teacher_id))));
    lines.push(format!("  {}", t!("summary.guardian", id = id_label(data.guardian_id))));
    lines.push(format!("  {}", t!("summary.student", id = id_label(data.student_id))));
    lines.push(String::new());
    if let Some(phase) = &report.aborted_by {
        lines.push(palette.paint(Color::Red, &t!("summary.aborted", phase = phase)));
    }
    lines.push(if report.success() {
        palette.paint(Color::Green, &t!("summary.result.pass"))
    } else {
        palette.paint(Color::Red, &t!("summary.result.fail"))
    });
    lines
}

// ============================================================================
// SECTION: Phase Command
// ============================================================================

/// Runs one phase, exiting 1 when any check failed.
async fn command_phase(global: &GlobalOptions, command: &PhaseCommand) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let kind = PhaseKind::from(command.phase);
    let options = PhaseOptions {
        health_only: command.health_only,
        full: command.full,
    };
    let mut ctx = PhaseContext::new(config, std::io::stdout(), global.palette(), options)
        .map_err(|err| CliError::new(t!("phase.failed", phase = kind.as_str(), error = err)))?;
    let tally = run_phase(kind, &mut ctx)
        .await
        .map_err(|err| CliError::new(t!("phase.failed", phase = kind.as_str(), error = err)))?;
    Ok(if tally.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Token Command
// ============================================================================

/// Logs in, prints the token, and probes the profile endpoint with it.
async fn command_token(global: &GlobalOptions, command: &TokenCommand) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let palette = global.palette();
    let client = ApiClient::new(&config.target)
        .map_err(|err| CliError::new(t!("client.init_failed", error = err)))?;
    let credentials = token_credentials(command, &config.accounts);
    let session = login(&client, &credentials).await.map_err(|err| {
        CliError::new(t!("token.failed", identifier = credentials.identifier(), error = err))
    })?;

    let mut lines = vec![
        palette.paint(Color::Bold, &t!("token.header", identifier = credentials.identifier())),
        session.access_token.clone(),
    ];
    if let Some(refresh) = &session.refresh_token {
        lines.push(t!("token.refresh", token = refresh));
    }
    if let Some(seconds) = session.expires_in {
        lines.push(t!("token.expires", seconds = seconds));
    }
    lines.push(String::new());
    lines.push(t!("token.usage"));
    lines.extend(token_usage_examples(client.api_base(), &session.access_token));
    stdout_lines(&lines)?;

    let probe = ApiRequest::get(Endpoint::UserProfile.path()).bearer(session.access_token.clone());
    let response = client.send(&probe).await;
    if response.is_success() {
        let line = t!("token.profile.ok", status = response.status_label());
        stdout_lines(&[String::new(), palette.paint(Color::Green, &line)])?;
        Ok(ExitCode::SUCCESS)
    } else {
        let line = t!("token.profile.failed", status = response.status_label());
        stdout_lines(&[String::new(), palette.paint(Color::Red, &line)])?;
        Ok(ExitCode::FAILURE)
    }
}

/// Picks credentials from flags, falling back to fixture accounts.
fn token_credentials(command: &TokenCommand, accounts: &AccountsConfig) -> Credentials {
    let password =
        || command.password.clone().unwrap_or_else(|| accounts.student.password.clone());
    if let Some(username) = &command.username {
        return Credentials::student(username.clone(), password());
    }
    if let Some(email) = &command.email {
        return Credentials::email(email.clone(), password());
    }
    let role = if command.teacher { Role::Teacher } else { Role::Student };
    fixture_credentials(role, accounts)
}

// ============================================================================
// SECTION: Data Command
// ============================================================================

/// Shows or resets shared test data.
fn command_data(global: &GlobalOptions, command: &DataCommand) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let mut store = open_store(&config);
    match command {
        DataCommand::Show => {
            let rendered = store
                .render()
                .map_err(|err| CliError::new(t!("data.show.failed", error = err)))?;
            stdout_lines(&[rendered])?;
        }
        DataCommand::Reset => {
            store.cleanup().map_err(|err| CliError::new(t!("data.reset.failed", error = err)))?;
            stdout_lines(&[t!("data.reset.ok", path = store.path().display())])?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Endpoints Command
// ============================================================================

/// Prints every endpoint with its resolved URL.
fn command_endpoints(global: &GlobalOptions) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    stdout_lines(&endpoint_lines(&config.target.api_base_url()))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the endpoint table under `api_base`.
fn endpoint_lines(api_base: &str) -> Vec<String> {
    let mut lines = vec![t!("endpoints.header", base = api_base)];
    lines.extend(Endpoint::ALL.iter().map(|endpoint| {
        t!(
            "endpoints.entry",
            namespace = endpoint.namespace().as_str(),
            name = endpoint.name(),
            url = format!("{api_base}{}", endpoint.path())
        )
    }));
    lines
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Resolves the locale from the flag, then the environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes lines to stdout.
fn stdout_lines(lines: &[String]) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        writeln!(&mut stdout, "{line}")
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    stdout.flush().map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
