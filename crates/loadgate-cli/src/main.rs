// crates/loadgate-cli/src/main.rs
// ============================================================================
// Module: Load Gate CLI Entry Point
// Description: Command dispatcher for the Load Gate build-quality gate.
// Purpose: Run gates, inspect credentials and tests, and validate configuration.
// Dependencies: clap, loadgate-core, loadgate-client, loadgate-config, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The Load Gate CLI wires the configuration, the HTTP metrics client, the
//! configured credentials, and the JSON-lines sinks into the core gate runner.
//! `loadgate run` exits with the verdict's exit code so CI pipelines can gate
//! on it directly. Ctrl-C cancels an in-flight gate, which then records a
//! `NotBuilt` verdict instead of being killed mid-poll.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use loadgate_client::HttpMetricsClient;
use loadgate_config::LoadGateConfig;
use loadgate_core::ApiKeyCredential;
use loadgate_core::CancellationToken;
use loadgate_core::ClientError;
use loadgate_core::Credential;
use loadgate_core::CredentialResolver;
use loadgate_core::GateEvent;
use loadgate_core::GateLog;
use loadgate_core::GateRunner;
use loadgate_core::GateStage;
use loadgate_core::JsonLinesGateLog;
use loadgate_core::JsonLinesVerdictRecorder;
use loadgate_core::LogLevel;
use loadgate_core::MetricsClient;
use loadgate_core::ThreadSleeper;
use loadgate_core::Verdict;
use loadgate_core::VerdictRecord;
use loadgate_core::VerdictRecorder;
use loadgate_core::display_label;
use loadgate_core::unique_credentials;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "loadgate", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `LOADGATE_CONFIG`, then loadgate.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a load test and gate the build on its summary metrics.
    Run(RunCommand),
    /// Remote test utilities.
    Tests {
        /// Selected tests subcommand.
        #[command(subcommand)]
        command: TestsCommand,
    },
    /// Credential store utilities.
    Credentials {
        /// Selected credentials subcommand.
        #[command(subcommand)]
        command: CredentialsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for a gate run.
#[derive(Args, Debug)]
struct RunCommand {
    /// Test identifier (overrides `gate.test_id`).
    #[arg(long, value_name = "ID")]
    test_id: Option<String>,
    /// Credential identifier (overrides `gate.api_key_id`).
    #[arg(long, value_name = "ID")]
    api_key_id: Option<String>,
    /// Append the verdict record to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,
    /// Append the event log to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

/// Tests subcommands.
#[derive(Subcommand, Debug)]
enum TestsCommand {
    /// List the tests visible to a credential.
    List(TestsListCommand),
}

/// Arguments for test listing.
#[derive(Args, Debug)]
struct TestsListCommand {
    /// Credential identifier (overrides `gate.api_key_id`).
    #[arg(long, value_name = "ID")]
    api_key_id: Option<String>,
}

/// Credentials subcommands.
#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// List configured credentials by identifier.
    List,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file, including threshold ranges.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a message and the process exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit code.
    exit_code: u8,
}

impl CliError {
    /// Constructs a general failure.
    const fn new(message: String) -> Self {
        Self {
            message,
            exit_code: 1,
        }
    }

    /// Constructs a failure that leaves the build unevaluated.
    const fn not_built(message: String) -> Self {
        Self {
            message,
            exit_code: Verdict::NotBuilt.exit_code(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(command) => command_run(config_path, &command),
        Commands::Tests {
            command: TestsCommand::List(command),
        } => command_tests_list(config_path, &command),
        Commands::Credentials {
            command: CredentialsCommand::List,
        } => command_credentials_list(config_path),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Everything a gate run needs beyond the output sinks.
struct PreparedGate {
    /// Loaded configuration.
    config: LoadGateConfig,
    /// Materialized credentials.
    credentials: Vec<ApiKeyCredential>,
    /// Remote service client.
    client: HttpMetricsClient,
}

/// Executes the gate and exits with the verdict's exit code.
fn command_run(config_path: Option<&Path>, command: &RunCommand) -> CliResult<ExitCode> {
    let log: Box<dyn GateLog> = match &command.log {
        Some(path) => Box::new(JsonLinesGateLog::new(open_append(path)?)),
        None => Box::new(JsonLinesGateLog::new(std::io::stderr())),
    };
    let recorder: Box<dyn VerdictRecorder> = match &command.record {
        Some(path) => Box::new(JsonLinesVerdictRecorder::new(open_append(path)?)),
        None => Box::new(JsonLinesVerdictRecorder::new(std::io::stdout())),
    };

    let prepared = match prepare_gate(config_path) {
        Ok(prepared) => prepared,
        Err(err) => {
            record_setup_failure(log.as_ref(), recorder.as_ref(), &err.message);
            return Ok(ExitCode::from(err.exit_code));
        }
    };

    let token = CancellationToken::new();
    if let Err(err) = spawn_interrupt_watcher(token.clone()) {
        record_setup_failure(log.as_ref(), recorder.as_ref(), &err.message);
        return Ok(ExitCode::from(err.exit_code));
    }
    let sleeper = ThreadSleeper::new(token);
    let runner = GateRunner::new(
        &prepared.client,
        &sleeper,
        CredentialResolver::new(prepared.config.credentials.defaults()),
        prepared.config.polling.policy(),
    );
    let request = prepared
        .config
        .gate_request(command.test_id.as_deref(), command.api_key_id.as_deref());
    let outcome = runner.run(&request, &prepared.credentials, log.as_ref(), recorder.as_ref());
    Ok(ExitCode::from(outcome.verdict.exit_code()))
}

/// Loads config, credentials, and the client for a gate run.
fn prepare_gate(config_path: Option<&Path>) -> CliResult<PreparedGate> {
    let config = LoadGateConfig::load(config_path)
        .map_err(|err| CliError::not_built(format!("failed to load config: {err}")))?;
    let credentials = config
        .credentials
        .materialize()
        .map_err(|err| CliError::not_built(format!("failed to load credentials: {err}")))?;
    let client = HttpMetricsClient::new(config.service.clone())
        .map_err(|err| CliError::not_built(format!("failed to create client: {err}")))?;
    Ok(PreparedGate {
        config,
        credentials,
        client,
    })
}

/// Logs and records a `NotBuilt` verdict for a run that never started.
fn record_setup_failure(log: &dyn GateLog, recorder: &dyn VerdictRecorder, reason: &str) {
    log.record(GateEvent::new(LogLevel::Error, GateStage::Config, "stage.failed", reason));
    let record = VerdictRecord {
        verdict: Verdict::NotBuilt,
        report: None,
        reason: Some(reason.to_string()),
        metrics: None,
    };
    if let Err(err) = recorder.record(&record) {
        log.record(GateEvent::new(
            LogLevel::Error,
            GateStage::Record,
            "record.failed",
            err.to_string(),
        ));
    }
}

/// Cancels `token` when the process receives Ctrl-C.
///
/// The listener is registered before this returns, so an interrupt that
/// arrives while the gate starts is still delivered to the token.
fn spawn_interrupt_watcher(token: CancellationToken) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::not_built(format!("failed to start signal handler: {err}")))?;
    let mut interrupts = {
        let _context = runtime.enter();
        register_interrupts()
            .map_err(|err| CliError::not_built(format!("failed to register signal handler: {err}")))?
    };
    thread::Builder::new()
        .name("loadgate-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if interrupts.recv().await.is_some() {
                    token.cancel();
                }
            });
        })
        .map_err(|err| CliError::not_built(format!("failed to start signal handler: {err}")))?;
    Ok(())
}

/// Installs the SIGINT listener in the current runtime context.
#[cfg(unix)]
fn register_interrupts() -> std::io::Result<tokio::signal::unix::Signal> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

/// Installs the Ctrl-C listener in the current runtime context.
#[cfg(windows)]
fn register_interrupts() -> std::io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}

/// Opens a file for appending, creating it when missing.
fn open_append(path: &Path) -> CliResult<File> {
    File::options().create(true).append(true).open(path).map_err(|err| {
        CliError::not_built(format!("failed to open {}: {err}", path.display()))
    })
}

// ============================================================================
// SECTION: Tests Command
// ============================================================================

/// Lists the remote tests visible to the resolved credential.
fn command_tests_list(config_path: Option<&Path>, command: &TestsListCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let credentials = config
        .credentials
        .materialize()
        .map_err(|err| CliError::new(format!("failed to load credentials: {err}")))?;
    let api_key_id = command.api_key_id.as_deref().unwrap_or(&config.gate.api_key_id);
    let credential = CredentialResolver::new(config.credentials.defaults())
        .resolve(api_key_id, &credentials)
        .map_err(|err| CliError::new(err.to_string()))?;
    let client = HttpMetricsClient::new(config.service.clone())
        .map_err(|err| CliError::new(format!("failed to create client: {err}")))?;
    match client.list_tests(credential.secret_key()) {
        Ok(tests) if tests.is_empty() => {
            write_stdout_line("no tests")?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(tests) => {
            for (test_id, name) in &tests {
                write_stdout_line(&format!("{test_id}  {name}"))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::Rejected(_)) => Err(CliError::new("invalid API key".to_string())),
        Err(err) => Err(CliError::new(format!("failed to list tests: {err}"))),
    }
}

// ============================================================================
// SECTION: Credentials Command
// ============================================================================

/// Lists configured credentials, deduplicated by identifier.
fn command_credentials_list(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let credentials = config
        .credentials
        .materialize()
        .map_err(|err| CliError::new(format!("failed to load credentials: {err}")))?;
    let unique = unique_credentials(&credentials);
    if unique.is_empty() {
        write_stdout_line("no credentials configured")?;
    }
    for credential in unique {
        write_stdout_line(&format!("{}  {}", credential.identifier(), display_label(credential)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Validates the configuration, including threshold ranges.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let issues = config.gate.thresholds.issues();
    if issues.is_empty() {
        write_stdout_line("config ok")?;
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        write_stderr_line(&format!("invalid threshold: {issue}"))?;
    }
    Ok(ExitCode::FAILURE)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration for the non-gate commands.
fn load_config(config_path: Option<&Path>) -> CliResult<LoadGateConfig> {
    LoadGateConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stderr: {err}")))
}

/// Emits an error message and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&err.message);
    ExitCode::from(err.exit_code)
}
