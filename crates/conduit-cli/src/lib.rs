//! Command-line client for the conduit command bridge.
//!
//! The crate owns the client request layer ([`Client`]) and the `conduit`
//! binary built on it. Configuration loading and IO streams are injectable so
//! the runtime can be exercised from tests without touching the process
//! environment.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;

mod cli;
mod client;
mod command;
mod config;
mod errors;
mod retry;
mod telemetry;
mod transport;

pub use client::Client;
pub use errors::ClientError;
pub use retry::{MAX_BACKOFF, RetryPolicy};
pub use telemetry::TelemetryError;
pub use transport::{Connector, TcpConnector};

use cli::Cli;
use command::CommandInvocation;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

/// Runs the CLI using the provided arguments and IO handles.
///
/// Exits 0 on success, 1 when the bridge reports a failure, and 2 for usage,
/// configuration, transport, and timeout failures.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match execute(&args, stdout, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            // --help and --version arrive as clap errors destined for stdout.
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            error.exit_code()
        }
    }
}

fn execute<W, L>(args: &[OsString], stdout: &mut W, loader: &L) -> Result<(), AppError>
where
    W: Write,
    L: ConfigLoader,
{
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(split.cli_arguments(args)).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let invocation = CommandInvocation::try_from(cli)?;
    let timeout = invocation
        .timeout
        .unwrap_or_else(|| config.command_timeout());
    let result = Client::from_config(&config).call(&invocation.command, invocation.args, timeout)?;
    write_result(stdout, &result).map_err(AppError::Output)
}

fn write_result<W: Write>(stdout: &mut W, result: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *stdout, result)?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}

#[cfg(test)]
mod tests;
