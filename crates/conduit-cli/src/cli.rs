//! CLI argument definitions for the conduit client.

use clap::Parser;

/// Sends one command to a running conduit bridge and prints the result.
#[derive(Parser, Debug)]
#[command(name = "conduit", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Registered command name (for example `set_parameter`).
    #[arg(value_name = "COMMAND")]
    pub(crate) command: String,
    /// Command arguments as a JSON object.
    #[arg(long = "args", value_name = "JSON")]
    pub(crate) args_json: Option<String>,
    /// One argument as `key=value`; the value is read as JSON when it parses,
    /// otherwise as a plain string. Overrides keys from `--args`.
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub(crate) arg_pairs: Vec<String>,
    /// Seconds to wait for the response, overriding `command_timeout_secs`.
    #[arg(long, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,
}
