//! Error types for the CLI runtime and the client request layer.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use conduit_protocol::{ErrorReply, FramingError};

/// Failure of one [`Client::call`](crate::Client::call).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Every permitted attempt failed to connect or to send the request.
    #[error("could not reach {endpoint} after {attempts} attempt(s): {source}")]
    Transport {
        /// Endpoint that was dialled.
        endpoint: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: io::Error,
    },
    /// The request was sent but no response arrived in time.
    #[error("no response to '{command}' within {timeout:?}")]
    Timeout {
        /// Command that timed out.
        command: String,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// The request was sent but the response could not be read.
    #[error("response to '{command}' was lost: {source}")]
    ResponseLost {
        /// Command whose response was lost.
        command: String,
        /// Read failure.
        #[source]
        source: FramingError,
    },
    /// A timeout of zero was supplied; the socket layer cannot honour it.
    #[error("the {name} must be greater than zero")]
    ZeroTimeout {
        /// Which timeout was zero.
        name: &'static str,
    },
    /// The socket timeouts could not be applied to a fresh connection.
    #[error("failed to configure connection: {0}")]
    Configure(#[source] io::Error),
    /// The request could not be framed.
    #[error("failed to frame request: {0}")]
    Framing(#[source] FramingError),
    /// The request could not be serialised.
    #[error("failed to serialise request: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The response frame did not hold JSON.
    #[error("failed to parse response: {0}")]
    MalformedReply(#[source] serde_json::Error),
    /// The bridge ran the command and reported a failure.
    #[error("{}: {}", .0.error, .0.message())]
    Host(ErrorReply),
}

impl ClientError {
    /// Returns true when the bridge itself answered with a failure.
    #[must_use]
    pub const fn is_host_failure(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("the command name must be provided")]
    MissingCommand,
    #[error("--args is not valid JSON: {0}")]
    ArgsJson(serde_json::Error),
    #[error("--args must be a JSON object, got {0}")]
    ArgsNotObject(String),
    #[error("--arg expects key=value, got '{0}'")]
    ArgPair(String),
    #[error("--timeout must be at least one second")]
    ZeroTimeout,
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] crate::telemetry::TelemetryError),
    #[error("failed to write output: {0}")]
    Output(io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AppError {
    /// Host failures exit 1; every local, transport, or timeout failure exits 2.
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::Client(error) if error.is_host_failure() => ExitCode::from(1),
            _ => ExitCode::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use conduit_protocol::ErrorKind;

    use super::*;

    #[test]
    fn host_failures_render_kind_and_detail() {
        let error = ClientError::Host(ErrorReply::new(
            ErrorKind::TypeMismatchError,
            "cannot set nodeA.mode",
        ));
        assert_eq!(error.to_string(), "TypeMismatchError: cannot set nodeA.mode");
        assert_eq!(AppError::from(error).exit_code(), ExitCode::from(1));
    }

    #[test]
    fn transport_failures_exit_two() {
        let error = ClientError::Transport {
            endpoint: "tcp://127.0.0.1:9881".to_owned(),
            attempts: 3,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(AppError::from(error).exit_code(), ExitCode::from(2));
    }

    #[test]
    fn zero_timeouts_are_local_failures() {
        let error = ClientError::ZeroTimeout { name: "command timeout" };
        assert_eq!(error.to_string(), "the command timeout must be greater than zero");
        assert!(!error.is_host_failure());
        assert_eq!(AppError::from(error).exit_code(), ExitCode::from(2));
        assert_eq!(AppError::ZeroTimeout.exit_code(), ExitCode::from(2));
    }
}
