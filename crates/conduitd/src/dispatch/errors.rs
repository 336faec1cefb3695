//! Error types for command dispatch failures.
//!
//! Every variant maps to exactly one wire [`ErrorKind`], so a failure raised
//! anywhere between the socket and a handler can be turned into an
//! [`ErrorReply`] without further inspection.

use thiserror::Error;

use conduit_protocol::{ErrorKind, ErrorReply, FramingError};

use crate::coercion::CoercionError;

/// Errors surfaced while decoding, validating, or executing a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request frame could not be read or decoded.
    #[error("{0}")]
    Framing(#[from] FramingError),

    /// No handler is registered under the requested name.
    #[error("unknown command '{name}'")]
    UnknownCommand { name: String },

    /// Arguments are missing, unexpected, or of the wrong JSON shape.
    #[error("invalid arguments for '{command}': {message}")]
    InvalidArguments { command: String, message: String },

    /// A value could not be converted to the property's declared type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// The handler ran and reported a failure.
    #[error("{message}")]
    Host { message: String },

    /// The handler panicked.
    #[error("handler '{command}' panicked: {message}")]
    Panicked { command: String, message: String },

    /// The host loop is not running, so the command cannot be executed.
    #[error("host loop stopped before the command could run")]
    HostUnavailable,
}

impl DispatchError {
    /// Returns the wire classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Framing(_) => ErrorKind::FramingError,
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommandError,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArgumentError,
            Self::Coercion(error) => error.kind(),
            Self::Host { .. } | Self::Panicked { .. } | Self::HostUnavailable => {
                ErrorKind::HostExecutionFailure
            }
        }
    }

    /// Builds the failure body sent to the client.
    pub fn to_reply(&self) -> ErrorReply {
        ErrorReply::new(self.kind(), self.to_string())
    }

    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Creates an invalid arguments error.
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a host failure error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }
}
