//! Failure taxonomy carried in error replies.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Failure classes a server can report back to a client.
///
/// The string form of each variant is what travels in the `error` field of a
/// failure reply, so the names are part of the wire contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum ErrorKind {
    /// The request frame or its payload was malformed.
    FramingError,
    /// No handler is registered under the requested name.
    UnknownCommandError,
    /// Arguments violate the handler's declared contract.
    InvalidArgumentError,
    /// A value could not be converted to the declared property type.
    TypeMismatchError,
    /// The handler ran and failed, panicked, or the host loop was unavailable.
    HostExecutionFailure,
}

impl ErrorKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
