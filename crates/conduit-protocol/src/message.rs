//! Command and reply payloads carried inside frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::kind::ErrorKind;

/// Client request naming a command and its arguments.
///
/// ```json
/// {"command":"set_parameter","args":{"node_id":"nodeA","parameter_id":"scale","value":[2,2,2]}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Registered command name.
    pub command: String,
    /// Named arguments; absent means none.
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Errors raised while decoding a request payload.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The payload is not well-formed JSON.
    #[error("malformed request payload: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The payload is JSON but not a command envelope.
    #[error("invalid request structure: {0}")]
    Structure(String),
}

impl RequestError {
    /// Wire classification of the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) => ErrorKind::FramingError,
            Self::Structure(_) => ErrorKind::InvalidArgumentError,
        }
    }
}

impl CommandRequest {
    /// Builds a request from a name and argument map.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Serialises the request as a frame payload.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error; this only happens for non-string map keys.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes and validates a request payload.
    ///
    /// Malformed JSON is a framing failure. Well-formed JSON with the wrong
    /// shape, or a blank command name, is an argument failure.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] describing which of the two checks failed.
    pub fn from_payload(payload: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(payload).map_err(RequestError::Malformed)?;
        let mut request: Self = serde_json::from_value(value)
            .map_err(|error| RequestError::Structure(error.to_string()))?;
        let trimmed = request.command.trim();
        if trimmed.is_empty() {
            return Err(RequestError::Structure("command field is empty".to_owned()));
        }
        if trimmed.len() != request.command.len() {
            request.command = trimmed.to_owned();
        }
        Ok(request)
    }
}

/// Failure reply body: `{"error": <kind>, "detail": <message>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Taxonomy name of the failure.
    pub error: String,
    /// Human-readable explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorReply {
    /// Builds a reply for `kind` with a detail message.
    #[must_use]
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            error: kind.as_str().to_owned(),
            detail: Some(detail.into()),
        }
    }

    /// Parsed taxonomy kind, when the server sent a known name.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.parse().ok()
    }

    /// Detail message, or the kind name when none was sent.
    #[must_use]
    pub fn message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.error)
    }
}

/// Decoded server reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Sanitized result value, sent bare.
    Success(Value),
    /// Failure body.
    Failure(ErrorReply),
}

impl Reply {
    /// Serialises the reply as a frame payload.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Success(value) => serde_json::to_vec(value),
            Self::Failure(error) => serde_json::to_vec(error),
        }
    }

    /// Decodes a reply payload.
    ///
    /// An object whose keys are exactly `error` (a string) and optionally
    /// `detail` is a failure; anything else is a success value.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the payload is not well-formed JSON.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(payload)?;
        if is_error_shape(&value) {
            return serde_json::from_value(value).map(Self::Failure);
        }
        Ok(Self::Success(value))
    }
}

fn is_error_shape(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    let has_error = map.get("error").is_some_and(Value::is_string);
    let detail_ok = map.get("detail").is_none_or(Value::is_string);
    let only_known = map.keys().all(|key| key == "error" || key == "detail");
    has_error && detail_ok && only_known
}
