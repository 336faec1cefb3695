//! Client request layer: one fresh connection per attempt, bounded retries.
//!
//! Only failures to connect or to deliver the request frame are retried. Once
//! the request is on the wire the bridge may already be mutating host state,
//! so timeouts, lost responses, and host failures are reported as they are.
//! The in-flight lock is taken once a connection is open and covers only the
//! send and receive of one attempt. It is released before any backoff sleep,
//! so a slow or unreachable endpoint never starves other callers sharing the
//! client.

use std::io;
use std::net::TcpStream;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use conduit_config::{Config, ServerEndpoint};
use conduit_protocol::{CommandRequest, FrameCodec, FramingError, Reply};

use crate::errors::ClientError;
use crate::retry::RetryPolicy;
use crate::transport::{Connector, TcpConnector};

pub(crate) const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

enum AttemptFailure {
    Retryable(io::Error),
    Fatal(ClientError),
}

/// Sends commands to a bridge endpoint.
pub struct Client<C: Connector = TcpConnector> {
    endpoint: ServerEndpoint,
    connector: C,
    codec: FrameCodec,
    policy: RetryPolicy,
    connect_timeout: Duration,
    in_flight: Mutex<()>,
}

impl Client<TcpConnector> {
    /// Client for the configured endpoint, limits, and retry schedule.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> Client<C> {
    /// Client that opens its connections through `connector`.
    #[must_use]
    pub fn with_connector(config: &Config, connector: C) -> Self {
        Self {
            endpoint: config.endpoint(),
            connector,
            codec: FrameCodec::new(config.max_frame_bytes()),
            policy: RetryPolicy::from_config(config),
            connect_timeout: config.connect_timeout(),
            in_flight: Mutex::new(()),
        }
    }

    /// Replaces the retry schedule.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Endpoint this client dials.
    #[must_use]
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Sends `command` with `args` and waits up to `timeout` for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ZeroTimeout`] before dialling when `timeout` or
    /// the connect timeout is zero, [`ClientError::Host`] when the bridge
    /// reports a failure, [`ClientError::Transport`] once every attempt failed
    /// to connect or send, and the timeout or lost-response variants after the
    /// request was sent.
    pub fn call(
        &self,
        command: &str,
        args: Map<String, Value>,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        if timeout.is_zero() {
            return Err(ClientError::ZeroTimeout { name: "command timeout" });
        }
        if self.connect_timeout.is_zero() {
            return Err(ClientError::ZeroTimeout { name: "connect timeout" });
        }
        let payload = CommandRequest::new(command, args)
            .to_payload()
            .map_err(ClientError::Serialise)?;

        let mut attempt = 1;
        loop {
            let failure = match self.attempt(command, &payload, timeout) {
                Ok(response) => return decode(&response),
                Err(AttemptFailure::Fatal(error)) => return Err(error),
                Err(AttemptFailure::Retryable(error)) => error,
            };
            let Some(delay) = self.policy.delay_before_retry(attempt) else {
                return Err(ClientError::Transport {
                    endpoint: self.endpoint.to_string(),
                    attempts: attempt,
                    source: failure,
                });
            };
            warn!(
                target: CLIENT_TARGET,
                %command,
                attempt,
                error = %failure,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "transport failure; retrying"
            );
            thread::sleep(delay);
            attempt += 1;
        }
    }

    fn attempt(
        &self,
        command: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, AttemptFailure> {
        let mut stream = self
            .connector
            .connect(&self.endpoint, self.connect_timeout)
            .map_err(AttemptFailure::Retryable)?;
        configure(&stream, timeout)
            .map_err(|error| AttemptFailure::Fatal(ClientError::Configure(error)))?;

        let _in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.codec
            .write_frame(&mut stream, payload)
            .map_err(|error| match error {
                FramingError::Io(source) => AttemptFailure::Retryable(source),
                other => AttemptFailure::Fatal(ClientError::Framing(other)),
            })?;
        debug!(target: CLIENT_TARGET, %command, "request sent");

        self.codec.read_frame(&mut stream).map_err(|error| {
            AttemptFailure::Fatal(if error.is_timeout() {
                ClientError::Timeout {
                    command: command.to_owned(),
                    timeout,
                }
            } else {
                ClientError::ResponseLost {
                    command: command.to_owned(),
                    source: error,
                }
            })
        })
    }
}

fn configure(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

fn decode(response: &[u8]) -> Result<Value, ClientError> {
    match Reply::from_payload(response).map_err(ClientError::MalformedReply)? {
        Reply::Success(value) => Ok(value),
        Reply::Failure(error) => Err(ClientError::Host(error)),
    }
}
