//! Shared configuration for the conduit server and client.
//!
//! Both binaries resolve the same [`Config`] through `ortho_config`, so the
//! listener and the client agree on the endpoint, frame bound, and timeouts
//! without either side hard-coding them. Values are layered as built-in
//! defaults, then a TOML file (`--config-path` or `CONDUIT_CONFIG_PATH`), then
//! `CONDUIT_*` environment variables, then command-line flags.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MS, default_host, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use endpoint::{EndpointParseError, ServerEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration shared by `conduitd` and `conduit`.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "CONDUIT")]
pub struct Config {
    /// Host the server listens on and the client connects to.
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// TCP port of the command endpoint.
    #[ortho_config(default = defaults::DEFAULT_PORT)]
    pub port: u16,
    /// `tracing` filter directive.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Largest frame payload either side accepts.
    #[ortho_config(default = defaults::DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: u32,
    /// Server-side bound on reading one request frame.
    #[ortho_config(default = defaults::DEFAULT_READ_TIMEOUT_SECS)]
    pub read_timeout_secs: u64,
    /// Bound on waiting for a command result, on both the server queue and the
    /// client socket.
    #[ortho_config(default = defaults::DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub command_timeout_secs: u64,
    /// Client-side bound on establishing one connection.
    #[ortho_config(default = defaults::DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,
    /// Total connection attempts per call, including the first.
    #[ortho_config(default = defaults::DEFAULT_RETRY_ATTEMPTS)]
    pub retry_attempts: u32,
    /// Delay before the first retry; later retries double it.
    #[ortho_config(default = defaults::DEFAULT_RETRY_BACKOFF_MS)]
    pub retry_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl Config {
    /// Endpoint the server binds and the client dials.
    #[must_use]
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.host.clone(), self.port)
    }

    /// Filter expression handed to the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Largest accepted frame payload in bytes.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> u32 {
        self.max_frame_bytes
    }

    /// Read timeout applied to each accepted connection.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Bound on waiting for one command result.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Connection establishment timeout used by the client.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Attempt budget for connection failures.
    #[must_use]
    pub const fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Initial backoff between connection attempts.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_targets_loopback_command_port() {
        let config = Config::default();
        assert_eq!(config.endpoint().to_string(), "tcp://127.0.0.1:9881");
    }

    #[test]
    fn timeouts_are_derived_from_seconds() {
        let config = Config {
            command_timeout_secs: 7,
            connect_timeout_secs: 2,
            ..Config::default()
        };
        assert_eq!(config.command_timeout(), Duration::from_secs(7));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.retry_backoff(), Duration::from_millis(1000));
    }
}
