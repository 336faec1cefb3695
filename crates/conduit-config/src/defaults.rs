//! Built-in defaults applied when no other configuration layer sets a value.

/// Loopback host used by both sides unless overridden.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port of the command endpoint.
pub const DEFAULT_PORT: u16 = 9881;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Upper bound on a single frame payload (100 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 100 * 1024 * 1024;

/// Server bound on reading a request frame. Exceeds the client call timeout so
/// a client never sees the server give up first.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 130;

/// Client bound on waiting for a response; host operations can be slow.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Client bound on establishing one connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Total attempts per call when the connection cannot be established.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Delay before the first retry.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Owned default host value.
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
