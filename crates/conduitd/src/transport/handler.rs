//! Connection handling abstraction for the listener.

use std::net::TcpStream;

/// Handles accepted socket connections.
///
/// Each call runs on a dedicated thread and owns the stream for the lifetime
/// of one request/response exchange.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}
