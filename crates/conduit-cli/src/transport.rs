//! Connection establishment for the client request layer.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use conduit_config::ServerEndpoint;

/// Opens one fresh connection per attempt.
pub trait Connector: Send + Sync {
    /// Connects to `endpoint`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the resolution or connection failure.
    fn connect(&self, endpoint: &ServerEndpoint, timeout: Duration) -> io::Result<TcpStream>;
}

/// Connector dialling TCP directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, endpoint: &ServerEndpoint, timeout: Duration) -> io::Result<TcpStream> {
        let address = endpoint.resolve()?;
        let stream = TcpStream::connect_timeout(&address, timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
