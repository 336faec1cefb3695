//! TCP listener for the command bridge.
//!
//! The listener binds the configured endpoint and accepts connections on a
//! background thread. Each accepted connection is handed to a
//! [`ConnectionHandler`] on its own thread, so a slow client never delays the
//! accept loop.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub use self::handler::ConnectionHandler;
pub use self::listener::{ListenerHandle, SocketListener};

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
