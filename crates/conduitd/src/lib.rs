//! Host-side command bridge.
//!
//! `conduitd` lets an automation client drive a single-threaded host
//! application over TCP without ever running host code off the host thread.
//! Each client connection carries one length-prefixed command frame. The
//! connection thread decodes it and submits it to the dispatch queue, whose
//! only consumer is the host loop. The loop runs the registered handler,
//! sanitizes the result, and passes the reply back to the waiting connection,
//! which writes one reply frame and closes.
//!
//! Parameter writes go through the [`coercion`] layer, which re-reads the
//! target property's declared kind on every call and refuses any value that
//! cannot be represented losslessly. A wrongly-typed value is answered with a
//! `TypeMismatchError` reply instead of reaching the host.
//!
//! The bundled [`host::GraphHost`] is an in-memory node graph that makes the
//! binary usable end to end.

mod bootstrap;
pub mod coercion;
pub mod dispatch;
mod health;
pub mod host;
mod process;
mod server;
mod shutdown;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_server, run_server_with};
pub use server::{RunningServer, Server, StopHandle};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
