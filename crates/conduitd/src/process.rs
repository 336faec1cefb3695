//! Process entry point wiring bootstrap, listener, host loop, and signals.

use std::io;
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::{error, info};

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{CommandRegistry, LoopSummary, RegistryError};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::host::{GraphHost, register_graph_commands};
use crate::shutdown::{ShutdownSignal, SystemShutdownSignal};
use crate::transport::ListenerError;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors that prevent the daemon from running.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The listener failed to bind or stop.
    #[error("listener failure: {0}")]
    Listener(#[from] ListenerError),
    /// The command set could not be registered.
    #[error("failed to register commands: {0}")]
    Registry(#[from] RegistryError),
    /// The signal watcher thread could not be spawned.
    #[error("failed to spawn shutdown watcher: {0}")]
    Watcher(#[source] io::Error),
}

/// Runs the daemon with system configuration and signal handling.
///
/// The calling thread becomes the host thread and returns once a shutdown
/// signal has stopped the host loop.
pub fn run_server() -> Result<LoopSummary, LaunchError> {
    run_server_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(SystemShutdownSignal),
    )
}

/// Runs the daemon with injected collaborators.
pub fn run_server_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: Arc<dyn ShutdownSignal>,
) -> Result<LoopSummary, LaunchError> {
    let server = bootstrap_with(loader, Arc::clone(&reporter))?;
    let (running, host_loop) = server.start()?;

    let mut registry = CommandRegistry::new();
    register_graph_commands(&mut registry, running.queue().stats())?;
    let mut host = GraphHost::default();

    let stop = running.stop_handle();
    thread::Builder::new()
        .name("conduitd-signal".to_owned())
        .spawn(move || match shutdown.wait() {
            Ok(()) => {
                stop.stop();
            }
            Err(err) => {
                error!(target: PROCESS_TARGET, error = %err, "shutdown watcher failed");
            }
        })
        .map_err(LaunchError::Watcher)?;

    let summary = host_loop.run(&registry, &mut host);
    reporter.host_loop_stopped(summary);
    running.shutdown()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(summary)
}
