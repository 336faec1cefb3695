//! Explicitly constructed bridge service.
//!
//! A [`Server`] owns its configuration and reporter; nothing is process-wide
//! except the tracing subscriber. [`Server::start`] binds the listener and
//! hands back the [`HostLoop`] so the caller's thread becomes the host thread.

use std::net::SocketAddr;
use std::sync::Arc;

use conduit_config::Config;
use conduit_protocol::FrameCodec;

use crate::dispatch::{BridgeConnectionHandler, DispatchQueue, HostLoop, dispatch_queue};
use crate::health::HealthReporter;
use crate::telemetry::TelemetryHandle;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Bootstrapped but not yet listening bridge.
pub struct Server {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    pub(crate) fn new(
        config: Config,
        telemetry: TelemetryHandle,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            config,
            telemetry,
            reporter,
        }
    }

    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the endpoint and starts accepting connections.
    ///
    /// Returns the running listener and the host loop. Requests queue up until
    /// the caller runs the loop.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound.
    pub fn start(&self) -> Result<(RunningServer, HostLoop), ListenerError> {
        let (queue, host_loop) = dispatch_queue(self.config.command_timeout());
        let listener = SocketListener::bind(&self.config.endpoint())?;
        let handler = Arc::new(BridgeConnectionHandler::new(
            queue.clone(),
            FrameCodec::new(self.config.max_frame_bytes()),
            self.config.read_timeout(),
        ));
        let listener = listener.start(handler)?;
        self.reporter.listener_ready(listener.local_addr());
        Ok((
            RunningServer {
                listener,
                queue,
                reporter: Arc::clone(&self.reporter),
            },
            host_loop,
        ))
    }
}

/// Listener and queue producer of a started server.
pub struct RunningServer {
    listener: ListenerHandle,
    queue: DispatchQueue,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningServer {
    /// Address the listener accepted on; resolves an ephemeral port.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Producer side of the dispatch queue.
    #[must_use]
    pub fn queue(&self) -> &DispatchQueue {
        &self.queue
    }

    /// Handle that asks the host loop to stop; safe to move to another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            queue: self.queue.clone(),
        }
    }

    /// Stops accepting, waits for the accept loop, and stops the host loop.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the accept thread panicked.
    pub fn shutdown(self) -> Result<(), ListenerError> {
        self.listener.shutdown();
        let joined = self.listener.join();
        self.queue.request_stop();
        self.reporter.listener_stopped();
        joined
    }
}

/// Requests a host loop stop from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    queue: DispatchQueue,
}

impl StopHandle {
    /// Queues a stop behind the commands already submitted.
    ///
    /// Returns `false` when the loop has already exited.
    pub fn stop(&self) -> bool {
        self.queue.request_stop()
    }
}
