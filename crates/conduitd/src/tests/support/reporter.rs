//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use conduit_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::LoopSummary;
use crate::health::HealthReporter;

/// Lifecycle events captured during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    ListenerStopped,
    HostLoopStopped(LoopSummary),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }

    /// Polls until the listener has reported its address.
    pub fn wait_for_listener(&self) -> SocketAddr {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let ready = self.events().into_iter().find_map(|event| match event {
                HealthEvent::ListenerReady(addr) => Some(addr),
                _ => None,
            });
            if let Some(addr) = ready {
                return addr;
            }
            assert!(Instant::now() < deadline, "listener never became ready");
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerReady(addr));
    }

    fn listener_stopped(&self) {
        self.record(HealthEvent::ListenerStopped);
    }

    fn host_loop_stopped(&self, summary: LoopSummary) {
        self.record(HealthEvent::HostLoopStopped(summary));
    }
}
