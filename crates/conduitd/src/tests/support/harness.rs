//! Loopback harness running a real listener and host loop.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{Value, json};

use conduit_config::Config;
use conduit_protocol::{FrameCodec, FramingError, Reply};

use crate::bootstrap::{StaticConfigLoader, bootstrap_with};
use crate::dispatch::{ArgumentContract, CommandRegistry, LoopSummary, ResultValue};
use crate::host::{GraphHost, register_graph_commands};
use crate::server::RunningServer;

use super::loaders::test_config;
use super::reporter::RecordingHealthReporter;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Server bound to an ephemeral loopback port with the graph command set plus
/// `degenerate` (non-finite floats) and `explode` (panics).
pub struct BridgeHarness {
    running: Option<RunningServer>,
    host_thread: Option<JoinHandle<(GraphHost, LoopSummary)>>,
    codec: FrameCodec,
}

impl BridgeHarness {
    pub fn start() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let codec = FrameCodec::new(config.max_frame_bytes());
        let reporter = Arc::new(RecordingHealthReporter::default());
        let server =
            bootstrap_with(&StaticConfigLoader::new(config), reporter).expect("bootstrap");
        let (running, host_loop) = server.start().expect("start listener");

        let mut registry = CommandRegistry::new();
        register_graph_commands(&mut registry, running.queue().stats()).expect("register");
        registry
            .register("degenerate", ArgumentContract::none(), |_: &mut GraphHost, _| {
                Ok(ResultValue::object([
                    ("nan", f64::NAN),
                    ("up", f64::INFINITY),
                    ("down", f64::NEG_INFINITY),
                    ("plain", 0.25),
                ]))
            })
            .expect("register degenerate");
        registry
            .register("explode", ArgumentContract::none(), |_: &mut GraphHost, _| {
                panic!("host fault")
            })
            .expect("register explode");

        let host_thread = thread::spawn(move || {
            let mut host = GraphHost::default();
            let summary = host_loop.run(&registry, &mut host);
            (host, summary)
        });

        Self {
            running: Some(running),
            host_thread: Some(host_thread),
            codec,
        }
    }

    /// Sends one command on a fresh connection and returns the decoded reply.
    pub fn call(&self, command: &str, args: Value) -> Reply {
        let payload = serde_json::to_vec(&json!({"command": command, "args": args}))
            .expect("serialise request");
        let mut stream = self.connect();
        self.codec
            .write_frame(&mut stream, &payload)
            .expect("write request");
        self.read_reply(&mut stream).expect("read reply")
    }

    /// Writes `bytes` verbatim, half-closes, and reads whatever reply arrives.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<Reply, FramingError> {
        let mut stream = self.connect();
        stream.write_all(bytes).expect("write raw bytes");
        stream.shutdown(Shutdown::Write).expect("half-close");
        self.read_reply(&mut stream)
    }

    /// Stops the listener and host loop, returning the final host state.
    pub fn stop(mut self) -> (GraphHost, LoopSummary) {
        self.shutdown_server();
        self.host_thread
            .take()
            .expect("host thread present")
            .join()
            .expect("host thread panicked")
    }

    fn connect(&self) -> TcpStream {
        let addr = self.local_addr();
        let stream = TcpStream::connect(addr).expect("connect to bridge");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set read timeout");
        stream
    }

    fn local_addr(&self) -> SocketAddr {
        self.running
            .as_ref()
            .map(RunningServer::local_addr)
            .expect("bridge is running")
    }

    fn read_reply(&self, stream: &mut TcpStream) -> Result<Reply, FramingError> {
        let payload = self.codec.read_frame(stream)?;
        let reply = Reply::from_payload(&payload).map_err(FramingError::Malformed)?;
        let mut trailing = [0_u8; 1];
        let after = stream.read(&mut trailing).expect("read after reply");
        assert_eq!(after, 0, "server must close after one reply");
        Ok(reply)
    }

    fn shutdown_server(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown().expect("listener shutdown");
        }
    }
}

impl Drop for BridgeHarness {
    fn drop(&mut self) {
        self.shutdown_server();
        if let Some(handle) = self.host_thread.take() {
            let _ = handle.join();
        }
    }
}
