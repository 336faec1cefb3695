//! Scripted bridge and connector doubles.
//!
//! [`FakeBridge`] answers one connection per scripted step with real frames,
//! recording each request, so client behaviour can be verified without a
//! running daemon.

use std::ffi::OsString;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use conduit_config::{Config, ServerEndpoint};
use conduit_protocol::FrameCodec;

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::transport::{Connector, TcpConnector};

/// What the fake bridge does with one connection.
pub(in crate::tests) enum Scripted {
    /// Replies with the given payload.
    Respond(Value),
    /// Reads the request and closes without replying.
    Hangup,
    /// Reads the request and holds the connection open.
    Stall(Duration),
}

pub(in crate::tests) struct FakeBridge {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl FakeBridge {
    /// Serves exactly `script.len()` connections on an ephemeral port.
    pub fn spawn(script: Vec<Scripted>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake bridge")?;
        let addr = listener.local_addr().context("local addr")?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for step in script {
                let (stream, _) = listener.accept().context("accept connection")?;
                Self::serve(stream, step, &recorded)?;
            }
            Ok(())
        });
        Ok(Self {
            addr,
            requests,
            handle: Some(handle),
        })
    }

    fn serve(mut stream: TcpStream, step: Scripted, requests: &Mutex<Vec<Value>>) -> Result<()> {
        let codec = FrameCodec::default();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .context("set read timeout")?;
        let payload = codec.read_frame(&mut stream).context("read request")?;
        let request: Value = serde_json::from_slice(&payload).context("parse request")?;
        requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?
            .push(request);

        match step {
            Scripted::Respond(reply) => {
                let bytes = serde_json::to_vec(&reply).context("encode reply")?;
                codec.write_frame(&mut stream, &bytes).context("write reply")?;
            }
            Scripted::Hangup => {}
            Scripted::Stall(delay) => thread::sleep(delay),
        }
        Ok(())
    }

    /// Client configuration pointing at this bridge with millisecond backoff.
    pub fn config(&self) -> Config {
        quiet_config(self.addr.port())
    }

    /// Waits for the script to finish and returns the recorded requests.
    pub fn finish(mut self) -> Result<Vec<Value>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake bridge thread panicked"))??;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }
}

/// Loopback configuration with logging off and a 1 ms retry backoff.
pub(in crate::tests) fn quiet_config(port: u16) -> Config {
    Config {
        host: "127.0.0.1".to_owned(),
        port,
        log_filter: "off".to_owned(),
        retry_backoff_ms: 1,
        ..Config::default()
    }
}

/// Port with nothing listening on it.
pub(in crate::tests) fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind scratch port")?;
    Ok(listener.local_addr().context("scratch port addr")?.port())
}

/// Connector that refuses its first `refusals` attempts and counts them all.
pub(in crate::tests) struct FlakyConnector {
    refusals: u32,
    attempts: Arc<AtomicU32>,
}

impl FlakyConnector {
    pub fn new(refusals: u32) -> (Self, Arc<AtomicU32>) {
        let attempts = Arc::new(AtomicU32::new(0));
        (
            Self {
                refusals,
                attempts: Arc::clone(&attempts),
            },
            attempts,
        )
    }
}

impl Connector for FlakyConnector {
    fn connect(&self, endpoint: &ServerEndpoint, timeout: Duration) -> io::Result<TcpStream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.refusals {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
        }
        TcpConnector.connect(endpoint, timeout)
    }
}

/// Connector whose first attempt sleeps for `delay` before dialling.
pub(in crate::tests) struct SlowFirstConnector {
    delay: Duration,
    attempts: Arc<AtomicU32>,
}

impl SlowFirstConnector {
    pub fn new(delay: Duration) -> (Self, Arc<AtomicU32>) {
        let attempts = Arc::new(AtomicU32::new(0));
        (
            Self {
                delay,
                attempts: Arc::clone(&attempts),
            },
            attempts,
        )
    }
}

impl Connector for SlowFirstConnector {
    fn connect(&self, endpoint: &ServerEndpoint, timeout: Duration) -> io::Result<TcpStream> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(self.delay);
        }
        TcpConnector.connect(endpoint, timeout)
    }
}

pub(in crate::tests) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}
