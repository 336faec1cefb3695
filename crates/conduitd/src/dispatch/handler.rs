//! Connection handler that relays one framed command through the queue.
//!
//! Every accepted connection carries exactly one exchange: read one request
//! frame, submit it, write one reply frame, close. Failures at any stage still
//! produce a reply when the socket allows it.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use tracing::{debug, warn};

use conduit_protocol::{CommandRequest, ErrorKind, ErrorReply, FrameCodec, FramingError, Reply};

use crate::transport::ConnectionHandler;

use super::errors::DispatchError;
use super::queue::{DispatchQueue, QUEUE_TARGET};

/// Relays framed requests from sockets to the dispatch queue.
#[derive(Debug, Clone)]
pub struct BridgeConnectionHandler {
    queue: DispatchQueue,
    codec: FrameCodec,
    socket_timeout: Duration,
}

impl BridgeConnectionHandler {
    /// Creates a handler submitting to `queue`.
    ///
    /// `socket_timeout` bounds how long a client may take to deliver its
    /// frame and to accept the reply.
    pub fn new(queue: DispatchQueue, codec: FrameCodec, socket_timeout: Duration) -> Self {
        Self {
            queue,
            codec,
            socket_timeout,
        }
    }

    fn serve(&self, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map_or_else(|_| "unknown".to_owned(), |addr| addr.to_string());
        self.apply_timeouts(&stream, &peer);

        let reply = match self.codec.read_frame(&mut stream) {
            Ok(payload) => self.dispatch_payload(&payload),
            Err(FramingError::Closed) => {
                debug!(target: QUEUE_TARGET, %peer, "client disconnected without request");
                return;
            }
            Err(error) => {
                warn!(target: QUEUE_TARGET, %error, %peer, "failed to read request frame");
                Reply::Failure(DispatchError::Framing(error).to_reply())
            }
        };

        if let Err(error) = self.write_reply(&mut stream, &reply) {
            warn!(target: QUEUE_TARGET, %error, %peer, "failed to write reply");
        }
        if let Err(error) = stream.shutdown(Shutdown::Both) {
            debug!(target: QUEUE_TARGET, %error, %peer, "socket already closed");
        }
    }

    /// Bounds both directions so a peer that stops reading cannot pin the
    /// connection thread.
    fn apply_timeouts(&self, stream: &TcpStream, peer: &str) {
        if let Err(error) = stream.set_read_timeout(Some(self.socket_timeout)) {
            warn!(target: QUEUE_TARGET, %error, %peer, "failed to set read timeout");
        }
        if let Err(error) = stream.set_write_timeout(Some(self.socket_timeout)) {
            warn!(target: QUEUE_TARGET, %error, %peer, "failed to set write timeout");
        }
    }

    fn dispatch_payload(&self, payload: &[u8]) -> Reply {
        match CommandRequest::from_payload(payload) {
            Ok(request) => {
                debug!(target: QUEUE_TARGET, command = %request.command, "submitting command");
                self.queue.submit(request)
            }
            Err(error) => {
                warn!(target: QUEUE_TARGET, %error, "rejected request payload");
                Reply::Failure(ErrorReply::new(error.kind(), error.to_string()))
            }
        }
    }

    fn write_reply<W: Write>(&self, writer: &mut W, reply: &Reply) -> Result<(), FramingError> {
        let payload = reply.to_payload().map_err(FramingError::Malformed)?;
        match self.codec.write_frame(writer, &payload) {
            Err(FramingError::TooLarge { length, max }) => {
                let oversized = ErrorReply::new(
                    ErrorKind::HostExecutionFailure,
                    format!("result of {length} bytes exceeds the {max} byte frame limit"),
                );
                let payload = Reply::Failure(oversized)
                    .to_payload()
                    .map_err(FramingError::Malformed)?;
                self.codec.write_frame(writer, &payload)
            }
            other => other,
        }
    }
}

impl ConnectionHandler for BridgeConnectionHandler {
    fn handle(&self, stream: TcpStream) {
        self.serve(stream);
    }
}
