//! Length-prefixed framing.
//!
//! A frame is `[u32 big-endian length][payload]`. The reader never hands out a
//! payload until every declared byte has arrived, and it refuses declared
//! lengths of zero or above the configured bound before allocating anything.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Default bound on a frame payload (100 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 100 * 1024 * 1024;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The peer closed the stream before sending any header bytes.
    #[error("connection closed before a frame header arrived")]
    Closed,
    /// The stream ended inside the 4-byte header.
    #[error("frame header truncated after {received} of {HEADER_LEN} bytes")]
    HeaderTruncated {
        /// Header bytes received before end of stream.
        received: usize,
    },
    /// The stream ended before the declared payload length was satisfied.
    #[error("frame truncated: declared {declared} bytes, received {received}")]
    Truncated {
        /// Length declared by the header.
        declared: u32,
        /// Payload bytes received before end of stream.
        received: usize,
    },
    /// Frames must carry at least one payload byte.
    #[error("frame declares a zero-length payload")]
    ZeroLength,
    /// The declared or supplied length exceeds the configured bound.
    #[error("frame of {length} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Offending length.
        length: u64,
        /// Configured bound.
        max: u32,
    },
    /// The payload is not well-formed JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Underlying stream failure.
    #[error("frame IO failed: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// Returns true when the error came from a stream timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        )
    }
}

/// Encoder and decoder for length-prefixed frames with a size bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_len: u32,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameCodec {
    /// Creates a codec accepting payloads up to `max_len` bytes.
    #[must_use]
    pub const fn new(max_len: u32) -> Self {
        Self { max_len }
    }

    /// Largest payload this codec accepts.
    #[must_use]
    pub const fn max_len(&self) -> u32 {
        self.max_len
    }

    /// Prefixes `payload` with its big-endian length.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::ZeroLength`] for an empty payload and
    /// [`FramingError::TooLarge`] when it exceeds the bound.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, FramingError> {
        let length = self.check_length(payload.len() as u64)?;
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(payload);
        Ok(frame)
    }

    /// Encodes `payload` and writes the whole frame, then flushes.
    ///
    /// # Errors
    ///
    /// Returns an encoding error or the underlying IO failure.
    pub fn write_frame<W: Write>(&self, writer: &mut W, payload: &[u8]) -> Result<(), FramingError> {
        let frame = self.encode(payload)?;
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads exactly one frame and returns its payload unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::Closed`] when the stream ends before any byte,
    /// a truncation error when it ends mid-frame, and a length error when the
    /// header declares zero or more than the bound.
    pub fn read_frame<R: Read>(&self, reader: &mut R) -> Result<Vec<u8>, FramingError> {
        let mut header = [0_u8; HEADER_LEN];
        let received = read_full(reader, &mut header)?;
        if received == 0 {
            return Err(FramingError::Closed);
        }
        if received < HEADER_LEN {
            return Err(FramingError::HeaderTruncated { received });
        }

        let declared = self.check_length(u64::from(u32::from_be_bytes(header)))?;
        let mut payload = Vec::new();
        reader
            .by_ref()
            .take(u64::from(declared))
            .read_to_end(&mut payload)?;
        if (payload.len() as u64) < u64::from(declared) {
            return Err(FramingError::Truncated {
                declared,
                received: payload.len(),
            });
        }
        Ok(payload)
    }

    fn check_length(&self, length: u64) -> Result<u32, FramingError> {
        if length == 0 {
            return Err(FramingError::ZeroLength);
        }
        if length > u64::from(self.max_len) {
            return Err(FramingError::TooLarge {
                length,
                max: self.max_len,
            });
        }
        u32::try_from(length).map_err(|_| FramingError::TooLarge {
            length,
            max: self.max_len,
        })
    }
}

/// Fills `buf` from `reader`, stopping early only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        match reader.read(rest) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}
