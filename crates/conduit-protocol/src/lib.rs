//! Wire types shared by the conduit server and client.
//!
//! Every exchange is one frame in each direction over a fresh TCP connection:
//! a 4-byte big-endian length followed by exactly that many bytes of UTF-8
//! JSON. The client sends a [`CommandRequest`]; the server answers with either
//! the sanitized result value itself or an [`ErrorReply`] naming an
//! [`ErrorKind`].

mod frame;
mod kind;
mod message;

pub use frame::{DEFAULT_MAX_FRAME_BYTES, FrameCodec, FramingError, HEADER_LEN};
pub use kind::ErrorKind;
pub use message::{CommandRequest, ErrorReply, Reply, RequestError};
