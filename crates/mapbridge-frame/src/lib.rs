//! Delimiter-free JSON message framing for the mapbridge command bridge.
//!
//! Every message on the wire is one compact JSON object with no length
//! prefix and no trailing delimiter. The receiving side appends bytes to an
//! accumulation buffer and re-parses the whole buffer after each read; the
//! first successful parse is the message boundary.
//!
//! That only works while both peers strictly alternate request and response.
//! A peer must not send a new message before it has fully received the
//! counterpart of the previous one. Pipelining would need a length-prefixed
//! wire format instead.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use buffer::MessageBuffer;
pub use codec::{decode_message, encode_message, FrameConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use error::{FrameError, Result};
pub use message::{Command, Params, Response};
pub use reader::MessageReader;
pub use writer::MessageWriter;
