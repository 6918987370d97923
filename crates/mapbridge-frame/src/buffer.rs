use bytes::BytesMut;
use serde_json::Value;

use crate::codec::{decode_message, may_be_complete, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Accumulation buffer for one direction of a connection.
///
/// Bytes are appended as they arrive and the buffer is re-parsed after each
/// append. The buffer is only ever emptied as a whole: after a successful
/// decode, on an error, or through [`MessageBuffer::clear`].
#[derive(Debug)]
pub struct MessageBuffer {
    buf: BytesMut,
    max_size: usize,
}

impl MessageBuffer {
    /// Create a buffer with the given size ceiling.
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY.min(max_size)),
            max_size,
        }
    }

    /// Append newly received bytes and try to decode a message.
    ///
    /// The size ceiling is checked before any parse attempt. On
    /// `MessageTooLarge` or `Malformed` the buffer is cleared.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Option<Value>> {
        self.buf.extend_from_slice(bytes);

        if self.buf.len() > self.max_size {
            let size = self.buf.len();
            self.buf.clear();
            return Err(FrameError::MessageTooLarge {
                size,
                max: self.max_size,
            });
        }

        if !may_be_complete(&self.buf) {
            return Ok(None);
        }

        decode_message(&mut self.buf).inspect_err(|_| self.buf.clear())
    }

    /// Drop everything buffered so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured size ceiling.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}
