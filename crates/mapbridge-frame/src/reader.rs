use std::io::{ErrorKind, Read};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::buffer::MessageBuffer;
use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::message::Response;

/// Reads complete JSON messages from any `Read` stream.
///
/// Partial reads are accumulated internally; callers only see complete
/// messages.
pub struct MessageReader<T> {
    inner: T,
    buffer: MessageBuffer,
    chunk: Vec<u8>,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buffer: MessageBuffer::new(config.max_message_size),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, and
    /// `Err(FrameError::MessageTooLarge)` once the accumulated bytes pass the
    /// configured ceiling.
    pub fn read_message(&mut self) -> Result<Value> {
        loop {
            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            if let Some(value) = self.buffer.push(&self.chunk[..read])? {
                return Ok(value);
            }
        }
    }

    /// Read the next message and deserialize it.
    pub fn read_as<D: DeserializeOwned>(&mut self) -> Result<D> {
        let value = self.read_message()?;
        serde_json::from_value(value).map_err(FrameError::Json)
    }

    /// Read the next message as a response envelope.
    pub fn read_response(&mut self) -> Result<Response> {
        self.read_as()
    }

    /// Bytes received but not yet forming a complete message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
