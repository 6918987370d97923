use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use serde::Serialize;

use crate::codec::{encode_message, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete JSON messages to any `Write` stream.
///
/// A message is written in full before `send` returns. A `WouldBlock` from
/// the stream is returned as an I/O error (see [`FrameError::is_timeout`]);
/// bounding how long a write may take is up to the stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one message (blocking until fully written).
    pub fn send<M: Serialize + ?Sized>(&mut self, message: &M) -> Result<()> {
        self.buf.clear();
        encode_message(message, &mut self.buf)?;

        if self.buf.len() > self.config.max_message_size {
            return Err(FrameError::MessageTooLarge {
                size: self.buf.len(),
                max: self.config.max_message_size,
            });
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;
    use crate::message::{Command, Response};
    use crate::reader::MessageReader;

    struct ChunkedWriter {
        data: Vec<u8>,
        max_write: usize,
        would_block_once: bool,
    }

    impl Write for ChunkedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.would_block_once {
                self.would_block_once = false;
                return Err(std::io::Error::new(ErrorKind::WouldBlock, "not yet"));
            }
            let n = buf.len().min(self.max_write);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn written_message_reads_back() {
        let mut writer = MessageWriter::new(Vec::new());
        let cmd = Command::new("render_map")
            .arg("path", "/tmp/map.png")
            .arg("width", 1024);
        writer.send(&cmd).unwrap();

        let mut reader = MessageReader::new(Cursor::new(writer.into_inner()));
        let decoded: Command = reader.read_as().unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn short_writes_complete() {
        let inner = ChunkedWriter {
            data: Vec::new(),
            max_write: 3,
            would_block_once: false,
        };
        let mut writer = MessageWriter::new(inner);
        writer.send(&Response::success(json!({"pong": true}))).unwrap();
        assert_eq!(
            writer.get_ref().data,
            br#"{"status":"success","result":{"pong":true}}"#
        );
    }

    #[test]
    fn would_block_is_returned_not_retried() {
        let inner = ChunkedWriter {
            data: Vec::new(),
            max_write: 3,
            would_block_once: true,
        };
        let mut writer = MessageWriter::new(inner);
        let err = writer
            .send(&Response::success(json!({"pong": true})))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(writer.get_ref().data.is_empty());
    }

    #[test]
    fn broken_pipe_is_io_error() {
        let mut writer = MessageWriter::new(BrokenPipe);
        let err = writer.send(&Command::new("ping")).unwrap_err();
        assert!(matches!(err, FrameError::Io(ref io) if io.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn oversized_message_rejected() {
        let config = FrameConfig {
            max_message_size: 8,
            ..FrameConfig::default()
        };
        let mut writer = MessageWriter::with_config(Vec::new(), config);
        let err = writer.send(&Command::new("ping")).unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLarge { max: 8, .. }));
        assert!(writer.get_ref().is_empty());
    }
}
