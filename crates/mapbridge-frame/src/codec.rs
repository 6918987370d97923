use bytes::BytesMut;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{FrameError, Result};

/// Default ceiling on one accumulated message: 50 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 50 * 1024 * 1024;

/// Default size of a single read from the stream.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Encode a message as compact JSON onto `dst`.
///
/// No delimiter is appended; the receiver finds the end by parsing.
pub fn encode_message<T: Serialize + ?Sized>(message: &T, dst: &mut BytesMut) -> Result<()> {
    let encoded = serde_json::to_vec(message)?;
    dst.reserve(encoded.len());
    dst.extend_from_slice(&encoded);
    Ok(())
}

/// Try to decode one message from the accumulated bytes.
///
/// Returns `Ok(None)` when the buffer is empty or holds an incomplete prefix
/// of a JSON document. On success the whole buffer is cleared, including any
/// bytes after the first document; those can only appear if the peer broke
/// request/response alternation.
pub fn decode_message(src: &mut BytesMut) -> Result<Option<Value>> {
    let outcome = {
        let mut stream = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Value>();
        match stream.next() {
            None => return Ok(None),
            Some(Ok(value)) => Ok((value, stream.byte_offset())),
            Some(Err(err)) => Err(err),
        }
    };

    match outcome {
        Ok((value, consumed)) => {
            let trailing = src[consumed..]
                .iter()
                .filter(|b| !b.is_ascii_whitespace())
                .count();
            if trailing > 0 {
                warn!(
                    discarded = trailing,
                    "bytes after a complete message were discarded"
                );
            }
            src.clear();
            Ok(Some(value))
        }
        Err(err) if err.is_eof() => Ok(None),
        Err(err) => Err(FrameError::Malformed(err)),
    }
}

/// True if the buffer could end a JSON document.
///
/// A buffer whose last significant byte opens a container or separates
/// members cannot parse yet, so the re-parse is skipped.
pub(crate) fn may_be_complete(src: &[u8]) -> bool {
    match src.iter().rev().find(|b| !b.is_ascii_whitespace()) {
        None => false,
        Some(b'{' | b'[' | b',' | b':') => false,
        Some(_) => true,
    }
}

/// Configuration for the message codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accumulated message size in bytes. Default: 50 MiB.
    pub max_message_size: usize,
    /// Bytes requested per read. Default: 64 KiB.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Command, Response};
    use serde_json::json;

    fn sample_command() -> Command {
        Command::new("add_labels")
            .arg("layer_name", "rivers")
            .arg("field_name", "name")
            .arg("font_size", 10.5)
            .arg("follow_line", true)
            .arg("extent", json!([-72.1, -14.0, -71.0, -13.2]))
            .arg("note", "snow ❄ and \"quotes\"")
    }

    #[test]
    fn encode_is_compact_without_delimiter() {
        let mut buf = BytesMut::new();
        encode_message(&Command::new("ping"), &mut buf).unwrap();
        assert_eq!(&buf[..], br#"{"type":"ping","params":{}}"#);
    }

    #[test]
    fn decode_inverts_encode() {
        let cmd = sample_command();
        let mut buf = BytesMut::new();
        encode_message(&cmd, &mut buf).unwrap();

        let value = decode_message(&mut buf).unwrap().unwrap();
        let decoded: Command = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, cmd);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_empty_buffer() {
        let mut buf = BytesMut::new();
        assert!(decode_message(&mut buf).unwrap().is_none());

        let mut blank = BytesMut::from(&b"  \n "[..]);
        assert!(decode_message(&mut blank).unwrap().is_none());
    }

    #[test]
    fn decode_incomplete_prefix_keeps_buffer() {
        let mut buf = BytesMut::from(&br#"{"status":"success","res"#[..]);
        assert!(decode_message(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 24);
    }

    #[test]
    fn decode_split_multibyte_character_is_incomplete() {
        let text = r#"{"message":"é"}"#.as_bytes();
        let cut = text.iter().position(|b| *b >= 0x80).unwrap() + 1;
        let mut buf = BytesMut::from(&text[..cut]);
        assert!(decode_message(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_malformed() {
        let mut buf = BytesMut::from(&b"{\"type\" 12}"[..]);
        let err = decode_message(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn back_to_back_messages_keep_only_the_first() {
        let mut buf = BytesMut::new();
        encode_message(&Response::success(json!(1)), &mut buf).unwrap();
        encode_message(&Response::success(json!(2)), &mut buf).unwrap();

        let value = decode_message(&mut buf).unwrap().unwrap();
        assert_eq!(value, json!({"status": "success", "result": 1}));
        assert!(buf.is_empty());
    }

    #[test]
    fn may_be_complete_skips_open_positions() {
        assert!(!may_be_complete(b""));
        assert!(!may_be_complete(b"{"));
        assert!(!may_be_complete(b"{\"a\":"));
        assert!(!may_be_complete(b"{\"a\":1, "));
        assert!(may_be_complete(b"{\"a\":1}"));
        assert!(may_be_complete(b"{\"a\":\"x"));
    }
}
