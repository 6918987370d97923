use std::time::Duration;

/// Errors surfaced by the client.
///
/// A failure envelope from the host is not an error at this level; it comes
/// back as `Ok(Response::Failure { .. })`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No connection could be established; nothing was sent.
    #[error("could not connect to {addr}; make sure the host is running and its listener is started")]
    Unavailable { addr: String },

    /// No response within the active timeout.
    #[error("timed out after {0:?} waiting for a response; the operation may still be running on the host")]
    Timeout(Duration),

    /// The host closed the connection before a complete response arrived.
    #[error("connection closed by the host while waiting for a response")]
    ConnectionClosed,

    /// The connection failed mid-command, and the retry failed too.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// The connection failed mid-command and could not be re-established.
    #[error("lost connection to {addr} and could not reconnect: {source}")]
    Reconnect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The response grew past the configured ceiling.
    #[error("response too large ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },

    /// The host sent something that is not a response envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The command arguments could not be encoded.
    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),

    /// Typed arguments did not encode to a JSON object.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
