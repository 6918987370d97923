use std::time::Duration;

use mapbridge_frame::{FrameConfig, DEFAULT_MAX_MESSAGE_SIZE};
use mapbridge_transport::{DEFAULT_HOST, DEFAULT_PORT};

/// Default socket timeout, generous enough for long host operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of bytes requested per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Client connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host running the listener. Default: `localhost`.
    pub host: String,
    /// Listener port. Default: 9876.
    pub port: u16,
    /// Connect, read and write timeout outside per-call overrides. Default: 120 s.
    pub default_timeout: Duration,
    /// Ceiling on one accumulated response. Default: 50 MiB.
    pub max_response_size: usize,
    /// Bytes requested per read. Default: 64 KiB.
    pub read_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_timeout: DEFAULT_TIMEOUT,
            max_response_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_max_response_size(mut self, max: usize) -> Self {
        self.max_response_size = max;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// `host:port`, for messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_message_size: self.max_response_size,
            read_chunk_size: self.read_chunk_size,
        }
    }
}
