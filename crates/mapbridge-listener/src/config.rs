use std::time::Duration;

use mapbridge_frame::DEFAULT_MAX_MESSAGE_SIZE;
use mapbridge_transport::{DEFAULT_HOST, DEFAULT_PORT};

/// Default interval between two ticks of the driver loop.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Default time allowed for writing one whole response.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default number of bytes read from the peer per tick.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Embedded listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Host to bind. Default: `localhost`.
    pub host: String,
    /// Port to bind; `0` picks a free port. Default: 9876.
    pub port: u16,
    /// Pause between ticks when a tick had nothing to do. Default: 100 ms.
    pub tick_interval: Duration,
    /// Ceiling on one buffered request. Default: 50 MiB.
    pub max_request_size: usize,
    /// Ceiling on one encoded response. Default: 50 MiB.
    pub max_response_size: usize,
    /// Bytes read from the peer per tick. Default: 8 KiB.
    pub read_chunk_size: usize,
    /// Time allowed for writing one whole response. A client that does not
    /// drain its response within it is dropped. Default: 1 s.
    pub write_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_request_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_response_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl ListenerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_max_request_size(mut self, max: usize) -> Self {
        self.max_request_size = max;
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

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}
