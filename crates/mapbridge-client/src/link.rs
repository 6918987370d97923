use std::io::{self, Read, Write};
use std::time::Duration;

use mapbridge_transport::{BridgeStream, TcpTransport};

/// A connected byte stream the client can drive.
pub trait Link: Read + Write {
    /// Set the read and write timeout.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Current read timeout.
    fn timeout(&self) -> io::Result<Option<Duration>>;

    /// Pending socket error, read without consuming any data.
    fn pending_error(&self) -> io::Result<Option<io::Error>>;

    /// Close both directions.
    fn close(&mut self) -> io::Result<()>;
}

impl Link for BridgeStream {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        BridgeStream::set_timeout(self, timeout).map_err(|err| err.into_io())
    }

    fn timeout(&self) -> io::Result<Option<Duration>> {
        self.read_timeout().map_err(|err| err.into_io())
    }

    fn pending_error(&self) -> io::Result<Option<io::Error>> {
        BridgeStream::pending_error(self).map_err(|err| err.into_io())
    }

    fn close(&mut self) -> io::Result<()> {
        self.shutdown().map_err(|err| err.into_io())
    }
}

/// Opens new [`Link`]s to the host.
pub trait Connector {
    type Link: Link;

    /// Open a link whose timeouts are set to `timeout`.
    fn connect(&mut self, timeout: Duration) -> io::Result<Self::Link>;

    /// Where this connector connects to, for messages.
    fn endpoint(&self) -> String;
}

/// Connects over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Connector for TcpConnector {
    type Link = BridgeStream;

    fn connect(&mut self, timeout: Duration) -> io::Result<BridgeStream> {
        TcpTransport::connect(&self.host, self.port, timeout).map_err(|err| err.into_io())
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
