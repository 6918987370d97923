use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::BridgeStream;

/// Default listen/connect host. Loopback by convention, not enforced.
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen/connect port.
pub const DEFAULT_PORT: u16 = 9876;

/// Non-blocking TCP accept socket.
///
/// Every call on a bound transport returns immediately; "no pending
/// connection" is reported as `Ok(None)` rather than an error.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Resolve a host/port pair, preferring IPv4 so `localhost` means the
    /// same thing on both ends.
    pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        let display = format!("{host}:{port}");
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: display.clone(),
                source,
            })?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| TransportError::Resolve {
                addr: display,
                source: std::io::Error::new(ErrorKind::AddrNotAvailable, "no resolved addresses"),
            })
    }

    /// Bind and listen on `host:port` in non-blocking mode.
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let requested = Self::resolve(host, port)?;
        let listener = TcpListener::bind(requested).map_err(|source| TransportError::Bind {
            addr: requested.to_string(),
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind {
                addr: requested.to_string(),
                source,
            })?;
        let addr = listener.local_addr()?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept a pending connection without blocking.
    ///
    /// Returns `Ok(None)` when nobody is waiting.
    pub fn try_accept(&self) -> Result<Option<(BridgeStream, SocketAddr)>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                Ok(Some((BridgeStream::from_tcp(stream), peer)))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// Open a blocking connection to `host:port`.
    ///
    /// `timeout` bounds the connect itself and becomes the stream's read and
    /// write timeout.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<BridgeStream> {
        let addr = Self::resolve(host, port)?;
        let stream =
            TcpStream::connect_timeout(&addr, timeout).map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        let stream = BridgeStream::from_tcp(stream);
        stream.set_timeout(Some(timeout))?;
        debug!(%addr, "connected to tcp socket");
        Ok(stream)
    }

    /// The address this socket is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.addr)
            .finish()
    }
}
