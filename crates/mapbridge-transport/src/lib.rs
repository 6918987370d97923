//! Loopback TCP transport for the mapbridge command bridge.
//!
//! This is the lowest layer of mapbridge. The listener side binds a
//! non-blocking [`TcpTransport`] and polls it for at most one peer; the client
//! side opens a blocking [`BridgeStream`] with a fixed timeout. Everything
//! else builds on those two types.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::BridgeStream;
pub use tcp::{TcpTransport, DEFAULT_HOST, DEFAULT_PORT};
