//! Reconnecting client and typed command façade for the mapbridge command
//! bridge.
//!
//! [`ConnectionManager`] owns the one connection to the host and hides
//! reconnects from callers. [`Bridge`] sits on top and offers one method per
//! host command.
//!
//! ```no_run
//! use mapbridge_client::{Bridge, ClientConfig};
//!
//! let mut bridge = Bridge::new(ClientConfig::default());
//! let response = bridge.ping()?;
//! assert!(response.is_success());
//! # Ok::<(), mapbridge_client::ClientError>(())
//! ```

pub mod args;
pub mod bridge;
pub mod config;
pub mod error;
pub mod link;
pub mod manager;

pub use bridge::{params_of, Bridge};
pub use config::{ClientConfig, DEFAULT_READ_CHUNK_SIZE, DEFAULT_TIMEOUT};
pub use error::{ClientError, Result};
pub use link::{Connector, Link, TcpConnector};
pub use manager::ConnectionManager;
pub use mapbridge_frame::{Command, Params, Response};
