//! Drive a desktop GIS host over a local JSON command bridge.
//!
//! A plugin inside the host runs an [`listener::EmbeddedListener`] that
//! executes named commands from a [`dispatch::CommandTable`]. External
//! tools talk to it through [`client::Bridge`], one typed method per
//! command.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP sockets and address resolution
//! - [`frame`]: delimiter-free JSON message framing and the wire envelopes
//! - [`dispatch`]: command names and the host-side dispatch table
//! - [`listener`]: tick-driven host listener (behind `listener` feature)
//! - [`client`]: reconnecting client and command façade (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use mapbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mapbridge_frame::*;
}

/// Re-export dispatch types.
pub mod dispatch {
    pub use mapbridge_dispatch::*;
}

/// Re-export listener types (requires `listener` feature).
#[cfg(feature = "listener")]
pub mod listener {
    pub use mapbridge_listener::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use mapbridge_client::*;
}
