//! Command name to operation routing for the mapbridge command bridge.
//!
//! A [`CommandTable`] maps command names to [`Operation`]s and turns every
//! outcome into a [`Response`](mapbridge_frame::Response) envelope. It is the
//! only place an operation's error is caught, so a failing operation never
//! reaches the listener.

pub mod error;
pub mod names;
pub mod params;
pub mod table;

pub use error::{OperationError, Result};
pub use params::ParamsExt;
pub use table::{ping, CommandTable, Operation};
