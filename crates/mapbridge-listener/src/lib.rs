//! Tick-driven embedded listener for the mapbridge command bridge.
//!
//! [`EmbeddedListener`] is built to run inside a host application's own
//! control loop: all progress happens in [`EmbeddedListener::tick`], reads
//! never wait, and a response write is capped by
//! [`ListenerConfig::write_timeout`]. When no such loop exists,
//! [`spawn_listener`] ticks it on a dedicated thread instead.

pub mod config;
pub mod error;
pub mod listener;
pub mod run;

pub use config::{
    ListenerConfig, DEFAULT_READ_CHUNK_SIZE, DEFAULT_TICK_INTERVAL, DEFAULT_WRITE_TIMEOUT,
};
pub use error::{ListenerError, Result};
pub use listener::{EmbeddedListener, ListenerState, TickOutcome};
pub use run::{run_until, spawn_listener, ListenerHandle};
