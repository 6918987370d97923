/// Errors that can occur while running the embedded listener.
///
/// Per-peer failures never show up here; they end the session and the
/// listener goes back to waiting for a client.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Binding the listening socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] mapbridge_transport::TransportError),

    /// The driver thread could not be started.
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The driver thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}

pub type Result<T> = std::result::Result<T, ListenerError>;
