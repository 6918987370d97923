use std::io::Write;
use std::time::Duration;

use bytes::BytesMut;
use mapbridge_frame::{encode_message, Command, FrameConfig, FrameError, MessageReader, Response};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::link::{Connector, Link, TcpConnector};

/// Owns the single connection to the host.
///
/// Connects lazily, probes liveness before every command and retries a
/// command once across a reconnect when the connection breaks mid-flight.
/// One command is in flight at a time; callers that share a manager must
/// serialize access themselves.
pub struct ConnectionManager<C: Connector = TcpConnector> {
    connector: C,
    config: ClientConfig,
    link: Option<C::Link>,
}

impl ConnectionManager<TcpConnector> {
    /// Create a TCP connection manager. Nothing is connected yet.
    pub fn new(config: ClientConfig) -> Self {
        let connector = TcpConnector::new(config.host.clone(), config.port);
        Self::with_connector(connector, config)
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager over an explicit connector.
    pub fn with_connector(connector: C, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            link: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a fresh connection, dropping any current one.
    ///
    /// Returns `false` if the host could not be reached.
    pub fn connect(&mut self) -> bool {
        self.disconnect();
        match self.connector.connect(self.config.default_timeout) {
            Ok(link) => {
                info!(addr = %self.connector.endpoint(), "connected");
                self.link = Some(link);
                true
            }
            Err(err) => {
                warn!(addr = %self.connector.endpoint(), error = %err, "connect failed");
                false
            }
        }
    }

    /// True if a connection is held and its socket reports no error.
    ///
    /// Reads only the pending error state; queued data is left in place.
    pub fn is_connected(&self) -> bool {
        match &self.link {
            None => false,
            Some(link) => matches!(link.pending_error(), Ok(None)),
        }
    }

    /// Close the connection if there is one. Close errors are ignored.
    pub fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(err) = link.close() {
                debug!(error = %err, "error while closing connection");
            }
            info!(addr = %self.connector.endpoint(), "disconnected");
        }
    }

    /// Drop the current connection and open a new one.
    pub fn reconnect(&mut self) -> bool {
        info!(addr = %self.connector.endpoint(), "reconnecting");
        self.connect()
    }

    /// Send `command` and wait for its response.
    ///
    /// `timeout` overrides the default timeout for this call only. A broken
    /// connection during the exchange is re-established and the command is
    /// sent once more; every other failure is returned as is.
    pub fn send_command(
        &mut self,
        command: &Command,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        if !self.is_connected() && !self.reconnect() {
            return Err(ClientError::Unavailable {
                addr: self.connector.endpoint(),
            });
        }

        match self.exchange(command, timeout) {
            Err(ClientError::Transport(err)) => {
                warn!(command = %command.name, error = %err, "connection lost, retrying once");
                if !self.reconnect() {
                    return Err(ClientError::Reconnect {
                        addr: self.connector.endpoint(),
                        source: err,
                    });
                }
                self.exchange(command, timeout)
            }
            other => other,
        }
    }

    fn exchange(&mut self, command: &Command, timeout: Option<Duration>) -> Result<Response> {
        let default = self.config.default_timeout;
        let frame_config = self.config.frame_config();
        let Some(link) = self.link.as_mut() else {
            return Err(ClientError::Unavailable {
                addr: self.connector.endpoint(),
            });
        };

        let outcome = match timeout {
            Some(limit) => {
                let outcome = match link.set_timeout(Some(limit)) {
                    Ok(()) => round_trip(link, command, frame_config, limit),
                    Err(err) => Err(ClientError::Transport(err)),
                };
                if let Err(err) = link.set_timeout(Some(default)) {
                    warn!(error = %err, "failed to restore default timeout");
                }
                outcome
            }
            None => round_trip(link, command, frame_config, default),
        };

        match outcome {
            Ok(response) => {
                debug!(
                    command = %command.name,
                    success = response.is_success(),
                    "response received"
                );
                Ok(response)
            }
            Err(err) => {
                // A late or partial reply must never be read as the answer
                // to the next command.
                self.disconnect();
                Err(err)
            }
        }
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.connector.endpoint())
            .field("connected", &self.link.is_some())
            .finish()
    }
}

fn round_trip<L: Link>(
    link: &mut L,
    command: &Command,
    frame_config: FrameConfig,
    timeout: Duration,
) -> Result<Response> {
    let mut request = BytesMut::new();
    encode_message(command, &mut request).map_err(|err| match err {
        FrameError::Json(err) => ClientError::Encode(err),
        other => ClientError::InvalidArguments(other.to_string()),
    })?;

    debug!(command = %command.name, bytes = request.len(), "sending command");
    link.write_all(&request)
        .and_then(|()| link.flush())
        .map_err(|err| exchange_failure(FrameError::Io(err), timeout))?;

    let mut reader = MessageReader::with_config(&mut *link, frame_config);
    let value = reader
        .read_message()
        .map_err(|err| exchange_failure(err, timeout))?;

    serde_json::from_value(value).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

fn exchange_failure(err: FrameError, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout(timeout);
    }
    match err {
        FrameError::ConnectionClosed => ClientError::ConnectionClosed,
        FrameError::MessageTooLarge { size, max } => ClientError::ResponseTooLarge { size, max },
        FrameError::Malformed(err) | FrameError::Json(err) => {
            ClientError::InvalidResponse(err.to_string())
        }
        FrameError::Io(err) => ClientError::Transport(err),
    }
}
