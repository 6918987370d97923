use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::time::Instant;

use mapbridge_dispatch::CommandTable;
use mapbridge_frame::{FrameConfig, FrameError, MessageBuffer, MessageWriter, Response};
use mapbridge_transport::{BridgeStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::config::ListenerConfig;
use crate::error::Result;

/// Observable state of an [`EmbeddedListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Not bound.
    Stopped,
    /// Bound, no client connected.
    AwaitingClient,
    /// Client connected, nothing buffered.
    Idle,
    /// Client connected, part of a request buffered.
    Receiving,
}

/// What a single [`EmbeddedListener::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The listener is not running.
    Stopped,
    /// No client connected and none waiting.
    Waiting,
    /// A client was accepted; it had not sent anything yet.
    Accepted(SocketAddr),
    /// Client connected but no bytes were available.
    Idle,
    /// Bytes arrived but do not form a complete request yet.
    Partial { buffered: usize },
    /// A request was dispatched and its response written back.
    Handled { success: bool },
    /// The session ended: the peer closed, or an I/O or framing error
    /// forced it closed.
    Disconnected,
}

impl TickOutcome {
    /// True when the tick found nothing to do.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Stopped | Self::Waiting | Self::Idle)
    }
}

struct Session {
    stream: BridgeStream,
    addr: SocketAddr,
}

/// Blocking writes to the peer, all bounded by one deadline.
///
/// The socket's write timeout is reset to the time left before every
/// `write`, so a client that stops reading costs at most the deadline.
struct DeadlineWriter<'a> {
    stream: &'a mut BridgeStream,
    deadline: Instant,
}

impl Write for DeadlineWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                ErrorKind::TimedOut,
                "response write deadline passed",
            ));
        }
        self.stream
            .set_write_timeout(Some(remaining))
            .map_err(|err| err.into_io())?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Command listener meant to live inside a host event loop.
///
/// Nothing here waits on the network: the host calls [`tick`](Self::tick)
/// periodically and each call does at most one accept, one read and, when a
/// full request has arrived, one dispatch plus its response write. The
/// response write is the only blocking step and is capped by
/// [`ListenerConfig::write_timeout`]. Operations run on the thread that
/// ticks, one at a time.
pub struct EmbeddedListener {
    config: ListenerConfig,
    table: CommandTable,
    transport: Option<TcpTransport>,
    session: Option<Session>,
    buffer: MessageBuffer,
    chunk: Vec<u8>,
}

impl EmbeddedListener {
    /// Create a stopped listener that will serve `table`.
    pub fn new(config: ListenerConfig, table: CommandTable) -> Self {
        let buffer = MessageBuffer::new(config.max_request_size);
        let chunk = vec![0u8; config.read_chunk_size.max(1)];
        Self {
            config,
            table,
            transport: None,
            session: None,
            buffer,
            chunk,
        }
    }

    /// Bind the listening socket in non-blocking mode.
    ///
    /// Starting a running listener does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.transport.is_some() {
            debug!("listener already running");
            return Ok(());
        }

        let transport = TcpTransport::bind(&self.config.host, self.config.port)?;
        info!(
            addr = %transport.local_addr(),
            commands = self.table.len(),
            "listener started"
        );
        self.transport = Some(transport);
        Ok(())
    }

    /// Advance the listener by one step.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(transport) = self.transport.as_ref() else {
            return TickOutcome::Stopped;
        };

        let mut accepted = None;
        if self.session.is_none() {
            match transport.try_accept() {
                Ok(Some((stream, addr))) => {
                    if let Err(err) = stream.set_nonblocking(true) {
                        warn!(peer = %addr, error = %err, "failed to configure client socket");
                        return TickOutcome::Waiting;
                    }
                    info!(peer = %addr, "client connected");
                    self.session = Some(Session { stream, addr });
                    accepted = Some(addr);
                }
                Ok(None) => return TickOutcome::Waiting,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    return TickOutcome::Waiting;
                }
            }
        }

        match (self.receive(), accepted) {
            (TickOutcome::Idle, Some(addr)) => TickOutcome::Accepted(addr),
            (outcome, _) => outcome,
        }
    }

    fn receive(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Waiting;
        };

        let read = match session.stream.read(&mut self.chunk) {
            Ok(0) => {
                info!(peer = %session.addr, "client disconnected");
                self.end_session();
                return TickOutcome::Disconnected;
            }
            Ok(n) => n,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                return if self.buffer.is_empty() {
                    TickOutcome::Idle
                } else {
                    TickOutcome::Partial {
                        buffered: self.buffer.len(),
                    }
                };
            }
            Err(err) => {
                warn!(peer = %session.addr, error = %err, "client read failed");
                self.end_session();
                return TickOutcome::Disconnected;
            }
        };

        let message = match self.buffer.push(&self.chunk[..read]) {
            Ok(Some(message)) => message,
            Ok(None) => {
                return TickOutcome::Partial {
                    buffered: self.buffer.len(),
                }
            }
            Err(err) => {
                warn!(peer = %session.addr, error = %err, "dropping client after bad request");
                self.end_session();
                return TickOutcome::Disconnected;
            }
        };

        let response = self.table.dispatch_value(message);
        let mut success = response.is_success();

        let frame_config = FrameConfig {
            max_message_size: self.config.max_response_size,
            read_chunk_size: self.config.read_chunk_size,
        };
        let deadline = Instant::now() + self.config.write_timeout;
        let sent = match session.stream.set_nonblocking(false) {
            Err(err) => Err(FrameError::Io(err.into_io())),
            Ok(()) => {
                let sent = {
                    let sink = DeadlineWriter {
                        stream: &mut session.stream,
                        deadline,
                    };
                    let mut writer = MessageWriter::with_config(sink, frame_config);
                    match writer.send(&response) {
                        Err(FrameError::MessageTooLarge { size, max }) => {
                            warn!(peer = %session.addr, size, max, "response too large");
                            success = false;
                            let failure = Response::failure(format!(
                                "response too large ({size} bytes, max {max})"
                            ));
                            MessageWriter::new(writer.into_inner()).send(&failure)
                        }
                        other => other,
                    }
                };
                sent.and_then(|()| {
                    session
                        .stream
                        .set_nonblocking(true)
                        .map_err(|err| FrameError::Io(err.into_io()))
                })
            }
        };

        match sent {
            Ok(()) => {
                debug!(peer = %session.addr, success, "response sent");
                TickOutcome::Handled { success }
            }
            Err(err) if err.is_timeout() => {
                warn!(
                    peer = %session.addr,
                    timeout = ?self.config.write_timeout,
                    "client stopped reading its response; dropping it"
                );
                self.end_session();
                TickOutcome::Disconnected
            }
            Err(err) => {
                warn!(peer = %session.addr, error = %err, "client write failed");
                self.end_session();
                TickOutcome::Disconnected
            }
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            // The peer may already be gone.
            let _ = session.stream.shutdown();
        }
        self.buffer.clear();
    }

    /// Close the client and the listening socket. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.transport.is_some();
        self.end_session();
        self.transport = None;
        if was_running {
            info!("listener stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.transport.is_some()
    }

    pub fn state(&self) -> ListenerState {
        match (&self.transport, &self.session) {
            (None, _) => ListenerState::Stopped,
            (Some(_), None) => ListenerState::AwaitingClient,
            (Some(_), Some(_)) if self.buffer.is_empty() => ListenerState::Idle,
            (Some(_), Some(_)) => ListenerState::Receiving,
        }
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.as_ref().map(TcpTransport::local_addr)
    }

    /// Address of the connected client, if any.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().map(|session| session.addr)
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Mutable access to the table, e.g. to register operations late.
    pub fn table_mut(&mut self) -> &mut CommandTable {
        &mut self.table
    }
}

impl Drop for EmbeddedListener {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for EmbeddedListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedListener")
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .field("peer_addr", &self.peer_addr())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpStream;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use mapbridge_dispatch::{OperationError, ParamsExt};
    use mapbridge_frame::{MessageReader, Params};
    use serde_json::{json, Value};

    use super::*;

    fn test_table() -> CommandTable {
        CommandTable::with_builtins()
            .with("save_project", |_: &Params| -> mapbridge_dispatch::Result<Value> {
                Err(OperationError::failed("no current project path"))
            })
            .with("get_layer_extent", |params: &Params| -> mapbridge_dispatch::Result<Value> {
                let layer = params.required_str("layer_name")?;
                Ok(json!({"layer": layer, "extent": [-72.0, -14.0, -71.0, -13.0]}))
            })
    }

    fn started(config: ListenerConfig) -> EmbeddedListener {
        let mut listener = EmbeddedListener::new(config.with_port(0), test_table());
        listener.start().expect("listener should bind");
        listener
    }

    fn connect(listener: &EmbeddedListener) -> TcpStream {
        let addr = listener.local_addr().expect("listener should be bound");
        let stream = TcpStream::connect(addr).expect("client should connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout should apply");
        stream
    }

    fn tick_until(
        listener: &mut EmbeddedListener,
        done: impl Fn(&TickOutcome) -> bool,
    ) -> TickOutcome {
        for _ in 0..1000 {
            let outcome = listener.tick();
            if done(&outcome) {
                return outcome;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("listener never reached the expected outcome");
    }

    fn handled(outcome: &TickOutcome) -> bool {
        matches!(outcome, TickOutcome::Handled { .. })
    }

    fn round_trip(
        listener: &mut EmbeddedListener,
        client: &mut TcpStream,
        request: Value,
    ) -> Value {
        client
            .write_all(request.to_string().as_bytes())
            .expect("request should be written");
        tick_until(listener, handled);
        MessageReader::new(client)
            .read_message()
            .expect("response should arrive")
    }

    #[test]
    fn ping_end_to_end() {
        let mut listener = started(ListenerConfig::default());
        let mut client = connect(&listener);

        let response = round_trip(
            &mut listener,
            &mut client,
            json!({"type": "ping", "params": {}}),
        );
        assert_eq!(response, json!({"status": "success", "result": {"pong": true}}));
        assert_eq!(listener.state(), ListenerState::Idle);
    }

    #[test]
    fn session_survives_unknown_and_failing_commands() {
        let mut listener = started(ListenerConfig::default());
        let mut client = connect(&listener);

        let response = round_trip(
            &mut listener,
            &mut client,
            json!({"type": "nonexistent", "params": {}}),
        );
        assert_eq!(
            response,
            json!({"status": "error", "message": "Unknown command type: nonexistent"})
        );

        let response = round_trip(
            &mut listener,
            &mut client,
            json!({"type": "save_project", "params": {"path": "/tmp/x.proj"}}),
        );
        assert_eq!(
            response,
            json!({"status": "error", "message": "no current project path"})
        );

        let response = round_trip(
            &mut listener,
            &mut client,
            json!({"type": "get_layer_extent", "params": {"layer_name": "rivers"}}),
        );
        assert_eq!(response["status"], "success");
        assert_eq!(response["result"]["layer"], "rivers");
    }

    #[test]
    fn request_split_across_ticks() {
        let config = ListenerConfig::default().with_read_chunk_size(4);
        let mut listener = started(config);
        let mut client = connect(&listener);

        let request = br#"{"type":"ping","params":{}}"#;
        client.write_all(&request[..10]).expect("first half written");
        tick_until(&mut listener, |o| matches!(o, TickOutcome::Partial { buffered: 8 }));
        assert_eq!(listener.state(), ListenerState::Receiving);

        client.write_all(&request[10..]).expect("second half written");
        let outcome = tick_until(&mut listener, handled);
        assert_eq!(outcome, TickOutcome::Handled { success: true });

        let response: Response = MessageReader::new(&mut client)
            .read_as()
            .expect("response should arrive");
        assert_eq!(response, Response::success(json!({"pong": true})));
    }

    #[test]
    fn peer_close_clears_session() {
        let mut listener = started(ListenerConfig::default());
        let mut client = connect(&listener);
        client.write_all(br#"{"type":"pi"#).expect("partial written");
        tick_until(&mut listener, |o| matches!(o, TickOutcome::Partial { .. }));

        drop(client);
        tick_until(&mut listener, |o| *o == TickOutcome::Disconnected);
        assert_eq!(listener.state(), ListenerState::AwaitingClient);
        assert_eq!(listener.peer_addr(), None);

        let mut next = connect(&listener);
        let response = round_trip(&mut listener, &mut next, json!({"type": "ping"}));
        assert_eq!(response["result"]["pong"], true);
    }

    #[test]
    fn second_client_waits_for_first() {
        let mut listener = started(ListenerConfig::default());
        let mut first = connect(&listener);
        let outcome = tick_until(&mut listener, |o| matches!(o, TickOutcome::Accepted(_)));
        assert_eq!(outcome, TickOutcome::Accepted(first.local_addr().unwrap()));

        let mut second = connect(&listener);
        let response = round_trip(&mut listener, &mut first, json!({"type": "ping"}));
        assert_eq!(response["status"], "success");
        assert_eq!(listener.peer_addr(), Some(first.local_addr().unwrap()));

        drop(first);
        tick_until(&mut listener, |o| *o == TickOutcome::Disconnected);
        let response = round_trip(&mut listener, &mut second, json!({"type": "ping"}));
        assert_eq!(response["status"], "success");
    }

    #[test]
    fn oversized_request_ends_session() {
        let config = ListenerConfig::default().with_max_request_size(64);
        let mut listener = started(config);
        let mut client = connect(&listener);

        let request = json!({"type": "execute_code", "params": {"code": "x".repeat(200)}});
        client
            .write_all(request.to_string().as_bytes())
            .expect("request written");
        tick_until(&mut listener, |o| *o == TickOutcome::Disconnected);
        assert_eq!(listener.state(), ListenerState::AwaitingClient);
    }

    #[test]
    fn malformed_request_ends_session() {
        let mut listener = started(ListenerConfig::default());
        let mut client = connect(&listener);
        client.write_all(b"{\"type\" \"ping\"}").expect("request written");
        tick_until(&mut listener, |o| *o == TickOutcome::Disconnected);
        assert_eq!(listener.state(), ListenerState::AwaitingClient);
    }

    #[test]
    fn invalid_command_shape_keeps_session() {
        let mut listener = started(ListenerConfig::default());
        let mut client = connect(&listener);
        let response = round_trip(&mut listener, &mut client, json!({"params": {}}));
        assert_eq!(response["status"], "error");
        assert!(response["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid command: "));
        assert_eq!(listener.state(), ListenerState::Idle);
    }

    #[test]
    fn oversized_response_becomes_failure() {
        let config = ListenerConfig::default().with_max_response_size(32);
        let mut listener = started(config);
        let mut client = connect(&listener);
        let response = round_trip(
            &mut listener,
            &mut client,
            json!({"type": "get_layer_extent", "params": {"layer_name": "rivers"}}),
        );
        assert_eq!(response["status"], "error");
        assert!(response["message"]
            .as_str()
            .unwrap()
            .starts_with("response too large"));
    }

    #[test]
    fn client_not_reading_cannot_stall_tick() {
        let config = ListenerConfig::default().with_write_timeout(Duration::from_millis(200));
        let mut listener = started(config);
        listener
            .table_mut()
            .register("render_map", |_: &Params| -> mapbridge_dispatch::Result<Value> {
                Ok(Value::String("x".repeat(32 * 1024 * 1024)))
            });

        // Sends a request whose response overflows the socket buffers, then
        // never reads.
        let mut stalled = connect(&listener);
        stalled
            .write_all(br#"{"type":"render_map","params":{}}"#)
            .expect("request should be written");

        let (done_tx, done_rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let outcome = tick_until(&mut listener, |o| {
                matches!(o, TickOutcome::Handled { .. } | TickOutcome::Disconnected)
            });
            let _ = done_tx.send(());
            (listener, outcome)
        });
        done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("tick should return while the client is not reading");
        let (mut listener, outcome) = worker.join().expect("ticking should not panic");

        assert_eq!(outcome, TickOutcome::Disconnected);
        assert_eq!(listener.state(), ListenerState::AwaitingClient);
        drop(stalled);

        let mut client = connect(&listener);
        let response = round_trip(&mut listener, &mut client, json!({"type": "ping"}));
        assert_eq!(response, json!({"status": "success", "result": {"pong": true}}));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut listener = started(ListenerConfig::default());
        let addr = listener.local_addr();
        listener.start().expect("second start is a no-op");
        assert_eq!(listener.local_addr(), addr);

        let _client = connect(&listener);
        tick_until(&mut listener, |o| matches!(o, TickOutcome::Accepted(_)));

        listener.stop();
        listener.stop();
        assert_eq!(listener.state(), ListenerState::Stopped);
        assert_eq!(listener.local_addr(), None);
        assert_eq!(listener.tick(), TickOutcome::Stopped);

        listener.start().expect("restart should bind");
        assert_eq!(listener.state(), ListenerState::AwaitingClient);
    }

    #[test]
    fn idle_tick_without_client() {
        let mut listener = started(ListenerConfig::default());
        assert_eq!(listener.tick(), TickOutcome::Waiting);
        assert!(listener.tick().is_idle());
    }
}
