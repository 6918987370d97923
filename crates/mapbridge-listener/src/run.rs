//! Driving an [`EmbeddedListener`] without a host event loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::info;

use crate::error::{ListenerError, Result};
use crate::listener::EmbeddedListener;

/// Tick `listener` on the calling thread until `shutdown` is set.
///
/// Starts the listener if needed and stops it before returning. The loop
/// only sleeps after a tick that found nothing to do, so a request arriving
/// in several reads is drained without waiting a full interval per read.
pub fn run_until(listener: &mut EmbeddedListener, shutdown: &AtomicBool) -> Result<()> {
    listener.start()?;
    drive(listener, shutdown);
    listener.stop();
    Ok(())
}

fn drive(listener: &mut EmbeddedListener, shutdown: &AtomicBool) {
    let interval = listener.config().tick_interval;
    while !shutdown.load(Ordering::SeqCst) {
        if listener.tick().is_idle() {
            thread::sleep(interval);
        }
    }
}

/// Start `listener` and tick it on a dedicated thread.
///
/// The socket is bound before this returns, so bind errors surface here and
/// [`ListenerHandle::local_addr`] is known immediately.
pub fn spawn_listener(mut listener: EmbeddedListener) -> Result<ListenerHandle> {
    listener.start()?;
    let local_addr = listener.local_addr();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    let handle = thread::Builder::new()
        .name("mapbridge-listener".to_string())
        .spawn(move || {
            drive(&mut listener, &shutdown_flag);
            listener.stop();
            listener
        })
        .map_err(ListenerError::Spawn)?;

    info!(addr = ?local_addr, "listener thread started");
    Ok(ListenerHandle {
        shutdown,
        handle: Some(handle),
        local_addr,
    })
}

/// Handle to a listener running on its own thread.
///
/// Dropping the handle asks the thread to stop but does not wait for it.
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<EmbeddedListener>>,
    local_addr: Option<SocketAddr>,
}

impl ListenerHandle {
    /// Ask the driver thread to stop after its current tick.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stop the driver thread and get the stopped listener back.
    pub fn join(mut self) -> Result<EmbeddedListener> {
        self.shutdown();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Err(ListenerError::ThreadPanic),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpStream;
    use std::time::Duration;

    use mapbridge_dispatch::CommandTable;
    use mapbridge_frame::{MessageReader, Response};
    use serde_json::json;

    use super::*;
    use crate::config::ListenerConfig;
    use crate::listener::ListenerState;

    fn config() -> ListenerConfig {
        ListenerConfig::default()
            .with_port(0)
            .with_tick_interval(Duration::from_millis(5))
    }

    fn ping(addr: SocketAddr) -> Response {
        let mut stream = TcpStream::connect(addr).expect("client should connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout should apply");
        stream
            .write_all(br#"{"type":"ping","params":{}}"#)
            .expect("request should be written");
        MessageReader::new(&mut stream)
            .read_response()
            .expect("response should arrive")
    }

    #[test]
    fn spawned_listener_serves_and_joins() {
        let listener = EmbeddedListener::new(config(), CommandTable::with_builtins());
        let handle = spawn_listener(listener).expect("listener should start");
        let addr = handle.local_addr().expect("listener should be bound");

        assert_eq!(ping(addr), Response::success(json!({"pong": true})));
        assert_eq!(ping(addr), Response::success(json!({"pong": true})));

        let listener = handle.join().expect("thread should stop cleanly");
        assert_eq!(listener.state(), ListenerState::Stopped);
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn run_until_returns_when_flag_is_set() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let worker = thread::spawn(move || {
            let mut listener = EmbeddedListener::new(config(), CommandTable::with_builtins());
            run_until(&mut listener, &flag).map(|()| listener.state())
        });

        thread::sleep(Duration::from_millis(50));
        shutdown.store(true, Ordering::SeqCst);
        let state = worker
            .join()
            .expect("worker should not panic")
            .expect("listener should run");
        assert_eq!(state, ListenerState::Stopped);
    }

    #[test]
    fn bind_error_surfaces_from_spawn() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("port should bind");
        let port = taken.local_addr().expect("bound address").port();
        let listener = EmbeddedListener::new(
            config().with_host("127.0.0.1").with_port(port),
            CommandTable::with_builtins(),
        );
        assert!(matches!(
            spawn_listener(listener),
            Err(ListenerError::Transport(_))
        ));
    }
}
