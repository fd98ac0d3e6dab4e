//! Line-oriented TCP trace server.
//!
//! Every accepted connection gets its own source group and reader thread.
//! When the peer disconnects, every lifeline of that group is terminated.
//! Idle connections are never reaped.

use super::line_buffer::LineBuffer;
use crate::model::{InputError, SharedModel, SourceGroup};
use std::io::{ErrorKind, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5112;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const READ_CHUNK: usize = 4096;

/// A bound, not yet running, trace server.
#[derive(Debug)]
pub struct TraceServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TraceServer {
    /// Bind on all interfaces at `port` (0 picks a free port).
    ///
    /// # Errors
    ///
    /// Returns `InputError::Bind` if the port cannot be bound.
    pub fn bind(port: u16) -> Result<Self, InputError> {
        Self::bind_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Bind on a specific address.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Bind` if the address cannot be bound.
    pub fn bind_addr(addr: SocketAddr) -> Result<Self, InputError> {
        let bind_error = |source| InputError::Bind {
            port: addr.port(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start accepting connections on a background thread.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` if the listener cannot be configured or the
    /// thread cannot be spawned.
    pub fn spawn(self, model: SharedModel) -> Result<ServerHandle, InputError> {
        self.listener.set_nonblocking(true)?;
        let stop = Arc::new(AtomicBool::new(false));
        let local_addr = self.local_addr;
        info!(addr = %local_addr, "Trace server listening");
        let thread = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("vizexec-accept".to_string())
                .spawn(move || accept_loop(self.listener, model, stop))?
        };
        Ok(ServerHandle {
            local_addr,
            stop,
            thread: Some(thread),
        })
    }
}

/// Running server. Stopping ends the accept loop; open connections keep
/// running until their peers disconnect.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address being served.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait for the accept thread.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Accept thread panicked");
            }
        }
    }
}

fn accept_loop(listener: TcpListener, model: SharedModel, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let group = model.allocate_source_group();
                info!(peer = %peer, group = %group, "Connection accepted");
                let model = model.clone();
                let spawned = thread::Builder::new()
                    .name(format!("vizexec-conn-{}", group))
                    .spawn(move || serve_connection(stream, peer, group, model));
                if let Err(error) = spawned {
                    warn!(peer = %peer, "Could not spawn connection thread: {}", error);
                }
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(error) => {
                warn!("Accept failed: {}", error);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
    info!("Trace server stopped");
}

fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    group: SourceGroup,
    model: SharedModel,
) {
    if let Err(error) = stream.set_nonblocking(false) {
        warn!(peer = %peer, "Could not make stream blocking: {}", error);
        model.terminate_group(&group);
        return;
    }
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut lines = 0u64;
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                for line in buffer.push(&chunk[..n]) {
                    model.ingest(&line, &group);
                    lines += 1;
                }
            }
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                warn!(peer = %peer, "Connection read failed: {}", error);
                break;
            }
        }
    }
    // end of stream terminates the last line, as at the end of a file
    if let Some(line) = buffer.take_remainder() {
        debug!(peer = %peer, "Ingesting unterminated final line");
        model.ingest(&line, &group);
        lines += 1;
    }
    let terminated = model.terminate_group(&group);
    info!(peer = %peer, group = %group, lines, terminated, "Connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;

    fn wait_for(
        model: &SharedModel,
        pred: impl Fn(&crate::model::SequenceModel) -> bool,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if pred(&model.lock()) {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn bind_conflict_is_reported() {
        let first = TraceServer::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap();
        let err = TraceServer::bind_addr(first.local_addr()).unwrap_err();
        assert!(matches!(err, InputError::Bind { .. }));
    }

    #[test]
    fn disconnect_terminates_connection_group() {
        let model = SharedModel::default();
        let server = TraceServer::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap();
        let handle = server.spawn(model.clone()).unwrap();

        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client.write_all(b"CAL t1 1 main\nCAL t1 2 inn").unwrap();
        client.write_all(b"er\n").unwrap();
        assert!(wait_for(&model, |m| m
            .lifelines()
            .first()
            .is_some_and(|l| l.depth() == 2)));

        drop(client);
        assert!(wait_for(&model, |m| m.lifelines()[0].is_terminated()));
        let model = model.lock();
        let line = &model.lifelines()[0];
        assert_eq!(line.id().as_str(), "g1/t1");
        assert!(line.frames().iter().all(|f| !f.is_open()));
        drop(model);
        handle.shutdown();
    }

    #[test]
    fn final_line_without_newline_is_applied() {
        // GIVEN a client whose last line has no newline
        let model = SharedModel::default();
        let server = TraceServer::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap();
        let handle = server.spawn(model.clone()).unwrap();
        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client.write_all(b"CAL t1 1 main\nEVT t1 2 last").unwrap();

        // WHEN it disconnects
        drop(client);

        // THEN the last line lands before the group is terminated
        assert!(wait_for(&model, |m| m
            .lifelines()
            .first()
            .is_some_and(|l| l.is_terminated())));
        let model = model.lock();
        let labels: Vec<Option<&str>> = model.lifelines()[0]
            .entities()
            .iter()
            .map(|e| e.label())
            .collect();
        assert!(labels.contains(&Some("last")), "{:?}", labels);
        let journal: Vec<String> = model.journal().lines().collect();
        assert_eq!(journal[1], "EVT g1/t1 2 last");
        assert_eq!(journal[2], "TRM g1/t1");
        drop(model);
        handle.shutdown();
    }
}
