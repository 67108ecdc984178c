//! Shared plumbing for the integration tests: spawning simulated peers on
//! ephemeral ports and wrapping backends to observe or slow down the traffic
//! the client generates.
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use evg_client::Registry;
use evg_server::{EvgServer, server::Builder};
use parking_lot::Mutex;

/// One recorded register access, in arrival order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TraceEntry {
    pub write: bool,
    pub offset: u16,
}

/// Shares a backend between the server thread and the test.
pub struct Shared<T>(pub Arc<Mutex<T>>);

impl<T> Shared<T> {
    pub fn new(backend: T) -> (Shared<T>, Arc<Mutex<T>>) {
        let backend = Arc::new(Mutex::new(backend));
        (Shared(backend.clone()), backend)
    }
}

impl<T: EvgServer> EvgServer for Shared<T> {
    fn read_register(&mut self, offset: u16) -> u16 {
        self.0.lock().read_register(offset)
    }

    fn write_register(&mut self, offset: u16, value: u16) {
        self.0.lock().write_register(offset, value)
    }

    fn highest_offset(&self) -> u16 {
        self.0.lock().highest_offset()
    }
}

/// Records every access, optionally dwelling on each one to widen race
/// windows between concurrent callers.
pub struct Recording<T> {
    inner: T,
    trace: Arc<Mutex<Vec<TraceEntry>>>,
    dwell: Duration,
}

impl<T> Recording<T> {
    pub fn new(inner: T, dwell: Duration) -> (Recording<T>, Arc<Mutex<Vec<TraceEntry>>>) {
        let trace = Arc::new(Mutex::new(Vec::new()));
        (
            Recording {
                inner,
                trace: trace.clone(),
                dwell,
            },
            trace,
        )
    }
}

impl<T: EvgServer> EvgServer for Recording<T> {
    fn read_register(&mut self, offset: u16) -> u16 {
        self.trace.lock().push(TraceEntry {
            write: false,
            offset,
        });
        thread::sleep(self.dwell);
        self.inner.read_register(offset)
    }

    fn write_register(&mut self, offset: u16, value: u16) {
        self.trace.lock().push(TraceEntry {
            write: true,
            offset,
        });
        thread::sleep(self.dwell);
        self.inner.write_register(offset, value)
    }

    fn highest_offset(&self) -> u16 {
        self.inner.highest_offset()
    }
}

/// Serves `backend` on an ephemeral localhost port from a detached thread.
pub fn spawn_server<T: EvgServer + Send + 'static>(backend: T) -> SocketAddr {
    spawn_server_with(Builder::new(), backend)
}

/// Same as [`spawn_server`] with explicit server options.
pub fn spawn_server_with<T: EvgServer + Send + 'static>(
    builder: Builder,
    backend: T,
) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("an ephemeral port should bind");
    let addr = socket.local_addr().expect("bound sockets have an address");
    let mut server = builder.build(backend);
    thread::spawn(move || {
        let _ = server.serve(socket);
    });
    addr
}

/// A registry with one initialized device pointed at `peer`.
pub fn registry_for(peer: SocketAddr, frequency_mhz: u32) -> Registry {
    let mut registry = Registry::new();
    registry
        .configure("EVG1", "127.0.0.1", peer.port(), frequency_mhz)
        .expect("configuration should be valid");
    registry
        .initialize_all()
        .expect("connecting a UDP socket cannot fail");
    registry
}
