use std::{
    io,
    net::{ToSocketAddrs, UdpSocket},
    thread,
    time::Duration,
};

use crate::EvgServer;
use evg_protocol::{Access, RegisterMessage};

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Number of replies to swallow before the server starts answering.
    /// Exercises a client's retransmission path.
    pub drop_first: u32,
    /// Artificial delay before every reply.
    pub reply_delay: Option<Duration>,
}

#[derive(Debug)]
pub struct Server<T: EvgServer> {
    server: T,
    config: Config,
    dropped: u32,
}

/// Builder to create a [Server] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use evg_server::server::Builder;
/// use std::time::Duration;
///
/// let server = Builder::new()
///     .drop_first(2)
///     .reply_delay(Duration::from_millis(50))
///     .build(my_register_bank);
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Swallow the first `count` replies.
    pub fn drop_first(mut self, count: u32) -> Self {
        self.config.drop_first = count;
        self
    }

    /// Delay every reply by `delay`.
    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.config.reply_delay = Some(delay);
        self
    }

    /// Build and return the server
    pub fn build<T: EvgServer>(self, server: T) -> Server<T> {
        Server::new(server, self.config)
    }
}

impl<T: EvgServer> Server<T> {
    pub fn new(server: T, config: Config) -> Server<T> {
        Server {
            server,
            config,
            dropped: 0,
        }
    }

    /// Binds `addr` and serves register accesses forever.
    pub fn listen(&mut self, addr: impl ToSocketAddrs) -> io::Result<()> {
        let socket = UdpSocket::bind(addr)?;
        log::info!("Server listening on {}", socket.local_addr()?);
        self.serve(socket)
    }

    /// Serves register accesses on an already bound socket.
    ///
    /// Useful when the caller needs the ephemeral port before the loop
    /// starts, e.g. to hand it to a client under test.
    pub fn serve(&mut self, socket: UdpSocket) -> io::Result<()> {
        let mut buf = [0u8; 64];
        loop {
            let (received, peer) = socket.recv_from(&mut buf)?;
            let request = match RegisterMessage::from_bytes(&buf[..received]) {
                Ok(request) => request,
                Err(error) => {
                    log::warn!("Dropping undecodable datagram from {}: {}", peer, error);
                    continue;
                }
            };
            let reply = self.process_message(request);
            if self.dropped < self.config.drop_first {
                self.dropped += 1;
                log::debug!(
                    "Swallowing reply {} of {}",
                    self.dropped,
                    self.config.drop_first
                );
                continue;
            }
            if let Some(delay) = self.config.reply_delay {
                thread::sleep(delay);
            }
            socket.send_to(&reply.to_bytes(), peer)?;
        }
    }

    /// Process one request, forwarding the register access to the backend.
    fn process_message(&mut self, request: RegisterMessage) -> RegisterMessage {
        let mut reply = request;
        match request.register_offset() {
            Some(offset) if offset <= self.server.highest_offset() => {
                match request.access {
                    Access::Read => {
                        reply.data = self.server.read_register(offset);
                        log::debug!("Read offset 0x{:02x}: 0x{:04x}", offset, reply.data);
                    }
                    Access::Write => {
                        self.server.write_register(offset, request.data);
                        log::debug!("Write offset 0x{:02x}: 0x{:04x}", offset, request.data);
                    }
                }
                reply.status = 0;
            }
            _ => {
                log::warn!(
                    "{} of address 0x{:08x} is outside the register window",
                    request.access,
                    request.address
                );
                reply.status = 1;
            }
        }
        reply
    }
}
