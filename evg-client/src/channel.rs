use std::{
    io::{self, ErrorKind},
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use evg_protocol::{Register, RegisterMessage};

use crate::error::Error;

/// Time to wait for a reply to a single request.
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Number of send/wait/receive attempts per register access.
pub const RETRY_BUDGET: u32 = 3;

/// A datagram socket connected to one card, with the retransmission
/// discipline layered on top.
///
/// The peer gives no delivery guarantee, so every access retransmits on
/// timeout or on a malformed reply, up to [`RETRY_BUDGET`] attempts of
/// [`REPLY_TIMEOUT`] each. A truly unreachable card therefore fails in about
/// three seconds instead of hanging the caller.
#[derive(Debug)]
pub(crate) struct Channel {
    socket: UdpSocket,
}

impl Channel {
    /// Binds an ephemeral local socket and connects it to the card.
    ///
    /// UDP "connect" only fixes the default peer; no packets are exchanged.
    pub(crate) fn connect(peer: SocketAddr) -> io::Result<Channel> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(peer)?;
        socket.set_read_timeout(Some(REPLY_TIMEOUT))?;
        socket.set_write_timeout(Some(REPLY_TIMEOUT))?;
        Ok(Channel { socket })
    }

    /// Reads a 16-bit register.
    pub(crate) fn read_register(&self, register: Register) -> Result<u16, Error> {
        let reply = self.transact(&RegisterMessage::read_request(register))?;
        Ok(reply.data)
    }

    /// Writes a 16-bit register.
    ///
    /// The reply only confirms that the transport delivered the request, not
    /// that the card accepted the value; use [`Channel::write_verify`] for
    /// state that must stick.
    pub(crate) fn write_register(&self, register: Register, value: u16) -> Result<(), Error> {
        self.transact(&RegisterMessage::write_request(register, value))?;
        Ok(())
    }

    /// Writes a register and reads it back, failing if the value did not take
    /// effect.
    pub(crate) fn write_verify(&self, register: Register, value: u16) -> Result<(), Error> {
        self.write_register(register, value)?;
        let read = self.read_register(register)?;
        if read != value {
            log::error!(
                "Verify failed on {:?}: wrote 0x{:04x}, read back 0x{:04x}",
                register,
                value,
                read
            );
            return Err(Error::VerifyMismatch {
                register,
                wrote: value,
                read,
            });
        }
        Ok(())
    }

    fn transact(&self, request: &RegisterMessage) -> Result<RegisterMessage, Error> {
        let datagram = request.to_bytes();
        for attempt in 1..=RETRY_BUDGET {
            match self.attempt(&datagram) {
                Ok(reply) => {
                    if reply.status != 0 {
                        log::debug!(
                            "Peer reported status 0x{:02x} for {} of offset 0x{:02x?}",
                            reply.status,
                            request.access,
                            request.register_offset()
                        );
                    }
                    return Ok(reply);
                }
                Err(error) => {
                    log::debug!(
                        "Attempt {}/{} for {} of offset 0x{:02x?} failed: {}",
                        attempt,
                        RETRY_BUDGET,
                        request.access,
                        request.register_offset(),
                        error
                    );
                }
            }
        }
        log::error!(
            "{} of offset 0x{:02x?} got no valid reply after {} attempts",
            request.access,
            request.register_offset(),
            RETRY_BUDGET
        );
        Err(Error::Communication)
    }

    /// One send/wait/receive round. Timeouts, short sends, and datagrams that
    /// do not decode all consume the attempt.
    fn attempt(&self, datagram: &[u8]) -> io::Result<RegisterMessage> {
        let sent = self.socket.send(datagram)?;
        if sent != datagram.len() {
            return Err(io::Error::other("short send"));
        }
        let mut buf = [0u8; 64];
        let received = self.socket.recv(&mut buf)?;
        RegisterMessage::from_bytes(&buf[..received])
            .map_err(|error| io::Error::new(ErrorKind::InvalidData, error))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::UdpSocket;
    use std::thread;

    /// A one-shot peer that echoes register messages like the card does.
    fn echo_peer() -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        thread::spawn(move || {
            let mut buf = [0u8; 64];
            loop {
                let Ok((received, from)) = socket.recv_from(&mut buf) else {
                    return;
                };
                let Ok(mut message) = RegisterMessage::from_bytes(&buf[..received]) else {
                    continue;
                };
                message.data = 0x4711;
                let _ = socket.send_to(&message.to_bytes(), from);
            }
        });
        addr
    }

    #[test]
    fn read_returns_reply_data() {
        let channel = Channel::connect(echo_peer()).unwrap();
        let value = channel.read_register(Register::Control).unwrap();
        assert_eq!(value, 0x4711);
    }

    #[test]
    fn verify_mismatch_is_reported() {
        let channel = Channel::connect(echo_peer()).unwrap();
        match channel.write_verify(Register::Control, 0x1000) {
            Err(Error::VerifyMismatch { wrote, read, .. }) => {
                assert_eq!(wrote, 0x1000);
                assert_eq!(read, 0x4711);
            }
            other => panic!("expected VerifyMismatch, got {:?}", other),
        }
    }
}
