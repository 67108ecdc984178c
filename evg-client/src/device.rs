use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use parking_lot::Mutex;

use crate::{channel::Channel, error::Error};

/// One configured timing card.
///
/// A device is created by [`Registry::configure`](crate::Registry::configure)
/// and lives as long as the registry. Its mutex serializes every register
/// transaction: an operation holds the lock from its first register access to
/// its last, so multi-register sequences (address select followed by data
/// access) never interleave between callers.
pub struct Device {
    name: String,
    address: SocketAddr,
    frequency_mhz: u32,
    pub(crate) channel: Mutex<Option<Channel>>,
}

impl Device {
    pub(crate) fn new(name: &str, ip: Ipv4Addr, port: u16, frequency_mhz: u32) -> Device {
        Device {
            name: name.to_string(),
            address: SocketAddr::V4(SocketAddrV4::new(ip, port)),
            frequency_mhz,
            channel: Mutex::new(None),
        }
    }

    /// The unique name the device was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The card's UDP endpoint.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The configured event-clock frequency in MHz.
    ///
    /// One event-clock cycle lasts `1 / frequency` microseconds; timestamp
    /// operations use this to convert between microseconds and cycle counts.
    pub fn event_clock_mhz(&self) -> u32 {
        self.frequency_mhz
    }

    /// Opens and connects the device's socket.
    ///
    /// Called once per device by
    /// [`Registry::initialize_all`](crate::Registry::initialize_all). Until it
    /// succeeds, every operation reports [`Error::NotInitialized`].
    pub(crate) fn initialize(&self) -> Result<(), Error> {
        let channel = Channel::connect(self.address)?;
        *self.channel.lock() = Some(channel);
        log::info!("Connected to device {} at {}", self.name, self.address);
        Ok(())
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("frequency_mhz", &self.frequency_mhz)
            .finish()
    }
}
