use std::net::Ipv4Addr;

use crate::{
    device::Device,
    error::{ConfigError, Error},
};

/// Number of devices a registry holds unless sized explicitly.
pub const DEFAULT_CAPACITY: usize = 10;

/// Device names must stay below this many bytes.
const NAME_LENGTH: usize = 30;

/// The bounded table of configured devices.
///
/// Devices are registered once at startup, initialized in one pass, and then
/// only looked up; nothing is ever removed. The registry owns the devices and
/// hands out borrows, so a [`Device`] handle stays valid for the registry's
/// whole lifetime.
pub struct Registry {
    devices: Vec<Device>,
    capacity: usize,
}

impl Registry {
    /// Creates a registry with the historical capacity of ten devices.
    pub fn new() -> Registry {
        Registry::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a registry bounded to `capacity` devices.
    pub fn with_capacity(capacity: usize) -> Registry {
        Registry {
            devices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Registers a device.
    ///
    /// Validates everything up front and appends an entry on success. No
    /// socket is opened here; that happens in [`Registry::initialize_all`].
    pub fn configure(
        &mut self,
        name: &str,
        ip: &str,
        port: u16,
        frequency_mhz: u32,
    ) -> Result<(), ConfigError> {
        if self.devices.len() >= self.capacity {
            return Err(ConfigError::TooManyDevices {
                capacity: self.capacity,
            });
        }
        if name.is_empty() || name.len() >= NAME_LENGTH {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        if self.devices.iter().any(|device| device.name() == name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        let ip: Ipv4Addr = ip
            .parse()
            .map_err(|_| ConfigError::InvalidIp(ip.to_string()))?;
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if frequency_mhz == 0 || frequency_mhz > u32::from(u16::MAX) {
            return Err(ConfigError::InvalidFrequency(frequency_mhz));
        }

        self.devices.push(Device::new(name, ip, port, frequency_mhz));
        log::info!(
            "Configured device {} at {}:{} ({} MHz event clock)",
            name,
            ip,
            port,
            frequency_mhz
        );
        Ok(())
    }

    /// Opens and connects the socket of every registered device.
    ///
    /// The first failure aborts the pass. The failed device's entry remains
    /// in the registry but is unusable: its operations report
    /// [`Error::NotInitialized`].
    pub fn initialize_all(&self) -> Result<(), Error> {
        for device in &self.devices {
            device.initialize().inspect_err(|error| {
                log::error!("Unable to initialize device {}: {}", device.name(), error);
            })?;
        }
        Ok(())
    }

    /// Looks up a device by name.
    pub fn open(&self, name: &str) -> Option<&Device> {
        if name.is_empty() || name.len() >= NAME_LENGTH {
            log::error!("Could not find device {:?}", name);
            return None;
        }
        self.devices.iter().find(|device| device.name() == name)
    }

    /// Iterates over all registered devices, in registration order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True if no device has been registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn configure_and_open() {
        let mut registry = Registry::new();
        registry.configure("EVG1", "192.0.2.5", 2000, 125).unwrap();
        let device = registry.open("EVG1").expect("device should be found");
        assert_eq!(device.name(), "EVG1");
        assert_eq!(device.event_clock_mhz(), 125);
        assert_eq!(device.address().to_string(), "192.0.2.5:2000");
        assert!(registry.open("EVG2").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = Registry::new();
        registry.configure("EVG1", "192.0.2.5", 2000, 125).unwrap();
        assert!(matches!(
            registry.configure("EVG1", "192.0.2.6", 2000, 125),
            Err(ConfigError::DuplicateName(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_bad_names() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.configure("", "192.0.2.5", 2000, 125),
            Err(ConfigError::InvalidName(_))
        ));
        let long = "X".repeat(30);
        assert!(matches!(
            registry.configure(&long, "192.0.2.5", 2000, 125),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_bad_endpoints() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.configure("EVG1", "not-an-ip", 2000, 125),
            Err(ConfigError::InvalidIp(_))
        ));
        assert!(matches!(
            registry.configure("EVG1", "192.0.2.500", 2000, 125),
            Err(ConfigError::InvalidIp(_))
        ));
        assert!(matches!(
            registry.configure("EVG1", "192.0.2.5", 0, 125),
            Err(ConfigError::InvalidPort)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_bad_frequencies() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.configure("EVG1", "192.0.2.5", 2000, 0),
            Err(ConfigError::InvalidFrequency(0))
        ));
        assert!(matches!(
            registry.configure("EVG1", "192.0.2.5", 2000, 70_000),
            Err(ConfigError::InvalidFrequency(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry = Registry::new();
        for i in 0..10 {
            registry
                .configure(&format!("EVG{}", i), "192.0.2.5", 2000 + i as u16, 125)
                .unwrap();
        }
        assert!(matches!(
            registry.configure("EVG10", "192.0.2.5", 2010, 125),
            Err(ConfigError::TooManyDevices { capacity: 10 })
        ));
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn capacity_is_configurable() {
        let mut registry = Registry::with_capacity(1);
        registry.configure("EVG1", "192.0.2.5", 2000, 125).unwrap();
        assert!(matches!(
            registry.configure("EVG2", "192.0.2.5", 2001, 125),
            Err(ConfigError::TooManyDevices { capacity: 1 })
        ));
    }

    #[test]
    fn open_rejects_overlong_names_without_searching() {
        let registry = Registry::new();
        assert!(registry.open("").is_none());
        assert!(registry.open(&"X".repeat(64)).is_none());
    }
}
