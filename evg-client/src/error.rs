use std::{error::Error as StdError, fmt::Display, io};

use evg_protocol::Register;

/// Errors that may occur while registering a device.
///
/// All of these are detected before any socket is opened; a rejected
/// registration leaves the registry unchanged.
#[derive(Debug)]
pub enum ConfigError {
    /// The registry already holds as many devices as it was sized for.
    TooManyDevices { capacity: usize },
    /// The device name is empty or longer than the driver supports.
    InvalidName(String),
    /// A device with this name is already registered.
    DuplicateName(String),
    /// The IP literal is not a parseable IPv4 address.
    InvalidIp(String),
    /// The UDP port is zero.
    InvalidPort,
    /// The event-clock frequency is zero or too large for the divider register.
    InvalidFrequency(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::TooManyDevices { capacity } => {
                write!(f, "Unable to configure device: registry holds at most {} devices", capacity)
            }
            ConfigError::InvalidName(name) => {
                write!(f, "Unable to configure device: missing or incorrect name {:?}", name)
            }
            ConfigError::DuplicateName(name) => {
                write!(f, "Unable to configure device: name {:?} is already registered", name)
            }
            ConfigError::InvalidIp(ip) => {
                write!(f, "Unable to configure device: missing or incorrect ip {:?}", ip)
            }
            ConfigError::InvalidPort => {
                write!(f, "Unable to configure device: missing or incorrect port")
            }
            ConfigError::InvalidFrequency(mhz) => {
                write!(f, "Unable to configure device: invalid event clock frequency {} MHz", mhz)
            }
        }
    }
}

impl StdError for ConfigError {}

/// Errors reported by register operations.
#[derive(Debug)]
pub enum Error {
    /// The device is registered but its socket was never opened, or opening it failed.
    NotInitialized,
    /// An argument is outside the range the hardware can express. No network
    /// I/O was performed.
    InvalidArgument(String),
    /// No valid reply arrived within the retry budget. The request may or may
    /// not have been applied by the peer.
    Communication,
    /// The transport confirmed a write, but reading the register back returned
    /// a different value.
    VerifyMismatch {
        register: Register,
        wrote: u16,
        read: u16,
    },
    /// Socket setup failed.
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotInitialized => write!(f, "Device has not been initialized"),
            Error::InvalidArgument(what) => write!(f, "{}", what),
            Error::Communication => {
                write!(f, "No valid reply from device within the retry budget")
            }
            Error::VerifyMismatch {
                register,
                wrote,
                read,
            } => {
                write!(
                    f,
                    "Wrote 0x{:04x} to {:?} but read back 0x{:04x}",
                    wrote, register, read
                )
            }
            Error::Io(error) => write!(f, "{}", error),
        }
    }
}

impl StdError for Error {}
