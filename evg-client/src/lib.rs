//! # EVG Client
//!
//! A Rust driver library for operating VME-EVG-230/RF timing cards (event
//! generators) over their UDP register-access protocol.
//!
//! ## Overview
//!
//! The timing card exposes a 16-bit register file over UDP: one datagram per
//! register access, no delivery guarantee, no write acknowledgement beyond an
//! echoed reply. This crate layers three things on top of that transport:
//!
//! - A **reliable channel** that retransmits every access up to three times
//!   with a one-second reply timeout, and a write-verify combinator that
//!   reads a written register back to confirm the value took effect
//! - A **registry** of configured devices, populated once at startup and
//!   initialized in a single pass that opens and connects the sockets
//! - An **operation layer** that turns domain requests (enable the card,
//!   program an event or a timestamp, select clock sources, set prescalers)
//!   into the right register choreography
//!
//! ## Concurrency
//!
//! The driver spawns no threads and runs no event loop; it blocks the calling
//! thread for the duration of the network I/O, bounded by the retry budget
//! (about three seconds per register access in the worst case). Each device
//! carries a mutex that is held across whole transactions, so multi-register
//! sequences such as address-select-then-data never interleave between
//! concurrent callers. Operations on different devices are independent.
//!
//! ## Basic Usage
//!
//! ### Configuring and Initializing Devices
//!
//! ```ignore
//! use evg_client::Registry;
//!
//! let mut registry = Registry::new();
//! registry.configure("EVG1", "192.0.2.5", 2000, 125)?;
//! registry.initialize_all()?;
//! ```
//!
//! ### Operating a Device
//!
//! ```ignore
//! let device = registry.open("EVG1").expect("EVG1 is configured");
//!
//! device.enable(true)?;
//! device.set_event(0, 10, 0x31)?;
//! device.set_timestamp(0, 10, 100.0)?;
//! println!("firmware 0x{:04x}", device.firmware_version()?);
//! ```
//!
//! ## Error Handling
//!
//! Registration problems surface as [`ConfigError`] before any socket is
//! opened. Operations return [`Error`]: invalid arguments are rejected before
//! any I/O, an unreachable peer surfaces as [`Error::Communication`] once the
//! retry budget is spent, and a write whose read-back disagrees surfaces as
//! [`Error::VerifyMismatch`] so callers can distinguish a lost datagram from
//! a value the card refused. Errors propagate to the immediate caller; the
//! channel's retry loop is the only built-in recovery.
//!
//! ## Related Crates
//!
//! - `evg-protocol` - wire message encoding/decoding and the register map
//! - `evg-server` - server side of the protocol, for simulators and tests

mod channel;
mod device;
pub mod error;
mod operations;
mod registry;

pub use channel::{REPLY_TIMEOUT, RETRY_BUDGET};
pub use device::Device;
pub use error::{ConfigError, Error};
pub use operations::{AcSource, RF_PRESCALER_MAX, RfSource, TriggerSource};
pub use registry::{DEFAULT_CAPACITY, Registry};
