//! # EVG Server Library
//!
//! This crate provides a foundation for implementing the server side of the
//! UDP register-access protocol spoken by the VME-EVG-230/RF timing card
//! family.
//!
//! ## Overview
//!
//! The real peer of the protocol is the timing card itself. This library
//! exists for everything that stands in for it: software simulators, test
//! benches, and gateway processes that forward register accesses to hardware
//! reached some other way.
//!
//! ## Architecture
//!
//! The crate is built around two main components:
//!
//! - **[`EvgServer`] Trait**: Defines the interface that register-file
//!   backends must implement (reading and writing one 16-bit register by
//!   offset)
//! - **[`server::Server`]**: A generic server that receives request
//!   datagrams, decodes them, dispatches to the backend, and sends the echoed
//!   reply
//!
//! ## How It Works
//!
//! 1. A backend (e.g. a software register bank) implements [`EvgServer`]
//! 2. The backend is wrapped in a [`server::Server`] instance
//! 3. The server receives one request datagram per register access
//! 4. Each decoded request is dispatched to the backend
//! 5. The reply — the request with `status` filled in and, for reads, the
//!    register value — is sent back to the requester
//!
//! Datagrams that do not decode as register messages are logged and dropped;
//! the protocol has no way to answer them.
//!
//! ## Basic Usage
//!
//! ### Implementing a Backend
//!
//! ```
//! use evg_server::EvgServer;
//!
//! struct ZeroBank;
//!
//! impl EvgServer for ZeroBank {
//!     fn read_register(&mut self, _offset: u16) -> u16 {
//!         0
//!     }
//!
//!     fn write_register(&mut self, _offset: u16, _value: u16) {}
//! }
//! ```
//!
//! ### Starting the Server
//!
//! ```ignore
//! use evg_server::server::{Builder, Server};
//!
//! let server = Builder::new().build(ZeroBank);
//! server.listen("127.0.0.1:2000")?;
//! ```
//!
//! ## Fault Injection
//!
//! Clients of this protocol must survive a lossy and slow network, so
//! [`server::Config`] can drop the first n replies or delay every reply.
//! Both knobs default to off.
//!
//! ## Logging
//!
//! This crate uses the `log` crate for diagnostics. Enable logging to see the
//! bound address, each processed access, and dropped datagrams. Configure
//! logging with an implementation like `env_logger`:
//!
//! ```ignore
//! env_logger::init();
//! ```
//!
//! ## Thread Model
//!
//! The server processes datagrams sequentially in a single thread, which
//! matches the card: one register access at a time, in arrival order.
pub mod server;

/// Trait that register-file backends must implement.
///
/// Offsets are relative to the protocol's base address. The card never
/// refuses an access, so neither does the trait: unknown offsets should read
/// as zero and ignore writes. The [`server::Server`] marks accesses outside
/// the backend's window in the reply's advisory status byte.
pub trait EvgServer {
    /// Reads the 16-bit register at `offset`.
    fn read_register(&mut self, offset: u16) -> u16;

    /// Writes the 16-bit register at `offset`.
    fn write_register(&mut self, offset: u16, value: u16);

    /// The highest offset the backend models, used only to fill the advisory
    /// status byte for accesses beyond it.
    fn highest_offset(&self) -> u16 {
        u16::MAX
    }
}
