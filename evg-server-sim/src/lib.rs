//! # Soft EVG
//!
//! A software register bank with the observable semantics of the
//! VME-EVG-230/RF, for use behind [`evg_server::server::Server`].
//!
//! ## Overview
//!
//! The simulator models what a driver can see through the register window:
//! plain storage for the control and clock registers, the windowed
//! per-sequencer event and timestamp tables behind the address-select
//! registers, the windowed 32-bit counter prescalers behind MXC_CONTROL, the
//! self-clearing software-trigger bits, and the software-event register that
//! reads back as zero. Inspection accessors expose the backing state so tests
//! can assert on what a client actually programmed.
pub mod backends;

pub use backends::soft::SoftEvg;
