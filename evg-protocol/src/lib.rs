//! # EVG Protocol Library
//!
//! This crate implements the UDP register-access protocol spoken by the
//! VME-EVG-230/RF timing card family, enabling client-server communication
//! for reading and writing the card's 16-bit hardware registers.
//!
//! ## Overview
//!
//! The timing card exposes its register file over the network: every request
//! and every reply is a single fixed-size datagram describing one register
//! access. This library implements that message layout, allowing you to:
//!
//! - Serialize and deserialize register-access messages
//! - Address the card's named registers without raw offsets
//! - Work with the register map's documented bit assignments
//!
//! ## Message Format
//!
//! Requests and replies share one 12-byte layout, with the multi-byte fields
//! in network byte order:
//!
//! | field | width | encoding |
//! |-----------|--------|-----------------------------------------------|
//! | access | 8 bit | 1 = read, 2 = write |
//! | status | 8 bit | filled in by the peer, advisory |
//! | data | 16 bit | big-endian register value |
//! | address | 32 bit | big-endian, [`BASE_ADDRESS`] + register offset |
//! | reference | 32 bit | reserved, always 0 |
//!
//! ## Basic Usage
//!
//! ### Building a Request
//!
//! ```
//! use evg_protocol::{Register, RegisterMessage};
//!
//! let request = RegisterMessage::read_request(Register::Control);
//! let datagram = request.to_bytes();
//! // Send datagram to the card...
//! assert_eq!(datagram.len(), RegisterMessage::LENGTH);
//! assert_eq!(&datagram[4..8], &[0x80, 0x00, 0x00, 0x00]);
//! ```
//!
//! ### Decoding a Reply
//!
//! ```
//! use evg_protocol::{Access, Register, RegisterMessage};
//!
//! let received = RegisterMessage::write_request(Register::SoftwareEvent, 0x7f).to_bytes();
//! let reply = RegisterMessage::from_bytes(&received).expect("Reply should decode");
//! assert_eq!(reply.access, Access::Write);
//! assert_eq!(reply.data, 0x7f);
//! ```
//!
//! ## Register Map
//!
//! [`Register`] names every documented register of the dual-sequencer
//! revision. Registers that exist once per sequencer (address select, event
//! code, timestamp words, clock select) are resolved through the
//! `Register::sequencer_*` constructors, which return `None` for sequencer
//! indices the card does not have.
//!
//! ## Error Handling
//!
//! Decoding uses the [`error::DecodeError`] type. Encoding cannot fail.
//!
//! ## Thread Safety
//!
//! All types in this library are plain values and safe to share across
//! threads. Transporting messages is the caller's concern.

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
