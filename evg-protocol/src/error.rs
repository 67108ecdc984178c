use std::{error::Error, fmt::Display};

/// Errors that may occur when decoding a received datagram.
#[derive(Debug)]
pub enum DecodeError {
    /// The datagram does not have the fixed message size.
    Length { expected: usize, got: usize },
    /// The access byte is neither read nor write.
    Access(u8),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Length { expected, got } => {
                write!(f, "Datagram has {} bytes, expected {}", got, expected)
            }
            DecodeError::Access(value) => {
                write!(f, "Invalid access byte 0x{:02x}", value)
            }
        }
    }
}

impl Error for DecodeError {}
