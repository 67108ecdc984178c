/// Encoding and decoding of register messages to and from the wire
use crate::{
    error::DecodeError,
    protocol::{Access, RegisterMessage},
};

impl RegisterMessage {
    /// Size of every request and reply datagram in bytes.
    pub const LENGTH: usize = 12;

    /// Encodes the message into a fixed-size buffer in network byte order.
    ///
    /// The 16- and 32-bit fields are big-endian on the wire; the two single
    /// bytes are transmitted as-is.
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut buf = [0u8; Self::LENGTH];
        buf[0] = self.access as u8;
        buf[1] = self.status;
        buf[2..4].copy_from_slice(&self.data.to_be_bytes());
        buf[4..8].copy_from_slice(&self.address.to_be_bytes());
        buf[8..12].copy_from_slice(&self.reference.to_be_bytes());
        buf
    }

    /// Decodes a message from a received datagram.
    ///
    /// The buffer must be exactly [`RegisterMessage::LENGTH`] bytes; UDP
    /// delivers whole datagrams, so any other size means the peer sent
    /// something that is not a register message.
    pub fn from_bytes(buf: &[u8]) -> Result<RegisterMessage, DecodeError> {
        if buf.len() != Self::LENGTH {
            return Err(DecodeError::Length {
                expected: Self::LENGTH,
                got: buf.len(),
            });
        }
        let access = Access::try_from(buf[0])?;
        // The sub-slices are fixed-width, the conversions cannot fail.
        let data = u16::from_be_bytes(buf[2..4].try_into().unwrap_or([0; 2]));
        let address = u32::from_be_bytes(buf[4..8].try_into().unwrap_or([0; 4]));
        let reference = u32::from_be_bytes(buf[8..12].try_into().unwrap_or([0; 4]));
        Ok(RegisterMessage {
            access,
            status: buf[1],
            data,
            address,
            reference,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::error::DecodeError;
    use crate::protocol::{Access, Register, RegisterMessage};

    #[test]
    fn encode_read_request() {
        let message = RegisterMessage::read_request(Register::EventEnable);
        assert_eq!(
            message.to_bytes(),
            [0x01, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_write_request() {
        let message = RegisterMessage::write_request(Register::RfControl, 0x01c3);
        assert_eq!(
            message.to_bytes(),
            [0x02, 0x00, 0x01, 0xc3, 0x80, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn decode_reply() {
        let buf = [0x01, 0x00, 0x12, 0x34, 0x80, 0x00, 0x00, 0x44, 0x00, 0x00, 0x00, 0x00];
        let message = RegisterMessage::from_bytes(&buf).unwrap();
        assert_eq!(message.access, Access::Read);
        assert_eq!(message.data, 0x1234);
        assert_eq!(message.address, 0x8000_0044);
        assert_eq!(message.register_offset(), Some(0x44));
        assert_eq!(message.reference, 0);
    }

    #[test]
    fn round_trip() {
        let message = RegisterMessage::write_request(Register::Seq1TimeLow, 0xbeef);
        let decoded = RegisterMessage::from_bytes(&message.to_bytes()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn short_datagram() {
        match RegisterMessage::from_bytes(&[0x01, 0x00, 0x12]) {
            Err(DecodeError::Length { expected, got }) => {
                assert_eq!(expected, RegisterMessage::LENGTH);
                assert_eq!(got, 3);
            }
            other => panic!("expected Length error, got {:?}", other),
        }
    }

    #[test]
    fn oversized_datagram() {
        let buf = [0u8; 16];
        assert!(matches!(
            RegisterMessage::from_bytes(&buf),
            Err(DecodeError::Length { got: 16, .. })
        ));
    }

    #[test]
    fn invalid_access_byte() {
        let mut buf = RegisterMessage::read_request(Register::Control).to_bytes();
        buf[0] = 0x07;
        match RegisterMessage::from_bytes(&buf) {
            Err(DecodeError::Access(value)) => assert_eq!(value, 0x07),
            other => panic!("expected Access error, got {:?}", other),
        }
    }
}
