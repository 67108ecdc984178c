use std::fmt::Display;

use crate::error::DecodeError;

/// All register addresses on the wire are this base plus a [`Register`] offset.
pub const BASE_ADDRESS: u32 = 0x8000_0000;

/// Number of independent sequencers in the card.
pub const SEQUENCER_COUNT: u8 = 2;

/// Number of entries in each sequencer's event/timestamp table.
pub const EVENT_TABLE_SIZE: u16 = 2048;

/// Number of general-purpose (multiplexed) counters.
pub const COUNTER_COUNT: u8 = 8;

/// The event code that terminates a sequence.
pub const EVENT_END_SEQUENCE: u8 = 0x7f;

/// The direction of a register access.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Access {
    Read = 1,
    Write = 2,
}

impl TryFrom<u8> for Access {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, DecodeError> {
        match value {
            1 => Ok(Access::Read),
            2 => Ok(Access::Write),
            other => Err(DecodeError::Access(other)),
        }
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// The registers exposed by the VME-EVG-230/RF, as offsets from [`BASE_ADDRESS`].
///
/// Sequencer-indexed registers exist once per sequencer; use the
/// `sequencer_*` constructors to resolve an index to a concrete register.
/// Timestamps are 32 bits wide and occupy two consecutive 16-bit registers,
/// high word first.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u16)]
pub enum Register {
    Control = 0x00,
    EventEnable = 0x02,
    SoftwareEvent = 0x04,
    SeqClockSel0 = 0x24,
    SeqClockSel1 = 0x26,
    AcEnable = 0x28,
    MxcControl = 0x2A,
    MxcPrescaler = 0x2C,
    Firmware = 0x2E,
    RfControl = 0x40,
    Seq0Address = 0x44,
    Seq0Code = 0x46,
    Seq0TimeHigh = 0x48,
    Seq0TimeLow = 0x4A,
    Seq1Address = 0x4C,
    Seq1Code = 0x4E,
    Seq1TimeHigh = 0x50,
    Seq1TimeLow = 0x52,
    UsecDivider = 0x68,
}

impl Register {
    /// The register's offset from [`BASE_ADDRESS`].
    pub const fn offset(self) -> u16 {
        self as u16
    }

    /// The full 32-bit address transmitted on the wire.
    pub const fn address(self) -> u32 {
        BASE_ADDRESS + self.offset() as u32
    }

    /// The event-table address-select register of the given sequencer.
    pub fn sequencer_address(sequencer: u8) -> Option<Register> {
        match sequencer {
            0 => Some(Register::Seq0Address),
            1 => Some(Register::Seq1Address),
            _ => None,
        }
    }

    /// The event-code register paired with the given sequencer's address select.
    pub fn sequencer_code(sequencer: u8) -> Option<Register> {
        match sequencer {
            0 => Some(Register::Seq0Code),
            1 => Some(Register::Seq1Code),
            _ => None,
        }
    }

    /// The high word of the given sequencer's 32-bit timestamp register.
    pub fn sequencer_time_high(sequencer: u8) -> Option<Register> {
        match sequencer {
            0 => Some(Register::Seq0TimeHigh),
            1 => Some(Register::Seq1TimeHigh),
            _ => None,
        }
    }

    /// The low word of the given sequencer's 32-bit timestamp register.
    pub fn sequencer_time_low(sequencer: u8) -> Option<Register> {
        match sequencer {
            0 => Some(Register::Seq0TimeLow),
            1 => Some(Register::Seq1TimeLow),
            _ => None,
        }
    }

    /// The clock-select (prescaler) register of the given sequencer.
    pub fn sequencer_clock_select(sequencer: u8) -> Option<Register> {
        match sequencer {
            0 => Some(Register::SeqClockSel0),
            1 => Some(Register::SeqClockSel1),
            _ => None,
        }
    }
}

/// CONTROL: master disable bit. Cleared when the card is generating events.
pub const CONTROL_DISABLE: u16 = 0x8000;
/// CONTROL: receiver FIFO full flag (read-only).
pub const CONTROL_FIFO_FULL: u16 = 0x4000;
/// CONTROL: keeps the upstream receiver FIFO disabled.
pub const CONTROL_DISABLE_FIFO: u16 = 0x1000;
/// CONTROL: error LED state.
pub const CONTROL_ERROR_LED: u16 = 0x0800;
/// CONTROL: receive violation flag.
pub const CONTROL_RX_VIOLATION: u16 = 0x0001;

/// AC_ENABLE: synchronize the AC trigger to the event clock instead of the line.
pub const AC_ENABLE_SYNC: u16 = 0x4000;
/// AC_ENABLE: the AC divider occupies the low byte.
pub const AC_ENABLE_DIVIDER_MASK: u16 = 0x00ff;

/// MXC_CONTROL: selects the high word of the addressed counter's prescaler.
pub const MXC_CONTROL_HIGH_WORD: u16 = 0x0008;
/// MXC_CONTROL: the counter index occupies the low three bits.
pub const MXC_CONTROL_COUNTER_MASK: u16 = 0x0007;

/// RF_CONTROL: select the external RF reference input.
pub const RF_CONTROL_EXTERNAL: u16 = 0x01c0;
/// RF_CONTROL: the RF divider (prescaler minus one) occupies the low five bits.
pub const RF_CONTROL_DIVIDER_MASK: u16 = 0x001f;

/// CONTROL: one-shot software trigger for the given sequencer. Self-clearing.
pub const fn control_seq_trigger(sequencer: u8) -> u16 {
    0x0100 << sequencer
}

/// EVENT_ENABLE: sequence-run enable for the given sequencer.
pub const fn event_enable_sequence(sequencer: u8) -> u16 {
    0x0004 << sequencer
}

/// EVENT_ENABLE: software/VME trigger enable for the given sequencer.
pub const fn event_enable_soft_trigger(sequencer: u8) -> u16 {
    0x0100 << sequencer
}

/// AC_ENABLE: AC-line trigger enable for the given sequencer.
pub const fn ac_enable_seq_trigger(sequencer: u8) -> u16 {
    0x1000 << sequencer
}

/// A single register access, as carried in one UDP datagram.
///
/// Requests and replies share this layout. The peer echoes the request with
/// `status` filled in and, for reads, `data` holding the register value.
/// `reference` is reserved and always zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegisterMessage {
    pub access: Access,
    pub status: u8,
    pub data: u16,
    pub address: u32,
    pub reference: u32,
}

impl RegisterMessage {
    /// Builds a read request for the given register.
    pub fn read_request(register: Register) -> RegisterMessage {
        RegisterMessage {
            access: Access::Read,
            status: 0,
            data: 0,
            address: register.address(),
            reference: 0,
        }
    }

    /// Builds a write request carrying `data` for the given register.
    pub fn write_request(register: Register, data: u16) -> RegisterMessage {
        RegisterMessage {
            access: Access::Write,
            status: 0,
            data,
            address: register.address(),
            reference: 0,
        }
    }

    /// The register offset addressed by this message, if the address lies
    /// above [`BASE_ADDRESS`].
    pub fn register_offset(&self) -> Option<u16> {
        let offset = self.address.checked_sub(BASE_ADDRESS)?;
        u16::try_from(offset).ok()
    }
}
