//! # Software Register Bank
//!
//! Models the VME-EVG-230/RF register file as seen through the UDP window.
//!
//! ## Example Usage
//!
//! ```ignore
//! use evg_server::server::Builder;
//! use evg_server_sim::SoftEvg;
//!
//! let mut server = Builder::new().build(SoftEvg::new());
//! server.listen("127.0.0.1:2000")?;
//! ```
use evg_protocol::{
    CONTROL_FIFO_FULL, EVENT_END_SEQUENCE, EVENT_TABLE_SIZE, MXC_CONTROL_COUNTER_MASK,
    MXC_CONTROL_HIGH_WORD, Register, control_seq_trigger,
};
use evg_server::EvgServer;

const CONTROL: u16 = Register::Control.offset();
const EVENT_ENABLE: u16 = Register::EventEnable.offset();
const SOFTWARE_EVENT: u16 = Register::SoftwareEvent.offset();
const SEQ_CLOCK_SEL_0: u16 = Register::SeqClockSel0.offset();
const SEQ_CLOCK_SEL_1: u16 = Register::SeqClockSel1.offset();
const AC_ENABLE: u16 = Register::AcEnable.offset();
const MXC_CONTROL: u16 = Register::MxcControl.offset();
const MXC_PRESCALER: u16 = Register::MxcPrescaler.offset();
const FIRMWARE: u16 = Register::Firmware.offset();
const RF_CONTROL: u16 = Register::RfControl.offset();
const SEQ_0_ADDRESS: u16 = Register::Seq0Address.offset();
const SEQ_0_CODE: u16 = Register::Seq0Code.offset();
const SEQ_0_TIME_HIGH: u16 = Register::Seq0TimeHigh.offset();
const SEQ_0_TIME_LOW: u16 = Register::Seq0TimeLow.offset();
const SEQ_1_ADDRESS: u16 = Register::Seq1Address.offset();
const SEQ_1_CODE: u16 = Register::Seq1Code.offset();
const SEQ_1_TIME_HIGH: u16 = Register::Seq1TimeHigh.offset();
const SEQ_1_TIME_LOW: u16 = Register::Seq1TimeLow.offset();
const USEC_DIVIDER: u16 = Register::UsecDivider.offset();

/// Firmware word reported by default: EVG-230 family, revision 2.
pub const DEFAULT_FIRMWARE: u16 = 0x2302;

/// The event-table address registers hold eleven bits.
const ADDRESS_MASK: u16 = EVENT_TABLE_SIZE - 1;

/// Software model of the card's register file.
///
/// Reads and writes behave like the hardware does under the original driver:
/// the address-select registers window the event and timestamp tables, the
/// MXC control register windows the 32-bit counter prescalers, trigger bits
/// latch a trigger instead of being stored, and the software-event register
/// is consumed immediately.
pub struct SoftEvg {
    control: u16,
    event_enable: u16,
    ac_enable: u16,
    mxc_control: u16,
    rf_control: u16,
    usec_divider: u16,
    firmware: u16,
    seq_clock_sel: [u16; 2],
    seq_address: [u16; 2],
    events: [Vec<u8>; 2],
    times: [Vec<u32>; 2],
    counters: [u32; 8],
    software_events: Vec<u8>,
    triggers: [u32; 2],
}

impl SoftEvg {
    /// Creates a bank in the power-on state: disabled, event tables filled
    /// with the end-of-sequence event, timestamps zeroed.
    pub fn new() -> SoftEvg {
        let table = vec![EVENT_END_SEQUENCE; usize::from(EVENT_TABLE_SIZE)];
        SoftEvg {
            control: evg_protocol::CONTROL_DISABLE | evg_protocol::CONTROL_DISABLE_FIFO,
            event_enable: 0,
            ac_enable: 0,
            mxc_control: 0,
            rf_control: 0,
            usec_divider: 0,
            firmware: DEFAULT_FIRMWARE,
            seq_clock_sel: [0; 2],
            seq_address: [0; 2],
            events: [table.clone(), table],
            times: [
                vec![0; usize::from(EVENT_TABLE_SIZE)],
                vec![0; usize::from(EVENT_TABLE_SIZE)],
            ],
            counters: [0; 8],
            software_events: Vec::new(),
            triggers: [0; 2],
        }
    }

    /// Same as [`SoftEvg::new`] with a specific firmware word.
    pub fn with_firmware(firmware: u16) -> SoftEvg {
        SoftEvg {
            firmware,
            ..SoftEvg::new()
        }
    }

    fn table_index(&self, sequencer: usize) -> usize {
        usize::from(self.seq_address[sequencer] & ADDRESS_MASK)
    }

    fn selected_counter(&self) -> usize {
        usize::from(self.mxc_control & MXC_CONTROL_COUNTER_MASK)
    }

    fn read_time_word(&self, sequencer: usize, high: bool) -> u16 {
        let time = self.times[sequencer][self.table_index(sequencer)];
        if high { (time >> 16) as u16 } else { time as u16 }
    }

    fn write_time_word(&mut self, sequencer: usize, high: bool, value: u16) {
        let index = self.table_index(sequencer);
        let time = &mut self.times[sequencer][index];
        if high {
            *time = (*time & 0x0000_ffff) | (u32::from(value) << 16);
        } else {
            *time = (*time & 0xffff_0000) | u32::from(value);
        }
    }

    /// The raw control register.
    pub fn control(&self) -> u16 {
        self.control
    }

    /// The raw event-enable register.
    pub fn event_enable(&self) -> u16 {
        self.event_enable
    }

    /// The raw AC-enable register.
    pub fn ac_enable(&self) -> u16 {
        self.ac_enable
    }

    /// The raw RF-control register.
    pub fn rf_control(&self) -> u16 {
        self.rf_control
    }

    /// The microsecond divider.
    pub fn usec_divider(&self) -> u16 {
        self.usec_divider
    }

    /// The clock prescaler of a sequencer.
    pub fn sequencer_prescaler(&self, sequencer: u8) -> Option<u16> {
        self.seq_clock_sel.get(usize::from(sequencer)).copied()
    }

    /// An entry of a sequencer's event table.
    pub fn event(&self, sequencer: u8, address: u16) -> Option<u8> {
        self.events
            .get(usize::from(sequencer))?
            .get(usize::from(address))
            .copied()
    }

    /// An entry of a sequencer's timestamp table, in event-clock cycles.
    pub fn timestamp_cycles(&self, sequencer: u8, address: u16) -> Option<u32> {
        self.times
            .get(usize::from(sequencer))?
            .get(usize::from(address))
            .copied()
    }

    /// The 32-bit prescaler of a multiplexed counter.
    pub fn counter_prescaler(&self, counter: u8) -> Option<u32> {
        self.counters.get(usize::from(counter)).copied()
    }

    /// Every software event received so far, in arrival order.
    pub fn software_events(&self) -> &[u8] {
        &self.software_events
    }

    /// How often a sequencer's software trigger has fired.
    pub fn triggers(&self, sequencer: u8) -> Option<u32> {
        self.triggers.get(usize::from(sequencer)).copied()
    }
}

impl Default for SoftEvg {
    fn default() -> Self {
        SoftEvg::new()
    }
}

impl EvgServer for SoftEvg {
    fn read_register(&mut self, offset: u16) -> u16 {
        match offset {
            CONTROL => self.control,
            EVENT_ENABLE => self.event_enable,
            // Consumed as soon as it enters the event stream.
            SOFTWARE_EVENT => 0,
            SEQ_CLOCK_SEL_0 => self.seq_clock_sel[0],
            SEQ_CLOCK_SEL_1 => self.seq_clock_sel[1],
            AC_ENABLE => self.ac_enable,
            MXC_CONTROL => self.mxc_control,
            MXC_PRESCALER => {
                let counter = self.counters[self.selected_counter()];
                if self.mxc_control & MXC_CONTROL_HIGH_WORD != 0 {
                    (counter >> 16) as u16
                } else {
                    counter as u16
                }
            }
            FIRMWARE => self.firmware,
            RF_CONTROL => self.rf_control,
            SEQ_0_ADDRESS => self.seq_address[0],
            SEQ_1_ADDRESS => self.seq_address[1],
            SEQ_0_CODE => u16::from(self.events[0][self.table_index(0)]),
            SEQ_1_CODE => u16::from(self.events[1][self.table_index(1)]),
            SEQ_0_TIME_HIGH => self.read_time_word(0, true),
            SEQ_0_TIME_LOW => self.read_time_word(0, false),
            SEQ_1_TIME_HIGH => self.read_time_word(1, true),
            SEQ_1_TIME_LOW => self.read_time_word(1, false),
            USEC_DIVIDER => self.usec_divider,
            _ => 0,
        }
    }

    fn write_register(&mut self, offset: u16, value: u16) {
        match offset {
            CONTROL => {
                for sequencer in 0..2u8 {
                    if value & control_seq_trigger(sequencer) != 0 {
                        self.triggers[usize::from(sequencer)] += 1;
                    }
                }
                // Trigger bits latch, the FIFO flag is read-only.
                self.control = value
                    & !(control_seq_trigger(0) | control_seq_trigger(1))
                    & !CONTROL_FIFO_FULL;
            }
            EVENT_ENABLE => self.event_enable = value,
            SOFTWARE_EVENT => self.software_events.push(value as u8),
            SEQ_CLOCK_SEL_0 => self.seq_clock_sel[0] = value,
            SEQ_CLOCK_SEL_1 => self.seq_clock_sel[1] = value,
            AC_ENABLE => self.ac_enable = value,
            MXC_CONTROL => self.mxc_control = value,
            MXC_PRESCALER => {
                let index = self.selected_counter();
                let counter = &mut self.counters[index];
                if self.mxc_control & MXC_CONTROL_HIGH_WORD != 0 {
                    *counter = (*counter & 0x0000_ffff) | (u32::from(value) << 16);
                } else {
                    *counter = (*counter & 0xffff_0000) | u32::from(value);
                }
            }
            FIRMWARE => {}
            RF_CONTROL => self.rf_control = value,
            SEQ_0_ADDRESS => self.seq_address[0] = value & ADDRESS_MASK,
            SEQ_1_ADDRESS => self.seq_address[1] = value & ADDRESS_MASK,
            SEQ_0_CODE => {
                let index = self.table_index(0);
                self.events[0][index] = value as u8;
            }
            SEQ_1_CODE => {
                let index = self.table_index(1);
                self.events[1][index] = value as u8;
            }
            SEQ_0_TIME_HIGH => self.write_time_word(0, true, value),
            SEQ_0_TIME_LOW => self.write_time_word(0, false, value),
            SEQ_1_TIME_HIGH => self.write_time_word(1, true, value),
            SEQ_1_TIME_LOW => self.write_time_word(1, false, value),
            USEC_DIVIDER => self.usec_divider = value,
            _ => {}
        }
    }

    fn highest_offset(&self) -> u16 {
        USEC_DIVIDER
    }
}
