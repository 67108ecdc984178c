//! The semantic operation layer.
//!
//! Every public method on [`Device`] validates its arguments first, then
//! holds the device mutex for the entire register transaction. Operations on
//! the same device are therefore totally ordered on the wire; operations on
//! different devices proceed independently.

use evg_protocol::{
    AC_ENABLE_DIVIDER_MASK, AC_ENABLE_SYNC, CONTROL_DISABLE, CONTROL_DISABLE_FIFO, COUNTER_COUNT,
    EVENT_TABLE_SIZE, MXC_CONTROL_HIGH_WORD, RF_CONTROL_DIVIDER_MASK, RF_CONTROL_EXTERNAL,
    Register, SEQUENCER_COUNT, ac_enable_seq_trigger, control_seq_trigger, event_enable_sequence,
    event_enable_soft_trigger,
};

use crate::{device::Device, error::Error};

/// Largest RF prescaler the five-bit divider field can hold.
pub const RF_PRESCALER_MAX: u16 = 32;

/// Source of the RF reference clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RfSource {
    /// The card's internal fractional synthesizer.
    Internal,
    /// The external RF input on the front panel.
    External,
}

/// What the AC trigger synchronizes to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AcSource {
    /// The mains line input, divided but otherwise free-running.
    Line,
    /// The event clock.
    EventClock,
}

/// What starts a sequencer run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TriggerSource {
    /// Software (VME) trigger only.
    Soft,
    /// The AC trigger input.
    Ac,
}

fn invalid_sequencer(sequencer: u8) -> Error {
    Error::InvalidArgument(format!(
        "sequencer {} does not exist, the card has {}",
        sequencer, SEQUENCER_COUNT
    ))
}

fn check_sequencer(sequencer: u8) -> Result<(), Error> {
    if sequencer >= SEQUENCER_COUNT {
        return Err(invalid_sequencer(sequencer));
    }
    Ok(())
}

fn check_event_address(address: u16) -> Result<(), Error> {
    if address >= EVENT_TABLE_SIZE {
        return Err(Error::InvalidArgument(format!(
            "event address {} is outside the table of {} entries",
            address, EVENT_TABLE_SIZE
        )));
    }
    Ok(())
}

impl Device {
    /// Enables or disables the device.
    ///
    /// The upstream receiver FIFO is kept disabled in both states. The result
    /// is verified by reading the disable bit back, since the FIFO-full and
    /// violation flags in the same register are not under our control.
    pub fn enable(&self, enable: bool) -> Result<(), Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let value = if enable {
            CONTROL_DISABLE_FIFO
        } else {
            CONTROL_DISABLE | CONTROL_DISABLE_FIFO
        };
        channel.write_register(Register::Control, value)?;

        let control = channel.read_register(Register::Control)?;
        if (control & CONTROL_DISABLE != 0) == enable {
            return Err(Error::VerifyMismatch {
                register: Register::Control,
                wrote: value,
                read: control,
            });
        }
        Ok(())
    }

    /// True while the master disable bit is clear.
    pub fn is_enabled(&self) -> Result<bool, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let control = channel.read_register(Register::Control)?;
        Ok(control & CONTROL_DISABLE == 0)
    }

    /// Selects the RF reference clock source.
    pub fn set_rf_clock_source(&self, source: RfSource) -> Result<(), Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let mut value = channel.read_register(Register::RfControl)? & !RF_CONTROL_EXTERNAL;
        if source == RfSource::External {
            value |= RF_CONTROL_EXTERNAL;
        }
        channel.write_verify(Register::RfControl, value)
    }

    /// Reads back the RF reference clock source.
    pub fn get_rf_clock_source(&self) -> Result<RfSource, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let value = channel.read_register(Register::RfControl)?;
        if value & RF_CONTROL_EXTERNAL == RF_CONTROL_EXTERNAL {
            Ok(RfSource::External)
        } else {
            Ok(RfSource::Internal)
        }
    }

    /// Selects what the AC trigger synchronizes to.
    pub fn set_ac_sync_source(&self, source: AcSource) -> Result<(), Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let mut value = channel.read_register(Register::AcEnable)? & !AC_ENABLE_SYNC;
        if source == AcSource::EventClock {
            value |= AC_ENABLE_SYNC;
        }
        channel.write_verify(Register::AcEnable, value)
    }

    /// Reads back the AC synchronization source.
    pub fn get_ac_sync_source(&self) -> Result<AcSource, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let value = channel.read_register(Register::AcEnable)?;
        if value & AC_ENABLE_SYNC != 0 {
            Ok(AcSource::EventClock)
        } else {
            Ok(AcSource::Line)
        }
    }

    /// Sets the RF prescaler.
    ///
    /// The register stores the divisor minus one in a five-bit field, so the
    /// prescaler must lie in `1..=32`.
    pub fn set_rf_prescaler(&self, prescaler: u16) -> Result<(), Error> {
        if prescaler == 0 || prescaler > RF_PRESCALER_MAX {
            return Err(Error::InvalidArgument(format!(
                "RF prescaler {} is outside 1..={}",
                prescaler, RF_PRESCALER_MAX
            )));
        }
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let rf = channel.read_register(Register::RfControl)?;
        let value = (rf & !RF_CONTROL_DIVIDER_MASK) | (prescaler - 1);
        channel.write_verify(Register::RfControl, value)
    }

    /// Reads back the RF prescaler.
    pub fn get_rf_prescaler(&self) -> Result<u16, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let rf = channel.read_register(Register::RfControl)?;
        Ok((rf & RF_CONTROL_DIVIDER_MASK) + 1)
    }

    /// Sets the AC trigger prescaler, leaving the rest of the register intact.
    pub fn set_ac_prescaler(&self, prescaler: u8) -> Result<(), Error> {
        if prescaler == 0 {
            return Err(Error::InvalidArgument(
                "AC prescaler must not be zero".to_string(),
            ));
        }
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let ac = channel.read_register(Register::AcEnable)?;
        let value = (ac & !AC_ENABLE_DIVIDER_MASK) | u16::from(prescaler);
        channel.write_verify(Register::AcEnable, value)
    }

    /// Reads back the AC trigger prescaler.
    pub fn get_ac_prescaler(&self) -> Result<u8, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let ac = channel.read_register(Register::AcEnable)?;
        Ok((ac & AC_ENABLE_DIVIDER_MASK) as u8)
    }

    /// Sets the clock prescaler of the given sequencer.
    pub fn set_sequencer_prescaler(&self, sequencer: u8, prescaler: u16) -> Result<(), Error> {
        let register = Register::sequencer_clock_select(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(register, prescaler)
    }

    /// Reads back the clock prescaler of the given sequencer.
    pub fn get_sequencer_prescaler(&self, sequencer: u8) -> Result<u16, Error> {
        let register = Register::sequencer_clock_select(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.read_register(register)
    }

    /// Starts or stops the given sequencer's event program.
    pub fn enable_sequencer(&self, sequencer: u8, enable: bool) -> Result<(), Error> {
        check_sequencer(sequencer)?;
        let bit = event_enable_sequence(sequencer);
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let value = channel.read_register(Register::EventEnable)?;
        let value = if enable { value | bit } else { value & !bit };
        channel.write_verify(Register::EventEnable, value)
    }

    /// True while the given sequencer's event program is running.
    pub fn is_sequencer_enabled(&self, sequencer: u8) -> Result<bool, Error> {
        check_sequencer(sequencer)?;
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        let value = channel.read_register(Register::EventEnable)?;
        Ok(value & event_enable_sequence(sequencer) != 0)
    }

    /// Selects what triggers the given sequencer.
    ///
    /// The soft-trigger enable (EVENT_ENABLE) and the AC-trigger enable
    /// (AC_ENABLE) are updated under one lock acquisition so no caller can
    /// observe the intermediate state where both or neither are active.
    pub fn set_sequencer_trigger_source(
        &self,
        sequencer: u8,
        source: TriggerSource,
    ) -> Result<(), Error> {
        check_sequencer(sequencer)?;
        let soft_bit = event_enable_soft_trigger(sequencer);
        let ac_bit = ac_enable_seq_trigger(sequencer);

        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let enable = channel.read_register(Register::EventEnable)?;
        let ac = channel.read_register(Register::AcEnable)?;
        let (enable, ac) = match source {
            TriggerSource::Soft => (enable | soft_bit, ac & !ac_bit),
            TriggerSource::Ac => (enable & !soft_bit, ac | ac_bit),
        };
        channel.write_verify(Register::EventEnable, enable)?;
        channel.write_verify(Register::AcEnable, ac)
    }

    /// Reads back what triggers the given sequencer.
    pub fn get_sequencer_trigger_source(&self, sequencer: u8) -> Result<TriggerSource, Error> {
        check_sequencer(sequencer)?;
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let enable = channel.read_register(Register::EventEnable)?;
        let ac = channel.read_register(Register::AcEnable)?;
        if enable & event_enable_soft_trigger(sequencer) == 0
            && ac & ac_enable_seq_trigger(sequencer) != 0
        {
            Ok(TriggerSource::Ac)
        } else {
            Ok(TriggerSource::Soft)
        }
    }

    /// Fires the one-shot software trigger of the given sequencer.
    ///
    /// The trigger bit clears itself as soon as the card latches it, so the
    /// write is confirmed at the transport level only.
    pub fn trigger_sequencer(&self, sequencer: u8) -> Result<(), Error> {
        check_sequencer(sequencer)?;
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        let control = channel.read_register(Register::Control)?;
        channel.write_register(Register::Control, control | control_seq_trigger(sequencer))
    }

    /// Writes an event code into the given sequencer's event table.
    pub fn set_event(&self, sequencer: u8, address: u16, code: u8) -> Result<(), Error> {
        check_event_address(address)?;
        let address_register =
            Register::sequencer_address(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;
        let code_register =
            Register::sequencer_code(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;

        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(address_register, address)?;
        channel.write_verify(code_register, u16::from(code))
    }

    /// Reads an event code from the given sequencer's event table.
    pub fn get_event(&self, sequencer: u8, address: u16) -> Result<u8, Error> {
        check_event_address(address)?;
        let address_register =
            Register::sequencer_address(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;
        let code_register =
            Register::sequencer_code(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;

        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(address_register, address)?;
        let code = channel.read_register(code_register)?;
        Ok((code & 0x00ff) as u8)
    }

    /// Writes a timestamp, in microseconds, into the given sequencer's table.
    ///
    /// The timestamp is converted to event-clock cycles with the device's
    /// configured frequency and rejected, before any I/O, if the cycle count
    /// does not fit the 32-bit hardware counter. The two 16-bit halves are
    /// written high word first.
    pub fn set_timestamp(
        &self,
        sequencer: u8,
        address: u16,
        timestamp_us: f64,
    ) -> Result<(), Error> {
        check_event_address(address)?;
        let cycles = self.timestamp_to_cycles(timestamp_us)?;
        let address_register =
            Register::sequencer_address(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;
        let high_register = Register::sequencer_time_high(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;
        let low_register = Register::sequencer_time_low(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;

        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(address_register, address)?;
        channel.write_verify(high_register, (cycles >> 16) as u16)?;
        channel.write_verify(low_register, cycles as u16)
    }

    /// Reads a timestamp, in microseconds, from the given sequencer's table.
    pub fn get_timestamp(&self, sequencer: u8, address: u16) -> Result<f64, Error> {
        check_event_address(address)?;
        let address_register =
            Register::sequencer_address(sequencer).ok_or_else(|| invalid_sequencer(sequencer))?;
        let high_register = Register::sequencer_time_high(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;
        let low_register = Register::sequencer_time_low(sequencer)
            .ok_or_else(|| invalid_sequencer(sequencer))?;

        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(address_register, address)?;
        let high = channel.read_register(high_register)?;
        let low = channel.read_register(low_register)?;
        let cycles = (u32::from(high) << 16) | u32::from(low);
        Ok(f64::from(cycles) / f64::from(self.event_clock_mhz()))
    }

    /// Fires a software event.
    ///
    /// Fire and forget: some firmware revisions clear the register as soon as
    /// the event enters the stream, so the write is not verified.
    pub fn set_software_event(&self, code: u8) -> Result<(), Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_register(Register::SoftwareEvent, u16::from(code))
    }

    /// Programs the microsecond divider with the configured event-clock
    /// frequency.
    pub fn set_usec_divider(&self) -> Result<(), Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.write_verify(Register::UsecDivider, self.event_clock_mhz() as u16)
    }

    /// Reads back the microsecond divider.
    pub fn get_usec_divider(&self) -> Result<u16, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.read_register(Register::UsecDivider)
    }

    /// Sets the 32-bit prescaler of one of the multiplexed counters.
    ///
    /// The prescaler register is a window selected by MXC_CONTROL, which
    /// carries the counter index and a word-half flag. High word first, like
    /// the original driver.
    pub fn set_counter_prescaler(&self, counter: u8, prescaler: u32) -> Result<(), Error> {
        if counter >= COUNTER_COUNT {
            return Err(Error::InvalidArgument(format!(
                "counter {} does not exist, the card has {}",
                counter, COUNTER_COUNT
            )));
        }
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        channel.write_verify(
            Register::MxcControl,
            MXC_CONTROL_HIGH_WORD | u16::from(counter),
        )?;
        channel.write_verify(Register::MxcPrescaler, (prescaler >> 16) as u16)?;
        channel.write_verify(Register::MxcControl, u16::from(counter))?;
        channel.write_verify(Register::MxcPrescaler, prescaler as u16)
    }

    /// Reads back the 32-bit prescaler of one of the multiplexed counters.
    pub fn get_counter_prescaler(&self, counter: u8) -> Result<u32, Error> {
        if counter >= COUNTER_COUNT {
            return Err(Error::InvalidArgument(format!(
                "counter {} does not exist, the card has {}",
                counter, COUNTER_COUNT
            )));
        }
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;

        channel.write_verify(
            Register::MxcControl,
            MXC_CONTROL_HIGH_WORD | u16::from(counter),
        )?;
        let high = channel.read_register(Register::MxcPrescaler)?;
        channel.write_verify(Register::MxcControl, u16::from(counter))?;
        let low = channel.read_register(Register::MxcPrescaler)?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }

    /// Reads the firmware version register. No side effects.
    pub fn firmware_version(&self) -> Result<u16, Error> {
        let guard = self.channel.lock();
        let channel = guard.as_ref().ok_or(Error::NotInitialized)?;
        channel.read_register(Register::Firmware)
    }

    /// Converts a microsecond timestamp to event-clock cycles.
    ///
    /// The guard compares the very same product that is cast afterwards, so a
    /// timestamp passes exactly when its cycle count is representable.
    fn timestamp_to_cycles(&self, timestamp_us: f64) -> Result<u32, Error> {
        let cycles = timestamp_us * f64::from(self.event_clock_mhz());
        if !cycles.is_finite() || cycles < 0.0 || cycles > f64::from(u32::MAX) {
            return Err(Error::InvalidArgument(format!(
                "timestamp {} us does not fit the 32-bit cycle counter at {} MHz",
                timestamp_us,
                self.event_clock_mhz()
            )));
        }
        Ok(cycles as u32)
    }
}
