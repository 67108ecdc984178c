//! Operation-layer behavior against the simulated card: register
//! choreography, unit conversion, and verification.
use std::time::Duration;

use evg_client::{AcSource, Error, RfSource, TriggerSource};
use evg_protocol::{
    AC_ENABLE_SYNC, CONTROL_DISABLE_FIFO, RF_CONTROL_DIVIDER_MASK, RF_CONTROL_EXTERNAL,
    ac_enable_seq_trigger, event_enable_sequence, event_enable_soft_trigger,
};
use evg_server_sim::SoftEvg;
use evg_tests::{Recording, Shared, registry_for, spawn_server};

#[test]
fn enable_round_trip() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    assert!(!device.is_enabled().expect("card powers on disabled"));

    device.enable(true).expect("enable");
    assert!(device.is_enabled().expect("read back"));
    // The upstream receiver FIFO stays disabled.
    assert_ne!(bank.lock().control() & CONTROL_DISABLE_FIFO, 0);

    device.enable(false).expect("disable");
    assert!(!device.is_enabled().expect("read back"));
}

#[test]
fn event_tables_are_independent_per_sequencer() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.set_event(0, 10, 0x31).expect("sequencer 0");
    device.set_event(1, 10, 0x42).expect("sequencer 1");

    assert_eq!(device.get_event(0, 10).expect("read back"), 0x31);
    assert_eq!(device.get_event(1, 10).expect("read back"), 0x42);
    assert_eq!(bank.lock().event(0, 10), Some(0x31));
    assert_eq!(bank.lock().event(1, 10), Some(0x42));
}

#[test]
fn timestamps_are_split_into_cycle_words() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    // 100 us at 125 MHz: 12500 cycles across the two 16-bit halves.
    device.set_timestamp(0, 10, 100.0).expect("set");
    assert_eq!(bank.lock().timestamp_cycles(0, 10), Some(12_500));
    assert_eq!(device.get_timestamp(0, 10).expect("get"), 100.0);
}

#[test]
fn timestamp_round_trip_stays_within_one_cycle() {
    let (backend, _bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    let cycle_us = 1.0 / 125.0;
    for (address, timestamp) in [(0u16, 3.14159f64), (1, 0.0), (2, 8000.5), (3, 0.004)] {
        device.set_timestamp(1, address, timestamp).expect("set");
        let read_back = device.get_timestamp(1, address).expect("get");
        assert!(
            (timestamp - read_back).abs() <= cycle_us,
            "{} came back as {}",
            timestamp,
            read_back
        );
    }
}

#[test]
fn sequencers_enable_independently() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.enable_sequencer(0, true).expect("start");
    assert!(device.is_sequencer_enabled(0).expect("read back"));
    assert!(!device.is_sequencer_enabled(1).expect("read back"));
    assert_ne!(bank.lock().event_enable() & event_enable_sequence(0), 0);

    device.enable_sequencer(0, false).expect("stop");
    assert!(!device.is_sequencer_enabled(0).expect("read back"));
}

#[test]
fn trigger_source_round_trip() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device
        .set_sequencer_trigger_source(0, TriggerSource::Ac)
        .expect("set");
    assert_eq!(
        device.get_sequencer_trigger_source(0).expect("get"),
        TriggerSource::Ac
    );
    {
        let bank = bank.lock();
        assert_eq!(bank.event_enable() & event_enable_soft_trigger(0), 0);
        assert_ne!(bank.ac_enable() & ac_enable_seq_trigger(0), 0);
    }

    device
        .set_sequencer_trigger_source(0, TriggerSource::Soft)
        .expect("set");
    assert_eq!(
        device.get_sequencer_trigger_source(0).expect("get"),
        TriggerSource::Soft
    );

    // Sequencer 1 was never touched.
    assert_eq!(bank.lock().ac_enable() & ac_enable_seq_trigger(1), 0);
}

#[test]
fn software_triggers_latch() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.trigger_sequencer(1).expect("trigger");
    device.trigger_sequencer(1).expect("trigger");
    assert_eq!(bank.lock().triggers(1), Some(2));
    assert_eq!(bank.lock().triggers(0), Some(0));
}

#[test]
fn software_events_reach_the_bank() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.set_software_event(0x31).expect("fire");
    device.set_software_event(0x7f).expect("fire");
    assert_eq!(bank.lock().software_events(), &[0x31, 0x7f]);
}

#[test]
fn clock_sources_round_trip() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    assert_eq!(
        device.get_rf_clock_source().expect("get"),
        RfSource::Internal
    );
    device
        .set_rf_clock_source(RfSource::External)
        .expect("set");
    assert_eq!(
        device.get_rf_clock_source().expect("get"),
        RfSource::External
    );
    assert_eq!(
        bank.lock().rf_control() & RF_CONTROL_EXTERNAL,
        RF_CONTROL_EXTERNAL
    );

    device
        .set_ac_sync_source(AcSource::EventClock)
        .expect("set");
    assert_eq!(
        device.get_ac_sync_source().expect("get"),
        AcSource::EventClock
    );
    assert_ne!(bank.lock().ac_enable() & AC_ENABLE_SYNC, 0);
    device.set_ac_sync_source(AcSource::Line).expect("set");
    assert_eq!(device.get_ac_sync_source().expect("get"), AcSource::Line);
}

#[test]
fn prescalers_round_trip() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.set_rf_prescaler(4).expect("rf");
    assert_eq!(device.get_rf_prescaler().expect("get"), 4);
    // Stored as the divisor minus one.
    assert_eq!(bank.lock().rf_control() & RF_CONTROL_DIVIDER_MASK, 3);

    device.set_ac_prescaler(50).expect("ac");
    assert_eq!(device.get_ac_prescaler().expect("get"), 50);

    device.set_sequencer_prescaler(0, 1).expect("seq 0");
    device.set_sequencer_prescaler(1, 12_000).expect("seq 1");
    assert_eq!(device.get_sequencer_prescaler(0).expect("get"), 1);
    assert_eq!(device.get_sequencer_prescaler(1).expect("get"), 12_000);

    device.set_counter_prescaler(3, 100_000).expect("counter");
    assert_eq!(device.get_counter_prescaler(3).expect("get"), 100_000);
    assert_eq!(bank.lock().counter_prescaler(3), Some(100_000));
}

#[test]
fn usec_divider_follows_the_configured_frequency() {
    let (backend, bank) = Shared::new(SoftEvg::new());
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    device.set_usec_divider().expect("set");
    assert_eq!(device.get_usec_divider().expect("get"), 125);
    assert_eq!(bank.lock().usec_divider(), 125);
}

#[test]
fn firmware_version_reads_the_firmware_register() {
    let (backend, _bank) = Shared::new(SoftEvg::with_firmware(0x2302));
    let registry = registry_for(spawn_server(backend), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    assert_eq!(device.firmware_version().expect("read"), 0x2302);
}

#[test]
fn rejected_arguments_never_reach_the_wire() {
    let (recording, trace) = Recording::new(SoftEvg::new(), Duration::ZERO);
    let registry = registry_for(spawn_server(recording), 125);
    let device = registry.open("EVG1").expect("EVG1 is configured");

    let too_long = f64::from(u32::MAX) / 125.0 + 1.0;
    assert!(matches!(
        device.set_timestamp(0, 10, too_long),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        device.set_event(2, 0, 0x31),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        device.get_event(0, 2048),
        Err(Error::InvalidArgument(_))
    ));
    let trace = trace.lock();
    assert!(trace.is_empty(), "saw {:?}", *trace);
}
