// tests/error_propagation_tests.rs
//! Error propagation through the input source and manager
//!
//! Failures must surface as typed errors and leave nothing half-open.

use crossbeam::channel;
use spike_core::acquisition::{IngestionBuffer, SampleSink};
use spike_core::config::{AcquisitionSettings, ConfigLoader};
use spike_core::error::{IngestionError, SpikeError, SpikeResult, TransportError};
use spike_core::hal::simulator::{SimulatedChipset, SimulatedChipsetFactory, SimulatorEvent};
use spike_core::hal::{ConnectionHandle, DeviceDescriptor, InputSourceManager, SampleChunk, SessionState, StreamingInputSource};
use std::sync::Arc;

fn sink() -> Arc<dyn SampleSink> {
    let (tx, _rx) = channel::unbounded::<SampleChunk>();
    Arc::new(tx)
}

#[test]
fn test_open_failure_leaves_source_closed() {
    let (chipset, handle) = SimulatedChipset::new();
    handle.fail_next_open("permission denied");
    let mut source = StreamingInputSource::new(
        DeviceDescriptor::serial(0x2341, 0x0043),
        Some(Box::new(chipset)),
        sink(),
        &AcquisitionSettings::default(),
    )
    .unwrap();

    let err = source.open().unwrap_err();
    assert!(err.is_hardware());
    assert!(matches!(&err, SpikeError::Transport(TransportError::OpenFailed(reason)) if reason == "permission denied"));
    assert_eq!(source.state(), SessionState::Closed);
    assert!(source.session_id().is_none());

    // Nothing configured, nothing written, nothing armed
    assert_eq!(handle.events(), vec![SimulatorEvent::OpenFailed("permission denied".to_string())]);

    // The failure is not retried internally but a later open may succeed
    source.open().unwrap();
    assert_eq!(source.state(), SessionState::Opening);
}

#[test]
fn test_absent_transport() {
    let mut source = StreamingInputSource::new(
        DeviceDescriptor::serial(0x1A86, 0x7523),
        None,
        sink(),
        &AcquisitionSettings::default(),
    )
    .unwrap();

    source.write(b"b:;\n");
    source.on_input_stop();
    source.close();

    match source.open() {
        Err(SpikeError::Transport(TransportError::OpenFailed(_))) => {}
        other => panic!("expected OpenFailed, got {:?}", other),
    }
    assert_eq!(source.state(), SessionState::Closed);
}

#[test]
fn test_unsupported_device_message() {
    let result = StreamingInputSource::new(DeviceDescriptor::serial(0x05AC, 0x1234), None, sink(), &AcquisitionSettings::default());
    let err = result.err().expect("unsupported");
    assert_eq!(err.to_string(), "unsupported device 0x05ac:0x1234");
}

#[test]
fn test_start_from_wrong_state() {
    let (chipset, _handle) = SimulatedChipset::new();
    let mut source = StreamingInputSource::new(
        DeviceDescriptor::serial(0x0403, 0x6001),
        Some(Box::new(chipset)),
        sink(),
        &AcquisitionSettings::default(),
    )
    .unwrap();

    let err = source.on_input_start().unwrap_err();
    assert_eq!(err.to_string(), "cannot start input while session is Closed");

    source.open().unwrap();
    source.on_input_start().unwrap();
    assert!(matches!(
        source.on_input_start(),
        Err(SpikeError::InvalidState { state: SessionState::Streaming, .. })
    ));
}

#[test]
fn test_busy_session_keeps_first_device() {
    let factory = Arc::new(SimulatedChipsetFactory::new());
    let buffer = Arc::new(IngestionBuffer::new(8).unwrap());
    let mut manager = InputSourceManager::new(factory.clone(), buffer, AcquisitionSettings::default());

    let first = DeviceDescriptor::serial(0x2E73, 0x0001);
    let second = DeviceDescriptor::serial(0x2A03, 0x0043);
    manager.attach(first, &ConnectionHandle::new("/dev/ttyACM0")).unwrap();

    let err = manager.attach(second, &ConnectionHandle::new("/dev/ttyACM1")).unwrap_err();
    assert!(matches!(err, SpikeError::SessionBusy { active_vendor_id: 0x2E73, active_product_id: 0x0001 }));
    assert!(factory.handle_for(&second).is_none());
    assert_eq!(manager.active().unwrap().state(), SessionState::Streaming);
}

#[test]
fn test_failed_attach_releases_everything() {
    let factory = Arc::new(SimulatedChipsetFactory::new().with_failing_open("device busy"));
    let buffer = Arc::new(IngestionBuffer::new(8).unwrap());
    let mut manager = InputSourceManager::new(factory.clone(), buffer, AcquisitionSettings::default());
    let board = DeviceDescriptor::serial(0x2E73, 0x0001);

    let err = manager.attach(board, &ConnectionHandle::new("/dev/ttyACM0")).unwrap_err();
    assert!(matches!(err, SpikeError::Transport(TransportError::OpenFailed(_))));
    assert!(!manager.is_busy());

    let chipset = factory.handle_for(&board).unwrap();
    assert_eq!(chipset.open_count(), 0);
    assert!(chipset.writes().is_empty());
    assert!(!chipset.is_read_armed());

    // A failed attach does not block the next one
    let other = DeviceDescriptor::serial(0x0403, 0x6001);
    assert!(matches!(
        manager.attach(other, &ConnectionHandle::new("/dev/ttyUSB0")),
        Err(SpikeError::Transport(_))
    ));
    assert!(!manager.is_busy());
}

#[test]
fn test_component_errors_convert() {
    fn ingestion() -> SpikeResult<IngestionBuffer> {
        Ok(IngestionBuffer::new(0)?)
    }
    fn config() -> SpikeResult<()> {
        ConfigLoader::from_toml_str("[acquisition]\nchannel_capacity_chunks = 0\n")?;
        Ok(())
    }

    assert!(matches!(ingestion(), Err(SpikeError::Ingestion(IngestionError::InvalidCapacity))));
    assert!(matches!(config(), Err(SpikeError::Config(_))));
}
