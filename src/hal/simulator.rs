// src/hal/simulator.rs
//! Simulated serial chipset
//!
//! [`SimulatedChipset`] records every call made on it and hands the
//! registered read callback to a [`SimulatorHandle`]. Calling
//! [`SimulatorHandle::deliver`] from any thread plays the role of the
//! driver's I/O thread.

use crate::error::TransportError;
use crate::hal::traits::{ChipsetFactory, ReadCallback, SerialChipset};
use crate::hal::types::{ConnectionHandle, DataBits, DeviceDescriptor, FlowControl, LineConfig, Parity, StopBits};
use parking_lot::Mutex;
use std::sync::Arc;

/// One observable call on the simulated chipset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatorEvent {
    Open,
    OpenFailed(String),
    SetBaudRate(u32),
    SetDataBits(DataBits),
    SetStopBits(StopBits),
    SetParity(Parity),
    SetFlowControl(FlowControl),
    Write(Vec<u8>),
    ReadArmed,
    Close,
}

#[derive(Default)]
struct SimulatorState {
    is_open: bool,
    events: Vec<SimulatorEvent>,
    fail_next_open: Option<String>,
}

#[derive(Default)]
struct SimulatorShared {
    state: Mutex<SimulatorState>,
    // Separate lock so delivery never contends with event recording
    callback: Mutex<Option<ReadCallback>>,
}

/// Chipset half, owned by the transport
pub struct SimulatedChipset {
    shared: Arc<SimulatorShared>,
}

/// Test half, observes and drives the chipset
#[derive(Clone)]
pub struct SimulatorHandle {
    shared: Arc<SimulatorShared>,
}

impl SimulatedChipset {
    pub fn new() -> (Self, SimulatorHandle) {
        let shared = Arc::new(SimulatorShared::default());
        (
            Self {
                shared: shared.clone(),
            },
            SimulatorHandle { shared },
        )
    }

    fn record(&self, event: SimulatorEvent) {
        self.shared.state.lock().events.push(event);
    }
}

impl SerialChipset for SimulatedChipset {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock();
        if let Some(reason) = state.fail_next_open.take() {
            state.events.push(SimulatorEvent::OpenFailed(reason.clone()));
            return Err(TransportError::OpenFailed(reason));
        }
        state.is_open = true;
        state.events.push(SimulatorEvent::Open);
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.record(SimulatorEvent::SetBaudRate(baud_rate));
    }

    fn set_data_bits(&mut self, data_bits: DataBits) {
        self.record(SimulatorEvent::SetDataBits(data_bits));
    }

    fn set_stop_bits(&mut self, stop_bits: StopBits) {
        self.record(SimulatorEvent::SetStopBits(stop_bits));
    }

    fn set_parity(&mut self, parity: Parity) {
        self.record(SimulatorEvent::SetParity(parity));
    }

    fn set_flow_control(&mut self, flow_control: FlowControl) {
        self.record(SimulatorEvent::SetFlowControl(flow_control));
    }

    fn write(&mut self, bytes: &[u8]) {
        self.record(SimulatorEvent::Write(bytes.to_vec()));
    }

    fn read(&mut self, callback: ReadCallback) {
        *self.shared.callback.lock() = Some(callback);
        self.record(SimulatorEvent::ReadArmed);
    }

    fn close(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.is_open = false;
            state.events.push(SimulatorEvent::Close);
        }
        // Waits for an in-progress delivery to finish
        self.shared.callback.lock().take();
    }
}

impl SimulatorHandle {
    /// Make the next `open()` fail with `reason`
    pub fn fail_next_open(&self, reason: &str) {
        self.shared.state.lock().fail_next_open = Some(reason.to_string());
    }

    /// Push a chunk through the registered callback. Returns false when no
    /// callback is armed.
    pub fn deliver(&self, bytes: &[u8]) -> bool {
        match self.shared.callback.lock().as_mut() {
            Some(callback) => {
                callback(bytes);
                true
            }
            None => false,
        }
    }

    /// Deliver chunks in order, returning how many reached a callback
    pub fn deliver_all<'a, I>(&self, chunks: I) -> usize
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        chunks.into_iter().filter(|chunk| self.deliver(chunk)).count()
    }

    pub fn is_open(&self) -> bool {
        self.shared.state.lock().is_open
    }

    pub fn is_read_armed(&self) -> bool {
        self.shared.callback.lock().is_some()
    }

    pub fn events(&self) -> Vec<SimulatorEvent> {
        self.shared.state.lock().events.clone()
    }

    /// Payloads of every write, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared
            .state
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SimulatorEvent::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.count(|event| matches!(event, SimulatorEvent::Open))
    }

    pub fn close_count(&self) -> usize {
        self.count(|event| matches!(event, SimulatorEvent::Close))
    }

    /// Line settings from the most recent setter calls, `None` until all
    /// five have been applied
    pub fn line_config(&self) -> Option<LineConfig> {
        let state = self.shared.state.lock();
        let mut baud_rate = None;
        let mut data_bits = None;
        let mut stop_bits = None;
        let mut parity = None;
        let mut flow_control = None;

        for event in &state.events {
            match event {
                SimulatorEvent::SetBaudRate(v) => baud_rate = Some(*v),
                SimulatorEvent::SetDataBits(v) => data_bits = Some(*v),
                SimulatorEvent::SetStopBits(v) => stop_bits = Some(*v),
                SimulatorEvent::SetParity(v) => parity = Some(*v),
                SimulatorEvent::SetFlowControl(v) => flow_control = Some(*v),
                _ => {}
            }
        }

        Some(LineConfig {
            baud_rate: baud_rate?,
            data_bits: data_bits?,
            stop_bits: stop_bits?,
            parity: parity?,
            flow_control: flow_control?,
        })
    }

    fn count(&self, predicate: impl Fn(&SimulatorEvent) -> bool) -> usize {
        self.shared.state.lock().events.iter().filter(|e| predicate(e)).count()
    }
}

/// Factory handing out simulated chipsets and remembering their handles
#[derive(Default)]
pub struct SimulatedChipsetFactory {
    created: Mutex<Vec<(DeviceDescriptor, SimulatorHandle)>>,
    unrecognized_vendors: Vec<u16>,
    failing_open: Option<String>,
}

impl SimulatedChipsetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report no chipset driver for devices of this vendor
    pub fn with_unrecognized_vendor(mut self, vendor_id: u16) -> Self {
        self.unrecognized_vendors.push(vendor_id);
        self
    }

    /// Every chipset created from now on fails its first `open()`
    pub fn with_failing_open(mut self, reason: &str) -> Self {
        self.failing_open = Some(reason.to_string());
        self
    }

    /// Handle of the most recent chipset created for `descriptor`
    pub fn handle_for(&self, descriptor: &DeviceDescriptor) -> Option<SimulatorHandle> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|(d, _)| d == descriptor)
            .map(|(_, handle)| handle.clone())
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl ChipsetFactory for SimulatedChipsetFactory {
    fn create(&self, descriptor: &DeviceDescriptor, _handle: &ConnectionHandle) -> Option<Box<dyn SerialChipset>> {
        if self.unrecognized_vendors.contains(&descriptor.vendor_id) {
            return None;
        }
        let (chipset, handle) = SimulatedChipset::new();
        if let Some(reason) = &self.failing_open {
            handle.fail_next_open(reason);
        }
        self.created.lock().push((*descriptor, handle));
        Some(Box::new(chipset))
    }
}
