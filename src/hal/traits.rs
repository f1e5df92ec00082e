// src/hal/traits.rs
//! Core HAL traits for input source abstraction

use crate::error::{SpikeResult, TransportError};
use crate::hal::types::{ConnectionHandle, DataBits, DeviceDescriptor, FlowControl, Parity, SessionState, StopBits};
use std::sync::Arc;

/// Callback invoked once per received chunk, on the chipset's I/O thread
pub type ReadCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Vendor-variant USB-to-serial chipset
///
/// Setters do not report failure. A chipset that silently ignores an
/// unsupported setting is an accepted platform limitation.
pub trait SerialChipset: Send {
    /// Establish the physical link
    fn open(&mut self) -> Result<(), TransportError>;

    fn set_baud_rate(&mut self, baud_rate: u32);

    fn set_data_bits(&mut self, data_bits: DataBits);

    fn set_stop_bits(&mut self, stop_bits: StopBits);

    fn set_parity(&mut self, parity: Parity);

    fn set_flow_control(&mut self, flow_control: FlowControl);

    /// Fire-and-forget transmission
    fn write(&mut self, bytes: &[u8]);

    /// Register the read callback, replacing any previous one. Returns
    /// immediately; the callback runs on a chipset-owned thread.
    fn read(&mut self, callback: ReadCallback);

    /// Release the physical link and drop the registered callback
    fn close(&mut self);
}

/// Builds the chipset driver for an accepted device
pub trait ChipsetFactory {
    /// `None` when the chipset variant is not recognized. The resulting
    /// transport is absent rather than an error.
    fn create(&self, descriptor: &DeviceDescriptor, handle: &ConnectionHandle) -> Option<Box<dyn SerialChipset>>;
}

/// Lets a caller keep a shared reference to the factory it hands over
impl<F: ChipsetFactory + ?Sized> ChipsetFactory for Arc<F> {
    fn create(&self, descriptor: &DeviceDescriptor, handle: &ConnectionHandle) -> Option<Box<dyn SerialChipset>> {
        (**self).create(descriptor, handle)
    }
}

/// Lifecycle-managed source of raw sample bytes
pub trait InputSource: Send {
    /// Establish the physical link
    fn open(&mut self) -> SpikeResult<()>;

    /// Configure the line, arm the data path and send the handshake
    fn on_input_start(&mut self) -> SpikeResult<()>;

    /// Close the transport. Bytes in flight are discarded.
    fn on_input_stop(&mut self);

    /// Release every resource. Idempotent.
    fn close(&mut self);

    /// Best-effort write to the device
    fn write(&mut self, bytes: &[u8]);

    fn state(&self) -> SessionState;

    fn descriptor(&self) -> &DeviceDescriptor;

    /// `open` followed by `on_input_start`
    fn start(&mut self) -> SpikeResult<()> {
        self.open()?;
        self.on_input_start()
    }
}
