// src/hal/device_manager.rs
//! Attached-device bookkeeping
//!
//! At most one input source feeds the sink at a time. A second supported
//! board is refused until the first is detached.

use crate::acquisition::SampleSink;
use crate::config::AcquisitionSettings;
use crate::error::{SpikeError, SpikeResult};
use crate::hal::classifier::is_supported;
use crate::hal::input_source::StreamingInputSource;
use crate::hal::traits::ChipsetFactory;
use crate::hal::types::{ConnectionHandle, DeviceDescriptor, SessionId, StreamStats, UsbSerialPort};
use std::sync::Arc;
use tracing::{info, warn};

pub struct InputSourceManager<F: ChipsetFactory> {
    factory: F,
    sink: Arc<dyn SampleSink>,
    settings: AcquisitionSettings,
    active: Option<StreamingInputSource>,
}

impl<F: ChipsetFactory> InputSourceManager<F> {
    pub fn new(factory: F, sink: Arc<dyn SampleSink>, settings: AcquisitionSettings) -> Self {
        Self {
            factory,
            sink,
            settings,
            active: None,
        }
    }

    /// Create, open and start a source for `descriptor`. On any failure the
    /// source is released and nothing stays attached.
    pub fn attach(&mut self, descriptor: DeviceDescriptor, handle: &ConnectionHandle) -> SpikeResult<SessionId> {
        if !is_supported(&descriptor) {
            return Err(SpikeError::UnsupportedDevice {
                vendor_id: descriptor.vendor_id,
                product_id: descriptor.product_id,
            });
        }

        if let Some(active) = &self.active {
            let busy = active.descriptor();
            return Err(SpikeError::SessionBusy {
                active_vendor_id: busy.vendor_id,
                active_product_id: busy.product_id,
            });
        }

        let chipset = self.factory.create(&descriptor, handle);
        if chipset.is_none() {
            warn!(device = %descriptor, port = %handle.port_name, "no chipset driver for device");
        }

        let mut source = StreamingInputSource::new(descriptor, chipset, self.sink.clone(), &self.settings)?;
        source.open()?;
        source.on_input_start()?;

        let session = source.current_session();
        info!(
            device = %descriptor,
            vendor = source.vendor().name(),
            port = %handle.port_name,
            session = %session,
            "input source attached"
        );
        self.active = Some(source);
        Ok(session)
    }

    pub fn attach_port(&mut self, port: &UsbSerialPort) -> SpikeResult<SessionId> {
        self.attach(port.descriptor, &port.handle())
    }

    /// Attach the first supported port, `Ok(None)` when there is none
    pub fn attach_first_supported<'a, I>(&mut self, ports: I) -> SpikeResult<Option<SessionId>>
    where
        I: IntoIterator<Item = &'a UsbSerialPort>,
    {
        match ports.into_iter().find(|port| is_supported(&port.descriptor)) {
            Some(port) => self.attach_port(port).map(Some),
            None => Ok(None),
        }
    }

    /// Stop and release the source for `descriptor`. Returns false when that
    /// device is not attached.
    pub fn detach(&mut self, descriptor: &DeviceDescriptor) -> bool {
        let matches = self
            .active
            .as_ref()
            .is_some_and(|source| source.descriptor() == descriptor);
        if !matches {
            return false;
        }

        if let Some(mut source) = self.active.take() {
            let stats = source.stats();
            source.close();
            info!(
                device = %descriptor,
                chunks = stats.chunks_forwarded,
                bytes = stats.bytes_forwarded,
                "input source detached"
            );
        }
        true
    }

    pub fn active(&self) -> Option<&StreamingInputSource> {
        self.active.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn stats(&self) -> Option<StreamStats> {
        self.active.as_ref().map(StreamingInputSource::stats)
    }

    /// Release the attached source, if any
    pub fn shutdown(&mut self) {
        if let Some(descriptor) = self.active.as_ref().map(|source| *source.descriptor()) {
            self.detach(&descriptor);
        }
    }
}

impl<F: ChipsetFactory> Drop for InputSourceManager<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
