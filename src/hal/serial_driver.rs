// src/hal/serial_driver.rs
//! Uniform serial transport over a vendor chipset
//!
//! The adapter tolerates an absent chipset: `write` and `start_reading` are
//! no-ops, `open` reports [`TransportError::OpenFailed`]. The same holds
//! after `close`, so callers never need to check which case they are in.

use crate::error::TransportError;
use crate::hal::traits::{ReadCallback, SerialChipset};
use crate::hal::types::LineConfig;
use tracing::{debug, trace};

/// Serial transport adapter
pub struct SerialTransport {
    chipset: Option<Box<dyn SerialChipset>>,
    is_open: bool,
    line_configured: bool,
}

impl SerialTransport {
    /// Wrap a chipset, `None` when its construction failed
    pub fn new(chipset: Option<Box<dyn SerialChipset>>) -> Self {
        Self {
            chipset,
            is_open: false,
            line_configured: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Line settings were applied since the last `open`
    pub fn is_line_configured(&self) -> bool {
        self.line_configured
    }

    /// Establish the physical link. Opening an already open link is a no-op.
    pub fn open(&mut self) -> Result<(), TransportError> {
        if self.is_open {
            return Ok(());
        }

        let chipset = self
            .chipset
            .as_mut()
            .ok_or_else(|| TransportError::OpenFailed("no chipset driver for device".to_string()))?;

        chipset.open()?;
        self.is_open = true;
        self.line_configured = false;
        debug!("serial transport opened");
        Ok(())
    }

    /// Apply line settings. Ignored unless the link is open.
    pub fn configure_line(&mut self, config: &LineConfig) {
        let Some(chipset) = self.open_chipset() else {
            return;
        };

        chipset.set_baud_rate(config.baud_rate);
        chipset.set_data_bits(config.data_bits);
        chipset.set_stop_bits(config.stop_bits);
        chipset.set_parity(config.parity);
        chipset.set_flow_control(config.flow_control);
        self.line_configured = true;
        debug!(baud_rate = config.baud_rate, "serial line configured");
    }

    /// Best-effort write, no delivery confirmation
    pub fn write(&mut self, bytes: &[u8]) {
        if let Some(chipset) = self.open_chipset() {
            trace!(len = bytes.len(), "serial write");
            chipset.write(bytes);
        }
    }

    /// Register the single read callback, replacing any previous one
    pub fn start_reading(&mut self, callback: ReadCallback) {
        if let Some(chipset) = self.open_chipset() {
            chipset.read(callback);
        }
    }

    /// Release the physical link. Closing twice releases once.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        if let Some(chipset) = self.chipset.as_mut() {
            chipset.close();
        }
        self.is_open = false;
        self.line_configured = false;
        debug!("serial transport closed");
    }

    fn open_chipset(&mut self) -> Option<&mut Box<dyn SerialChipset>> {
        if self.is_open {
            self.chipset.as_mut()
        } else {
            None
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::simulator::{SimulatedChipset, SimulatorEvent};

    #[test]
    fn test_absent_transport_is_inert() {
        let mut transport = SerialTransport::new(None);

        assert!(matches!(transport.open(), Err(TransportError::OpenFailed(_))));
        transport.configure_line(&LineConfig::BYB);
        transport.write(b"ignored");
        transport.start_reading(Box::new(|_| {}));
        transport.close();

        assert!(!transport.is_open());
        assert!(!transport.is_line_configured());
    }

    #[test]
    fn test_configure_line_applies_every_setting() {
        let (chipset, handle) = SimulatedChipset::new();
        let mut transport = SerialTransport::new(Some(Box::new(chipset)));

        transport.open().unwrap();
        transport.configure_line(&LineConfig::BYB);

        assert!(transport.is_line_configured());
        assert_eq!(handle.line_config(), Some(LineConfig::BYB));
    }

    #[test]
    fn test_operations_before_open_are_no_ops() {
        let (chipset, handle) = SimulatedChipset::new();
        let mut transport = SerialTransport::new(Some(Box::new(chipset)));

        transport.configure_line(&LineConfig::BYB);
        transport.write(b"early");
        transport.start_reading(Box::new(|_| {}));

        assert!(handle.events().is_empty());
    }

    #[test]
    fn test_operations_after_close_are_no_ops() {
        let (chipset, handle) = SimulatedChipset::new();
        let mut transport = SerialTransport::new(Some(Box::new(chipset)));

        transport.open().unwrap();
        transport.close();
        let events_at_close = handle.events();

        transport.configure_line(&LineConfig::BYB);
        transport.write(b"b:;\n");
        transport.start_reading(Box::new(|_| {}));

        assert_eq!(handle.events(), events_at_close);
        assert!(!handle.is_read_armed());
        assert!(handle.writes().is_empty());
        assert!(!transport.is_line_configured());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (chipset, handle) = SimulatedChipset::new();
        let mut transport = SerialTransport::new(Some(Box::new(chipset)));

        transport.open().unwrap();
        transport.close();
        transport.close();

        assert_eq!(handle.close_count(), 1);
        assert_eq!(handle.events(), vec![SimulatorEvent::Open, SimulatorEvent::Close]);
    }

    #[test]
    fn test_open_failure_leaves_transport_closed() {
        let (chipset, handle) = SimulatedChipset::new();
        handle.fail_next_open("permission denied");
        let mut transport = SerialTransport::new(Some(Box::new(chipset)));

        let err = transport.open().unwrap_err();
        assert_eq!(err, TransportError::OpenFailed("permission denied".to_string()));
        assert!(!transport.is_open());

        transport.open().unwrap();
        assert!(transport.is_open());
    }
}
