// src/hal/tests.rs
//! Unit tests for HAL types

use crate::hal::{ConnectionHandle, DeviceDescriptor, LineConfig, SessionId, SessionState, TransportCapability, UsbSerialPort};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{DataBits, FlowControl, Parity, SampleChunk, StopBits};

    #[test]
    fn test_descriptor_display() {
        let descriptor = DeviceDescriptor::serial(0x2E73, 0x0001);
        assert_eq!(descriptor.to_string(), "2e73:0001");
        assert_eq!(descriptor.transport_capability, TransportCapability::SerialCapable);
    }

    #[test]
    fn test_byb_line_config() {
        let line = LineConfig::default();
        assert_eq!(line, LineConfig::BYB);
        assert_eq!(line.baud_rate, 230_400);
        assert_eq!(line.data_bits, DataBits::Eight);
        assert_eq!(line.stop_bits, StopBits::One);
        assert_eq!(line.parity, Parity::None);
        assert_eq!(line.flow_control, FlowControl::Off);
    }

    #[test]
    fn test_session_state_transitions() {
        assert!(SessionState::Closed.can_open());
        assert!(SessionState::Stopped.can_open());
        assert!(!SessionState::Opening.can_open());
        assert!(!SessionState::Streaming.can_open());

        assert!(SessionState::Opening.is_live());
        assert!(SessionState::Streaming.is_live());
        assert!(!SessionState::Stopped.is_live());
    }

    #[test]
    fn test_session_id() {
        assert!(SessionId::NONE.is_none());
        assert!(!SessionId(7).is_none());
        assert_eq!(SessionId(7).to_string(), "#7");
    }

    #[test]
    fn test_sample_chunk_copies_bytes() {
        let mut driver_buffer = vec![1u8, 2, 3];
        let chunk = SampleChunk::new(SessionId(1), &driver_buffer);
        driver_buffer[0] = 9;

        assert_eq!(chunk.bytes, vec![1, 2, 3]);
        assert_eq!(chunk.len(), 3);
        assert!(chunk.received_at_nanos > 0);
    }

    #[test]
    fn test_port_handle() {
        let port = UsbSerialPort {
            port_name: "/dev/ttyUSB0".to_string(),
            descriptor: DeviceDescriptor::serial(0x0403, 0x6001),
            product: Some("FT232R".to_string()),
        };
        assert_eq!(port.handle(), ConnectionHandle::new("/dev/ttyUSB0"));
    }
}
