// src/hal/types.rs
//! Core types for the serial input source

use crate::config::constants::line::BAUD_RATE;
use crate::utils::time::current_timestamp_nanos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the host transport exposes a serial interface for the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportCapability {
    SerialCapable,
    NotCapable,
}

/// USB device descriptor as reported by the host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub transport_capability: TransportCapability,
}

impl DeviceDescriptor {
    pub const fn new(vendor_id: u16, product_id: u16, transport_capability: TransportCapability) -> Self {
        Self {
            vendor_id,
            product_id,
            transport_capability,
        }
    }

    /// Shorthand for a serial-capable device
    pub const fn serial(vendor_id: u16, product_id: u16) -> Self {
        Self::new(vendor_id, product_id, TransportCapability::SerialCapable)
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Already-granted connection to a device. On desktop hosts this is the
/// serial device path the OS driver exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle {
    pub port_name: String,
}

impl ConnectionHandle {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
        }
    }
}

/// Discovered serial port together with its USB descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbSerialPort {
    pub port_name: String,
    pub descriptor: DeviceDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl UsbSerialPort {
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle::new(self.port_name.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

/// Serial parity settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Serial flow control settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowControl {
    Off,
    Software,
    Hardware,
}

/// Serial line parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl LineConfig {
    /// The only line setup BYB firmware accepts: 230400 8N1, no flow control
    pub const BYB: LineConfig = LineConfig {
        baud_rate: BAUD_RATE,
        data_bits: DataBits::Eight,
        stop_bits: StopBits::One,
        parity: Parity::None,
        flow_control: FlowControl::Off,
    };
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::BYB
    }
}

/// Lifecycle state of one physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Closed,
    Opening,
    Streaming,
    Stopped,
}

impl SessionState {
    /// A new `open()` is allowed from here
    pub fn can_open(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Stopped)
    }

    /// The transport may be holding the physical link
    pub fn is_live(self) -> bool {
        matches!(self, SessionState::Opening | SessionState::Streaming)
    }
}

/// Identity of one successful `open()`. Zero is never a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    pub const NONE: SessionId = SessionId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw bytes from one transport read, owned by whoever holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleChunk {
    pub session: SessionId,
    pub bytes: Vec<u8>,
    pub received_at_nanos: u64,
}

impl SampleChunk {
    /// Copy `bytes` out of the driver buffer and stamp the arrival time
    pub fn new(session: SessionId, bytes: &[u8]) -> Self {
        Self {
            session,
            bytes: bytes.to_vec(),
            received_at_nanos: current_timestamp_nanos(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Data path counters of one input source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    pub chunks_forwarded: u64,
    pub bytes_forwarded: u64,
    /// Chunks that arrived for a session that was already stopped
    pub chunks_dropped_late: u64,
    /// Chunks dropped because the dispatcher channel was full
    pub chunks_dropped_backpressure: u64,
}
