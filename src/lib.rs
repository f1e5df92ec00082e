//! Spike-Core: USB serial input source for BYB acquisition boards
//!
//! Detects supported USB serial boards, opens them with the fixed BYB line
//! setup, sends the start-of-stream handshake and delivers every raw chunk
//! the board sends to a [`SampleSink`](acquisition::SampleSink). Decoding
//! the bytes into samples is left to the consumer.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use spike_core::acquisition::IngestionBuffer;
//! use spike_core::config::AcquisitionSettings;
//! use spike_core::hal::simulator::SimulatedChipsetFactory;
//! use spike_core::hal::{ConnectionHandle, DeviceDescriptor, InputSourceManager};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let buffer = Arc::new(IngestionBuffer::new(1024)?);
//!     let factory = Arc::new(SimulatedChipsetFactory::new());
//!     let mut manager = InputSourceManager::new(factory.clone(), buffer.clone(), AcquisitionSettings::default());
//!
//!     let board = DeviceDescriptor::serial(0x2E73, 0x0001);
//!     manager.attach(board, &ConnectionHandle::new("/dev/ttyACM0"))?;
//!
//!     // Play the board: push bytes through the armed read callback
//!     let chipset = factory.handle_for(&board).expect("chipset created on attach");
//!     chipset.deliver(&[0x80, 0x12, 0x00, 0x34]);
//!
//!     for chunk in buffer.drain() {
//!         println!("{} bytes from session {}", chunk.len(), chunk.session);
//!     }
//!
//!     manager.detach(&board);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod hal;
pub mod utils;

// Re-export commonly used types for convenience
pub use acquisition::{IngestionBuffer, SampleSink};
pub use error::{SpikeError, SpikeResult, TransportError};
pub use hal::{
    ChipsetFactory, DeviceDescriptor, InputSource, InputSourceManager, SampleChunk, SerialChipset, SessionId,
    SessionState, StreamingInputSource, SupportedVendor,
};
pub use utils::time::{current_timestamp_nanos, TimeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec!["simulator".to_string()];
    if cfg!(feature = "hardware") {
        features.push("hardware".to_string());
    }
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "USB serial input source for BYB electrophysiology boards".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Compiled-in capabilities
    pub features: Vec<String>,
}
