// src/hal/mod.rs
//! Hardware Abstraction Layer for USB serial acquisition boards

pub mod traits;
pub mod types;
pub mod classifier;
pub mod protocol;
pub mod serial_driver;
pub mod simulator;
pub mod input_source;
pub mod device_manager;
#[cfg(feature = "hardware")]
pub mod serialport_chipset;

#[cfg(test)]
mod tests;

pub use traits::*;
pub use types::*;
pub use classifier::{classify, is_supported, SupportedVendor};
pub use input_source::StreamingInputSource;
pub use device_manager::InputSourceManager;
