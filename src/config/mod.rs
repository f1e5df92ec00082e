//! Configuration management
//!
//! Only the data path is configurable: buffer capacities, the reader poll
//! interval and the port filter. Line parameters, sample rate and channel
//! count live in [`constants`] and are fixed.

pub mod constants;
pub mod schema_validator;
pub mod loader;

pub use constants::*;
pub use schema_validator::{SchemaValidator, ValidationError};
pub use loader::{ConfigLoader, ConfigError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub acquisition: AcquisitionSettings,
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Data path sizing
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AcquisitionSettings {
    /// Chunks held by the reference ingestion buffer before eviction
    #[serde(default = "defaults::ingestion_capacity_chunks")]
    pub ingestion_capacity_chunks: usize,

    /// Chunks in flight between the I/O thread and the dispatcher
    #[serde(default = "defaults::channel_capacity_chunks")]
    pub channel_capacity_chunks: usize,
}

/// Host serial port settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SerialSettings {
    #[serde(default = "defaults::read_buffer_size")]
    pub read_buffer_size: usize,

    #[serde(default = "defaults::read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Restrict discovery to this port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn ingestion_capacity_chunks() -> usize { acquisition::DEFAULT_INGESTION_CAPACITY_CHUNKS }
    pub fn channel_capacity_chunks() -> usize { acquisition::DEFAULT_CHANNEL_CAPACITY_CHUNKS }

    pub fn read_buffer_size() -> usize { hal::DEFAULT_READ_BUFFER_SIZE }
    pub fn read_timeout_ms() -> u64 { hal::DEFAULT_READ_TIMEOUT_MS }

    pub fn log_level() -> String { logging::DEFAULT_LEVEL.to_string() }
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            ingestion_capacity_chunks: defaults::ingestion_capacity_chunks(),
            channel_capacity_chunks: defaults::channel_capacity_chunks(),
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: defaults::read_buffer_size(),
            read_timeout_ms: defaults::read_timeout_ms(),
            port_name: None,
        }
    }
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();
        assert_eq!(config.acquisition.ingestion_capacity_chunks, 1024);
        assert_eq!(config.acquisition.channel_capacity_chunks, 256);
        assert_eq!(config.serial.read_buffer_size, 4096);
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(10));
        assert!(config.serial.port_name.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SystemConfig = toml::from_str(
            r#"
[serial]
port_name = "/dev/ttyACM0"
"#,
        )
        .unwrap();

        assert_eq!(config.serial.port_name.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.serial.read_buffer_size, 4096);
        assert_eq!(config.acquisition, AcquisitionSettings::default());
    }
}
