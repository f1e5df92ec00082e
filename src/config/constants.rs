// src/config/constants.rs
//! System-wide constants
//!
//! Everything here is fixed at compile time. The serial line and the
//! handshake values are part of the board firmware contract and are never
//! read from configuration.

/// Signal constants
pub mod signal {
    /// Sample rate announced to the board in the config message
    pub const SAMPLE_RATE_HZ: u32 = 10_000;
    /// Channel count announced by the serial input source
    pub const SERIAL_CHANNEL_COUNT: u32 = 1;
}

/// USB vendor IDs of supported acquisition boards
pub mod vendors {
    /// Backyard Brains
    pub const BYB_VENDOR_ID: u16 = 0x2E73;
    pub const ARDUINO_VENDOR_ID_1: u16 = 0x2341;
    pub const ARDUINO_VENDOR_ID_2: u16 = 0x2A03;
    pub const FTDI_VENDOR_ID: u16 = 0x0403;
    /// CH340 based clone boards
    pub const CH340_VENDOR_ID: u16 = 0x1A86;
}

/// Serial line parameters
pub mod line {
    pub const BAUD_RATE: u32 = 230_400;
}

/// Handshake protocol tokens
pub mod protocol {
    pub const CONFIG_PREFIX: &str = "conf ";
    pub const SAMPLE_RATE_KEY: &str = "s:";
    pub const CHANNELS_KEY: &str = "c:";
    pub const FIELD_TERMINATOR: char = ';';
    pub const MESSAGE_TERMINATOR: char = '\n';
    pub const BOARD_TYPE_INQUIRY: &[u8] = b"b:;\n";
}

/// Acquisition data path constants
pub mod acquisition {
    pub const DEFAULT_INGESTION_CAPACITY_CHUNKS: usize = 1024;
    pub const MIN_INGESTION_CAPACITY_CHUNKS: usize = 1;
    pub const MAX_INGESTION_CAPACITY_CHUNKS: usize = 1_048_576;

    pub const DEFAULT_CHANNEL_CAPACITY_CHUNKS: usize = 256;
    pub const MIN_CHANNEL_CAPACITY_CHUNKS: usize = 1;
    pub const MAX_CHANNEL_CAPACITY_CHUNKS: usize = 65_536;

    /// Prefix of dispatcher thread names
    pub const DISPATCHER_THREAD_PREFIX: &str = "spike-dispatch";
}

/// Host serial port constants
pub mod hal {
    pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;
    pub const MIN_READ_BUFFER_SIZE: usize = 64;
    pub const MAX_READ_BUFFER_SIZE: usize = 1_048_576; // 1MB

    pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10;
    pub const MIN_READ_TIMEOUT_MS: u64 = 1;
    pub const MAX_READ_TIMEOUT_MS: u64 = 1000;

    /// Prefix of chipset reader thread names
    pub const READER_THREAD_PREFIX: &str = "spike-serial-rx";
}

/// Logging constants
pub mod logging {
    pub const DEFAULT_LEVEL: &str = "info";
    pub const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
}

/// Configuration file locations
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/spike-core/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/spike-core";
    pub const DEFAULT_CONFIG_FILE: &str = "spike-core.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    /// Prefix of environment overrides
    pub const ENV_PREFIX: &str = "SPIKE_";
}
