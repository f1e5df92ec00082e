// src/error.rs
//! Unified error handling for spike-core
//!
//! Every fallible public operation returns [`SpikeResult`]. Component errors
//! (transport, configuration, ingestion) convert into [`SpikeError`] with `?`
//! so callers match on a single type.
//!
//! Expected runtime conditions never surface here: writes on an absent
//! transport, stop/close on an idle source and chunks arriving after stop are
//! silent no-ops by contract.

use crate::config::ConfigError;
use crate::hal::types::SessionState;
use thiserror::Error;

/// Result alias used across the crate
pub type SpikeResult<T> = Result<T, SpikeError>;

/// Errors raised by the serial transport layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The physical link could not be established: chipset absent,
    /// incompatible, or refused by a lower layer.
    #[error("failed to open serial transport: {0}")]
    OpenFailed(String),

    /// The host could not list its serial ports
    #[error("failed to enumerate serial ports: {0}")]
    Enumeration(String),
}

/// Errors raised by the reference ingestion buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestionError {
    #[error("ingestion buffer capacity must be greater than zero")]
    InvalidCapacity,
}

/// Unified error type for the whole crate
#[derive(Debug, Error)]
pub enum SpikeError {
    /// The descriptor is not a serial-capable board from a supported vendor.
    /// Callers must not construct an input source for it.
    #[error("unsupported device {vendor_id:#06x}:{product_id:#06x}")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A lifecycle call was made from a state that does not allow it
    #[error("cannot {operation} while session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Another device already owns the single streaming session
    #[error("session busy with device {active_vendor_id:#06x}:{active_product_id:#06x}")]
    SessionBusy {
        active_vendor_id: u16,
        active_product_id: u16,
    },

    /// The dispatcher thread could not be spawned
    #[error("failed to spawn sample dispatcher: {0}")]
    Dispatcher(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),
}

impl SpikeError {
    /// True for errors caused by the hardware link rather than by the caller
    pub fn is_hardware(&self) -> bool {
        matches!(self, SpikeError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpikeError>();
        assert_send_sync::<TransportError>();
    }

    #[test]
    fn test_unsupported_device_display() {
        let err = SpikeError::UnsupportedDevice {
            vendor_id: 0x1234,
            product_id: 0x00ab,
        };
        let display = err.to_string();
        assert!(display.contains("0x1234"));
        assert!(display.contains("0x00ab"));
    }

    #[test]
    fn test_transport_conversion() {
        fn open() -> SpikeResult<()> {
            Err(TransportError::OpenFailed("no chipset".to_string()))?
        }

        let err = open().unwrap_err();
        assert!(err.is_hardware());
        assert!(err.to_string().contains("no chipset"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = SpikeError::InvalidState {
            operation: "start input",
            state: SessionState::Closed,
        };
        assert_eq!(err.to_string(), "cannot start input while session is Closed");
        assert!(!err.is_hardware());
    }
}
