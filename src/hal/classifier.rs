// src/hal/classifier.rs
//! Supported board detection

use crate::config::constants::vendors::*;
use crate::hal::types::{DeviceDescriptor, TransportCapability};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendors whose serial boards speak the BYB protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedVendor {
    Byb,
    Arduino1,
    Arduino2,
    Ftdi,
    Ch340,
}

impl SupportedVendor {
    pub const ALL: [SupportedVendor; 5] = [
        SupportedVendor::Byb,
        SupportedVendor::Arduino1,
        SupportedVendor::Arduino2,
        SupportedVendor::Ftdi,
        SupportedVendor::Ch340,
    ];

    pub const fn from_vendor_id(vendor_id: u16) -> Option<Self> {
        match vendor_id {
            BYB_VENDOR_ID => Some(SupportedVendor::Byb),
            ARDUINO_VENDOR_ID_1 => Some(SupportedVendor::Arduino1),
            ARDUINO_VENDOR_ID_2 => Some(SupportedVendor::Arduino2),
            FTDI_VENDOR_ID => Some(SupportedVendor::Ftdi),
            CH340_VENDOR_ID => Some(SupportedVendor::Ch340),
            _ => None,
        }
    }

    pub const fn vendor_id(self) -> u16 {
        match self {
            SupportedVendor::Byb => BYB_VENDOR_ID,
            SupportedVendor::Arduino1 => ARDUINO_VENDOR_ID_1,
            SupportedVendor::Arduino2 => ARDUINO_VENDOR_ID_2,
            SupportedVendor::Ftdi => FTDI_VENDOR_ID,
            SupportedVendor::Ch340 => CH340_VENDOR_ID,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SupportedVendor::Byb => "Backyard Brains",
            SupportedVendor::Arduino1 | SupportedVendor::Arduino2 => "Arduino",
            SupportedVendor::Ftdi => "FTDI",
            SupportedVendor::Ch340 => "CH340",
        }
    }
}

impl fmt::Display for SupportedVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#06x})", self.name(), self.vendor_id())
    }
}

/// True iff the device is serial capable and made by a supported vendor
pub fn is_supported(descriptor: &DeviceDescriptor) -> bool {
    descriptor.transport_capability == TransportCapability::SerialCapable
        && SupportedVendor::from_vendor_id(descriptor.vendor_id).is_some()
}

/// Vendor of a supported device, `None` when [`is_supported`] is false
pub fn classify(descriptor: &DeviceDescriptor) -> Option<SupportedVendor> {
    if descriptor.transport_capability != TransportCapability::SerialCapable {
        return None;
    }
    SupportedVendor::from_vendor_id(descriptor.vendor_id)
}
