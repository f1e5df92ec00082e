// src/hal/protocol.rs
//! Board configuration handshake
//!
//! Two ASCII commands are sent once, right after the read path is armed:
//! the sample rate / channel layout, then a board type inquiry. The board
//! streams on its own after the link comes up, so nothing here requests
//! data. Its reply arrives on the sample stream and is parsed downstream.

use crate::config::constants::protocol::*;
use crate::config::constants::signal::{SAMPLE_RATE_HZ, SERIAL_CHANNEL_COUNT};
use crate::hal::serial_driver::SerialTransport;
use std::fmt::Write as _;
use tracing::debug;

/// Outbound handshake command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMessage {
    /// `conf s:<rate>;c:<channels>;\n`
    Config { sample_rate: u32, channel_count: u32 },
    /// `b:;\n`
    BoardInquiry,
}

impl HandshakeMessage {
    /// Wire bytes. Integers go through `Display`, which is always plain
    /// decimal with no grouping, so the result never depends on host locale.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            HandshakeMessage::Config { sample_rate, channel_count } => {
                let mut message = String::with_capacity(24);
                message.push_str(CONFIG_PREFIX);
                // Writing to a String cannot fail
                let _ = write!(
                    message,
                    "{SAMPLE_RATE_KEY}{sample_rate}{FIELD_TERMINATOR}{CHANNELS_KEY}{channel_count}{FIELD_TERMINATOR}"
                );
                message.push(MESSAGE_TERMINATOR);
                message.into_bytes()
            }
            HandshakeMessage::BoardInquiry => BOARD_TYPE_INQUIRY.to_vec(),
        }
    }
}

/// Pre-formatted handshake for one sample rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    config: Vec<u8>,
    inquiry: Vec<u8>,
}

impl Handshake {
    /// Handshake for a single-channel serial source
    pub fn new(sample_rate: u32) -> Self {
        Self {
            config: HandshakeMessage::Config {
                sample_rate,
                channel_count: SERIAL_CHANNEL_COUNT,
            }
            .to_bytes(),
            inquiry: HandshakeMessage::BoardInquiry.to_bytes(),
        }
    }

    pub fn config_message(&self) -> &[u8] {
        &self.config
    }

    pub fn inquiry_message(&self) -> &[u8] {
        &self.inquiry
    }

    /// Messages in send order
    pub fn messages(&self) -> [&[u8]; 2] {
        [&self.config, &self.inquiry]
    }

    /// Send both messages in order. Writes on an absent or closed transport
    /// are no-ops; the handshake is not retried.
    pub fn execute(&self, transport: &mut SerialTransport) {
        for message in self.messages() {
            debug!(message = %String::from_utf8_lossy(message).trim_end(), "sending handshake");
            transport.write(message);
        }
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new(SAMPLE_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_message_bytes() {
        let handshake = Handshake::new(10_000);
        assert_eq!(handshake.config_message(), b"conf s:10000;c:1;\n");
    }

    #[test]
    fn test_inquiry_message_bytes() {
        assert_eq!(Handshake::default().inquiry_message(), b"b:;\n");
    }

    #[test]
    fn test_default_uses_system_sample_rate() {
        let handshake = Handshake::default();
        assert_eq!(handshake, Handshake::new(SAMPLE_RATE_HZ));
        assert_eq!(handshake.messages()[0], b"conf s:10000;c:1;\n");
        assert_eq!(handshake.messages()[1], b"b:;\n");
    }

    #[test]
    fn test_large_values_have_no_grouping() {
        let message = HandshakeMessage::Config {
            sample_rate: 1_000_000,
            channel_count: 12,
        };
        assert_eq!(message.to_bytes(), b"conf s:1000000;c:12;\n");
    }

    #[test]
    fn test_messages_are_ascii() {
        for message in Handshake::new(44_100).messages() {
            assert!(message.is_ascii());
        }
    }
}
