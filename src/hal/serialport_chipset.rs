// src/hal/serialport_chipset.rs
//! Host serial ports through the `serialport` crate
//!
//! The OS driver already handles the vendor chipset, so one implementation
//! covers every supported board. Reads run on a dedicated thread that polls
//! the port with a short timeout so `close()` can stop it promptly.
//!
//! `open()` only sets the baud rate and read timeout. Data bits, stop bits,
//! parity and flow control reach the port solely through the setters that
//! the transport calls when it configures the line.

use crate::config::constants::hal::READER_THREAD_PREFIX;
use crate::config::SerialSettings;
use crate::error::TransportError;
use crate::hal::traits::{ChipsetFactory, ReadCallback, SerialChipset};
use crate::hal::types::{
    ConnectionHandle, DataBits, DeviceDescriptor, FlowControl, LineConfig, Parity, StopBits, UsbSerialPort,
};
use serialport::{SerialPort, SerialPortType};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

struct ReaderThread {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ReaderThread {
    fn stop(self) {
        self.stop.store(true, Ordering::Release);
        if self.thread.join().is_err() {
            warn!("serial reader thread panicked");
        }
    }
}

/// Serial chipset backed by an OS serial device
pub struct SerialPortChipset {
    port_name: String,
    settings: SerialSettings,
    line: LineConfig,
    port: Option<Box<dyn SerialPort>>,
    reader: Option<ReaderThread>,
}

impl SerialPortChipset {
    pub fn new(port_name: impl Into<String>, settings: &SerialSettings) -> Self {
        Self {
            port_name: port_name.into(),
            settings: settings.clone(),
            line: LineConfig::BYB,
            port: None,
            reader: None,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Builder with only the baud rate and read timeout set
    fn open_builder(&self) -> serialport::SerialPortBuilder {
        serialport::new(&self.port_name, self.line.baud_rate).timeout(self.settings.read_timeout())
    }

    fn apply(&mut self, setting: &str, result: impl FnOnce(&mut dyn SerialPort) -> serialport::Result<()>) {
        if let Some(port) = self.port.as_mut() {
            if let Err(err) = result(port.as_mut()) {
                warn!(port = %self.port_name, setting, error = %err, "serial setting not applied");
            }
        }
    }

    fn stop_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop();
        }
    }
}

impl SerialChipset for SerialPortChipset {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = self
            .open_builder()
            .open()
            .map_err(|err| TransportError::OpenFailed(format!("{}: {}", self.port_name, err)))?;

        debug!(port = %self.port_name, "serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.line.baud_rate = baud_rate;
        self.apply("baud_rate", |port| port.set_baud_rate(baud_rate));
    }

    fn set_data_bits(&mut self, bits: DataBits) {
        self.line.data_bits = bits;
        self.apply("data_bits", |port| port.set_data_bits(data_bits(bits)));
    }

    fn set_stop_bits(&mut self, bits: StopBits) {
        self.line.stop_bits = bits;
        self.apply("stop_bits", |port| port.set_stop_bits(stop_bits(bits)));
    }

    fn set_parity(&mut self, value: Parity) {
        self.line.parity = value;
        self.apply("parity", |port| port.set_parity(parity(value)));
    }

    fn set_flow_control(&mut self, value: FlowControl) {
        self.line.flow_control = value;
        self.apply("flow_control", |port| port.set_flow_control(flow_control(value)));
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Some(port) = self.port.as_mut() {
            if let Err(err) = port.write_all(bytes).and_then(|_| port.flush()) {
                warn!(port = %self.port_name, error = %err, "serial write failed");
            }
        }
    }

    fn read(&mut self, mut callback: ReadCallback) {
        self.stop_reader();

        let Some(port) = self.port.as_ref() else {
            return;
        };
        let mut reader = match port.try_clone() {
            Ok(reader) => reader,
            Err(err) => {
                warn!(port = %self.port_name, error = %err, "cannot clone serial port for reading");
                return;
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let port_name = self.port_name.clone();
        let mut buffer = vec![0u8; self.settings.read_buffer_size];

        let spawned = thread::Builder::new()
            .name(READER_THREAD_PREFIX.to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Acquire) {
                    match reader.read(&mut buffer) {
                        Ok(0) => {}
                        Ok(n) => callback(&buffer[..n]),
                        Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                        Err(err) => {
                            warn!(port = %port_name, error = %err, "serial read failed, reader exiting");
                            break;
                        }
                    }
                }
                debug!(port = %port_name, "serial reader exited");
            });

        match spawned {
            Ok(thread) => self.reader = Some(ReaderThread { stop, thread }),
            Err(err) => warn!(port = %self.port_name, error = %err, "cannot spawn serial reader"),
        }
    }

    fn close(&mut self) {
        self.stop_reader();
        if self.port.take().is_some() {
            debug!(port = %self.port_name, "serial port closed");
        }
    }
}

impl Drop for SerialPortChipset {
    fn drop(&mut self) {
        self.close();
    }
}

/// Builds [`SerialPortChipset`]s from the configured serial settings
pub struct SerialPortChipsetFactory {
    settings: SerialSettings,
}

impl SerialPortChipsetFactory {
    pub fn new(settings: SerialSettings) -> Self {
        Self { settings }
    }
}

impl ChipsetFactory for SerialPortChipsetFactory {
    fn create(&self, descriptor: &DeviceDescriptor, handle: &ConnectionHandle) -> Option<Box<dyn SerialChipset>> {
        debug!(device = %descriptor, port = %handle.port_name, "creating serial chipset");
        Some(Box::new(SerialPortChipset::new(handle.port_name.clone(), &self.settings)))
    }
}

/// USB serial ports currently present on the host. Non-USB ports carry no
/// descriptor and are skipped.
pub fn discover_ports() -> Result<Vec<UsbSerialPort>, TransportError> {
    let ports = serialport::available_ports().map_err(|err| TransportError::Enumeration(err.to_string()))?;

    Ok(ports
        .into_iter()
        .filter_map(|port| match port.port_type {
            SerialPortType::UsbPort(info) => Some(UsbSerialPort {
                port_name: port.port_name,
                descriptor: DeviceDescriptor::serial(info.vid, info.pid),
                product: info.product,
            }),
            _ => None,
        })
        .collect())
}

/// [`discover_ports`] restricted to `settings.port_name` when set
pub fn discover_configured_ports(settings: &SerialSettings) -> Result<Vec<UsbSerialPort>, TransportError> {
    let mut ports = discover_ports()?;
    if let Some(name) = &settings.port_name {
        ports.retain(|port| &port.port_name == name);
    }
    Ok(ports)
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

fn parity(value: Parity) -> serialport::Parity {
    match value {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn flow_control(value: FlowControl) -> serialport::FlowControl {
    match value {
        FlowControl::Off => serialport::FlowControl::None,
        FlowControl::Software => serialport::FlowControl::Software,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
    }
}
