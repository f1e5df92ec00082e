// src/bin/spike_monitor.rs
//! Stream from the first supported USB serial board and report throughput

use clap::Parser;
use serde::Serialize;
use spike_core::acquisition::IngestionBuffer;
use spike_core::config::{ConfigLoader, SystemConfig};
use spike_core::hal::serialport_chipset::{discover_configured_ports, SerialPortChipsetFactory};
use spike_core::hal::{classify, InputSourceManager, UsbSerialPort};
use spike_core::utils::time::{SystemTimeProvider, TimeProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "spike-monitor",
    version,
    about = "Stream raw samples from a BYB USB serial board"
)]
struct Cli {
    /// Additional configuration file, applied after the standard search path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List USB serial ports and whether they are supported, then exit
    #[arg(long)]
    list: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// How long to stream before shutting down
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,
}

#[derive(Serialize)]
struct PortReport<'a> {
    port_name: &'a str,
    vendor_id: u16,
    product_id: u16,
    product: Option<&'a str>,
    vendor: Option<&'static str>,
    supported: bool,
}

impl<'a> From<&'a UsbSerialPort> for PortReport<'a> {
    fn from(port: &'a UsbSerialPort) -> Self {
        let vendor = classify(&port.descriptor);
        Self {
            port_name: &port.port_name,
            vendor_id: port.descriptor.vendor_id,
            product_id: port.descriptor.product_id,
            product: port.product.as_deref(),
            vendor: vendor.map(|v| v.name()),
            supported: vendor.is_some(),
        }
    }
}

#[derive(Serialize)]
struct MetricsReport {
    elapsed_secs: u64,
    chunks_received: u64,
    bytes_received: u64,
    chunks_evicted: u64,
    chunks_dropped_backpressure: u64,
    buffered_chunks: usize,
    staleness_ms: Option<u128>,
}

fn load_config(cli: &Cli) -> Result<SystemConfig, Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit_file(path)?;
    }
    Ok(loader.load_system_config()?)
}

fn init_tracing(config: &SystemConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("spike_core={0},spike_monitor={0}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn list_ports(ports: &[UsbSerialPort], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reports: Vec<PortReport> = ports.iter().map(PortReport::from).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No USB serial ports found");
    }
    for report in &reports {
        println!(
            "{:<20} {:04x}:{:04x} {:<16} {}",
            report.port_name,
            report.vendor_id,
            report.product_id,
            report.vendor.unwrap_or("-"),
            if report.supported { "supported" } else { "unsupported" }
        );
    }
    Ok(())
}

fn stream(config: &SystemConfig, ports: &[UsbSerialPort], cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let buffer = Arc::new(IngestionBuffer::new(config.acquisition.ingestion_capacity_chunks)?);
    let factory = SerialPortChipsetFactory::new(config.serial.clone());
    let mut manager = InputSourceManager::new(factory, buffer.clone(), config.acquisition.clone());

    if manager.attach_first_supported(ports)?.is_none() {
        warn!(ports = ports.len(), "no supported board found");
        return Ok(());
    }

    let clock = SystemTimeProvider;
    let started = Instant::now();
    let duration = Duration::from_secs(cli.duration_secs);

    while started.elapsed() < duration {
        thread::sleep(Duration::from_secs(1));

        let buffered_chunks = buffer.len();
        // Samples are not decoded here, only counted
        buffer.drain();
        let metrics = buffer.metrics();
        let stats = manager.stats().unwrap_or_default();
        let report = MetricsReport {
            elapsed_secs: started.elapsed().as_secs(),
            chunks_received: metrics.chunks_received,
            bytes_received: metrics.bytes_received,
            chunks_evicted: metrics.chunks_evicted,
            chunks_dropped_backpressure: stats.chunks_dropped_backpressure,
            buffered_chunks,
            staleness_ms: buffer.staleness(clock.now_nanos()).map(|d| d.as_millis()),
        };

        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!(
                "[{:>3}s] {} chunks, {} bytes, {} evicted, {} dropped",
                report.elapsed_secs,
                report.chunks_received,
                report.bytes_received,
                report.chunks_evicted,
                report.chunks_dropped_backpressure
            );
        }
    }

    manager.shutdown();
    info!(bytes = buffer.metrics().bytes_received, "monitor finished");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let ports = discover_configured_ports(&config.serial)?;
    if cli.list {
        return list_ports(&ports, cli.json);
    }

    let build = spike_core::version_info();
    info!(version = %build.version, features = ?build.features, ports = ports.len(), "starting spike-monitor");
    stream(&config, &ports, &cli)
}
