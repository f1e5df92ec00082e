use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spike_core::acquisition::IngestionBuffer;
use spike_core::config::AcquisitionSettings;
use spike_core::hal::protocol::Handshake;
use spike_core::hal::simulator::SimulatedChipset;
use spike_core::hal::{DeviceDescriptor, SampleChunk, SessionId, StreamingInputSource};
use std::sync::Arc;

// Typical USB bulk read sizes at 230400 baud
const CHUNK_SIZES: &[usize] = &[16, 64, 256, 1024];
const BUFFER_CAPACITIES: &[usize] = &[256, 1024, 4096];

fn benchmark_ingestion_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion_buffer");

    for &capacity in BUFFER_CAPACITIES {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(BenchmarkId::new("push_evicting", capacity), &capacity, |b, &capacity| {
            let buffer = IngestionBuffer::new(capacity).unwrap();
            let payload = vec![0x80u8; 64];

            b.iter(|| {
                for _ in 0..1000 {
                    black_box(buffer.push(SampleChunk::new(SessionId(1), &payload)));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("push_drain", capacity), &capacity, |b, &capacity| {
            let buffer = IngestionBuffer::new(capacity).unwrap();
            let payload = vec![0x80u8; 64];

            b.iter(|| {
                for _ in 0..capacity {
                    buffer.push(SampleChunk::new(SessionId(1), &payload));
                }
                black_box(buffer.drain());
            });
        });
    }

    group.finish();
}

fn benchmark_data_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_path");

    for &chunk_size in CHUNK_SIZES {
        group.throughput(Throughput::Bytes((chunk_size * 100) as u64));
        group.bench_with_input(BenchmarkId::new("callback_to_sink", chunk_size), &chunk_size, |b, &size| {
            let buffer = Arc::new(IngestionBuffer::new(4096).unwrap());
            let (chipset, handle) = SimulatedChipset::new();
            let mut source = StreamingInputSource::new(
                DeviceDescriptor::serial(0x2E73, 0x0001),
                Some(Box::new(chipset)),
                buffer.clone(),
                &AcquisitionSettings::default(),
            )
            .unwrap();
            source.open().unwrap();
            source.on_input_start().unwrap();
            let payload = vec![0x80u8; size];

            b.iter(|| {
                for _ in 0..100 {
                    handle.deliver(black_box(&payload));
                }
                buffer.drain();
            });

            source.close();
        });
    }

    group.finish();
}

fn benchmark_handshake(c: &mut Criterion) {
    c.bench_function("handshake_format", |b| b.iter(|| Handshake::new(black_box(10_000))));
}

criterion_group!(benches, benchmark_ingestion_buffer, benchmark_data_path, benchmark_handshake);
criterion_main!(benches);
