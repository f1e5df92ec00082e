// src/acquisition/ingestion_buffer.rs
//! Bounded chunk buffer feeding the display pipeline

use crate::acquisition::SampleSink;
use crate::error::IngestionError;
use crate::hal::types::SampleChunk;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

/// Ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionMetrics {
    pub chunks_received: u64,
    pub bytes_received: u64,
    /// Oldest chunks overwritten because the consumer fell behind
    pub chunks_evicted: u64,
    /// Arrival time of the newest chunk, 0 before the first one
    pub last_received_nanos: u64,
}

/// Lock-free bounded buffer of raw chunks
///
/// When full, a push evicts the oldest chunk: a live display prefers fresh
/// data over complete history.
pub struct IngestionBuffer {
    queue: ArrayQueue<SampleChunk>,
    chunks_received: AtomicU64,
    bytes_received: AtomicU64,
    chunks_evicted: AtomicU64,
    last_received_nanos: AtomicU64,
}

impl IngestionBuffer {
    pub fn new(capacity: usize) -> Result<Self, IngestionError> {
        if capacity == 0 {
            return Err(IngestionError::InvalidCapacity);
        }

        Ok(Self {
            queue: ArrayQueue::new(capacity),
            chunks_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            chunks_evicted: AtomicU64::new(0),
            last_received_nanos: AtomicU64::new(0),
        })
    }

    /// Store a chunk, returning the evicted one if the buffer was full
    pub fn push(&self, chunk: SampleChunk) -> Option<SampleChunk> {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        self.last_received_nanos.store(chunk.received_at_nanos, Ordering::Relaxed);

        let evicted = self.queue.force_push(chunk);
        if evicted.is_some() {
            self.chunks_evicted.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Oldest buffered chunk
    pub fn pop(&self) -> Option<SampleChunk> {
        self.queue.pop()
    }

    /// Take every buffered chunk, oldest first
    pub fn drain(&self) -> Vec<SampleChunk> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Fraction of capacity in use (0.0 to 1.0)
    pub fn utilization(&self) -> f32 {
        self.queue.len() as f32 / self.queue.capacity() as f32
    }

    pub fn metrics(&self) -> IngestionMetrics {
        IngestionMetrics {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            chunks_evicted: self.chunks_evicted.load(Ordering::Relaxed),
            last_received_nanos: self.last_received_nanos.load(Ordering::Relaxed),
        }
    }

    /// Time since the newest chunk arrived, `None` before the first chunk.
    /// The transport never reports an unplug, so this is how consumers
    /// notice a dead stream.
    pub fn staleness(&self, now_nanos: u64) -> Option<Duration> {
        match self.last_received_nanos.load(Ordering::Relaxed) {
            0 => None,
            last => Some(Duration::from_nanos(now_nanos.saturating_sub(last))),
        }
    }
}

impl SampleSink for IngestionBuffer {
    fn on_samples_received(&self, chunk: SampleChunk) {
        trace!(session = %chunk.session, len = chunk.len(), "ingesting chunk");
        self.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::types::SessionId;
    use crate::utils::time::{MockTimeProvider, TimeProvider};

    fn chunk(bytes: &[u8]) -> SampleChunk {
        SampleChunk::new(SessionId(1), bytes)
    }

    #[test]
    fn test_invalid_capacity() {
        assert!(matches!(IngestionBuffer::new(0), Err(IngestionError::InvalidCapacity)));
        assert!(IngestionBuffer::new(1).is_ok());
    }

    #[test]
    fn test_fifo_order() {
        let buffer = IngestionBuffer::new(8).unwrap();
        buffer.on_samples_received(chunk(b"A"));
        buffer.on_samples_received(chunk(b"B"));

        assert_eq!(buffer.pop().unwrap().bytes, b"A");
        assert_eq!(buffer.pop().unwrap().bytes, b"B");
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_full_buffer_evicts_oldest() {
        let buffer = IngestionBuffer::new(2).unwrap();
        assert!(buffer.push(chunk(b"1")).is_none());
        assert!(buffer.push(chunk(b"2")).is_none());

        let evicted = buffer.push(chunk(b"3")).unwrap();
        assert_eq!(evicted.bytes, b"1");

        let remaining: Vec<Vec<u8>> = buffer.drain().into_iter().map(SampleChunk::into_bytes).collect();
        assert_eq!(remaining, vec![b"2".to_vec(), b"3".to_vec()]);

        let metrics = buffer.metrics();
        assert_eq!(metrics.chunks_received, 3);
        assert_eq!(metrics.bytes_received, 3);
        assert_eq!(metrics.chunks_evicted, 1);
    }

    #[test]
    fn test_utilization() {
        let buffer = IngestionBuffer::new(4).unwrap();
        assert_eq!(buffer.utilization(), 0.0);

        buffer.push(chunk(b"x"));
        buffer.push(chunk(b"y"));
        assert_eq!(buffer.utilization(), 0.5);
    }

    #[test]
    fn test_staleness() {
        let clock = MockTimeProvider::new(1_000);
        let buffer = IngestionBuffer::new(4).unwrap();
        assert!(buffer.staleness(clock.now_nanos()).is_none());

        let mut c = chunk(b"z");
        c.received_at_nanos = clock.now_nanos();
        buffer.push(c);

        clock.advance(Duration::from_micros(2));
        assert_eq!(buffer.staleness(clock.now_nanos()), Some(Duration::from_nanos(2_000)));

        // Clock skew never underflows
        clock.set_time(500);
        assert_eq!(buffer.staleness(clock.now_nanos()), Some(Duration::ZERO));
    }
}
