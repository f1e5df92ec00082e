// src/acquisition/mod.rs
//! Sample ingestion: the consumer side of the serial data path

pub mod ingestion_buffer;

pub use ingestion_buffer::*;

use crate::hal::types::SampleChunk;
use crossbeam::channel::{Sender, TrySendError};
use std::sync::Arc;
use tracing::trace;

/// Receives raw chunks from an input source, one call per chunk, in
/// arrival order. Called from the dispatcher thread, never from the
/// driver's I/O thread. At most one source feeds a sink at a time.
///
/// Implementations must not block: stopping a source waits for the call
/// in progress to return.
pub trait SampleSink: Send + Sync {
    fn on_samples_received(&self, chunk: SampleChunk);
}

impl<S: SampleSink + ?Sized> SampleSink for Arc<S> {
    fn on_samples_received(&self, chunk: SampleChunk) {
        (**self).on_samples_received(chunk)
    }
}

/// Forward into a channel owned by the consumer. Chunks are dropped when
/// the channel is full or the receiver is gone.
impl SampleSink for Sender<SampleChunk> {
    fn on_samples_received(&self, chunk: SampleChunk) {
        match self.try_send(chunk) {
            Ok(()) => {}
            Err(TrySendError::Full(chunk)) => {
                trace!(session = %chunk.session, len = chunk.len(), "sink channel full, dropping chunk")
            }
            Err(TrySendError::Disconnected(chunk)) => {
                trace!(session = %chunk.session, "sink receiver gone, dropping chunk")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::types::SessionId;
    use crossbeam::channel;

    #[test]
    fn test_full_channel_sink_does_not_block() {
        let (tx, rx) = channel::bounded::<SampleChunk>(1);
        for byte in [1u8, 2, 3] {
            tx.on_samples_received(SampleChunk::new(SessionId(1), &[byte]));
        }

        assert_eq!(rx.try_recv().unwrap().bytes, vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_channel_sink() {
        let (tx, rx) = channel::bounded::<SampleChunk>(1);
        drop(rx);
        tx.on_samples_received(SampleChunk::new(SessionId(1), b"gone"));
    }
}
