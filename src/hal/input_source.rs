// src/hal/input_source.rs
//! Streaming serial input source
//!
//! Owns one transport and moves its chunks to a [`SampleSink`]:
//!
//! ```text
//! chipset I/O thread ──callback──▶ bounded channel ──▶ dispatcher thread ──▶ sink
//! ```
//!
//! The callback never blocks and never touches lifecycle state. Each
//! `open()` allocates a [`SessionId`]; chunks carry it and both the callback
//! and the dispatcher drop chunks whose session is no longer active. A chunk
//! racing with `on_input_stop()` is therefore forwarded once or dropped,
//! never twice.

use crate::acquisition::SampleSink;
use crate::config::constants::acquisition::DISPATCHER_THREAD_PREFIX;
use crate::config::AcquisitionSettings;
use crate::error::{SpikeError, SpikeResult};
use crate::hal::classifier::{classify, SupportedVendor};
use crate::hal::protocol::Handshake;
use crate::hal::serial_driver::SerialTransport;
use crate::hal::traits::{InputSource, ReadCallback, SerialChipset};
use crate::hal::types::{DeviceDescriptor, LineConfig, SampleChunk, SessionId, SessionState, StreamStats};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct StreamCounters {
    chunks_forwarded: AtomicU64,
    bytes_forwarded: AtomicU64,
    chunks_dropped_late: AtomicU64,
    chunks_dropped_backpressure: AtomicU64,
}

/// State shared with the callback and the dispatcher
struct SessionShared {
    // Written only from lifecycle calls
    state: Mutex<SessionState>,
    active_session: AtomicU64,
    counters: StreamCounters,
}

impl SessionShared {
    fn is_active(&self, session: SessionId) -> bool {
        self.active_session.load(Ordering::Acquire) == session.0
    }

    fn drop_late(&self, chunk_session: SessionId) {
        self.counters.chunks_dropped_late.fetch_add(1, Ordering::Relaxed);
        trace!(session = %chunk_session, "dropping chunk of inactive session");
    }
}

/// Forwards chunks from the channel to the sink on its own thread
struct Dispatcher {
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Dispatcher {
    fn spawn(
        session: SessionId,
        chunks: Receiver<SampleChunk>,
        shared: Arc<SessionShared>,
        sink: Arc<dyn SampleSink>,
    ) -> std::io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", DISPATCHER_THREAD_PREFIX, session.0))
            .spawn(move || {
                loop {
                    crossbeam::select! {
                        recv(chunks) -> msg => match msg {
                            Ok(chunk) => forward(&shared, sink.as_ref(), chunk),
                            Err(_) => break,
                        },
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                debug!(session = %session, "dispatcher exited");
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Signal shutdown and wait. Chunks still queued are discarded.
    fn stop(mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("sample dispatcher panicked");
            }
        }
    }
}

fn forward(shared: &SessionShared, sink: &dyn SampleSink, chunk: SampleChunk) {
    if !shared.is_active(chunk.session) {
        shared.drop_late(chunk.session);
        return;
    }

    let len = chunk.len() as u64;
    sink.on_samples_received(chunk);
    shared.counters.chunks_forwarded.fetch_add(1, Ordering::Relaxed);
    shared.counters.bytes_forwarded.fetch_add(len, Ordering::Relaxed);
}

/// Serial input source for one supported board
pub struct StreamingInputSource {
    descriptor: DeviceDescriptor,
    vendor: SupportedVendor,
    transport: SerialTransport,
    handshake: Handshake,
    sink: Arc<dyn SampleSink>,
    channel_capacity: usize,
    session: SessionId,
    shared: Arc<SessionShared>,
    dispatcher: Option<Dispatcher>,
}

impl StreamingInputSource {
    /// Create a source for an accepted device. `chipset` is `None` when the
    /// host had no driver for it; every later write is then a no-op and
    /// `open()` fails.
    pub fn new(
        descriptor: DeviceDescriptor,
        chipset: Option<Box<dyn SerialChipset>>,
        sink: Arc<dyn SampleSink>,
        settings: &AcquisitionSettings,
    ) -> SpikeResult<Self> {
        let vendor = classify(&descriptor).ok_or(SpikeError::UnsupportedDevice {
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
        })?;

        Ok(Self {
            descriptor,
            vendor,
            transport: SerialTransport::new(chipset),
            handshake: Handshake::default(),
            sink,
            channel_capacity: settings.channel_capacity_chunks.max(1),
            session: SessionId::NONE,
            shared: Arc::new(SessionShared {
                state: Mutex::new(SessionState::Closed),
                active_session: AtomicU64::new(SessionId::NONE.0),
                counters: StreamCounters::default(),
            }),
            dispatcher: None,
        })
    }

    pub fn vendor(&self) -> SupportedVendor {
        self.vendor
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock()
    }

    /// Session of the current physical open, `None` when closed or stopped
    pub fn session_id(&self) -> Option<SessionId> {
        if self.state().is_live() {
            Some(self.session)
        } else {
            None
        }
    }

    pub(crate) fn current_session(&self) -> SessionId {
        self.session
    }

    pub fn stats(&self) -> StreamStats {
        let counters = &self.shared.counters;
        StreamStats {
            chunks_forwarded: counters.chunks_forwarded.load(Ordering::Relaxed),
            bytes_forwarded: counters.bytes_forwarded.load(Ordering::Relaxed),
            chunks_dropped_late: counters.chunks_dropped_late.load(Ordering::Relaxed),
            chunks_dropped_backpressure: counters.chunks_dropped_backpressure.load(Ordering::Relaxed),
        }
    }

    /// Establish the physical link. Allowed from `Closed` or `Stopped`.
    /// Failure leaves the source `Closed` and is not retried.
    pub fn open(&mut self) -> SpikeResult<()> {
        let state = self.state();
        if !state.can_open() {
            return Err(SpikeError::InvalidState { operation: "open", state });
        }

        debug!(device = %self.descriptor, vendor = self.vendor.name(), "open()");
        if let Err(err) = self.transport.open() {
            warn!(device = %self.descriptor, error = %err, "failed to open input source");
            self.set_state(SessionState::Closed);
            return Err(err.into());
        }

        self.session = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        self.set_state(SessionState::Opening);
        Ok(())
    }

    /// Configure the line, arm the read path, then send the handshake. The
    /// callback is armed first because a reply may arrive before the write
    /// call returns.
    pub fn on_input_start(&mut self) -> SpikeResult<()> {
        let state = self.state();
        if state != SessionState::Opening {
            return Err(SpikeError::InvalidState { operation: "start input", state });
        }

        debug!(device = %self.descriptor, session = %self.session, "onInputStart()");
        self.transport.configure_line(&LineConfig::BYB);

        let (tx, rx) = channel::bounded(self.channel_capacity);
        let dispatcher = Dispatcher::spawn(self.session, rx, self.shared.clone(), self.sink.clone())
            .map_err(SpikeError::Dispatcher)?;
        self.dispatcher = Some(dispatcher);
        self.shared.active_session.store(self.session.0, Ordering::Release);

        let callback = self.read_callback(tx);
        self.transport.start_reading(callback);
        self.handshake.execute(&mut self.transport);

        self.set_state(SessionState::Streaming);
        Ok(())
    }

    /// Close the transport without draining. No-op unless the link is live.
    pub fn on_input_stop(&mut self) {
        if !self.state().is_live() {
            return;
        }

        debug!(device = %self.descriptor, session = %self.session, "onInputStop()");
        // Invalidate first so late callbacks drop their chunk
        self.shared.active_session.store(SessionId::NONE.0, Ordering::Release);
        self.transport.close();
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.stop();
        }
        self.set_state(SessionState::Stopped);
    }

    /// Release everything. Idempotent.
    pub fn close(&mut self) {
        self.on_input_stop();
        self.transport.close();
        if self.state() != SessionState::Closed {
            debug!(device = %self.descriptor, "close()");
            self.set_state(SessionState::Closed);
        }
    }

    /// Best-effort write to the board
    pub fn write(&mut self, bytes: &[u8]) {
        self.transport.write(bytes);
    }

    fn set_state(&self, state: SessionState) {
        *self.shared.state.lock() = state;
    }

    fn read_callback(&self, tx: Sender<SampleChunk>) -> ReadCallback {
        let shared = self.shared.clone();
        let session = self.session;

        Box::new(move |bytes: &[u8]| {
            if bytes.is_empty() {
                return;
            }
            if !shared.is_active(session) {
                shared.drop_late(session);
                return;
            }

            match tx.try_send(SampleChunk::new(session, bytes)) {
                Ok(()) => trace!(session = %session, len = bytes.len(), "chunk queued"),
                Err(TrySendError::Full(_)) => {
                    shared.counters.chunks_dropped_backpressure.fetch_add(1, Ordering::Relaxed);
                    warn!(session = %session, len = bytes.len(), "dispatcher channel full, dropping chunk");
                }
                Err(TrySendError::Disconnected(_)) => shared.drop_late(session),
            }
        })
    }
}

impl InputSource for StreamingInputSource {
    fn open(&mut self) -> SpikeResult<()> {
        StreamingInputSource::open(self)
    }

    fn on_input_start(&mut self) -> SpikeResult<()> {
        StreamingInputSource::on_input_start(self)
    }

    fn on_input_stop(&mut self) {
        StreamingInputSource::on_input_stop(self)
    }

    fn close(&mut self) {
        StreamingInputSource::close(self)
    }

    fn write(&mut self, bytes: &[u8]) {
        StreamingInputSource::write(self, bytes)
    }

    fn state(&self) -> SessionState {
        StreamingInputSource::state(self)
    }

    fn descriptor(&self) -> &DeviceDescriptor {
        StreamingInputSource::descriptor(self)
    }
}

impl Drop for StreamingInputSource {
    fn drop(&mut self) {
        self.close();
    }
}
