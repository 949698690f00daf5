use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bgapi_event::{dispatch_event, Observer};
use bgapi_frame::{Frame, FrameError, FrameHeader, FrameReader, MessageKind};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::dispatcher::{ArmSignal, Correlation, PendingSlot};
use crate::error::DriverError;
use crate::stats::DriverStats;

/// Owns the read half, the frame assembler and the observer.
///
/// Frames are handled strictly in stream order: responses are handed to the
/// writer agent through the pending slot, events are decoded and delivered
/// to the observer on this thread.
pub(crate) struct ReaderAgent<R, O> {
    frames: FrameReader<R>,
    observer: O,
    arming: Receiver<ArmSignal>,
    correlations: Sender<Correlation>,
    pending: Option<PendingSlot>,
    stats: Arc<DriverStats>,
    shutdown: Arc<AtomicBool>,
    retry_delay: Duration,
}

impl<R: Read, O: Observer> ReaderAgent<R, O> {
    pub fn new(
        frames: FrameReader<R>,
        observer: O,
        arming: Receiver<ArmSignal>,
        correlations: Sender<Correlation>,
        stats: Arc<DriverStats>,
        shutdown: Arc<AtomicBool>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            frames,
            observer,
            arming,
            correlations,
            pending: None,
            stats,
            shutdown,
            retry_delay,
        }
    }

    /// Read until end of stream or shutdown.
    pub fn run(mut self) {
        debug!("reader agent started");
        while !self.shutdown.load(Ordering::Acquire) {
            match self.frames.read_frame() {
                Ok(frame) => self.route(frame),
                Err(FrameError::ConnectionClosed) => {
                    info!("transport reached end of stream, reader stopping");
                    break;
                }
                // read timeouts are how a quiet serial port looks
                Err(FrameError::Io(err))
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
                Err(FrameError::Io(err)) => self.read_failed(DriverError::TransportRead(err)),
                Err(other) => self.read_failed(other.into()),
            }
        }
        debug!("reader agent stopped");
    }

    /// Handle one complete frame.
    pub fn route(&mut self, frame: Frame) {
        self.stats.frame();
        let header = frame.header;
        debug!(
            kind = header.message_kind().as_str(),
            category = header.category,
            subtype = header.subtype,
            len = frame.payload.len(),
            "frame"
        );

        match header.message_kind() {
            MessageKind::Response => self.on_response(header, frame.payload),
            MessageKind::Event => {
                let dispatched = dispatch_event(
                    &mut self.observer,
                    header.category,
                    header.subtype,
                    frame.payload,
                );
                self.stats.event(dispatched);
            }
        }
    }

    fn on_response(&mut self, header: FrameHeader, payload: Bytes) {
        self.sync_arming();
        match self.pending.take() {
            Some(slot) => {
                self.stats.correlated();
                let correlation = Correlation {
                    seq: slot.seq,
                    header,
                    payload,
                };
                if self.correlations.send(correlation).is_err() {
                    debug!(seq = slot.seq, "writer agent gone, response dropped");
                }
            }
            None => {
                self.stats.unsolicited();
                let err = DriverError::UnsolicitedResponse {
                    category: header.category,
                    command: header.subtype,
                };
                warn!(%err, "dropping response");
            }
        }
    }

    fn sync_arming(&mut self) {
        while let Ok(signal) = self.arming.try_recv() {
            match signal {
                ArmSignal::Arm(slot) => self.pending = Some(slot),
                ArmSignal::Disarm { seq } => {
                    if self.pending.is_some_and(|slot| slot.seq == seq) {
                        self.pending = None;
                    }
                }
            }
        }
    }

    fn read_failed(&mut self, err: DriverError) {
        self.stats.read_error();
        warn!(%err, delay = ?self.retry_delay, "read failed, retrying");
        thread::sleep(self.retry_delay);
    }
}
