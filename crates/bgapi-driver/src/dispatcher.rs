//! Single-outstanding-request dispatcher.
//!
//! The writer agent owns the transport's write half and drains submissions
//! in FIFO order. For each one it arms the reader's pending slot, writes the
//! command, then waits for the reader to hand back the next response frame
//! or for the deadline to pass. Arming always precedes the write, so a fast
//! device can never answer before the reader knows a response is expected.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bgapi_frame::{FrameError, FrameHeader, FrameWriter};
use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::error::{DriverError, Result};

/// The operation the reader should expect a response for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingSlot {
    pub seq: u64,
    pub category: u8,
    pub command: u8,
}

/// Writer to reader: establish or withdraw the pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArmSignal {
    Arm(PendingSlot),
    Disarm { seq: u64 },
}

/// Reader to writer: a response frame claimed by the slot `seq`.
#[derive(Debug)]
pub(crate) struct Correlation {
    pub seq: u64,
    pub header: FrameHeader,
    pub payload: Bytes,
}

/// One queued command and where to deliver its outcome.
pub(crate) struct Submission {
    pub category: u8,
    pub command: u8,
    pub payload: Bytes,
    pub timeout: Duration,
    pub reply: SyncSender<Result<Bytes>>,
}

/// Match a correlated response against the operation that armed the slot.
pub(crate) fn correlate(slot: &PendingSlot, correlation: Correlation) -> Result<Bytes> {
    let header = correlation.header;
    if header.category != slot.category || header.subtype != slot.command {
        return Err(DriverError::ProtocolMismatch {
            expected_category: slot.category,
            expected_command: slot.command,
            actual_category: header.category,
            actual_command: header.subtype,
        });
    }
    Ok(correlation.payload)
}

pub(crate) struct WriterAgent<W> {
    writer: FrameWriter<W>,
    arming: Sender<ArmSignal>,
    correlations: Receiver<Correlation>,
    shutdown: Arc<AtomicBool>,
    max_payload_size: usize,
    next_seq: u64,
}

impl<W: Write> WriterAgent<W> {
    pub fn new(
        writer: FrameWriter<W>,
        arming: Sender<ArmSignal>,
        correlations: Receiver<Correlation>,
        shutdown: Arc<AtomicBool>,
        max_payload_size: usize,
    ) -> Self {
        Self {
            writer,
            arming,
            correlations,
            shutdown,
            max_payload_size,
            next_seq: 0,
        }
    }

    /// Serve submissions until every sender is gone.
    pub fn run(mut self, submissions: Receiver<Submission>) {
        for submission in submissions {
            let outcome = if self.shutdown.load(Ordering::Acquire) {
                Err(DriverError::Closed)
            } else {
                self.execute(&submission)
            };
            // the caller may have stopped waiting
            let _ = submission.reply.send(outcome);
        }
        debug!("writer agent stopped");
    }

    /// Run one command to completion.
    pub fn execute(&mut self, submission: &Submission) -> Result<Bytes> {
        if submission.payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: submission.payload.len(),
                max: self.max_payload_size,
            }
            .into());
        }

        self.next_seq += 1;
        let slot = PendingSlot {
            seq: self.next_seq,
            category: submission.category,
            command: submission.command,
        };
        self.discard_stale();

        // A stopped reader cannot correlate anything; the wait below times out.
        let _ = self.arming.send(ArmSignal::Arm(slot));
        trace!(
            seq = slot.seq,
            category = slot.category,
            command = slot.command,
            len = submission.payload.len(),
            "writing command"
        );

        if let Err(err) = self
            .writer
            .send(slot.category, slot.command, &submission.payload)
        {
            let _ = self.arming.send(ArmSignal::Disarm { seq: slot.seq });
            let err = DriverError::from_write(err);
            warn!(category = slot.category, command = slot.command, %err, "command write failed");
            return Err(err);
        }

        self.await_response(&slot, submission.timeout)
    }

    fn await_response(&mut self, slot: &PendingSlot, timeout: Duration) -> Result<Bytes> {
        // None: the timeout is too large to represent, so wait without one.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let received = match deadline {
                Some(deadline) => self
                    .correlations
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .correlations
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(correlation) if correlation.seq == slot.seq => {
                    return correlate(slot, correlation);
                }
                Ok(stale) => {
                    debug!(seq = stale.seq, current = slot.seq, "discarding stale response");
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    if let Some(deadline) = deadline {
                        thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    }
                    break;
                }
            }
        }

        let _ = self.arming.send(ArmSignal::Disarm { seq: slot.seq });
        warn!(
            category = slot.category,
            command = slot.command,
            ?timeout,
            "command timed out"
        );
        Err(DriverError::Timeout(timeout))
    }

    fn discard_stale(&mut self) {
        while let Ok(stale) = self.correlations.try_recv() {
            debug!(seq = stale.seq, "discarding late response");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::mpsc;
    use std::sync::Mutex;

    use bgapi_frame::{CommandFraming, MessageKind};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Harness<W> {
        agent: WriterAgent<W>,
        arm_rx: Receiver<ArmSignal>,
        corr_tx: Sender<Correlation>,
    }

    fn harness<W: Write>(writer: W, max_payload_size: usize) -> Harness<W> {
        let (arm_tx, arm_rx) = mpsc::channel();
        let (corr_tx, corr_rx) = mpsc::channel();
        let agent = WriterAgent::new(
            FrameWriter::with_framing(writer, CommandFraming::Bare),
            arm_tx,
            corr_rx,
            Arc::new(AtomicBool::new(false)),
            max_payload_size,
        );
        Harness {
            agent,
            arm_rx,
            corr_tx,
        }
    }

    fn submission(category: u8, command: u8, payload: &'static [u8], timeout: Duration) -> Submission {
        let (reply, _) = mpsc::sync_channel(1);
        Submission {
            category,
            command,
            payload: Bytes::from_static(payload),
            timeout,
            reply,
        }
    }

    fn response(seq: u64, category: u8, command: u8, payload: &'static [u8]) -> Correlation {
        Correlation {
            seq,
            header: FrameHeader::new(MessageKind::Response, category, command, payload.len()),
            payload: Bytes::from_static(payload),
        }
    }

    /// Answer the next armed slot, optionally preceded by a stale response.
    fn responder(
        arm_rx: Receiver<ArmSignal>,
        corr_tx: Sender<Correlation>,
        category: u8,
        command: u8,
        with_stale: bool,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let ArmSignal::Arm(slot) = arm_rx.recv().unwrap() else {
                panic!("expected arm");
            };
            if with_stale {
                corr_tx.send(response(slot.seq - 1, 0, 0, &[])).unwrap();
            }
            corr_tx
                .send(response(slot.seq, category, command, &[0x00, 0x00]))
                .unwrap();
        })
    }

    #[test]
    fn correlate_accepts_matching_pair() {
        let slot = PendingSlot {
            seq: 1,
            category: 0,
            command: 1,
        };
        let payload = correlate(&slot, response(1, 0, 1, &[7])).unwrap();
        assert_eq!(payload.as_ref(), &[7]);
    }

    #[test]
    fn correlate_rejects_other_pair() {
        let slot = PendingSlot {
            seq: 1,
            category: 0,
            command: 1,
        };
        let err = correlate(&slot, response(1, 0, 2, &[])).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ProtocolMismatch {
                expected_category: 0,
                expected_command: 1,
                actual_category: 0,
                actual_command: 2,
            }
        ));
    }

    #[test]
    fn arms_before_writing() {
        struct ArmRecorder {
            arm_rx: Receiver<ArmSignal>,
            armed_at_write: Arc<Mutex<Option<ArmSignal>>>,
        }

        impl Write for ArmRecorder {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                *self.armed_at_write.lock().unwrap() = self.arm_rx.try_recv().ok();
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (arm_tx, arm_rx) = mpsc::channel();
        let (_corr_tx, corr_rx) = mpsc::channel();
        let seen = Arc::new(Mutex::new(None));
        let recorder = ArmRecorder {
            arm_rx,
            armed_at_write: Arc::clone(&seen),
        };
        let mut agent = WriterAgent::new(
            FrameWriter::new(recorder),
            arm_tx,
            corr_rx,
            Arc::new(AtomicBool::new(false)),
            64,
        );

        let err = agent
            .execute(&submission(0, 1, &[], Duration::from_millis(10)))
            .unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)));
        assert_eq!(
            *seen.lock().unwrap(),
            Some(ArmSignal::Arm(PendingSlot {
                seq: 1,
                category: 0,
                command: 1
            }))
        );
    }

    #[test]
    fn completes_with_response_payload() {
        let wire = SharedBuf::default();
        let Harness {
            mut agent,
            arm_rx,
            corr_tx,
        } = harness(wire.clone(), 64);
        let peer = responder(arm_rx, corr_tx, 6, 2, false);

        let payload = agent
            .execute(&submission(6, 2, &[1], Duration::from_secs(2)))
            .unwrap();
        peer.join().unwrap();

        assert_eq!(payload.as_ref(), &[0, 0]);
        assert_eq!(wire.contents(), vec![6, 2, 1]);
    }

    #[test]
    fn unbounded_timeout_waits_and_agent_stays_usable() {
        let Harness {
            mut agent,
            arm_rx,
            corr_tx,
        } = harness(SharedBuf::default(), 64);
        let peer = thread::spawn(move || {
            for _ in 0..2 {
                let ArmSignal::Arm(slot) = arm_rx.recv().unwrap() else {
                    panic!("expected arm");
                };
                corr_tx
                    .send(response(slot.seq, slot.category, slot.command, &[1]))
                    .unwrap();
            }
        });

        let first = agent
            .execute(&submission(0, 1, &[], Duration::MAX))
            .unwrap();
        let second = agent
            .execute(&submission(0, 2, &[], Duration::from_millis(500)))
            .unwrap();
        peer.join().unwrap();
        assert_eq!(first.as_ref(), &[1]);
        assert_eq!(second.as_ref(), &[1]);
    }

    #[test]
    fn stale_responses_are_skipped() {
        let Harness {
            mut agent,
            arm_rx,
            corr_tx,
        } = harness(SharedBuf::default(), 64);
        let peer = responder(arm_rx, corr_tx, 0, 1, true);

        let payload = agent
            .execute(&submission(0, 1, &[], Duration::from_secs(2)))
            .unwrap();
        peer.join().unwrap();
        assert_eq!(payload.as_ref(), &[0, 0]);
    }

    #[test]
    fn timeout_disarms_slot() {
        let Harness {
            mut agent, arm_rx, ..
        } = harness(SharedBuf::default(), 64);
        let timeout = Duration::from_millis(20);

        let err = agent.execute(&submission(0, 1, &[], timeout)).unwrap_err();
        assert!(matches!(err, DriverError::Timeout(t) if t == timeout));

        let signals: Vec<_> = arm_rx.try_iter().collect();
        assert_eq!(signals.len(), 2);
        assert!(matches!(signals[0], ArmSignal::Arm(PendingSlot { seq: 1, .. })));
        assert_eq!(signals[1], ArmSignal::Disarm { seq: 1 });
    }

    #[test]
    fn write_failure_disarms_without_waiting() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let Harness {
            mut agent, arm_rx, ..
        } = harness(Broken, 64);
        let started = Instant::now();
        let err = agent
            .execute(&submission(0, 1, &[], Duration::from_secs(30)))
            .unwrap_err();

        assert!(matches!(err, DriverError::TransportWrite(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
        let signals: Vec<_> = arm_rx.try_iter().collect();
        assert_eq!(signals.last(), Some(&ArmSignal::Disarm { seq: 1 }));
    }

    #[test]
    fn oversized_payload_rejected_before_arming() {
        let Harness {
            mut agent, arm_rx, ..
        } = harness(SharedBuf::default(), 2);
        let err = agent
            .execute(&submission(1, 3, &[1, 2, 3], Duration::from_secs(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Frame(FrameError::PayloadTooLarge { size: 3, max: 2 })
        ));
        assert!(arm_rx.try_recv().is_err());
    }

    #[test]
    fn stopped_reader_ends_in_timeout() {
        let Harness {
            mut agent,
            arm_rx,
            corr_tx,
        } = harness(SharedBuf::default(), 64);
        drop(arm_rx);
        drop(corr_tx);

        let err = agent
            .execute(&submission(0, 1, &[], Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)));
    }

    #[test]
    fn run_replies_closed_after_shutdown() {
        let (arm_tx, _arm_rx) = mpsc::channel();
        let (_corr_tx, corr_rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(true));
        let agent = WriterAgent::new(
            FrameWriter::new(SharedBuf::default()),
            arm_tx,
            corr_rx,
            shutdown,
            64,
        );

        let (sub_tx, sub_rx) = mpsc::channel();
        let (reply, reply_rx) = mpsc::sync_channel(1);
        sub_tx
            .send(Submission {
                category: 0,
                command: 1,
                payload: Bytes::new(),
                timeout: Duration::from_secs(1),
                reply,
            })
            .unwrap();
        drop(sub_tx);

        agent.run(sub_rx);
        assert!(matches!(reply_rx.recv().unwrap(), Err(DriverError::Closed)));
    }
}
