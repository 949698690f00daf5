use std::fmt;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bgapi_event::Observer;
use bgapi_frame::{FrameReader, FrameWriter};
use bgapi_transport::BgStream;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::dispatcher::{Submission, WriterAgent};
use crate::error::{DriverError, Result};
use crate::reader_loop::ReaderAgent;
use crate::stats::{DriverStats, StatsSnapshot};

/// How often a reader blocked on a quiet [`BgStream`] rechecks for shutdown.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running BGAPI host driver.
///
/// Two worker threads sit behind this handle: a reader that reassembles
/// frames and delivers events to the observer, and a writer that runs one
/// command at a time. [`Driver::send`] blocks its caller until the command's
/// response arrives, the timeout passes, or the write fails. Concurrent
/// callers are served in submission order; commands never interleave on
/// the wire.
///
/// Dropping the driver (or calling [`Driver::shutdown`]) stops both workers.
pub struct Driver {
    submissions: Option<Sender<Submission>>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<DriverStats>,
    config: DriverConfig,
}

impl Driver {
    /// Start a driver over separate read and write halves.
    pub fn from_parts<R, W, O>(reader: R, writer: W, observer: O, config: DriverConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
        O: Observer,
    {
        let (submit_tx, submit_rx) = mpsc::channel();
        let (arm_tx, arm_rx) = mpsc::channel();
        let (corr_tx, corr_rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(DriverStats::default());

        let reader_agent = ReaderAgent::new(
            FrameReader::with_chunk_size(reader, config.read_chunk_size),
            observer,
            arm_rx,
            corr_tx,
            Arc::clone(&stats),
            Arc::clone(&shutdown),
            config.read_retry_delay,
        );
        let reader = thread::Builder::new()
            .name("bgapi-reader".into())
            .spawn(move || reader_agent.run())
            .map_err(DriverError::Spawn)?;

        let writer_agent = WriterAgent::new(
            FrameWriter::with_framing(writer, config.command_framing),
            arm_tx,
            corr_rx,
            Arc::clone(&shutdown),
            config.max_payload_size,
        );
        let writer = match thread::Builder::new()
            .name("bgapi-writer".into())
            .spawn(move || writer_agent.run(submit_rx))
        {
            Ok(handle) => handle,
            Err(err) => {
                shutdown.store(true, Ordering::Release);
                return Err(DriverError::Spawn(err));
            }
        };

        info!(
            framing = ?config.command_framing,
            timeout = ?config.default_timeout,
            "driver started"
        );
        Ok(Self {
            submissions: Some(submit_tx),
            writer: Some(writer),
            reader: Some(reader),
            shutdown,
            stats,
            config,
        })
    }

    /// Start a driver over a duplex transport stream.
    pub fn connect<O: Observer>(stream: BgStream, observer: O, config: DriverConfig) -> Result<Self> {
        let mut read_half = stream.try_clone()?;
        read_half.set_read_timeout(READ_POLL_INTERVAL)?;
        debug!(transport = stream.transport_name(), "split transport");
        Self::from_parts(read_half, stream, observer, config)
    }

    /// Open a serial device and start a driver on it.
    #[cfg(feature = "serial")]
    pub fn open_serial<O: Observer>(
        path: impl AsRef<std::path::Path>,
        serial: &bgapi_transport::SerialConfig,
        observer: O,
        config: DriverConfig,
    ) -> Result<Self> {
        let stream = bgapi_transport::open_serial(path, serial)?;
        Self::connect(stream, observer, config)
    }

    /// Send one command and wait up to `timeout` for its response payload.
    pub fn send(
        &self,
        category: u8,
        command: u8,
        payload: impl Into<Bytes>,
        timeout: Duration,
    ) -> Result<Bytes> {
        let submissions = self.submissions.as_ref().ok_or(DriverError::Closed)?;
        let (reply, outcome) = mpsc::sync_channel(1);
        submissions
            .send(Submission {
                category,
                command,
                payload: payload.into(),
                timeout,
                reply,
            })
            .map_err(|_| DriverError::Closed)?;
        outcome.recv().map_err(|_| DriverError::Closed)?
    }

    /// [`Driver::send`] with the configured default timeout.
    pub fn call(&self, category: u8, command: u8, payload: impl Into<Bytes>) -> Result<Bytes> {
        self.send(category, command, payload, self.config.default_timeout)
    }

    /// Send one command and hand its response payload to `on_success`.
    ///
    /// `on_success` runs exactly once when the command succeeds and never
    /// when it fails.
    pub fn send_with<F>(
        &self,
        category: u8,
        command: u8,
        payload: impl Into<Bytes>,
        timeout: Duration,
        on_success: F,
    ) -> Result<()>
    where
        F: FnOnce(Bytes),
    {
        let reply = self.send(category, command, payload, timeout)?;
        on_success(reply);
        Ok(())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Stop both workers. Commands still queued fail with
    /// [`DriverError::Closed`].
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.submissions.is_none() {
            return;
        }
        self.shutdown.store(true, Ordering::Release);
        self.submissions.take();

        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                warn!("writer agent panicked");
            }
        }
        if let Some(reader) = self.reader.take() {
            if reader.is_finished() {
                if reader.join().is_err() {
                    warn!("reader agent panicked");
                }
            } else {
                // exits on its next read timeout or end of stream
                debug!("reader agent still blocked in read, detaching");
            }
        }
        info!(stats = ?self.stats.snapshot(), "driver stopped");
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("running", &self.submissions.is_some())
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use bgapi_event::{ChannelObserver, Event, NoopObserver};
    use bgapi_frame::{encode_frame, MessageKind};
    use bytes::BytesMut;

    use super::*;

    fn config() -> DriverConfig {
        DriverConfig::default().with_timeout(Duration::from_secs(2))
    }

    fn pair() -> (BgStream, UnixStream) {
        let (host, device) = UnixStream::pair().unwrap();
        device
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        (BgStream::from_unix(host), device)
    }

    fn frame(kind: MessageKind, category: u8, subtype: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(kind, category, subtype, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn expect_command(device: &mut UnixStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        device.read_exact(&mut buf).unwrap();
        buf
    }

    fn respond(device: &mut UnixStream, category: u8, command: u8, payload: &[u8]) {
        device
            .write_all(&frame(MessageKind::Response, category, command, payload))
            .unwrap();
    }

    /// Assert the host writes nothing further within a short window.
    fn expect_silence(device: &mut UnixStream) {
        device
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        let mut byte = [0u8; 1];
        let err = device
            .read(&mut byte)
            .expect_err("next command written before the previous response");
        assert!(
            matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            "{err}"
        );
        device
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn hello_round_trip() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();

        let peer = thread::spawn(move || {
            assert_eq!(expect_command(&mut device, 2), vec![0, 1]);
            respond(&mut device, 0, 1, &[]);
            device
        });

        let reply = driver.send(0, 1, Bytes::new(), Duration::from_secs(2)).unwrap();
        assert!(reply.is_empty());
        peer.join().unwrap();
        assert_eq!(driver.stats().responses_correlated, 1);
    }

    #[test]
    fn timeout_then_next_command_works() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();

        let peer = thread::spawn(move || {
            // first command goes unanswered
            expect_command(&mut device, 2);
            assert_eq!(expect_command(&mut device, 2), vec![0, 6]);
            respond(&mut device, 0, 6, &[4]);
            device
        });

        let timeout = Duration::from_millis(50);
        let err = driver.send(0, 1, Bytes::new(), timeout).unwrap_err();
        assert!(matches!(err, DriverError::Timeout(t) if t == timeout));

        let reply = driver.call(0, 6, Bytes::new()).unwrap();
        assert_eq!(reply.as_ref(), &[4]);
        peer.join().unwrap();
    }

    #[test]
    fn mismatch_then_next_command_works() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();

        let peer = thread::spawn(move || {
            expect_command(&mut device, 2);
            respond(&mut device, 0, 2, &[]);
            expect_command(&mut device, 2);
            respond(&mut device, 0, 1, &[]);
            device
        });

        let err = driver.call(0, 1, Bytes::new()).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ProtocolMismatch {
                expected_command: 1,
                actual_command: 2,
                ..
            }
        ));
        driver.call(0, 1, Bytes::new()).unwrap();
        peer.join().unwrap();
    }

    #[test]
    fn unsolicited_response_is_harmless() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();

        respond(&mut device, 3, 7, &[0]);
        wait_until(|| driver.stats().unsolicited_responses == 1);

        let peer = thread::spawn(move || {
            expect_command(&mut device, 2);
            respond(&mut device, 0, 1, &[]);
            device
        });
        driver.call(0, 1, Bytes::new()).unwrap();
        peer.join().unwrap();
    }

    #[test]
    fn event_and_response_in_one_write() {
        let (host, mut device) = pair();
        let (tx, events) = mpsc::channel();
        let driver = Driver::connect(host, ChannelObserver::new(tx), config()).unwrap();

        let peer = thread::spawn(move || {
            expect_command(&mut device, 2);
            let mut burst = frame(MessageKind::Event, 0, 2, &[5, 127]);
            burst.extend(frame(MessageKind::Response, 0, 1, &[]));
            device.write_all(&burst).unwrap();
            device
        });

        driver.call(0, 1, Bytes::new()).unwrap();
        // the event precedes the response in the stream, so it is already out
        assert_eq!(
            events.try_recv().unwrap(),
            Event::SystemEndpointWatermarkRx {
                endpoint: 5,
                data: 127
            }
        );
        peer.join().unwrap();
    }

    #[test]
    fn concurrent_callers_never_interleave() {
        let (host, mut device) = pair();
        let driver = Arc::new(Driver::connect(host, NoopObserver, config()).unwrap());
        const CALLERS: u8 = 4;
        let started = Arc::new(AtomicUsize::new(0));

        let waiting = Arc::clone(&started);
        let peer = thread::spawn(move || {
            for answered in 0..CALLERS {
                let cmd = expect_command(&mut device, 5);
                assert_eq!(cmd[0], 6);
                assert!(cmd[2..].iter().all(|&b| b == cmd[1]), "interleaved: {cmd:?}");
                if answered == 0 {
                    wait_until(|| waiting.load(Ordering::SeqCst) == usize::from(CALLERS));
                }
                if answered + 1 < CALLERS {
                    expect_silence(&mut device);
                }
                respond(&mut device, 6, cmd[1], &[cmd[1]]);
            }
            device
        });

        let callers: Vec<_> = (0..CALLERS)
            .map(|i| {
                let driver = Arc::clone(&driver);
                let started = Arc::clone(&started);
                thread::spawn(move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    let reply = driver.call(6, i, vec![i; 3]).unwrap();
                    assert_eq!(reply.as_ref(), &[i]);
                })
            })
            .collect();
        for caller in callers {
            caller.join().unwrap();
        }
        peer.join().unwrap();
        assert_eq!(driver.stats().responses_correlated, u64::from(CALLERS));
    }

    #[test]
    fn unbounded_timeout_does_not_stop_the_writer() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();

        let peer = thread::spawn(move || {
            assert_eq!(expect_command(&mut device, 2), vec![0, 1]);
            respond(&mut device, 0, 1, &[]);
            assert_eq!(expect_command(&mut device, 2), vec![0, 6]);
            respond(&mut device, 0, 6, &[1, 2, 3, 4, 5, 6]);
            device
        });

        driver.send(0, 1, Bytes::new(), Duration::MAX).unwrap();
        let reply = driver
            .send(0, 6, Bytes::new(), Duration::from_millis(500))
            .unwrap();
        assert_eq!(reply.len(), 6);
        peer.join().unwrap();
    }

    #[test]
    fn send_with_runs_callback_once_on_success_only() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let peer = thread::spawn(move || {
            expect_command(&mut device, 2);
            respond(&mut device, 0, 1, &[]);
            expect_command(&mut device, 2);
            device
        });

        let counter = Arc::clone(&calls);
        driver
            .send_with(0, 1, Bytes::new(), Duration::from_secs(2), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let counter = Arc::clone(&calls);
        let err = driver
            .send_with(0, 1, Bytes::new(), Duration::from_millis(30), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        peer.join().unwrap();
    }

    #[test]
    fn end_of_stream_leaves_commands_timing_out() {
        let driver = Driver::from_parts(
            Cursor::new(Vec::<u8>::new()),
            Vec::<u8>::new(),
            NoopObserver,
            config(),
        )
        .unwrap();

        let err = driver
            .send(0, 1, Bytes::new(), Duration::from_millis(30))
            .unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let (host, _device) = pair();
        let mut config = config();
        config.max_payload_size = 4;
        let driver = Driver::connect(host, NoopObserver, config).unwrap();

        let err = driver.call(1, 3, vec![0u8; 5]).unwrap_err();
        assert!(matches!(err, DriverError::Frame(_)));
    }

    #[test]
    fn shutdown_releases_transport() {
        let (host, mut device) = pair();
        let driver = Driver::connect(host, NoopObserver, config()).unwrap();
        driver.shutdown();

        // both halves close once the workers are gone
        let mut buf = [0u8; 1];
        assert_eq!(device.read(&mut buf).unwrap(), 0);
    }
}
