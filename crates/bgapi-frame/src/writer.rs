use std::io::{self, ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::header::{encode_command, CommandFraming, CommandPacket};

/// Puts host commands on a blocking byte sink.
///
/// Each command is encoded into a scratch buffer first, so a payload that
/// fails validation never reaches the wire. The whole packet is written and
/// flushed before [`send`](Self::send) returns.
pub struct FrameWriter<T> {
    sink: T,
    scratch: BytesMut,
    framing: CommandFraming,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(sink: T) -> Self {
        Self::with_framing(sink, CommandFraming::default())
    }

    pub fn with_framing(sink: T, framing: CommandFraming) -> Self {
        Self {
            sink,
            scratch: BytesMut::new(),
            framing,
        }
    }

    pub fn write_command(&mut self, packet: &CommandPacket) -> Result<()> {
        self.send(packet.category, packet.command, &packet.payload)
    }

    /// Encode one command, write all of it and flush.
    ///
    /// A zero-length write is reported as [`FrameError::ConnectionClosed`].
    pub fn send(&mut self, category: u8, command: u8, payload: &[u8]) -> Result<()> {
        self.scratch.clear();
        encode_command(self.framing, category, command, payload, &mut self.scratch)?;

        let mut rest = &self.scratch[..];
        while !rest.is_empty() {
            let written = retry_transient(|| self.sink.write(rest))?;
            if written == 0 {
                return Err(FrameError::ConnectionClosed);
            }
            rest = &rest[written..];
            if !rest.is_empty() {
                trace!(written, remaining = rest.len(), "short write");
            }
        }
        retry_transient(|| self.sink.flush())
    }

    pub fn framing(&self) -> CommandFraming {
        self.framing
    }

    pub fn into_inner(self) -> T {
        self.sink
    }
}

/// Repeat `op` while it fails with `Interrupted` or `WouldBlock`.
fn retry_transient<R>(mut op: impl FnMut() -> io::Result<R>) -> Result<R> {
    loop {
        match op() {
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            other => return other.map_err(FrameError::Io),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;
    use crate::header::MAX_PAYLOAD;
    use crate::reader::FrameReader;

    /// What a scripted sink does on its next `write` call.
    enum Step {
        Accept(usize),
        Fail(ErrorKind),
    }

    /// A sink replaying a fixed script; once the script runs out every
    /// write is accepted in full.
    #[derive(Default)]
    struct ScriptedSink {
        script: VecDeque<Step>,
        flush_failures: VecDeque<ErrorKind>,
        wire: Vec<u8>,
        flushes: usize,
    }

    impl ScriptedSink {
        fn with_script(script: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: script.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl Write for ScriptedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = match self.script.pop_front() {
                Some(Step::Fail(kind)) => return Err(kind.into()),
                Some(Step::Accept(n)) => n.min(buf.len()),
                None => buf.len(),
            };
            self.wire.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            if let Some(kind) = self.flush_failures.pop_front() {
                return Err(kind.into());
            }
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn bare_commands_back_to_back() {
        let mut writer = FrameWriter::new(ScriptedSink::default());
        writer.send(0, 1, &[]).unwrap();
        writer.send(6, 2, &[1]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.wire, vec![0, 1, 6, 2, 1]);
        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn headered_command_reads_back_as_response_frame() {
        let mut writer =
            FrameWriter::with_framing(Cursor::new(Vec::<u8>::new()), CommandFraming::Headered);
        writer
            .write_command(&CommandPacket::new(3, 0, vec![1u8]))
            .unwrap();
        assert_eq!(writer.framing(), CommandFraming::Headered);

        let mut reader = FrameReader::new(Cursor::new(writer.into_inner().into_inner()));
        let frame = reader.read_frame().unwrap();
        assert_eq!((frame.header.category, frame.header.subtype), (3, 0));
        assert_eq!(frame.payload.as_ref(), &[1]);
    }

    #[test]
    fn oversized_payload_never_reaches_the_sink() {
        let mut writer = FrameWriter::new(ScriptedSink::default());
        let err = writer.send(1, 3, &vec![0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));

        let sink = writer.into_inner();
        assert!(sink.wire.is_empty());
        assert_eq!(sink.flushes, 0);
    }

    #[test]
    fn short_and_transient_writes_are_completed() {
        let sink = ScriptedSink::with_script([
            Step::Fail(ErrorKind::Interrupted),
            Step::Accept(1),
            Step::Fail(ErrorKind::WouldBlock),
            Step::Accept(2),
        ]);
        let mut writer = FrameWriter::new(sink);
        writer.send(0, 7, &[3, 1, 2]).unwrap();

        assert_eq!(writer.into_inner().wire, vec![0, 7, 3, 1, 2]);
    }

    #[test]
    fn interrupted_flush_is_retried() {
        let mut sink = ScriptedSink::default();
        sink.flush_failures.push_back(ErrorKind::Interrupted);
        let mut writer = FrameWriter::new(sink);
        writer.send(0, 8, &[]).unwrap();

        assert_eq!(writer.into_inner().flushes, 1);
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut writer = FrameWriter::new(ScriptedSink::with_script([Step::Accept(0)]));
        let err = writer.send(0, 1, &[]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn hard_errors_surface() {
        let mut writer = FrameWriter::new(ScriptedSink::with_script([Step::Fail(
            ErrorKind::BrokenPipe,
        )]));
        let err = writer.send(0, 1, &[]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }
}
