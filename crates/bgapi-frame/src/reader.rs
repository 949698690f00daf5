use std::io::{ErrorKind, Read};

use crate::assembler::FrameAssembler;
use crate::error::{FrameError, Result};
use crate::header::{Frame, HEADER_SIZE};

/// Default size of a single `read` call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Pulls whole frames out of a blocking byte source.
///
/// Also an [`Iterator`] over a finite capture: it yields every complete
/// frame, then one `ConnectionClosed` error only if the capture ends
/// mid-frame.
pub struct FrameReader<T> {
    source: T,
    assembler: FrameAssembler,
    chunk: Box<[u8]>,
    exhausted: bool,
}

impl<T: Read> FrameReader<T> {
    pub fn new(source: T) -> Self {
        Self::with_chunk_size(source, DEFAULT_READ_CHUNK_SIZE)
    }

    /// Read at most `chunk_size` bytes (minimum 1) per call to the source.
    pub fn with_chunk_size(source: T, chunk_size: usize) -> Self {
        Self {
            source,
            assembler: FrameAssembler::new(),
            chunk: vec![0u8; chunk_size.max(1)].into_boxed_slice(),
            exhausted: false,
        }
    }

    /// Block until the next frame is complete.
    ///
    /// Buffered frames are drained before the source is read again. End of
    /// input is [`FrameError::ConnectionClosed`]. Any other I/O error is
    /// returned as is with partial input kept, so the caller may retry.
    pub fn read_frame(&mut self) -> Result<Frame> {
        while !self.assembler.has_complete_frame() {
            let n = match self.source.read(&mut self.chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            self.assembler.append(&self.chunk[..n]);
        }
        self.assembler.take_frame()
    }

    /// Bytes held toward a frame that is not complete yet, header included.
    pub fn buffered(&self) -> usize {
        let header = self.assembler.pending_header().map_or(0, |_| HEADER_SIZE);
        header + self.assembler.buffered()
    }

    pub fn into_inner(self) -> T {
        self.source
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) if self.buffered() == 0 => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}
