use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::header::{Frame, FrameHeader, HEADER_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Reassembles a continuous byte stream into frames.
///
/// Input may arrive in chunks of any size, split anywhere inside a header or
/// a payload. Once four bytes are available the header is parsed, consumed
/// and latched; the frame becomes available when its whole payload is
/// buffered. Only one header is held at a time.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    header: Option<FrameHeader>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            header: None,
        }
    }

    /// Accumulate raw input.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// True once a full frame is buffered.
    ///
    /// Parses and latches the next header as a side effect when enough bytes
    /// have arrived.
    pub fn has_complete_frame(&mut self) -> bool {
        if self.header.is_none() && self.buf.len() >= HEADER_SIZE {
            let raw = [self.buf[0], self.buf[1], self.buf[2], self.buf[3]];
            self.buf.advance(HEADER_SIZE);
            let header = FrameHeader::from_bytes(raw);
            trace!(
                kind = header.message_kind().as_str(),
                category = header.category,
                subtype = header.subtype,
                len = header.payload_length(),
                "header latched"
            );
            self.header = Some(header);
        }

        match &self.header {
            Some(header) => self.buf.len() >= header.payload_length(),
            None => false,
        }
    }

    /// Remove the latched frame.
    ///
    /// Only valid after [`has_complete_frame`](Self::has_complete_frame)
    /// returned true; otherwise fails with [`FrameError::NoFrameReady`] and
    /// leaves the buffered state untouched.
    pub fn take_frame(&mut self) -> Result<Frame> {
        let header = match self.header {
            Some(header) if self.buf.len() >= header.payload_length() => header,
            _ => return Err(FrameError::NoFrameReady),
        };

        self.header = None;
        let payload = self.buf.split_to(header.payload_length()).freeze();
        Ok(Frame { header, payload })
    }

    /// Return the next complete frame, if any.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.has_complete_frame() {
            self.take_frame().ok()
        } else {
            None
        }
    }

    /// Header latched while its payload is still arriving.
    pub fn pending_header(&self) -> Option<FrameHeader> {
        self.header
    }

    /// Bytes buffered beyond any latched header.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop all buffered input and any latched header.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.header = None;
    }
}
