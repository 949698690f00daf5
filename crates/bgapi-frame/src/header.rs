use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Header: length word (2) + category (1) + subtype (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 15-bit length field can describe.
pub const MAX_PAYLOAD: usize = 0x7fff;

const LENGTH_MASK: u16 = 0x7fff;
const KIND_SHIFT: u16 = 15;
const TECHNOLOGY_SHIFT: u16 = 11;
const TECHNOLOGY_MASK: u16 = 0x0f;

/// Discriminator between correlated responses and unsolicited events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Reply to the host's outstanding command.
    Response,
    /// Device-initiated notification.
    Event,
}

impl MessageKind {
    fn bit(self) -> u16 {
        match self {
            MessageKind::Response => 0,
            MessageKind::Event => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Response => "response",
            MessageKind::Event => "event",
        }
    }
}

/// Parsed 4-byte frame header.
///
/// The first two bytes form one little-endian word: payload length in bits
/// 0-14 and message kind in bit 15. Technology type is a second view over
/// bits 11-14 of the same word, so it is derived rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    word: u16,
    /// Command class.
    pub category: u8,
    /// Command or event id within the class.
    pub subtype: u8,
}

impl FrameHeader {
    /// Build a header. `payload_length` is truncated to 15 bits; callers
    /// validate against [`MAX_PAYLOAD`] first.
    pub fn new(kind: MessageKind, category: u8, subtype: u8, payload_length: usize) -> Self {
        let word = ((payload_length as u16) & LENGTH_MASK) | (kind.bit() << KIND_SHIFT);
        Self {
            word,
            category,
            subtype,
        }
    }

    /// Reconstruct a header from its wire bytes.
    pub fn from_bytes(raw: [u8; HEADER_SIZE]) -> Self {
        Self {
            word: u16::from_le_bytes([raw[0], raw[1]]),
            category: raw[2],
            subtype: raw[3],
        }
    }

    /// Wire bytes of this header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [lo, hi] = self.word.to_le_bytes();
        [lo, hi, self.category, self.subtype]
    }

    /// Number of payload bytes following the header.
    pub fn payload_length(&self) -> usize {
        (self.word & LENGTH_MASK) as usize
    }

    pub fn message_kind(&self) -> MessageKind {
        if self.word >> KIND_SHIFT == 0 {
            MessageKind::Response
        } else {
            MessageKind::Event
        }
    }

    /// Legacy overlay on bits 11-14 of the length word.
    pub fn technology_type(&self) -> u8 {
        ((self.word >> TECHNOLOGY_SHIFT) & TECHNOLOGY_MASK) as u8
    }

    /// The raw packed length word.
    pub fn raw_word(&self) -> u16 {
        self.word
    }
}

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame; the header length is derived from the payload.
    pub fn new(kind: MessageKind, category: u8, subtype: u8, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            header: FrameHeader::new(kind, category, subtype, payload.len()),
            payload,
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// ```text
/// ┌─────────────────────┬──────────┬─────────┬────────────────┐
/// │ Length word (2B LE) │ Category │ Subtype │ Payload         │
/// │ len:15 | kind:1     │ (1B)     │ (1B)    │ (len bytes)     │
/// └─────────────────────┴──────────┴─────────┴────────────────┘
/// ```
pub fn encode_frame(
    kind: MessageKind,
    category: u8,
    subtype: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    check_payload_len(payload.len())?;
    let header = FrameHeader::new(kind, category, subtype, payload.len());
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&header.to_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer without latching state.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let header = FrameHeader::from_bytes([src[0], src[1], src[2], src[3]]);
    let total = HEADER_SIZE + header.payload_length();
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(header.payload_length()).freeze();

    Ok(Some(Frame { header, payload }))
}

/// How host commands are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandFraming {
    /// `[category, command, payload...]`
    #[default]
    Bare,
    /// 4-byte header with message kind 0, then payload.
    Headered,
}

/// A host-initiated command awaiting transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub category: u8,
    pub command: u8,
    pub payload: Bytes,
}

impl CommandPacket {
    pub fn new(category: u8, command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            category,
            command,
            payload: payload.into(),
        }
    }
}

/// Encode a host command using the given framing.
pub fn encode_command(
    framing: CommandFraming,
    category: u8,
    command: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    match framing {
        CommandFraming::Bare => {
            check_payload_len(payload.len())?;
            dst.reserve(2 + payload.len());
            dst.put_u8(category);
            dst.put_u8(command);
            dst.put_slice(payload);
            Ok(())
        }
        CommandFraming::Headered => {
            encode_frame(MessageKind::Response, category, command, payload, dst)
        }
    }
}

fn check_payload_len(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}
