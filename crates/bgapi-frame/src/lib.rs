//! BGAPI framing for byte-stream transports.
//!
//! Every device message carries a 4-byte header:
//! - A 2-byte little-endian word: payload length (15 bits) and message kind
//!   (bit 15; 0 = response, 1 = event)
//! - A category (command class) byte
//! - A subtype (command or event id) byte
//!
//! [`FrameAssembler`] turns arbitrarily chunked input into whole frames;
//! [`FrameWriter`] puts host commands on the wire.

pub mod assembler;
pub mod category;
#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use assembler::FrameAssembler;
pub use category::category_name;
#[cfg(feature = "async")]
pub use codec::BgapiCodec;
pub use error::{FrameError, Result};
pub use header::{
    decode_frame, encode_command, encode_frame, CommandFraming, CommandPacket, Frame,
    FrameHeader, MessageKind, HEADER_SIZE, MAX_PAYLOAD,
};
pub use reader::{FrameReader, DEFAULT_READ_CHUNK_SIZE};
pub use writer::FrameWriter;
