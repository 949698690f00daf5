//! `tokio_util::codec` adapter for async transports.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::header::{decode_frame, encode_command, CommandFraming, CommandPacket, Frame};

/// Decodes device frames and encodes host commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BgapiCodec {
    framing: CommandFraming,
}

impl BgapiCodec {
    pub fn new(framing: CommandFraming) -> Self {
        Self { framing }
    }
}

impl Decoder for BgapiCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src)
    }
}

impl Encoder<CommandPacket> for BgapiCodec {
    type Error = FrameError;

    fn encode(&mut self, item: CommandPacket, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_command(
            self.framing,
            item.category,
            item.command,
            item.payload.as_ref(),
            dst,
        )
    }
}
