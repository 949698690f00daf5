use bytes::{Buf, Bytes};

use crate::types::BdAddr;

/// Permissive little-endian reader over a frame payload.
///
/// Fields read past the end of the payload come back as zero and consume
/// whatever bytes were left. Length-prefixed sequences are clamped to what
/// is actually present.
#[derive(Debug, Clone)]
pub struct PayloadCursor {
    buf: Bytes,
}

impl PayloadCursor {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn u8(&mut self) -> u8 {
        if self.buf.has_remaining() {
            self.buf.get_u8()
        } else {
            0
        }
    }

    pub fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    pub fn u16(&mut self) -> u16 {
        if self.buf.remaining() >= 2 {
            self.buf.get_u16_le()
        } else {
            self.exhaust();
            0
        }
    }

    pub fn i16(&mut self) -> i16 {
        self.u16() as i16
    }

    pub fn u32(&mut self) -> u32 {
        if self.buf.remaining() >= 4 {
            self.buf.get_u32_le()
        } else {
            self.exhaust();
            0
        }
    }

    /// Six address bytes in wire (least significant first) order.
    pub fn addr(&mut self) -> BdAddr {
        let mut raw = [0u8; 6];
        if self.buf.remaining() >= raw.len() {
            self.buf.copy_to_slice(&mut raw);
        } else {
            self.exhaust();
        }
        BdAddr(raw)
    }

    /// A length byte followed by up to that many bytes.
    pub fn prefixed(&mut self) -> Bytes {
        let len = usize::from(self.u8());
        let take = len.min(self.buf.remaining());
        self.buf.split_to(take)
    }

    /// Everything left in the payload.
    pub fn rest(&mut self) -> Bytes {
        std::mem::take(&mut self.buf)
    }

    fn exhaust(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let mut cur = PayloadCursor::new(Bytes::from_static(&[
            0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xff,
        ]));
        assert_eq!(cur.u8(), 1);
        assert_eq!(cur.u16(), 0x1234);
        assert_eq!(cur.u32(), 0x1234_5678);
        assert_eq!(cur.i8(), -1);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn short_reads_are_zero() {
        let mut cur = PayloadCursor::new(Bytes::from_static(&[0xaa]));
        assert_eq!(cur.u16(), 0);
        assert_eq!(cur.remaining(), 0);
        assert_eq!(cur.u8(), 0);
        assert_eq!(cur.u32(), 0);
        assert_eq!(cur.addr(), BdAddr([0; 6]));
    }

    #[test]
    fn prefixed_is_clamped() {
        let mut cur = PayloadCursor::new(Bytes::from_static(&[0x05, 1, 2]));
        assert_eq!(cur.prefixed().as_ref(), &[1, 2]);

        let mut cur = PayloadCursor::new(Bytes::from_static(&[0x01, 9, 8]));
        assert_eq!(cur.prefixed().as_ref(), &[9]);
        assert_eq!(cur.rest().as_ref(), &[8]);
        assert!(cur.rest().is_empty());
    }
}
