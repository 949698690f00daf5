//! Typed command builders, one module per BGAPI class.
//!
//! Every method marshals its arguments into a payload and goes through
//! [`Driver::call`](crate::Driver::call), so it blocks for at most the
//! configured default timeout. Replies with a known layout are decoded;
//! the rest return the raw response payload.

mod attclient;
mod attributes;
mod connection;
mod flash;
mod gap;
mod hardware;
mod sm;
mod system;

use bgapi_event::QualifiedAddr;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DriverError, Result};

pub use connection::ConnectionParameters;
pub use gap::{DISCOVER_GENERIC, DISCOVER_LIMITED, DISCOVER_OBSERVATION};
pub use hardware::SpiConfig;
pub use system::{MemoryRead, RegisterValue, SystemCounters};

/// Little-endian payload builder.
#[derive(Debug, Default)]
pub(crate) struct Payload(BytesMut);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.0.put_u8(value);
        self
    }

    pub fn flag(self, value: bool) -> Self {
        self.u8(u8::from(value))
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.0.put_u16_le(value);
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.0.put_u32_le(value);
        self
    }

    pub fn addr(mut self, addr: &QualifiedAddr) -> Self {
        self.0.put_slice(&addr.address.0);
        self.0.put_u8(addr.address_type);
        self
    }

    /// One length byte followed by `data`.
    pub fn prefixed(mut self, field: &'static str, data: &[u8]) -> Result<Self> {
        let len = u8::try_from(data.len()).map_err(|_| DriverError::ArgumentTooLong {
            field,
            len: data.len(),
        })?;
        self.0.put_u8(len);
        self.0.put_slice(data);
        Ok(self)
    }

    pub fn build(self) -> Bytes {
        self.0.freeze()
    }
}
