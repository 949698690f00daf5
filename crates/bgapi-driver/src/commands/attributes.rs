use bgapi_frame::category::ATTRIBUTES;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

/// Local GATT database.
impl Driver {
    pub fn attributes_write(&self, handle: u16, offset: u8, value: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .u16(handle)
            .u8(offset)
            .prefixed("value", value)?
            .build();
        self.call(ATTRIBUTES, 0, payload)
    }

    pub fn attributes_read(&self, handle: u16, offset: u16) -> Result<Bytes> {
        self.call(ATTRIBUTES, 1, Payload::new().u16(handle).u16(offset).build())
    }

    pub fn attributes_read_type(&self, handle: u16) -> Result<Bytes> {
        self.call(ATTRIBUTES, 2, Payload::new().u16(handle).build())
    }

    /// Answer an `attribute_user_read_request` event.
    pub fn attributes_user_read_response(
        &self,
        connection: u8,
        att_error: u8,
        value: &[u8],
    ) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .u8(att_error)
            .prefixed("value", value)?
            .build();
        self.call(ATTRIBUTES, 3, payload)
    }

    pub fn attributes_user_write_response(&self, connection: u8, att_error: u8) -> Result<Bytes> {
        self.call(ATTRIBUTES, 4, Payload::new().u8(connection).u8(att_error).build())
    }
}
