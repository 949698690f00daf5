use bgapi_frame::category::ATTCLIENT;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

/// GATT client procedures. Results arrive as `attclient_*` events, ending
/// with `attclient_procedure_completed`.
impl Driver {
    pub fn attclient_find_by_type_value(
        &self,
        connection: u8,
        start: u16,
        end: u16,
        uuid: u16,
        value: &[u8],
    ) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .u16(start)
            .u16(end)
            .u16(uuid)
            .prefixed("value", value)?
            .build();
        self.call(ATTCLIENT, 0, payload)
    }

    /// Discover services; each one is reported by `attclient_group_found`.
    pub fn attclient_read_by_group_type(
        &self,
        connection: u8,
        start: u16,
        end: u16,
        uuid: &[u8],
    ) -> Result<Bytes> {
        let payload = range(connection, start, end).prefixed("uuid", uuid)?.build();
        self.call(ATTCLIENT, 1, payload)
    }

    pub fn attclient_read_by_type(
        &self,
        connection: u8,
        start: u16,
        end: u16,
        uuid: &[u8],
    ) -> Result<Bytes> {
        let payload = range(connection, start, end).prefixed("uuid", uuid)?.build();
        self.call(ATTCLIENT, 2, payload)
    }

    pub fn attclient_find_information(&self, connection: u8, start: u16, end: u16) -> Result<Bytes> {
        self.call(ATTCLIENT, 3, range(connection, start, end).build())
    }

    pub fn attclient_read_by_handle(&self, connection: u8, handle: u16) -> Result<Bytes> {
        self.call(ATTCLIENT, 4, Payload::new().u8(connection).u16(handle).build())
    }

    pub fn attclient_attribute_write(&self, connection: u8, handle: u16, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .u16(handle)
            .prefixed("data", data)?
            .build();
        self.call(ATTCLIENT, 5, payload)
    }

    /// Write without response.
    pub fn attclient_write_command(&self, connection: u8, handle: u16, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .u16(handle)
            .prefixed("data", data)?
            .build();
        self.call(ATTCLIENT, 6, payload)
    }

    pub fn attclient_indicate_confirm(&self, connection: u8) -> Result<Bytes> {
        self.call(ATTCLIENT, 7, Payload::new().u8(connection).build())
    }

    pub fn attclient_read_long(&self, connection: u8, handle: u16) -> Result<Bytes> {
        self.call(ATTCLIENT, 8, Payload::new().u8(connection).u16(handle).build())
    }

    pub fn attclient_prepare_write(
        &self,
        connection: u8,
        handle: u16,
        offset: u16,
        data: &[u8],
    ) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .u16(handle)
            .u16(offset)
            .prefixed("data", data)?
            .build();
        self.call(ATTCLIENT, 9, payload)
    }

    /// Commit (`true`) or cancel queued prepared writes.
    pub fn attclient_execute_write(&self, connection: u8, commit: bool) -> Result<Bytes> {
        self.call(ATTCLIENT, 10, Payload::new().u8(connection).flag(commit).build())
    }

    /// `handles` is the packed little-endian list of 16-bit handles.
    pub fn attclient_read_multiple(&self, connection: u8, handles: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(connection)
            .prefixed("handles", handles)?
            .build();
        self.call(ATTCLIENT, 11, payload)
    }
}

fn range(connection: u8, start: u16, end: u16) -> Payload {
    Payload::new().u8(connection).u16(start).u16(end)
}
