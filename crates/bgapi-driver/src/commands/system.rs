use bgapi_event::{BdAddr, PayloadCursor, QualifiedAddr, SystemInfo};
use bgapi_frame::category::SYSTEM;
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use super::Payload;
use crate::driver::Driver;
use crate::error::{DriverError, Result};

/// Radio diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SystemCounters {
    pub tx_ok: u8,
    pub tx_retry: u8,
    pub rx_ok: u8,
    pub rx_fail: u8,
    pub mbuf: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegisterValue {
    pub address: u16,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryRead {
    pub address: u32,
    pub data: Bytes,
}

impl Driver {
    /// Reboot the module, optionally into the DFU bootloader.
    ///
    /// The module restarts instead of answering; a boot event follows.
    pub fn system_reset(&self, boot_in_dfu: bool) -> Result<()> {
        match self.call(SYSTEM, 0, Payload::new().flag(boot_in_dfu).build()) {
            Ok(_) | Err(DriverError::Timeout(_)) => {
                debug!(boot_in_dfu, "reset requested");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// No-op round trip, useful as a liveness check.
    pub fn system_hello(&self) -> Result<()> {
        self.call(SYSTEM, 1, Bytes::new()).map(drop)
    }

    pub fn system_address_get(&self) -> Result<BdAddr> {
        let reply = self.call(SYSTEM, 2, Bytes::new())?;
        Ok(PayloadCursor::new(reply).addr())
    }

    pub fn system_reg_write(&self, address: u16, value: u8) -> Result<u16> {
        let reply = self.call(SYSTEM, 3, Payload::new().u16(address).u8(value).build())?;
        Ok(PayloadCursor::new(reply).u16())
    }

    pub fn system_reg_read(&self, address: u16) -> Result<RegisterValue> {
        let reply = self.call(SYSTEM, 4, Payload::new().u16(address).build())?;
        let mut cur = PayloadCursor::new(reply);
        Ok(RegisterValue {
            address: cur.u16(),
            value: cur.u8(),
        })
    }

    pub fn system_counters_get(&self) -> Result<SystemCounters> {
        let reply = self.call(SYSTEM, 5, Bytes::new())?;
        let mut cur = PayloadCursor::new(reply);
        Ok(SystemCounters {
            tx_ok: cur.u8(),
            tx_retry: cur.u8(),
            rx_ok: cur.u8(),
            rx_fail: cur.u8(),
            mbuf: cur.u8(),
        })
    }

    /// Maximum number of simultaneous connections the firmware supports.
    pub fn system_connections_get(&self) -> Result<u8> {
        let reply = self.call(SYSTEM, 6, Bytes::new())?;
        Ok(PayloadCursor::new(reply).u8())
    }

    pub fn system_memory_read(&self, address: u32, length: u8) -> Result<MemoryRead> {
        let reply = self.call(SYSTEM, 7, Payload::new().u32(address).u8(length).build())?;
        let mut cur = PayloadCursor::new(reply);
        Ok(MemoryRead {
            address: cur.u32(),
            data: cur.prefixed(),
        })
    }

    pub fn system_info_get(&self) -> Result<SystemInfo> {
        let reply = self.call(SYSTEM, 8, Bytes::new())?;
        let mut cur = PayloadCursor::new(reply);
        Ok(SystemInfo {
            major: cur.u16(),
            minor: cur.u16(),
            patch: cur.u16(),
            build: cur.u16(),
            ll_version: cur.u16(),
            protocol_version: cur.u8(),
            hw: cur.u8(),
        })
    }

    pub fn system_endpoint_tx(&self, endpoint: u8, data: &[u8]) -> Result<u16> {
        let payload = Payload::new().u8(endpoint).prefixed("data", data)?.build();
        let reply = self.call(SYSTEM, 9, payload)?;
        Ok(PayloadCursor::new(reply).u16())
    }

    pub fn system_whitelist_append(&self, address: &QualifiedAddr) -> Result<u16> {
        let reply = self.call(SYSTEM, 10, Payload::new().addr(address).build())?;
        Ok(PayloadCursor::new(reply).u16())
    }

    pub fn system_whitelist_remove(&self, address: &QualifiedAddr) -> Result<Bytes> {
        self.call(SYSTEM, 11, Payload::new().addr(address).build())
    }

    pub fn system_whitelist_clear(&self) -> Result<Bytes> {
        self.call(SYSTEM, 12, Bytes::new())
    }

    pub fn system_endpoint_rx(&self, endpoint: u8, size: u8) -> Result<Bytes> {
        self.call(SYSTEM, 13, Payload::new().u8(endpoint).u8(size).build())
    }

    pub fn system_endpoint_set_watermarks(&self, endpoint: u8, rx: u8, tx: u8) -> Result<Bytes> {
        self.call(SYSTEM, 14, Payload::new().u8(endpoint).u8(rx).u8(tx).build())
    }
}
