use bgapi_frame::category::SM;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

impl Driver {
    pub fn sm_encrypt_start(&self, handle: u8, bonding: bool) -> Result<Bytes> {
        self.call(SM, 0, Payload::new().u8(handle).flag(bonding).build())
    }

    pub fn sm_set_bondable_mode(&self, bondable: bool) -> Result<Bytes> {
        self.call(SM, 1, Payload::new().flag(bondable).build())
    }

    /// Delete one bond, or all of them with handle `0xff`.
    pub fn sm_delete_bonding(&self, handle: u8) -> Result<Bytes> {
        self.call(SM, 2, Payload::new().u8(handle).build())
    }

    pub fn sm_set_parameters(&self, mitm: bool, min_key_size: u8, io_capabilities: u8) -> Result<Bytes> {
        let payload = Payload::new()
            .flag(mitm)
            .u8(min_key_size)
            .u8(io_capabilities)
            .build();
        self.call(SM, 3, payload)
    }

    pub fn sm_passkey_entry(&self, handle: u8, passkey: u32) -> Result<Bytes> {
        self.call(SM, 4, Payload::new().u8(handle).u32(passkey).build())
    }

    /// Bonds are reported as `sm_bond_status` events.
    pub fn sm_get_bonds(&self) -> Result<Bytes> {
        self.call(SM, 5, Bytes::new())
    }

    pub fn sm_set_oob_data(&self, oob: &[u8]) -> Result<Bytes> {
        self.call(SM, 6, Payload::new().prefixed("oob", oob)?.build())
    }
}
