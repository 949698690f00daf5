use bgapi_frame::category::FLASH;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

impl Driver {
    pub fn flash_ps_defrag(&self) -> Result<Bytes> {
        self.call(FLASH, 0, Bytes::new())
    }

    /// Stream every persistent-store key as `flash_ps_key` events.
    pub fn flash_ps_dump(&self) -> Result<Bytes> {
        self.call(FLASH, 1, Bytes::new())
    }

    pub fn flash_ps_erase_all(&self) -> Result<Bytes> {
        self.call(FLASH, 2, Bytes::new())
    }

    pub fn flash_ps_save(&self, key: u16, value: &[u8]) -> Result<Bytes> {
        let payload = Payload::new().u16(key).prefixed("value", value)?.build();
        self.call(FLASH, 3, payload)
    }

    pub fn flash_ps_load(&self, key: u16) -> Result<Bytes> {
        self.call(FLASH, 4, Payload::new().u16(key).build())
    }

    pub fn flash_ps_erase(&self, key: u16) -> Result<Bytes> {
        self.call(FLASH, 5, Payload::new().u16(key).build())
    }

    pub fn flash_erase_page(&self, page: u8) -> Result<Bytes> {
        self.call(FLASH, 6, Payload::new().u8(page).build())
    }

    pub fn flash_write_words(&self, address: u16, words: &[u8]) -> Result<Bytes> {
        let payload = Payload::new().u16(address).prefixed("words", words)?.build();
        self.call(FLASH, 7, payload)
    }
}
