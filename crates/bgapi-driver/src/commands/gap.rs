use bgapi_event::QualifiedAddr;
use bgapi_frame::category::GAP;
use bytes::Bytes;

use super::{ConnectionParameters, Payload};
use crate::driver::Driver;
use crate::error::Result;

/// Discovery mode for [`Driver::gap_discover`].
pub const DISCOVER_LIMITED: u8 = 0;
pub const DISCOVER_GENERIC: u8 = 1;
pub const DISCOVER_OBSERVATION: u8 = 2;

impl Driver {
    pub fn gap_set_privacy_flags(&self, peripheral: u8, central: u8) -> Result<Bytes> {
        self.call(GAP, 0, Payload::new().u8(peripheral).u8(central).build())
    }

    pub fn gap_set_mode(&self, discover: u8, connect: u8) -> Result<Bytes> {
        self.call(GAP, 1, Payload::new().u8(discover).u8(connect).build())
    }

    /// Start scanning; results arrive as `gap_scan_response` events until
    /// [`Driver::gap_end_procedure`].
    pub fn gap_discover(&self, mode: u8) -> Result<Bytes> {
        self.call(GAP, 2, Payload::new().u8(mode).build())
    }

    pub fn gap_connect_direct(
        &self,
        address: &QualifiedAddr,
        params: &ConnectionParameters,
    ) -> Result<Bytes> {
        let payload = params.put_for_connect(Payload::new().addr(address)).build();
        self.call(GAP, 3, payload)
    }

    pub fn gap_end_procedure(&self) -> Result<Bytes> {
        self.call(GAP, 4, Bytes::new())
    }

    /// Connect to the first whitelisted device that advertises.
    pub fn gap_connect_selective(&self, params: &ConnectionParameters) -> Result<Bytes> {
        self.call(GAP, 5, params.put_for_connect(Payload::new()).build())
    }

    pub fn gap_set_filtering(
        &self,
        scan_policy: u8,
        adv_policy: u8,
        scan_duplicate_filtering: bool,
    ) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(scan_policy)
            .u8(adv_policy)
            .flag(scan_duplicate_filtering)
            .build();
        self.call(GAP, 6, payload)
    }

    pub fn gap_set_scan_parameters(&self, interval: u16, window: u16, active: bool) -> Result<Bytes> {
        let payload = Payload::new().u16(interval).u16(window).flag(active).build();
        self.call(GAP, 7, payload)
    }

    pub fn gap_set_adv_parameters(&self, interval_min: u16, interval_max: u16, channels: u8) -> Result<Bytes> {
        let payload = Payload::new()
            .u16(interval_min)
            .u16(interval_max)
            .u8(channels)
            .build();
        self.call(GAP, 8, payload)
    }

    pub fn gap_set_adv_data(&self, scan_response: bool, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .flag(scan_response)
            .prefixed("data", data)?
            .build();
        self.call(GAP, 9, payload)
    }

    pub fn gap_set_directed_connectable_mode(&self, address: &QualifiedAddr) -> Result<Bytes> {
        self.call(GAP, 10, Payload::new().addr(address).build())
    }
}
