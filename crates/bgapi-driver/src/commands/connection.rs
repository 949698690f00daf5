use bgapi_frame::category::CONNECTION;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

/// Link-layer connection timing, in controller units (1.25 ms intervals,
/// 10 ms supervision timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub interval_min: u16,
    pub interval_max: u16,
    pub timeout: u16,
    pub latency: u16,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            interval_min: 60,
            interval_max: 76,
            timeout: 100,
            latency: 0,
        }
    }
}

impl ConnectionParameters {
    /// Layout used when opening a connection: min, max, timeout, latency.
    pub(crate) fn put_for_connect(&self, payload: Payload) -> Payload {
        payload
            .u16(self.interval_min)
            .u16(self.interval_max)
            .u16(self.timeout)
            .u16(self.latency)
    }

    /// Layout used by `connection_update`: min, max, latency, timeout.
    pub(crate) fn put_for_update(&self, payload: Payload) -> Payload {
        payload
            .u16(self.interval_min)
            .u16(self.interval_max)
            .u16(self.latency)
            .u16(self.timeout)
    }
}

impl Driver {
    pub fn connection_disconnect(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 0, Payload::new().u8(connection).build())
    }

    pub fn connection_get_rssi(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 1, Payload::new().u8(connection).build())
    }

    pub fn connection_update(&self, connection: u8, params: &ConnectionParameters) -> Result<Bytes> {
        let payload = params.put_for_update(Payload::new().u8(connection)).build();
        self.call(CONNECTION, 2, payload)
    }

    pub fn connection_version_update(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 3, Payload::new().u8(connection).build())
    }

    pub fn connection_channel_map_get(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 4, Payload::new().u8(connection).build())
    }

    pub fn connection_channel_map_set(&self, connection: u8, map: &[u8]) -> Result<Bytes> {
        let payload = Payload::new().u8(connection).prefixed("map", map)?.build();
        self.call(CONNECTION, 5, payload)
    }

    pub fn connection_features_get(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 6, Payload::new().u8(connection).build())
    }

    /// Ask for a fresh `connection_status` event.
    pub fn connection_get_status(&self, connection: u8) -> Result<Bytes> {
        self.call(CONNECTION, 7, Payload::new().u8(connection).build())
    }

    pub fn connection_raw_tx(&self, connection: u8, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new().u8(connection).prefixed("data", data)?.build();
        self.call(CONNECTION, 8, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_swaps_latency_and_timeout() {
        let params = ConnectionParameters {
            interval_min: 1,
            interval_max: 2,
            timeout: 3,
            latency: 4,
        };
        let connect = params.put_for_connect(Payload::new()).build();
        let update = params.put_for_update(Payload::new()).build();
        assert_eq!(connect.as_ref(), &[1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(update.as_ref(), &[1, 0, 2, 0, 4, 0, 3, 0]);
    }
}
