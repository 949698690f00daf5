use std::fmt;

use bytes::Bytes;
use serde::{Serialize, Serializer};

/// Bluetooth device address, stored in wire order (least significant byte
/// first) and displayed most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr(pub [u8; 6]);

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

impl Serialize for BdAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Address plus its BLE address type (0 public, 1 random).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct QualifiedAddr {
    pub address: BdAddr,
    pub address_type: u8,
}

/// Firmware and hardware identification reported at boot and by `info_get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SystemInfo {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
    pub ll_version: u16,
    pub protocol_version: u8,
    pub hw: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionStatus {
    pub connection: u8,
    pub flags: u8,
    pub address: QualifiedAddr,
    pub conn_interval: u16,
    pub timeout: u16,
    pub latency: u16,
    pub bonding: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VersionIndication {
    pub connection: u8,
    pub version: u8,
    pub comp_id: u16,
    pub sub_version: u16,
}

/// Security manager bonding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BondStatus {
    pub bond: u8,
    pub key_size: u8,
    pub mitm: u8,
    pub keys: u8,
}

/// One advertisement or scan response seen during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScanResponse {
    pub rssi: i8,
    pub packet_type: u8,
    pub sender: QualifiedAddr,
    pub bond: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IoPortStatus {
    pub timestamp: u32,
    pub port: u8,
    pub irq: u8,
    pub state: u8,
}

/// Render a byte sequence as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    use fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

pub(crate) fn serialize_hex<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(bytes))
}
