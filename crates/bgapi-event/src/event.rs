use bytes::Bytes;
use serde::Serialize;

use crate::types::{
    serialize_hex, BondStatus, ConnectionStatus, IoPortStatus, ScanResponse, SystemInfo,
    VersionIndication,
};

/// A decoded device-initiated event.
///
/// One variant per (category, subtype) pair the decoder understands.
/// Byte sequences serialize as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SystemBoot(SystemInfo),
    SystemDebug {
        #[serde(serialize_with = "serialize_hex")]
        data: Bytes,
    },
    SystemEndpointWatermarkRx {
        endpoint: u8,
        data: u8,
    },
    SystemEndpointWatermarkTx {
        endpoint: u8,
        data: u8,
    },
    SystemScriptFailure {
        address: u16,
        reason: u16,
    },
    SystemNoLicenseKey,

    FlashPsKey {
        key: u16,
        #[serde(serialize_with = "serialize_hex")]
        value: Bytes,
    },

    AttributeValue {
        connection: u8,
        reason: u8,
        handle: u16,
        offset: u16,
        #[serde(serialize_with = "serialize_hex")]
        value: Bytes,
    },
    AttributeUserReadRequest {
        connection: u8,
        handle: u16,
        offset: u16,
        max_size: u8,
    },
    AttributeStatus {
        handle: u16,
        flags: u8,
    },

    ConnectionStatus(ConnectionStatus),
    ConnectionVersionIndication(VersionIndication),
    ConnectionFeatureIndication {
        connection: u8,
        #[serde(serialize_with = "serialize_hex")]
        features: Bytes,
    },
    ConnectionRawRx {
        connection: u8,
        #[serde(serialize_with = "serialize_hex")]
        data: Bytes,
    },
    ConnectionDisconnected {
        connection: u8,
        reason: u16,
    },

    AttclientIndicated {
        connection: u8,
        attr_handle: u16,
    },
    AttclientProcedureCompleted {
        connection: u8,
        result: u16,
        chr_handle: u16,
    },
    AttclientGroupFound {
        connection: u8,
        start: u16,
        end: u16,
        #[serde(serialize_with = "serialize_hex")]
        uuid: Bytes,
    },
    AttclientAttributeFound {
        connection: u8,
        chrdecl: u16,
        value: u16,
        properties: u8,
        #[serde(serialize_with = "serialize_hex")]
        uuid: Bytes,
    },
    AttclientFindInformationFound {
        connection: u8,
        chr_handle: u16,
        #[serde(serialize_with = "serialize_hex")]
        uuid: Bytes,
    },
    AttclientAttributeValue {
        connection: u8,
        att_handle: u16,
        value_type: u8,
        #[serde(serialize_with = "serialize_hex")]
        value: Bytes,
    },
    AttclientReadMultipleResponse {
        connection: u8,
        #[serde(serialize_with = "serialize_hex")]
        handles: Bytes,
    },

    SmSmpData {
        handle: u8,
        packet: u8,
        #[serde(serialize_with = "serialize_hex")]
        data: Bytes,
    },
    SmBondingFail {
        handle: u8,
        result: u16,
    },
    SmPasskeyDisplay {
        handle: u8,
        passkey: u32,
    },
    SmPasskeyRequest {
        handle: u8,
    },
    SmBondStatus(BondStatus),

    GapScanResponse(ScanResponse),
    GapModeChanged {
        discover: u8,
        connect: u8,
    },

    HardwareIoPortStatus(IoPortStatus),
    HardwareSoftTimer {
        handle: u8,
    },
    HardwareAdcResult {
        input: u8,
        value: i16,
    },
}

impl Event {
    /// Stable snake_case name, matching the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SystemBoot(_) => "system_boot",
            Event::SystemDebug { .. } => "system_debug",
            Event::SystemEndpointWatermarkRx { .. } => "system_endpoint_watermark_rx",
            Event::SystemEndpointWatermarkTx { .. } => "system_endpoint_watermark_tx",
            Event::SystemScriptFailure { .. } => "system_script_failure",
            Event::SystemNoLicenseKey => "system_no_license_key",
            Event::FlashPsKey { .. } => "flash_ps_key",
            Event::AttributeValue { .. } => "attribute_value",
            Event::AttributeUserReadRequest { .. } => "attribute_user_read_request",
            Event::AttributeStatus { .. } => "attribute_status",
            Event::ConnectionStatus(_) => "connection_status",
            Event::ConnectionVersionIndication(_) => "connection_version_indication",
            Event::ConnectionFeatureIndication { .. } => "connection_feature_indication",
            Event::ConnectionRawRx { .. } => "connection_raw_rx",
            Event::ConnectionDisconnected { .. } => "connection_disconnected",
            Event::AttclientIndicated { .. } => "attclient_indicated",
            Event::AttclientProcedureCompleted { .. } => "attclient_procedure_completed",
            Event::AttclientGroupFound { .. } => "attclient_group_found",
            Event::AttclientAttributeFound { .. } => "attclient_attribute_found",
            Event::AttclientFindInformationFound { .. } => "attclient_find_information_found",
            Event::AttclientAttributeValue { .. } => "attclient_attribute_value",
            Event::AttclientReadMultipleResponse { .. } => "attclient_read_multiple_response",
            Event::SmSmpData { .. } => "sm_smp_data",
            Event::SmBondingFail { .. } => "sm_bonding_fail",
            Event::SmPasskeyDisplay { .. } => "sm_passkey_display",
            Event::SmPasskeyRequest { .. } => "sm_passkey_request",
            Event::SmBondStatus(_) => "sm_bond_status",
            Event::GapScanResponse(_) => "gap_scan_response",
            Event::GapModeChanged { .. } => "gap_mode_changed",
            Event::HardwareIoPortStatus(_) => "hardware_io_port_status",
            Event::HardwareSoftTimer { .. } => "hardware_soft_timer",
            Event::HardwareAdcResult { .. } => "hardware_adc_result",
        }
    }

    /// The (category, subtype) pair this event arrives under.
    pub fn key(&self) -> (u8, u8) {
        match self {
            Event::SystemBoot(_) => (0, 0),
            Event::SystemDebug { .. } => (0, 1),
            Event::SystemEndpointWatermarkRx { .. } => (0, 2),
            Event::SystemEndpointWatermarkTx { .. } => (0, 3),
            Event::SystemScriptFailure { .. } => (0, 4),
            Event::SystemNoLicenseKey => (0, 5),
            Event::FlashPsKey { .. } => (1, 0),
            Event::AttributeValue { .. } => (2, 0),
            Event::AttributeUserReadRequest { .. } => (2, 1),
            Event::AttributeStatus { .. } => (2, 2),
            Event::ConnectionStatus(_) => (3, 0),
            Event::ConnectionVersionIndication(_) => (3, 1),
            Event::ConnectionFeatureIndication { .. } => (3, 2),
            Event::ConnectionRawRx { .. } => (3, 3),
            Event::ConnectionDisconnected { .. } => (3, 4),
            Event::AttclientIndicated { .. } => (4, 0),
            Event::AttclientProcedureCompleted { .. } => (4, 1),
            Event::AttclientGroupFound { .. } => (4, 2),
            Event::AttclientAttributeFound { .. } => (4, 3),
            Event::AttclientFindInformationFound { .. } => (4, 4),
            Event::AttclientAttributeValue { .. } => (4, 5),
            Event::AttclientReadMultipleResponse { .. } => (4, 6),
            Event::SmSmpData { .. } => (5, 0),
            Event::SmBondingFail { .. } => (5, 1),
            Event::SmPasskeyDisplay { .. } => (5, 2),
            Event::SmPasskeyRequest { .. } => (5, 3),
            Event::SmBondStatus(_) => (5, 4),
            Event::GapScanResponse(_) => (6, 0),
            Event::GapModeChanged { .. } => (6, 1),
            Event::HardwareIoPortStatus(_) => (7, 0),
            Event::HardwareSoftTimer { .. } => (7, 1),
            Event::HardwareAdcResult { .. } => (7, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_name() {
        let events = [
            Event::SystemNoLicenseKey,
            Event::SystemEndpointWatermarkRx {
                endpoint: 5,
                data: 127,
            },
            Event::SystemBoot(SystemInfo::default()),
            Event::HardwareAdcResult {
                input: 1,
                value: -2,
            },
        ];
        for event in &events {
            let json = serde_json::to_value(event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }

    #[test]
    fn byte_fields_render_as_hex() {
        let event = Event::ConnectionRawRx {
            connection: 0,
            data: Bytes::from_static(&[0xde, 0xad]),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"], "dead");
        assert_eq!(json["connection"], 0);
    }

    #[test]
    fn newtype_variants_flatten_fields() {
        let event = Event::GapModeChanged {
            discover: 2,
            connect: 2,
        };
        assert_eq!(event.key(), (6, 1));

        let json = serde_json::to_value(Event::SystemBoot(SystemInfo {
            major: 1,
            minor: 4,
            ..SystemInfo::default()
        }))
        .unwrap();
        assert_eq!(json["event"], "system_boot");
        assert_eq!(json["major"], 1);
        assert_eq!(json["minor"], 4);
    }
}
