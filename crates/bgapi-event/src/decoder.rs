use bgapi_frame::category;
use bytes::Bytes;
use tracing::debug;

use crate::cursor::PayloadCursor;
use crate::event::Event;
use crate::observer::Observer;
use crate::types::{
    BondStatus, ConnectionStatus, IoPortStatus, QualifiedAddr, ScanResponse, SystemInfo,
    VersionIndication,
};

/// Decode one event frame payload.
///
/// Returns `None` for (category, subtype) pairs with no known layout.
/// Decoding never fails: missing fixed fields read as zero and
/// length-prefixed sequences are clamped to the bytes present.
pub fn decode_event(category: u8, subtype: u8, payload: Bytes) -> Option<Event> {
    let mut cur = PayloadCursor::new(payload);
    match category {
        category::SYSTEM => system(subtype, &mut cur),
        category::FLASH => flash(subtype, &mut cur),
        category::ATTRIBUTES => attributes(subtype, &mut cur),
        category::CONNECTION => connection(subtype, &mut cur),
        category::ATTCLIENT => attclient(subtype, &mut cur),
        category::SM => sm(subtype, &mut cur),
        category::GAP => gap(subtype, &mut cur),
        category::HARDWARE => hardware(subtype, &mut cur),
        _ => None,
    }
}

/// Decode an event frame and hand it to `observer`.
///
/// Returns `false` when the pair is unknown and the frame was dropped.
pub fn dispatch_event<O: Observer + ?Sized>(
    observer: &mut O,
    category: u8,
    subtype: u8,
    payload: Bytes,
) -> bool {
    match decode_event(category, subtype, payload) {
        Some(event) => {
            observer.on_event(&event);
            true
        }
        None => {
            debug!(category, subtype, "ignoring unknown event");
            false
        }
    }
}

fn system(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::SystemBoot(SystemInfo {
            major: cur.u16(),
            minor: cur.u16(),
            patch: cur.u16(),
            build: cur.u16(),
            ll_version: cur.u16(),
            protocol_version: cur.u8(),
            hw: cur.u8(),
        }),
        1 => Event::SystemDebug {
            data: cur.prefixed(),
        },
        2 => Event::SystemEndpointWatermarkRx {
            endpoint: cur.u8(),
            data: cur.u8(),
        },
        3 => Event::SystemEndpointWatermarkTx {
            endpoint: cur.u8(),
            data: cur.u8(),
        },
        4 => Event::SystemScriptFailure {
            address: cur.u16(),
            reason: cur.u16(),
        },
        5 => Event::SystemNoLicenseKey,
        _ => return None,
    };
    Some(event)
}

fn flash(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    match subtype {
        0 => Some(Event::FlashPsKey {
            key: cur.u16(),
            value: cur.prefixed(),
        }),
        _ => None,
    }
}

fn attributes(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::AttributeValue {
            connection: cur.u8(),
            reason: cur.u8(),
            handle: cur.u16(),
            offset: cur.u16(),
            value: cur.prefixed(),
        },
        1 => Event::AttributeUserReadRequest {
            connection: cur.u8(),
            handle: cur.u16(),
            offset: cur.u16(),
            max_size: cur.u8(),
        },
        2 => Event::AttributeStatus {
            handle: cur.u16(),
            flags: cur.u8(),
        },
        _ => return None,
    };
    Some(event)
}

fn connection(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::ConnectionStatus(ConnectionStatus {
            connection: cur.u8(),
            flags: cur.u8(),
            address: qualified_addr(cur),
            conn_interval: cur.u16(),
            timeout: cur.u16(),
            latency: cur.u16(),
            bonding: cur.u8(),
        }),
        1 => Event::ConnectionVersionIndication(VersionIndication {
            connection: cur.u8(),
            version: cur.u8(),
            comp_id: cur.u16(),
            sub_version: cur.u16(),
        }),
        2 => Event::ConnectionFeatureIndication {
            connection: cur.u8(),
            features: cur.prefixed(),
        },
        3 => Event::ConnectionRawRx {
            connection: cur.u8(),
            data: cur.prefixed(),
        },
        4 => Event::ConnectionDisconnected {
            connection: cur.u8(),
            reason: cur.u16(),
        },
        _ => return None,
    };
    Some(event)
}

fn attclient(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::AttclientIndicated {
            connection: cur.u8(),
            attr_handle: cur.u16(),
        },
        1 => Event::AttclientProcedureCompleted {
            connection: cur.u8(),
            result: cur.u16(),
            chr_handle: cur.u16(),
        },
        2 => Event::AttclientGroupFound {
            connection: cur.u8(),
            start: cur.u16(),
            end: cur.u16(),
            uuid: cur.prefixed(),
        },
        3 => Event::AttclientAttributeFound {
            connection: cur.u8(),
            chrdecl: cur.u16(),
            value: cur.u16(),
            properties: cur.u8(),
            uuid: cur.prefixed(),
        },
        4 => Event::AttclientFindInformationFound {
            connection: cur.u8(),
            chr_handle: cur.u16(),
            uuid: cur.prefixed(),
        },
        5 => Event::AttclientAttributeValue {
            connection: cur.u8(),
            att_handle: cur.u16(),
            value_type: cur.u8(),
            value: cur.prefixed(),
        },
        6 => Event::AttclientReadMultipleResponse {
            connection: cur.u8(),
            handles: cur.prefixed(),
        },
        _ => return None,
    };
    Some(event)
}

fn sm(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::SmSmpData {
            handle: cur.u8(),
            packet: cur.u8(),
            data: cur.prefixed(),
        },
        1 => Event::SmBondingFail {
            handle: cur.u8(),
            result: cur.u16(),
        },
        2 => Event::SmPasskeyDisplay {
            handle: cur.u8(),
            passkey: cur.u32(),
        },
        3 => Event::SmPasskeyRequest { handle: cur.u8() },
        // bond status carries no connection handle
        4 => Event::SmBondStatus(BondStatus {
            bond: cur.u8(),
            key_size: cur.u8(),
            mitm: cur.u8(),
            keys: cur.u8(),
        }),
        _ => return None,
    };
    Some(event)
}

fn gap(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::GapScanResponse(ScanResponse {
            rssi: cur.i8(),
            packet_type: cur.u8(),
            sender: qualified_addr(cur),
            bond: cur.u8(),
            data: cur.prefixed(),
        }),
        1 => Event::GapModeChanged {
            discover: cur.u8(),
            connect: cur.u8(),
        },
        _ => return None,
    };
    Some(event)
}

fn hardware(subtype: u8, cur: &mut PayloadCursor) -> Option<Event> {
    let event = match subtype {
        0 => Event::HardwareIoPortStatus(IoPortStatus {
            timestamp: cur.u32(),
            port: cur.u8(),
            irq: cur.u8(),
            state: cur.u8(),
        }),
        1 => Event::HardwareSoftTimer { handle: cur.u8() },
        2 => Event::HardwareAdcResult {
            input: cur.u8(),
            value: cur.i16(),
        },
        _ => return None,
    };
    Some(event)
}

fn qualified_addr(cur: &mut PayloadCursor) -> QualifiedAddr {
    QualifiedAddr {
        address: cur.addr(),
        address_type: cur.u8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BdAddr;

    fn decode(category: u8, subtype: u8, payload: &'static [u8]) -> Option<Event> {
        decode_event(category, subtype, Bytes::from_static(payload))
    }

    #[test]
    fn watermark_rx() {
        assert_eq!(
            decode(0, 2, &[5, 127]),
            Some(Event::SystemEndpointWatermarkRx {
                endpoint: 5,
                data: 127
            })
        );
    }

    #[test]
    fn boot_layout() {
        let event = decode(
            0,
            0,
            &[1, 0, 4, 0, 2, 0, 0x6f, 0x00, 3, 0, 1, 2],
        )
        .unwrap();
        assert_eq!(
            event,
            Event::SystemBoot(SystemInfo {
                major: 1,
                minor: 4,
                patch: 2,
                build: 111,
                ll_version: 3,
                protocol_version: 1,
                hw: 2,
            })
        );
    }

    #[test]
    fn short_boot_zero_fills() {
        let event = decode(0, 0, &[1, 0, 4]).unwrap();
        let Event::SystemBoot(info) = &event else {
            panic!("expected boot, got {event:?}");
        };
        assert_eq!(info.major, 1);
        assert_eq!(info.minor, 0);
        assert_eq!(info.hw, 0);
    }

    #[test]
    fn empty_payloads_still_decode() {
        assert_eq!(
            decode(5, 3, &[]),
            Some(Event::SmPasskeyRequest { handle: 0 })
        );
        assert_eq!(
            decode(3, 4, &[]),
            Some(Event::ConnectionDisconnected {
                connection: 0,
                reason: 0
            })
        );
        assert_eq!(decode(0, 5, &[1, 2, 3]), Some(Event::SystemNoLicenseKey));
    }

    #[test]
    fn connection_status_layout() {
        let event = decode(
            3,
            0,
            &[
                0, 0x05, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 1, 0x3c, 0, 0x64, 0, 0, 0, 0xff,
            ],
        )
        .unwrap();
        assert_eq!(
            event,
            Event::ConnectionStatus(ConnectionStatus {
                connection: 0,
                flags: 0x05,
                address: QualifiedAddr {
                    address: BdAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
                    address_type: 1,
                },
                conn_interval: 60,
                timeout: 100,
                latency: 0,
                bonding: 0xff,
            })
        );
    }

    #[test]
    fn disconnected_and_adc_decode_fields() {
        assert_eq!(
            decode(3, 4, &[2, 0x13, 0x02]),
            Some(Event::ConnectionDisconnected {
                connection: 2,
                reason: 0x0213
            })
        );
        assert_eq!(
            decode(7, 2, &[6, 0xfe, 0xff]),
            Some(Event::HardwareAdcResult {
                input: 6,
                value: -2
            })
        );
        assert_eq!(
            decode(2, 2, &[0x10, 0x00, 0x02]),
            Some(Event::AttributeStatus {
                handle: 0x10,
                flags: 2
            })
        );
    }

    #[test]
    fn scan_response_clamps_data() {
        let event = decode(
            6,
            0,
            &[0xc4, 0, 1, 2, 3, 4, 5, 6, 0, 0xff, 10, 0x02, 0x01, 0x06],
        )
        .unwrap();
        let Event::GapScanResponse(resp) = &event else {
            panic!("expected scan response, got {event:?}");
        };
        assert_eq!(resp.rssi, -60);
        assert_eq!(resp.sender.address, BdAddr([1, 2, 3, 4, 5, 6]));
        assert_eq!(resp.bond, 0xff);
        assert_eq!(resp.data.as_ref(), &[0x02, 0x01, 0x06]);
    }

    #[test]
    fn bytes_past_declared_length_are_dropped() {
        let event = decode(6, 0, &[0xd0, 0, 1, 2, 3, 4, 5, 6, 1, 0xff, 2, 0x0a, 0x0b, 0xee, 0xef])
            .unwrap();
        let Event::GapScanResponse(resp) = &event else {
            panic!("expected scan response, got {event:?}");
        };
        assert_eq!(resp.data.as_ref(), &[0x0a, 0x0b]);

        assert_eq!(
            decode(0, 1, &[1, b'x', b'y', b'z']),
            Some(Event::SystemDebug {
                data: Bytes::from_static(b"x"),
            })
        );
    }

    #[test]
    fn attclient_value_prefix_is_honoured() {
        let event = decode(4, 5, &[1, 0x2a, 0x00, 0, 2, 0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(
            event,
            Event::AttclientAttributeValue {
                connection: 1,
                att_handle: 0x2a,
                value_type: 0,
                value: Bytes::from_static(&[0xaa, 0xbb]),
            }
        );
    }

    #[test]
    fn unknown_pairs_are_ignored() {
        assert_eq!(decode(0, 6, &[]), None);
        assert_eq!(decode(4, 7, &[0]), None);
        assert_eq!(decode(8, 0, &[]), None);
        assert_eq!(decode(0xff, 0xff, &[]), None);
    }

    #[test]
    fn every_known_pair_round_trips_its_key() {
        for (category, max_subtype) in [(0u8, 5u8), (1, 0), (2, 2), (3, 4), (4, 6), (5, 4), (6, 1), (7, 2)] {
            for subtype in 0..=max_subtype {
                let event = decode_event(category, subtype, Bytes::new())
                    .unwrap_or_else(|| panic!("({category}, {subtype}) should decode"));
                assert_eq!(event.key(), (category, subtype));
            }
        }
    }

    #[test]
    fn dispatch_reports_ignored_frames() {
        #[derive(Default)]
        struct Recorder(Vec<Event>);

        impl Observer for Recorder {
            fn on_event(&mut self, event: &Event) {
                self.0.push(event.clone());
            }
        }

        let mut rec = Recorder::default();
        assert!(dispatch_event(&mut rec, 7, 1, Bytes::from_static(&[3])));
        assert!(!dispatch_event(&mut rec, 9, 9, Bytes::new()));
        assert_eq!(rec.0, vec![Event::HardwareSoftTimer { handle: 3 }]);
    }
}
