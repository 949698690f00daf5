use std::sync::mpsc::Sender;

use tracing::{debug, info};

use crate::event::Event;
use crate::types::{
    to_hex, BondStatus, ConnectionStatus, IoPortStatus, ScanResponse, SystemInfo,
    VersionIndication,
};

/// Receiver for decoded device events.
///
/// Every method has an empty default body, so implementations override only
/// what they care about. Methods run on the driver's reader thread, one
/// event at a time in stream order; a slow observer delays response
/// correlation.
///
/// [`Observer::on_event`] sees every event first and, unless overridden,
/// routes it to the matching per-event method.
#[allow(unused_variables)]
pub trait Observer: Send + 'static {
    fn on_event(&mut self, event: &Event) {
        route(self, event);
    }

    fn on_system_boot(&mut self, info: &SystemInfo) {}
    fn on_system_debug(&mut self, data: &[u8]) {}
    fn on_system_endpoint_watermark_rx(&mut self, endpoint: u8, data: u8) {}
    fn on_system_endpoint_watermark_tx(&mut self, endpoint: u8, data: u8) {}
    fn on_system_script_failure(&mut self, address: u16, reason: u16) {}
    fn on_system_no_license_key(&mut self) {}

    fn on_flash_ps_key(&mut self, key: u16, value: &[u8]) {}

    fn on_attribute_value(
        &mut self,
        connection: u8,
        reason: u8,
        handle: u16,
        offset: u16,
        value: &[u8],
    ) {
    }
    fn on_attribute_user_read_request(
        &mut self,
        connection: u8,
        handle: u16,
        offset: u16,
        max_size: u8,
    ) {
    }
    fn on_attribute_status(&mut self, handle: u16, flags: u8) {}

    fn on_connection_status(&mut self, status: &ConnectionStatus) {}
    fn on_connection_version_indication(&mut self, indication: &VersionIndication) {}
    fn on_connection_feature_indication(&mut self, connection: u8, features: &[u8]) {}
    fn on_connection_raw_rx(&mut self, connection: u8, data: &[u8]) {}
    fn on_connection_disconnected(&mut self, connection: u8, reason: u16) {}

    fn on_attclient_indicated(&mut self, connection: u8, attr_handle: u16) {}
    fn on_attclient_procedure_completed(&mut self, connection: u8, result: u16, chr_handle: u16) {}
    fn on_attclient_group_found(&mut self, connection: u8, start: u16, end: u16, uuid: &[u8]) {}
    fn on_attclient_attribute_found(
        &mut self,
        connection: u8,
        chrdecl: u16,
        value: u16,
        properties: u8,
        uuid: &[u8],
    ) {
    }
    fn on_attclient_find_information_found(&mut self, connection: u8, chr_handle: u16, uuid: &[u8]) {
    }
    fn on_attclient_attribute_value(
        &mut self,
        connection: u8,
        att_handle: u16,
        value_type: u8,
        value: &[u8],
    ) {
    }
    fn on_attclient_read_multiple_response(&mut self, connection: u8, handles: &[u8]) {}

    fn on_sm_smp_data(&mut self, handle: u8, packet: u8, data: &[u8]) {}
    fn on_sm_bonding_fail(&mut self, handle: u8, result: u16) {}
    fn on_sm_passkey_display(&mut self, handle: u8, passkey: u32) {}
    fn on_sm_passkey_request(&mut self, handle: u8) {}
    fn on_sm_bond_status(&mut self, status: &BondStatus) {}

    fn on_gap_scan_response(&mut self, response: &ScanResponse) {}
    fn on_gap_mode_changed(&mut self, discover: u8, connect: u8) {}

    fn on_hardware_io_port_status(&mut self, status: &IoPortStatus) {}
    fn on_hardware_soft_timer(&mut self, handle: u8) {}
    fn on_hardware_adc_result(&mut self, input: u8, value: i16) {}
}

macro_rules! forward {
    ($($name:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $name(&mut self, $($arg: $ty),*) {
                (**self).$name($($arg),*)
            }
        )*
    };
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    forward! {
        on_event(event: &Event);
        on_system_boot(info: &SystemInfo);
        on_system_debug(data: &[u8]);
        on_system_endpoint_watermark_rx(endpoint: u8, data: u8);
        on_system_endpoint_watermark_tx(endpoint: u8, data: u8);
        on_system_script_failure(address: u16, reason: u16);
        on_system_no_license_key();
        on_flash_ps_key(key: u16, value: &[u8]);
        on_attribute_value(connection: u8, reason: u8, handle: u16, offset: u16, value: &[u8]);
        on_attribute_user_read_request(connection: u8, handle: u16, offset: u16, max_size: u8);
        on_attribute_status(handle: u16, flags: u8);
        on_connection_status(status: &ConnectionStatus);
        on_connection_version_indication(indication: &VersionIndication);
        on_connection_feature_indication(connection: u8, features: &[u8]);
        on_connection_raw_rx(connection: u8, data: &[u8]);
        on_connection_disconnected(connection: u8, reason: u16);
        on_attclient_indicated(connection: u8, attr_handle: u16);
        on_attclient_procedure_completed(connection: u8, result: u16, chr_handle: u16);
        on_attclient_group_found(connection: u8, start: u16, end: u16, uuid: &[u8]);
        on_attclient_attribute_found(
            connection: u8,
            chrdecl: u16,
            value: u16,
            properties: u8,
            uuid: &[u8]
        );
        on_attclient_find_information_found(connection: u8, chr_handle: u16, uuid: &[u8]);
        on_attclient_attribute_value(connection: u8, att_handle: u16, value_type: u8, value: &[u8]);
        on_attclient_read_multiple_response(connection: u8, handles: &[u8]);
        on_sm_smp_data(handle: u8, packet: u8, data: &[u8]);
        on_sm_bonding_fail(handle: u8, result: u16);
        on_sm_passkey_display(handle: u8, passkey: u32);
        on_sm_passkey_request(handle: u8);
        on_sm_bond_status(status: &BondStatus);
        on_gap_scan_response(response: &ScanResponse);
        on_gap_mode_changed(discover: u8, connect: u8);
        on_hardware_io_port_status(status: &IoPortStatus);
        on_hardware_soft_timer(handle: u8);
        on_hardware_adc_result(input: u8, value: i16);
    }
}

/// Invoke the per-event method of `observer` that matches `event`.
pub fn route<O: Observer + ?Sized>(observer: &mut O, event: &Event) {
    match event {
        Event::SystemBoot(info) => observer.on_system_boot(info),
        Event::SystemDebug { data } => observer.on_system_debug(data),
        Event::SystemEndpointWatermarkRx { endpoint, data } => {
            observer.on_system_endpoint_watermark_rx(*endpoint, *data)
        }
        Event::SystemEndpointWatermarkTx { endpoint, data } => {
            observer.on_system_endpoint_watermark_tx(*endpoint, *data)
        }
        Event::SystemScriptFailure { address, reason } => {
            observer.on_system_script_failure(*address, *reason)
        }
        Event::SystemNoLicenseKey => observer.on_system_no_license_key(),
        Event::FlashPsKey { key, value } => observer.on_flash_ps_key(*key, value),
        Event::AttributeValue {
            connection,
            reason,
            handle,
            offset,
            value,
        } => observer.on_attribute_value(*connection, *reason, *handle, *offset, value),
        Event::AttributeUserReadRequest {
            connection,
            handle,
            offset,
            max_size,
        } => observer.on_attribute_user_read_request(*connection, *handle, *offset, *max_size),
        Event::AttributeStatus { handle, flags } => observer.on_attribute_status(*handle, *flags),
        Event::ConnectionStatus(status) => observer.on_connection_status(status),
        Event::ConnectionVersionIndication(ind) => observer.on_connection_version_indication(ind),
        Event::ConnectionFeatureIndication {
            connection,
            features,
        } => observer.on_connection_feature_indication(*connection, features),
        Event::ConnectionRawRx { connection, data } => {
            observer.on_connection_raw_rx(*connection, data)
        }
        Event::ConnectionDisconnected { connection, reason } => {
            observer.on_connection_disconnected(*connection, *reason)
        }
        Event::AttclientIndicated {
            connection,
            attr_handle,
        } => observer.on_attclient_indicated(*connection, *attr_handle),
        Event::AttclientProcedureCompleted {
            connection,
            result,
            chr_handle,
        } => observer.on_attclient_procedure_completed(*connection, *result, *chr_handle),
        Event::AttclientGroupFound {
            connection,
            start,
            end,
            uuid,
        } => observer.on_attclient_group_found(*connection, *start, *end, uuid),
        Event::AttclientAttributeFound {
            connection,
            chrdecl,
            value,
            properties,
            uuid,
        } => observer.on_attclient_attribute_found(*connection, *chrdecl, *value, *properties, uuid),
        Event::AttclientFindInformationFound {
            connection,
            chr_handle,
            uuid,
        } => observer.on_attclient_find_information_found(*connection, *chr_handle, uuid),
        Event::AttclientAttributeValue {
            connection,
            att_handle,
            value_type,
            value,
        } => observer.on_attclient_attribute_value(*connection, *att_handle, *value_type, value),
        Event::AttclientReadMultipleResponse {
            connection,
            handles,
        } => observer.on_attclient_read_multiple_response(*connection, handles),
        Event::SmSmpData {
            handle,
            packet,
            data,
        } => observer.on_sm_smp_data(*handle, *packet, data),
        Event::SmBondingFail { handle, result } => observer.on_sm_bonding_fail(*handle, *result),
        Event::SmPasskeyDisplay { handle, passkey } => {
            observer.on_sm_passkey_display(*handle, *passkey)
        }
        Event::SmPasskeyRequest { handle } => observer.on_sm_passkey_request(*handle),
        Event::SmBondStatus(status) => observer.on_sm_bond_status(status),
        Event::GapScanResponse(resp) => observer.on_gap_scan_response(resp),
        Event::GapModeChanged { discover, connect } => {
            observer.on_gap_mode_changed(*discover, *connect)
        }
        Event::HardwareIoPortStatus(status) => observer.on_hardware_io_port_status(status),
        Event::HardwareSoftTimer { handle } => observer.on_hardware_soft_timer(*handle),
        Event::HardwareAdcResult { input, value } => {
            observer.on_hardware_adc_result(*input, *value)
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Logs every event through `tracing`.
///
/// Scan responses and raw data are frequent, so they log at debug level;
/// everything else logs at info.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl Observer for LoggingObserver {
    fn on_event(&mut self, event: &Event) {
        let (category, subtype) = event.key();
        match event {
            Event::GapScanResponse(resp) => debug!(
                sender = %resp.sender.address,
                rssi = resp.rssi,
                data = %to_hex(&resp.data),
                "scan response"
            ),
            Event::ConnectionRawRx { connection, data } => debug!(
                connection,
                data = %to_hex(data),
                "raw rx"
            ),
            _ => info!(name = event.name(), category, subtype, ?event, "device event"),
        }
    }
}

/// Forwards every event into an mpsc channel.
///
/// Events are dropped silently once the receiving side hangs up.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<Event>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }
}

impl Observer for ChannelObserver {
    fn on_event(&mut self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }
}
