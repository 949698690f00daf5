use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::BgStream;

/// BLED112 modules talk 115200 baud over their USB CDC interface.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial link configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed in baud. Default: 115200.
    pub baud_rate: u32,
    /// Read timeout. The reader agent treats an expired read as "no data yet".
    pub read_timeout: Duration,
    /// Enable RTS/CTS hardware flow control.
    pub hardware_flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            hardware_flow_control: false,
        }
    }
}

/// Open a serial device (blocking).
pub fn open_serial(path: impl AsRef<Path>, config: &SerialConfig) -> Result<BgStream> {
    let path = path.as_ref();
    let name = path.to_str().ok_or(TransportError::Unsupported(
        "serial device path is not valid UTF-8",
    ))?;

    let flow_control = if config.hardware_flow_control {
        serialport::FlowControl::Hardware
    } else {
        serialport::FlowControl::None
    };

    let port = serialport::new(name, config.baud_rate)
        .timeout(config.read_timeout)
        .flow_control(flow_control)
        .open()
        .map_err(|err| TransportError::Open {
            path: path.to_path_buf(),
            source: err.into(),
        })?;

    info!(?path, baud = config.baud_rate, "opened serial port");
    Ok(BgStream::from_serial(port))
}

/// A serial device visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name (e.g. `/dev/ttyACM0`, `COM3`).
    pub name: String,
    /// Coarse port kind.
    pub kind: PortKind,
}

/// Enumerate serial ports present on the host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(std::io::Error::from)?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports
        .into_iter()
        .map(|port| PortInfo {
            name: port.port_name,
            kind: PortKind::from(&port.port_type),
        })
        .collect())
}

/// Coarse classification of a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Pci,
    Bluetooth,
    Unknown,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Usb => "usb",
            PortKind::Pci => "pci",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Unknown => "unknown",
        }
    }
}

impl From<&serialport::SerialPortType> for PortKind {
    fn from(value: &serialport::SerialPortType) -> Self {
        match value {
            serialport::SerialPortType::UsbPort(_) => PortKind::Usb,
            serialport::SerialPortType::PciPort => PortKind::Pci,
            serialport::SerialPortType::BluetoothPort => PortKind::Bluetooth,
            serialport::SerialPortType::Unknown => PortKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_bled112() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert!(!cfg.hardware_flow_control);
        assert_eq!(cfg.read_timeout, Duration::from_millis(100));
    }

    #[test]
    fn open_missing_device_reports_path() {
        let path = format!("/dev/bgapi-missing-{}", std::process::id());
        let err = open_serial(&path, &SerialConfig::default()).unwrap_err();
        match err {
            TransportError::Open { path: reported, .. } => {
                assert_eq!(reported, std::path::PathBuf::from(path));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn port_kind_names() {
        assert_eq!(PortKind::Usb.as_str(), "usb");
        assert_eq!(
            PortKind::from(&serialport::SerialPortType::PciPort),
            PortKind::Pci
        );
    }
}
