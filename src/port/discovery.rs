//! Serial port enumeration for port selection.

use super::error::PortError;
use serde::Serialize;
use serialport::SerialPortType;

/// A serial port visible to the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        let mut out = PortInfo {
            port_name: info.port_name,
            port_type: String::new(),
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
        };
        match info.port_type {
            SerialPortType::UsbPort(usb) => {
                out.port_type = "usb".into();
                out.vid = Some(usb.vid);
                out.pid = Some(usb.pid);
                out.manufacturer = usb.manufacturer;
                out.product = usb.product;
            }
            SerialPortType::BluetoothPort => out.port_type = "bluetooth".into(),
            SerialPortType::PciPort => out.port_type = "pci".into(),
            SerialPortType::Unknown => out.port_type = "unknown".into(),
        }
        out
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.port_name, self.port_type)?;
        if let (Some(vid), Some(pid)) = (self.vid, self.pid) {
            write!(f, " {:04X}:{:04X}", vid, pid)?;
        }
        if let Some(ref product) = self.product {
            write!(f, " {}", product)?;
        }
        Ok(())
    }
}

/// List the serial ports currently present, sorted by name.
pub fn list_ports() -> Result<Vec<PortInfo>, PortError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.port_name.cmp(&b.port_name));
    Ok(ports)
}
