use serialport::{available_ports, SerialPortInfo, SerialPortType};

/// A serial port as seen by discovery: its device path and the
/// human-readable description the OS reports for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub port_name: String,
    pub description: Option<String>,
}

impl PortCandidate {
    pub fn new(port_name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.map(str::to_string),
        }
    }

    fn matches(&self, path_token: &str, vendor_token: &str) -> bool {
        let path_token = path_token.to_lowercase();
        let vendor_token = vendor_token.to_lowercase();
        if self.port_name.to_lowercase().contains(&path_token) {
            return true;
        }
        match &self.description {
            Some(description) => description.to_lowercase().contains(&vendor_token),
            None => false,
        }
    }
}

impl From<SerialPortInfo> for PortCandidate {
    fn from(info: SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => usb.product.or(usb.manufacturer),
            _ => None,
        };
        Self {
            port_name: info.port_name,
            description,
        }
    }
}

/// Lists the ports the OS reports, in its own order. Enumeration failure
/// is logged and reads as "no ports".
pub fn available_candidates() -> Vec<PortCandidate> {
    match available_ports() {
        Ok(ports) => ports.into_iter().map(PortCandidate::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "serial port enumeration failed");
            vec![]
        }
    }
}

/// First candidate whose path contains `path_token` or whose description
/// contains `vendor_token`, both compared case-insensitively.
pub fn find_device_port<'a>(
    candidates: &'a [PortCandidate],
    path_token: &str,
    vendor_token: &str,
) -> Option<&'a PortCandidate> {
    candidates
        .iter()
        .find(|candidate| candidate.matches(path_token, vendor_token))
}
