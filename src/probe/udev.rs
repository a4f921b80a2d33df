// file: src/probe/udev.rs
// version: 1.0.0
// guid: f5c28a14-9b3e-4d70-8e62-a1d7b3c90f45

//! Parsing `udevadm info` output

use std::collections::HashMap;

/// Property carrying the USB interface list of a device
pub const ID_USB_INTERFACES: &str = "ID_USB_INTERFACES";

/// Properties of one device from the udev database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdevDevice {
    pub properties: HashMap<String, String>,
}

impl UdevDevice {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Whether the device sits on a USB bus
    pub fn is_usb(&self) -> bool {
        self.get(ID_USB_INTERFACES).map_or(false, |v| !v.is_empty())
    }

    /// An input device reporting keyboard capability
    pub fn is_keyboard(&self) -> bool {
        self.get("SUBSYSTEM") == Some("input") && self.get("ID_INPUT_KEYBOARD") == Some("1")
    }
}

/// Parse `udevadm info --query=property` output (`KEY=VALUE` per line)
pub fn parse_properties(output: &str) -> UdevDevice {
    let properties = output
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    UdevDevice { properties }
}

/// Parse `udevadm info --export-db` output into one entry per device
///
/// Records are separated by blank lines; only `E:` property lines are kept.
pub fn parse_export_db(output: &str) -> Vec<UdevDevice> {
    let mut devices = Vec::new();
    let mut current = UdevDevice::default();

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !current.properties.is_empty() {
                devices.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some((key, value)) = line.strip_prefix("E: ").and_then(|p| p.split_once('=')) {
            current
                .properties
                .insert(key.to_string(), value.to_string());
        }
    }
    if !current.properties.is_empty() {
        devices.push(current);
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT_DB: &str = "\
P: /devices/platform/i8042/serio0/input/input3
E: DEVPATH=/devices/platform/i8042/serio0/input/input3
E: SUBSYSTEM=input
E: ID_INPUT=1
E: ID_INPUT_KEYBOARD=1

P: /devices/pci0000:00/0000:00:14.0/usb1/1-2/1-2:1.0/input/input7
E: SUBSYSTEM=input
E: ID_INPUT_KEYBOARD=1
E: ID_USB_INTERFACES=:030101:030000:

P: /devices/virtual/block/dm-0
E: SUBSYSTEM=block
E: DM_NAME=qubes_dom0-root
";

    #[test]
    fn test_parse_export_db() {
        let devices = parse_export_db(EXPORT_DB);
        assert_eq!(devices.len(), 3);

        assert!(devices[0].is_keyboard());
        assert!(!devices[0].is_usb());
        assert!(devices[1].is_keyboard());
        assert!(devices[1].is_usb());
        assert!(!devices[2].is_keyboard());
        assert_eq!(devices[2].get("DM_NAME"), Some("qubes_dom0-root"));
    }

    #[test]
    fn test_parse_properties() {
        let device = parse_properties("DEVNAME=/dev/sdb\nID_BUS=usb\nID_USB_INTERFACES=:080650:\n");
        assert!(device.is_usb());
        assert_eq!(device.get("ID_BUS"), Some("usb"));

        let device = parse_properties("DEVNAME=/dev/nvme0n1\nID_USB_INTERFACES=\n");
        assert!(!device.is_usb());
    }
}
