// file: src/kickstart/options.rs
// version: 1.0.0
// guid: 0f8e2a6d-47c3-4b19-8d5e-c92a1b7f4e63

//! Boolean add-on options and their kickstart keys

use std::fmt;

/// One of the boolean options of the add-on section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOption {
    /// Provision the default system VMs (sys-net, sys-firewall, default DVM)
    SystemVms,
    /// Make sys-firewall and sys-usb disposable
    DispFirewallvmAndUsbvm,
    /// Make sys-net disposable
    DispNetvm,
    /// Create the default personal VMs
    DefaultVms,
    /// Install the Whonix VMs
    WhonixVms,
    /// Route updates through Whonix
    WhonixDefault,
    /// Provision a USB-handling VM
    Usbvm,
    /// Let the network VM handle USB as well
    UsbvmWithNetvm,
    /// Skip the whole setup
    Skip,
}

impl BoolOption {
    /// Every option, in serialization order
    pub const ALL: [BoolOption; 9] = [
        BoolOption::SystemVms,
        BoolOption::DispFirewallvmAndUsbvm,
        BoolOption::DispNetvm,
        BoolOption::DefaultVms,
        BoolOption::WhonixVms,
        BoolOption::WhonixDefault,
        BoolOption::Usbvm,
        BoolOption::UsbvmWithNetvm,
        BoolOption::Skip,
    ];

    /// Kickstart key of the option
    pub fn key(&self) -> &'static str {
        match self {
            BoolOption::SystemVms => "system_vms",
            BoolOption::DispFirewallvmAndUsbvm => "disp_firewallvm_and_usbvm",
            BoolOption::DispNetvm => "disp_netvm",
            BoolOption::DefaultVms => "default_vms",
            BoolOption::WhonixVms => "whonix_vms",
            BoolOption::WhonixDefault => "whonix_default",
            BoolOption::Usbvm => "usbvm",
            BoolOption::UsbvmWithNetvm => "usbvm_with_netvm",
            BoolOption::Skip => "skip",
        }
    }

    /// Look an option up by its kickstart key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|option| option.key() == key)
    }
}

impl fmt::Display for BoolOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parse a kickstart boolean, accepting `true`/`false` in any case
pub fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Render a boolean the way the add-on section stores it
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_and_round_trip() {
        for option in BoolOption::ALL {
            assert_eq!(BoolOption::from_key(option.key()), Some(option));
        }

        let mut keys: Vec<&str> = BoolOption::ALL.iter().map(|o| o.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), BoolOption::ALL.len());
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(BoolOption::from_key("lvm_pool"), None);
        assert_eq!(BoolOption::from_key("SYSTEM_VMS"), None);
    }

    #[test]
    fn test_parse_bool_any_case() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("fAlSe"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("1"), None);
        assert_eq!(parse_bool(""), None);
    }
}
