// file: src/setup/salt.rs
// version: 1.0.0
// guid: 1d6a9f3e-52c8-4b07-8e14-a7b3c0d95f26

//! Salt states selected from the setup flags

use crate::kickstart::SetupData;

/// States prefixed with this are pillar toggles rather than top files
pub const PILLAR_PREFIX: &str = "pillar.";

/// Ordered list of states to enable for the selected options
pub fn configuration_states(data: &SetupData) -> Vec<String> {
    let mut states: Vec<&str> = Vec::new();

    if data.system_vms {
        states.extend(["qvm.sys-net", "qvm.sys-firewall", "qvm.default-dispvm"]);
    }
    if data.disp_firewallvm_and_usbvm {
        states.extend([
            "pillar.qvm.disposable-sys-firewall",
            "pillar.qvm.disposable-sys-usb",
        ]);
    }
    if data.disp_netvm {
        states.push("pillar.qvm.disposable-sys-net");
    }
    if data.default_vms {
        states.extend(["qvm.personal", "qvm.work", "qvm.untrusted", "qvm.vault"]);
    }
    if data.facts().whonix_available && data.whonix_vms {
        states.extend(["qvm.sys-whonix", "qvm.anon-whonix"]);
    }
    if data.whonix_default {
        states.push("qvm.updates-via-whonix");
    }
    if data.usbvm {
        states.push("qvm.sys-usb");
    }
    if data.usbvm_with_netvm {
        states.push("pillar.qvm.sys-net-as-usbvm");
    }

    states.into_iter().map(str::to_string).collect()
}

/// Pillar name for a pillar state, `None` for a top file state
pub fn pillar_name(state: &str) -> Option<&str> {
    state.strip_prefix(PILLAR_PREFIX)
}

/// `qubesctl` arguments enabling `state`
pub fn enable_args(state: &str) -> Vec<&str> {
    match pillar_name(state) {
        Some(pillar) => vec!["qubesctl", "top.enable", pillar, "pillar=True"],
        None => vec!["qubesctl", "top.enable", state],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kickstart::ProbedFacts;

    fn data(whonix_available: bool) -> SetupData {
        SetupData::new(ProbedFacts {
            whonix_available,
            ..ProbedFacts::default()
        })
    }

    #[test]
    fn test_all_enabled_ordering() {
        let mut data = data(true);
        data.system_vms = true;
        data.disp_firewallvm_and_usbvm = true;
        data.disp_netvm = true;
        data.default_vms = true;
        data.whonix_vms = true;
        data.whonix_default = true;
        data.usbvm = true;
        data.usbvm_with_netvm = true;

        assert_eq!(
            configuration_states(&data),
            vec![
                "qvm.sys-net",
                "qvm.sys-firewall",
                "qvm.default-dispvm",
                "pillar.qvm.disposable-sys-firewall",
                "pillar.qvm.disposable-sys-usb",
                "pillar.qvm.disposable-sys-net",
                "qvm.personal",
                "qvm.work",
                "qvm.untrusted",
                "qvm.vault",
                "qvm.sys-whonix",
                "qvm.anon-whonix",
                "qvm.updates-via-whonix",
                "qvm.sys-usb",
                "pillar.qvm.sys-net-as-usbvm",
            ]
        );
    }

    #[test]
    fn test_whonix_vms_need_whonix_template() {
        let mut data = data(false);
        data.whonix_vms = true;
        data.whonix_default = true;

        assert_eq!(configuration_states(&data), vec!["qvm.updates-via-whonix"]);
    }

    #[test]
    fn test_enable_args() {
        assert_eq!(
            enable_args("pillar.qvm.disposable-sys-net"),
            vec!["qubesctl", "top.enable", "qvm.disposable-sys-net", "pillar=True"]
        );
        assert_eq!(
            enable_args("qvm.vault"),
            vec!["qubesctl", "top.enable", "qvm.vault"]
        );
        assert_eq!(pillar_name("qvm.vault"), None);
    }
}
