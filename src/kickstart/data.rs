// file: src/kickstart/data.rs
// version: 1.3.0
// guid: 83c5f0a7-1b9e-4d2c-8f36-a4e7d15b9c02

//! The add-on's configuration record and its line-oriented text format

use super::facts::ProbedFacts;
use super::options::{format_bool, parse_bool, BoolOption};
use crate::error::SetupError;
use crate::Result;
use tracing::debug;

/// Templates installed when the kickstart does not name any
pub const DEFAULT_TEMPLATES: [&str; 4] = ["fedora", "debian", "whonix-gw", "whonix-ws"];

/// Token written for an unset default template
const NONE_TOKEN: &str = "None";

const TEMPLATES_KEY: &str = "templates_to_install";

/// User-facing options of the add-on plus the facts probed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct SetupData {
    pub system_vms: bool,
    pub disp_firewallvm_and_usbvm: bool,
    pub disp_netvm: bool,
    pub default_vms: bool,
    pub whonix_vms: bool,
    pub whonix_default: bool,
    pub usbvm: bool,
    pub usbvm_with_netvm: bool,
    pub skip: bool,

    /// Template family to mark as default, without version
    pub default_template: Option<String>,
    pub templates_to_install: Vec<String>,
    /// Volume group and thin pool for the default storage pool
    pub vg_tpool: Option<(String, String)>,

    /// Set once any line was parsed successfully
    pub seen: bool,

    facts: ProbedFacts,
}

impl SetupData {
    /// Create the record with defaults derived from the probed facts
    pub fn new(facts: ProbedFacts) -> Self {
        Self {
            system_vms: true,
            disp_firewallvm_and_usbvm: true,
            disp_netvm: false,
            default_vms: true,
            whonix_vms: facts.whonix_available,
            whonix_default: false,
            usbvm: facts.usbvm_available,
            usbvm_with_netvm: false,
            skip: false,
            default_template: None,
            templates_to_install: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            vg_tpool: facts.default_pool.clone(),
            seen: false,
            facts,
        }
    }

    /// Facts probed when the record was created
    pub fn facts(&self) -> &ProbedFacts {
        &self.facts
    }

    /// Current value of a boolean option
    pub fn flag(&self, option: BoolOption) -> bool {
        match option {
            BoolOption::SystemVms => self.system_vms,
            BoolOption::DispFirewallvmAndUsbvm => self.disp_firewallvm_and_usbvm,
            BoolOption::DispNetvm => self.disp_netvm,
            BoolOption::DefaultVms => self.default_vms,
            BoolOption::WhonixVms => self.whonix_vms,
            BoolOption::WhonixDefault => self.whonix_default,
            BoolOption::Usbvm => self.usbvm,
            BoolOption::UsbvmWithNetvm => self.usbvm_with_netvm,
            BoolOption::Skip => self.skip,
        }
    }

    /// Set a boolean option
    pub fn set_flag(&mut self, option: BoolOption, value: bool) {
        let field = match option {
            BoolOption::SystemVms => &mut self.system_vms,
            BoolOption::DispFirewallvmAndUsbvm => &mut self.disp_firewallvm_and_usbvm,
            BoolOption::DispNetvm => &mut self.disp_netvm,
            BoolOption::DefaultVms => &mut self.default_vms,
            BoolOption::WhonixVms => &mut self.whonix_vms,
            BoolOption::WhonixDefault => &mut self.whonix_default,
            BoolOption::Usbvm => &mut self.usbvm,
            BoolOption::UsbvmWithNetvm => &mut self.usbvm_with_netvm,
            BoolOption::Skip => &mut self.skip,
        };
        *field = value;
    }

    /// Apply one line of the add-on section
    ///
    /// A failing line leaves the record untouched.
    pub fn parse_line(&mut self, line: &str) -> Result<()> {
        let trimmed = line.trim();
        let (param, value) = match trimmed.split_once(char::is_whitespace) {
            Some((param, value)) => (param, value.trim_start()),
            None => (trimmed, ""),
        };
        // An empty template selection is the only option without a value
        if param.is_empty() || (value.is_empty() && param != TEMPLATES_KEY) {
            return Err(SetupError::kickstart(format!("invalid line: {}", line)));
        }

        if let Some(option) = BoolOption::from_key(param) {
            let flag = parse_bool(value).ok_or_else(|| {
                SetupError::kickstart(format!("invalid value for bool property: {}", line))
            })?;
            self.set_flag(option, flag);
        } else {
            match param {
                "default_template" => {
                    self.default_template = if value == NONE_TOKEN {
                        None
                    } else {
                        Some(value.to_string())
                    };
                }
                TEMPLATES_KEY => {
                    self.templates_to_install =
                        value.split_whitespace().map(str::to_string).collect();
                }
                "lvm_pool" => {
                    self.vg_tpool = Some(parse_lvm_pool(value).ok_or_else(|| {
                        SetupError::kickstart(format!("invalid value for lvm_pool: {}", line))
                    })?);
                }
                _ => {
                    return Err(SetupError::kickstart(format!(
                        "invalid parameter: {}",
                        param
                    )))
                }
            }
        }

        debug!("Applied add-on line: {}", trimmed);
        self.seen = true;
        Ok(())
    }

    /// Serialize the persisted options as an `%addon` block
    pub fn serialize(&self, addon_name: &str) -> String {
        let mut section = format!("%addon {}\n", addon_name);

        for option in BoolOption::ALL {
            section.push_str(&format!(
                "{} {}\n",
                option.key(),
                format_bool(self.flag(option))
            ));
        }

        section.push_str(&format!(
            "default_template {}\n",
            self.default_template.as_deref().unwrap_or(NONE_TOKEN)
        ));
        if self.templates_to_install.is_empty() {
            section.push_str(TEMPLATES_KEY);
            section.push('\n');
        } else {
            section.push_str(&format!(
                "{} {}\n",
                TEMPLATES_KEY,
                self.templates_to_install.join(" ")
            ));
        }

        if let Some((volume_group, thin_pool)) = &self.vg_tpool {
            section.push_str(&format!("lvm_pool {}/{}\n", volume_group, thin_pool));
        }

        section.push_str("%end\n");
        section
    }
}

fn parse_lvm_pool(value: &str) -> Option<(String, String)> {
    let mut parts = value.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(pool), None) if !group.is_empty() && !pool.is_empty() => {
            Some((group.to_string(), pool.to_string()))
        }
        _ => None,
    }
}
