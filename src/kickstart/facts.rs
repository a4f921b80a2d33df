// file: src/kickstart/facts.rs
// version: 1.0.0
// guid: d71a3c95-2e8f-4b06-a4c7-5f19e0b28d4a

//! Host facts probed once when the add-on data is created

use crate::error::SetupError;
use crate::probe::templates::TemplateInventory;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Facts about the host, computed once and never mutated afterwards
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbedFacts {
    pub fedora_available: bool,
    pub debian_available: bool,
    /// Both the gateway and workstation packages are present
    pub whonix_available: bool,
    /// Version per template family (`fedora`, `debian`, `whonix`)
    pub templates_versions: BTreeMap<String, String>,
    /// Display name per template family, e.g. `Fedora 33`
    pub templates_aliases: BTreeMap<String, String>,
    /// No USB keyboard is attached and the system did not boot from USB
    pub usbvm_available: bool,
    /// Volume group and thin pool guessed from the root filesystem
    pub default_pool: Option<(String, String)>,
}

impl ProbedFacts {
    /// Derive template availability, versions and aliases from the package inventory
    pub fn from_inventory(
        inventory: &TemplateInventory,
        usbvm_available: bool,
        default_pool: Option<(String, String)>,
    ) -> Self {
        let mut facts = Self {
            fedora_available: inventory.is_template_rpm_available("fedora"),
            debian_available: inventory.is_template_rpm_available("debian"),
            whonix_available: inventory.is_template_rpm_available("whonix-gw")
                && inventory.is_template_rpm_available("whonix-ws"),
            usbvm_available,
            default_pool,
            ..Self::default()
        };

        let families = [
            ("fedora", "fedora", "Fedora", facts.fedora_available),
            ("debian", "debian", "Debian", facts.debian_available),
            ("whonix", "whonix-ws", "Whonix", facts.whonix_available),
        ];
        for (family, package, label, available) in families {
            if !available {
                continue;
            }
            if let Some(version) = inventory.get_template_version(package) {
                facts
                    .templates_aliases
                    .insert(family.to_string(), format!("{} {}", label, version));
                facts.templates_versions.insert(family.to_string(), version);
            }
        }

        facts
    }

    /// Version of the family a template identifier belongs to
    ///
    /// Both Whonix templates share the `whonix` family version.
    pub fn template_version(&self, template: &str) -> Result<&str> {
        let family = if template.starts_with("whonix") {
            "whonix"
        } else {
            template
        };

        self.templates_versions
            .get(family)
            .map(String::as_str)
            .ok_or_else(|| SetupError::MissingTemplateVersion(template.to_string()))
    }
}
