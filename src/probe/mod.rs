// file: src/probe/mod.rs
// version: 1.0.0
// guid: 92e4b7c0-5d18-4f3a-8a6e-c07f19d2b54e

//! Host probes run once when the add-on data is created
//!
//! Probes never fail: anything that goes wrong means the feature is treated
//! as unavailable.

pub mod devnum;
pub mod media;
pub mod storage;
pub mod templates;
pub mod udev;

pub use media::{started_from_usb, usb_keyboard_present};
pub use storage::get_default_tpool;
pub use templates::TemplateInventory;

use crate::config::SetupSettings;
use crate::executor::CommandRunner;
use crate::kickstart::ProbedFacts;
use tracing::info;

/// Run every probe and collect the results
pub async fn probe_host(settings: &SetupSettings, runner: &mut dyn CommandRunner) -> ProbedFacts {
    let inventory = TemplateInventory::new(&settings.template_packages_dir);

    let usbvm_available =
        !usb_keyboard_present(runner).await && !started_from_usb(settings, runner).await;
    let default_pool =
        get_default_tpool(&settings.root_mount, &settings.sysfs_dev_block, runner).await;

    let facts = ProbedFacts::from_inventory(&inventory, usbvm_available, default_pool);
    info!(
        "Probed host: templates {:?}, USB VM available: {}, default pool: {:?}",
        facts.templates_versions, facts.usbvm_available, facts.default_pool
    );
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_host_usb_keyboard_short_circuits() {
        let packages = TempDir::new().unwrap();
        fs::write(
            packages
                .path()
                .join("qubes-template-fedora-33-4.0.6-202103.noarch.rpm"),
            b"",
        )
        .unwrap();
        let settings = SetupSettings {
            template_packages_dir: packages.path().to_path_buf(),
            ..SetupSettings::default()
        };

        let runner = MockRunner::new();
        runner.respond(
            &["udevadm", "info", "--export-db"],
            "E: SUBSYSTEM=input\nE: ID_INPUT_KEYBOARD=1\nE: ID_USB_INTERFACES=:030101:\n",
        );
        runner.fail(&["dmsetup"], "not a dm device");

        let mut handle = runner.clone();
        let facts = probe_host(&settings, &mut handle).await;

        assert!(!facts.usbvm_available);
        assert!(facts.fedora_available);
        assert_eq!(facts.templates_aliases["fedora"], "Fedora 33");
        assert_eq!(facts.default_pool, None);
        assert!(runner
            .command_lines()
            .iter()
            .all(|c| !c.contains("--query=property")));
    }
}
