// file: src/probe/media.rs
// version: 1.1.0
// guid: 0c7d95e2-a64f-4b18-b3d9-5e28f1a06c73

//! USB keyboard and boot media detection
//!
//! A USB-handling VM takes the USB controllers away from dom0, which is not
//! an option when dom0 needs a USB keyboard or runs from USB storage.

use super::devnum;
use super::udev::{parse_export_db, parse_properties};
use crate::config::SetupSettings;
use crate::executor::CommandRunner;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Device-mapper stacks deeper than this are treated as cycles
const MAX_SLAVE_DEPTH: usize = 16;

/// Whether any keyboard attached to the system is a USB device
pub async fn usb_keyboard_present(runner: &mut dyn CommandRunner) -> bool {
    let output = match runner
        .execute_ignoring_failure(&["udevadm", "info", "--export-db"])
        .await
    {
        Ok(output) if output.is_success() => output.stdout,
        Ok(output) => {
            warn!(
                "Cannot query the udev database: {}",
                output.stderr.trim_end()
            );
            return false;
        }
        Err(e) => {
            warn!("Cannot query the udev database: {}", e);
            return false;
        }
    };

    let present = parse_export_db(&output)
        .iter()
        .any(|device| device.is_keyboard() && device.is_usb());
    if present {
        info!("USB keyboard detected");
    }
    present
}

/// Whether any mounted filesystem lives on a USB device
///
/// Device-mapper devices are followed down to the physical devices below them.
pub async fn started_from_usb(settings: &SetupSettings, runner: &mut dyn CommandRunner) -> bool {
    let mounts = match fs::read_to_string(&settings.proc_mounts) {
        Ok(mounts) => mounts,
        Err(e) => {
            warn!("Cannot read {}: {}", settings.proc_mounts.display(), e);
            return false;
        }
    };

    for line in mounts.lines() {
        let Some(source) = line.split(' ').next() else {
            continue;
        };
        let source = Path::new(source);
        if !source.is_absolute() || !source.exists() {
            continue;
        }

        let mut leaves = Vec::new();
        collect_used_devices(source, settings, 0, &mut leaves);

        for dev in leaves {
            let dev_name = format!("--name={}", dev.display());
            let output = match runner
                .execute_ignoring_failure(&["udevadm", "info", "--query=property", dev_name.as_str()])
                .await
            {
                Ok(output) if output.is_success() => output.stdout,
                Ok(output) => {
                    debug!(
                        "No udev data for {}: {}",
                        dev.display(),
                        output.stderr.trim_end()
                    );
                    continue;
                }
                Err(e) => {
                    debug!("No udev data for {}: {}", dev.display(), e);
                    continue;
                }
            };
            if parse_properties(&output).is_usb() {
                info!("Mounted filesystem on USB device {}", dev.display());
                return true;
            }
        }
    }

    false
}

/// Push the physical devices backing `dev` onto `leaves`
fn collect_used_devices(
    dev: &Path,
    settings: &SetupSettings,
    depth: usize,
    leaves: &mut Vec<PathBuf>,
) {
    if depth > MAX_SLAVE_DEPTH {
        warn!("Device stack too deep at {}", dev.display());
        return;
    }

    let rdev = match fs::metadata(dev) {
        Ok(metadata) => metadata.rdev(),
        Err(e) => {
            debug!("Cannot stat {}: {}", dev.display(), e);
            return;
        }
    };
    if rdev == 0 {
        return;
    }

    let slaves = settings
        .sysfs_dev_block
        .join(devnum::dev_id(rdev))
        .join("slaves");
    match fs::read_dir(&slaves) {
        Ok(entries) => {
            for entry in entries.filter_map(|entry| entry.ok()) {
                let slave = settings.dev_dir.join(entry.file_name());
                collect_used_devices(&slave, settings, depth + 1, leaves);
            }
        }
        Err(_) => leaves.push(dev.to_path_buf()),
    }
}
