// file: src/config/settings.rs
// version: 1.1.0
// guid: 9a3f52c1-0d7e-4b8a-a6f4-2e5c71d09b38

//! Host paths and fixed names used by the probes and the setup pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kickstart add-on name used for the `%addon` header
pub const DEFAULT_ADDON_NAME: &str = "org_qubes_os_initial_setup";

/// Settings for the setup add-on
///
/// Every field has a default matching a stock Qubes OS installation, so an
/// empty YAML document is a valid settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupSettings {
    /// Name of the kickstart add-on section
    pub addon_name: String,
    /// Group whose first member owns the managed VMs, resolved through NSS
    pub qubes_group: String,
    /// Root of the installed system; commands are chrooted when not `/`
    pub system_root: PathBuf,
    /// Directory holding the template packages shipped on the install media
    pub template_packages_dir: PathBuf,
    /// Directory holding one entry per installed VM kernel
    pub vm_kernels_dir: PathBuf,
    /// Salt minion log archived before configuration starts
    pub salt_minion_log: PathBuf,
    /// Mount table read by the boot media probe
    pub proc_mounts: PathBuf,
    /// sysfs directory of block devices keyed by `major:minor`
    pub sysfs_dev_block: PathBuf,
    /// Device node directory
    pub dev_dir: PathBuf,
    /// Mount point whose backing device is inspected for the default pool
    pub root_mount: PathBuf,
    /// File-creation mask applied when the pipeline starts
    pub umask: u32,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            addon_name: DEFAULT_ADDON_NAME.to_string(),
            qubes_group: "qubes".to_string(),
            system_root: PathBuf::from("/"),
            template_packages_dir: PathBuf::from("/var/lib/qubes/template-packages"),
            vm_kernels_dir: PathBuf::from("/var/lib/qubes/vm-kernels"),
            salt_minion_log: PathBuf::from("/var/log/salt/minion"),
            proc_mounts: PathBuf::from("/proc/mounts"),
            sysfs_dev_block: PathBuf::from("/sys/dev/block"),
            dev_dir: PathBuf::from("/dev"),
            root_mount: PathBuf::from("/"),
            umask: 0o007,
        }
    }
}

impl SetupSettings {
    /// Validate the settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.addon_name.trim().is_empty() {
            return Err(crate::error::SetupError::ValidationError(
                "Add-on name cannot be empty".to_string(),
            ));
        }

        if self.qubes_group.trim().is_empty() {
            return Err(crate::error::SetupError::ValidationError(
                "Qubes group name cannot be empty".to_string(),
            ));
        }

        let paths: [(&str, &Path); 8] = [
            ("system_root", &self.system_root),
            ("template_packages_dir", &self.template_packages_dir),
            ("vm_kernels_dir", &self.vm_kernels_dir),
            ("salt_minion_log", &self.salt_minion_log),
            ("proc_mounts", &self.proc_mounts),
            ("sysfs_dev_block", &self.sysfs_dev_block),
            ("dev_dir", &self.dev_dir),
            ("root_mount", &self.root_mount),
        ];
        for (name, path) in paths {
            if !path.is_absolute() {
                return Err(crate::error::SetupError::ValidationError(format!(
                    "{} must be an absolute path: {}",
                    name,
                    path.display()
                )));
            }
        }

        if self.umask > 0o777 {
            return Err(crate::error::SetupError::ValidationError(format!(
                "Invalid umask: {:o}",
                self.umask
            )));
        }

        Ok(())
    }

    /// Whether commands run inside a chroot
    pub fn is_chrooted(&self) -> bool {
        self.system_root != Path::new("/")
    }
}
