// file: src/utils/system.rs
// version: 2.0.0
// guid: b6e18d4a-2f95-4c07-8a3e-d90c57f1b2a8

//! System utility functions

use tracing::debug;

/// External tools the probes and the setup pipeline invoke
pub const REQUIRED_COMMANDS: [&str; 10] = [
    "qubes-prefs",
    "qvm-pool",
    "qvm-prefs",
    "qvm-start",
    "qubesctl",
    "rpm",
    "systemctl",
    "dmsetup",
    "lvs",
    "udevadm",
];

/// System utility functions
pub struct SystemUtils;

impl SystemUtils {
    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        match which::which(command) {
            Ok(path) => {
                debug!("Found {} at {}", command, path.display());
                true
            }
            Err(_) => false,
        }
    }

    /// Check if running as root
    pub fn is_root() -> bool {
        // SAFETY: getuid has no preconditions
        unsafe { libc::getuid() == 0 }
    }

    /// Required commands missing from PATH
    pub fn check_prerequisites() -> Vec<String> {
        REQUIRED_COMMANDS
            .iter()
            .filter(|command| !Self::command_exists(command))
            .map(|command| command.to_string())
            .collect()
    }
}
