// file: src/probe/storage.rs
// version: 1.2.0
// guid: b83e16d9-7f20-4ac5-9d41-c6a0e2f57b18

//! Guessing the LVM thin pool to use as the default VM storage pool

use super::devnum;
use crate::executor::CommandRunner;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::{debug, info};

/// Pool name of the default partitioning layout that must not hold VMs
const ROOT_POOL: &str = "root-pool";
/// Conventional pool for VM volumes
const VM_POOL: &str = "vm-pool";
const TPOOL_SUFFIX: &str = "-tpool";
/// Stand-in for an escaped hyphen while splitting; never valid in LVM names
const ESCAPED_HYPHEN: &str = "=";

/// One device-mapper table line of the root device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmTarget {
    pub target_type: String,
    /// `major:minor` of the device the target maps onto
    pub lower_device: String,
}

/// Parse `<start> <sectors> <type> <args...>`
///
/// Only `thin` and `linear` targets are of interest; anything else yields `None`.
pub fn parse_dm_table(table: &str) -> Option<DmTarget> {
    let line = table.lines().next()?;
    let mut fields = line.split_whitespace();
    let _start = fields.next()?;
    let _sectors = fields.next()?;
    let target_type = fields.next()?;
    if target_type != "thin" && target_type != "linear" {
        return None;
    }
    let lower_device = fields.next()?;

    Some(DmTarget {
        target_type: target_type.to_string(),
        lower_device: lower_device.to_string(),
    })
}

/// Escape a volume group or volume name the way device-mapper names embed it
pub fn escape_dm_component(name: &str) -> String {
    name.replace('-', "--")
}

/// Undo [`escape_dm_component`] on one already-split component
fn unescape_dm_component(component: &str) -> String {
    component.replace(ESCAPED_HYPHEN, "-")
}

/// Split a device-mapper name into volume group and thin pool
///
/// `<vg>-<pool>-tpool` yields both; a plain `<vg>-<lv>` yields only the group.
pub fn split_dm_name(dm_name: &str) -> Option<(String, Option<String>)> {
    let masked = dm_name.replace("--", ESCAPED_HYPHEN);

    if dm_name.ends_with(TPOOL_SUFFIX) {
        let mut parts = masked.rsplitn(3, '-');
        let _tpool = parts.next()?;
        let thin_pool = parts.next()?;
        let volume_group = parts.next()?;
        Some((
            unescape_dm_component(volume_group),
            Some(unescape_dm_component(thin_pool)),
        ))
    } else {
        let (volume_group, _lv_name) = masked.rsplit_once('-')?;
        Some((unescape_dm_component(volume_group), None))
    }
}

/// Find the volume group and thin pool backing `root_mount`
///
/// Every failure along the way means "no default pool" rather than an error.
pub async fn get_default_tpool(
    root_mount: &Path,
    sysfs_dev_block: &Path,
    runner: &mut dyn CommandRunner,
) -> Option<(String, String)> {
    let dev = match fs::metadata(root_mount) {
        Ok(metadata) => metadata.dev(),
        Err(e) => {
            debug!("Cannot stat {}: {}", root_mount.display(), e);
            return None;
        }
    };
    let major = devnum::major(dev).to_string();
    let minor = devnum::minor(dev).to_string();

    let table = match runner
        .execute_ignoring_failure(&["dmsetup", "-j", major.as_str(), "-m", minor.as_str(), "table"])
        .await
    {
        Ok(output) if output.is_success() => output.stdout,
        Ok(output) => {
            debug!(
                "Root filesystem is not on device-mapper: {}",
                output.stderr.trim_end()
            );
            return None;
        }
        Err(e) => {
            debug!("Cannot run dmsetup: {}", e);
            return None;
        }
    };

    let target = parse_dm_table(&table)?;
    let name_path = sysfs_dev_block
        .join(&target.lower_device)
        .join("dm")
        .join("name");
    let lower_name = match fs::read_to_string(&name_path) {
        Ok(name) => name.trim_end_matches('\n').to_string(),
        Err(e) => {
            debug!("Cannot read {}: {}", name_path.display(), e);
            return None;
        }
    };

    let (volume_group, mut thin_pool) = split_dm_name(&lower_name)?;

    if thin_pool.as_deref().map_or(true, |pool| pool == ROOT_POOL) {
        let vm_pool = format!("{}/{}", volume_group, VM_POOL);
        let found = runner
            .check_silent(&["lvs", "--noheadings", vm_pool.as_str()])
            .await
            .unwrap_or(false);
        if !found {
            debug!("No {} in volume group {}", VM_POOL, volume_group);
            return None;
        }
        thin_pool = Some(VM_POOL.to_string());
    }

    match thin_pool {
        Some(pool) if !volume_group.is_empty() && !pool.is_empty() => {
            info!("Default storage pool: {}/{}", volume_group, pool);
            Some((volume_group, pool))
        }
        _ => None,
    }
}
