// file: src/setup/context.rs
// version: 2.0.0
// guid: 4f81d2b6-e093-4a5c-b7f2-6c1e08a9d3b5

//! Process identity the pipeline runs under

use crate::error::SetupError;
use crate::Result;
use std::ffi::{CStr, CString};
use std::io;
use tracing::{debug, info};

/// Upper bound for the `getgrnam_r` buffer when growing it on `ERANGE`
const MAX_GROUP_BUFFER: usize = 1 << 20;

/// Members of the group reserved for managed VMs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QubesGroup {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl QubesGroup {
    /// First member, who owns the default VMs
    pub fn first_member(&self) -> Option<&str> {
        self.members.first().map(String::as_str)
    }
}

/// Source of group entries
pub trait GroupDatabase: Send + Sync {
    fn lookup(&self, name: &str) -> Result<QubesGroup>;
}

/// Groups as the C library resolves them, following `nsswitch.conf`
pub struct SystemGroups;

impl GroupDatabase for SystemGroups {
    fn lookup(&self, name: &str) -> Result<QubesGroup> {
        let c_name = CString::new(name)
            .map_err(|_| SetupError::validation(format!("Invalid group name: {:?}", name)))?;

        // SAFETY: sysconf takes no pointers
        let mut size = match unsafe { libc::sysconf(libc::_SC_GETGR_R_SIZE_MAX) } {
            n if n > 0 => n as usize,
            _ => 1024,
        };

        loop {
            let mut buffer: Vec<libc::c_char> = vec![0; size];
            // SAFETY: `group` is plain data filled in by getgrnam_r
            let mut group: libc::group = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::group = std::ptr::null_mut();

            // SAFETY: every pointer refers to a live local of the stated size
            let rc = unsafe {
                libc::getgrnam_r(
                    c_name.as_ptr(),
                    &mut group,
                    buffer.as_mut_ptr(),
                    buffer.len(),
                    &mut result,
                )
            };

            if rc == libc::ERANGE && size < MAX_GROUP_BUFFER {
                debug!("Group entry for {} exceeds {} bytes, retrying", name, size);
                size *= 2;
                continue;
            }
            if rc != 0 {
                return Err(SetupError::system(format!(
                    "Failed to look up group {}: {}",
                    name,
                    io::Error::from_raw_os_error(rc)
                )));
            }
            if result.is_null() {
                return Err(SetupError::system(format!("Group not found: {}", name)));
            }

            // SAFETY: on success gr_mem points into `buffer`, which is still alive
            let members = unsafe { collect_members(group.gr_mem) };
            return Ok(QubesGroup {
                name: name.to_string(),
                gid: group.gr_gid,
                members,
            });
        }
    }
}

/// Copy a null-terminated `gr_mem` array
///
/// # Safety
///
/// `member` must be null or point to a null-terminated array of C strings.
unsafe fn collect_members(mut member: *mut *mut libc::c_char) -> Vec<String> {
    let mut members = Vec::new();
    if member.is_null() {
        return members;
    }
    while !(*member).is_null() {
        members.push(CStr::from_ptr(*member).to_string_lossy().into_owned());
        member = member.add(1);
    }
    members
}

/// Fixed group entries supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct StaticGroups {
    groups: Vec<QubesGroup>,
}

impl StaticGroups {
    pub fn new(groups: Vec<QubesGroup>) -> Self {
        Self { groups }
    }
}

impl GroupDatabase for StaticGroups {
    fn lookup(&self, name: &str) -> Result<QubesGroup> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .cloned()
            .ok_or_else(|| SetupError::system(format!("Group not found: {}", name)))
    }
}

/// Group id and file-creation mask the pipeline switches to before any step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub gid: u32,
    pub umask: u32,
}

/// Applies an [`ExecutionContext`] to the running process
pub trait PrivilegeDrop: Send + Sync {
    fn apply(&self, context: &ExecutionContext) -> Result<()>;
}

/// Switches the real process group and umask
pub struct ProcessPrivileges;

impl PrivilegeDrop for ProcessPrivileges {
    fn apply(&self, context: &ExecutionContext) -> Result<()> {
        info!(
            "Switching to gid {} with umask {:03o}",
            context.gid, context.umask
        );

        // SAFETY: plain syscalls without pointer arguments
        let rc = unsafe { libc::setgid(context.gid as libc::gid_t) };
        if rc != 0 {
            return Err(SetupError::system(format!(
                "setgid({}) failed: {}",
                context.gid,
                std::io::Error::last_os_error()
            )));
        }
        unsafe {
            libc::umask(context.umask as libc::mode_t);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_lookup_root() {
        let group = SystemGroups.lookup("root").unwrap();
        assert_eq!(group.name, "root");
        assert_eq!(group.gid, 0);
    }

    #[test]
    fn test_system_lookup_missing_group() {
        let err = SystemGroups
            .lookup("qubes-setup-no-such-group")
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Group not found: qubes-setup-no-such-group"));
    }

    #[test]
    fn test_system_lookup_rejects_nul() {
        assert!(matches!(
            SystemGroups.lookup("qu\0bes"),
            Err(SetupError::ValidationError(_))
        ));
    }

    #[test]
    fn test_static_lookup_members() {
        let groups = StaticGroups::new(vec![
            QubesGroup {
                name: "wheel".to_string(),
                gid: 10,
                members: vec!["alice".to_string()],
            },
            QubesGroup {
                name: "qubes".to_string(),
                gid: 1000,
                members: vec!["alice".to_string(), "bob".to_string()],
            },
        ]);
        let group = groups.lookup("qubes").unwrap();

        assert_eq!(group.gid, 1000);
        assert_eq!(group.first_member(), Some("alice"));
        assert!(groups.lookup("users").is_err());
    }

    #[test]
    fn test_group_without_members() {
        let group = QubesGroup {
            name: "qubes".to_string(),
            gid: 1000,
            members: Vec::new(),
        };
        assert_eq!(group.first_member(), None);
    }
}
