// file: src/probe/templates.rs
// version: 1.1.0
// guid: 1d6f4b80-c3a2-4e95-8b17-e5a09c2d73f4

//! Template packages shipped on the install media

use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;

const PACKAGE_PREFIX: &str = "qubes-template-";
const PACKAGE_SUFFIX: &str = ".rpm";

/// Looks up `qubes-template-<name>-*.rpm` packages in one directory
#[derive(Debug, Clone)]
pub struct TemplateInventory {
    dir: PathBuf,
}

impl TemplateInventory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First package matching the template name, in file name order
    pub fn get_template_rpm(&self, template: &str) -> Option<PathBuf> {
        let pattern = format!(
            "{}/{}{}-*{}",
            Pattern::escape(&self.dir.to_string_lossy()),
            PACKAGE_PREFIX,
            Pattern::escape(template),
            PACKAGE_SUFFIX
        );

        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Invalid template package pattern {}: {}", pattern, e);
                return None;
            }
        };

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Skipping unreadable template package: {}", e);
                    None
                }
            })
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    pub fn is_template_rpm_available(&self, template: &str) -> bool {
        self.get_template_rpm(template).is_some()
    }

    /// Version token of the template package, e.g. `33` for
    /// `qubes-template-fedora-33-4.0.6-202103.noarch.rpm`
    pub fn get_template_version(&self, template: &str) -> Option<String> {
        let rpm = self.get_template_rpm(template)?;
        let file_name = rpm.file_name()?.to_string_lossy().into_owned();
        let prefix = format!("{}{}-", PACKAGE_PREFIX, template);

        file_name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.split('-').next())
            .map(str::to_string)
    }
}
