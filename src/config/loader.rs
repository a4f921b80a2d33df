// file: src/config/loader.rs
// version: 2.0.0
// guid: 6e1d8b42-93a5-4c0f-b7e8-15f2a94c3d70

//! Settings and kickstart file loading with environment variable substitution

use super::SetupSettings;
use crate::kickstart::{extract_addon_section, SetupData};
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load settings from a YAML file, falling back to defaults when no path is given
    pub fn load_settings<P: AsRef<Path>>(&self, path: Option<P>) -> Result<SetupSettings> {
        let settings = match path {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    crate::error::SetupError::ConfigError(format!(
                        "Failed to read settings file {}: {}",
                        path.as_ref().display(),
                        e
                    ))
                })?;

                let expanded = self.expand_env_vars(&content)?;
                if expanded.trim().is_empty() {
                    SetupSettings::default()
                } else {
                    serde_yaml::from_str(&expanded)?
                }
            }
            None => SetupSettings::default(),
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Read a kickstart file and apply every line of its add-on section to `data`
    ///
    /// Stops at the first line that fails to parse; earlier lines stay applied.
    pub fn apply_kickstart<P: AsRef<Path>>(
        &self,
        path: P,
        addon_name: &str,
        data: &mut SetupData,
    ) -> Result<usize> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::SetupError::ConfigError(format!(
                "Failed to read kickstart file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let lines = extract_addon_section(&content, addon_name)?;
        debug!(
            "Found {} add-on lines in {}",
            lines.len(),
            path.as_ref().display()
        );

        for line in &lines {
            data.parse_line(line)?;
        }

        Ok(lines.len())
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::SetupError::ConfigError(format!("Invalid regex pattern: {}", e))
        })?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(crate::error::SetupError::ConfigError(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
