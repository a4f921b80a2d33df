// file: src/executor/local.rs
// version: 2.0.0
// guid: 71f3a9c8-0e5d-4b2a-96c4-d8e2b15f0a93

//! Local command execution, optionally inside the installed system's root

use super::{process_error, CommandOutput, CommandRunner};
use crate::error::SetupError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

/// Runs commands on this machine
pub struct LocalRunner {
    system_root: Option<PathBuf>,
}

impl LocalRunner {
    /// Create a runner for the live system
    pub fn new() -> Self {
        Self { system_root: None }
    }

    /// Create a runner that chroots into `root` unless it is `/`
    pub fn with_system_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let system_root = if root == Path::new("/") {
            None
        } else {
            Some(root)
        };
        Self { system_root }
    }

    /// Full argument vector, including the chroot prefix
    pub fn command_line(&self, argv: &[&str]) -> Vec<String> {
        let mut line = Vec::with_capacity(argv.len() + 2);
        if let Some(root) = &self.system_root {
            line.push("chroot".to_string());
            line.push(root.display().to_string());
        }
        line.extend(argv.iter().map(|arg| arg.to_string()));
        line
    }

    async fn spawn(&self, argv: &[&str]) -> Result<CommandOutput> {
        let line = self.command_line(argv);
        let (program, args) = line
            .split_first()
            .ok_or_else(|| SetupError::validation("No command provided"))?;

        debug!("Executing command: {}", line.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SetupError::spawn_failed(&line, e))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandRunner for LocalRunner {
    async fn execute(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        let output = self.spawn(argv).await?;

        if !output.is_success() {
            error!("Command failed with exit code {:?}", output.exit_code);
            if !output.stdout.trim().is_empty() {
                error!("STDOUT: {}", output.stdout);
            }
            if !output.stderr.trim().is_empty() {
                error!("STDERR: {}", output.stderr);
            }
            return Err(process_error(argv, output));
        }

        debug!("Command executed successfully");
        Ok(output)
    }

    async fn execute_ignoring_failure(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        let output = self.spawn(argv).await?;
        if !output.is_success() {
            debug!(
                "Ignoring exit code {:?} of {}",
                output.exit_code,
                argv.join(" ")
            );
        }
        Ok(output)
    }

    async fn check_silent(&mut self, argv: &[&str]) -> Result<bool> {
        Ok(self.spawn(argv).await?.is_success())
    }
}
