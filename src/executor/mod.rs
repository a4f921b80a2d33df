// file: src/executor/mod.rs
// version: 2.0.0
// guid: e2b60d4f-7a19-4c83-b5d2-91f4a8c3e067

//! Command execution trait for the probes and the setup pipeline
//!
//! Every external tool is invoked with an explicit argument vector; nothing
//! goes through a shell.

use crate::Result;

pub mod dry_run;
pub mod local;
pub mod mock;

pub use dry_run::DryRunRunner;
pub use local::LocalRunner;
pub use mock::MockRunner;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with status 0
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for running external commands
#[async_trait::async_trait]
pub trait CommandRunner: Send {
    /// Run a command; a non-zero exit status is a `ProcessError`
    async fn execute(&mut self, argv: &[&str]) -> Result<CommandOutput>;

    /// Run a command and return its output whatever the exit status
    async fn execute_ignoring_failure(&mut self, argv: &[&str]) -> Result<CommandOutput>;

    /// Run a command as a boolean check, without emitting error logs
    async fn check_silent(&mut self, argv: &[&str]) -> Result<bool>;
}

/// Build the `ProcessError` for a command that exited unsuccessfully
pub(crate) fn process_error(argv: &[&str], output: CommandOutput) -> crate::error::SetupError {
    crate::error::SetupError::ProcessError {
        command: argv.join(" "),
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
