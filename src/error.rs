// file: src/error.rs
// version: 3.1.0
// guid: 4c0e9d27-5b1a-4f63-9e2d-8a71c3b6f015

use std::fmt;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, SetupError>;

/// Operator guidance shown when the salt convergence pass fails
pub const CONFIGURATION_FAILED_MESSAGE: &str = "Qubes initial configuration failed. \
Login to the system and check /var/log/salt/minion for details. \
You can retry configuration by calling 'sudo qubesctl --all state.highstate' \
in dom0 (you will get detailed state there).";

/// Error types for the Qubes initial setup add-on
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Kickstart error: {0}")]
    KickstartError(String),

    #[error("{}", format_process_error(.command, .stdout, .stderr))]
    ProcessError {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("No version known for template: {0}")]
    MissingTemplateVersion(String),

    /// Operator guidance; the salt failure itself is kept as the source
    #[error("{}", CONFIGURATION_FAILED_MESSAGE)]
    ConfigurationFailed(#[source] Box<SetupError>),

    #[error("{}", format_stage_failures(.0))]
    StagesFailed(Vec<StageFailure>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("System error: {0}")]
    SystemError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A non-critical stage that failed and was deferred to the end of the run
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub error: Box<SetupError>,
}

impl StageFailure {
    pub fn new(stage: impl Into<String>, error: SetupError) -> Self {
        Self {
            stage: stage.into(),
            error: Box::new(error),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed:\n{}\n\n", self.stage, self.error)
    }
}

fn format_process_error(command: &str, stdout: &str, stderr: &str) -> String {
    format!(
        "{} failed:\nstdout: \"{}\"\nstderr: \"{}\"",
        command, stdout, stderr
    )
}

fn format_stage_failures(failures: &[StageFailure]) -> String {
    failures.iter().map(ToString::to_string).collect()
}

impl SetupError {
    /// Create a new kickstart parse error
    pub fn kickstart(msg: impl Into<String>) -> Self {
        Self::KickstartError(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::SystemError(msg.into())
    }

    /// Create a process error for a command that could not be spawned
    pub fn spawn_failed(argv: &[String], err: std::io::Error) -> Self {
        Self::ProcessError {
            command: argv.join(" "),
            exit_code: None,
            stdout: String::new(),
            stderr: format!("Failed to execute command: {}", err),
        }
    }
}
