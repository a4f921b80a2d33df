// file: src/executor/dry_run.rs
// version: 1.0.0
// guid: 38d7c1e4-b25a-4f90-8e6b-0a49f3d2c781

//! Runner that logs commands instead of executing them

use super::{CommandOutput, CommandRunner};
use crate::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Logs every command and reports success without running anything
#[derive(Clone, Default)]
pub struct DryRunRunner {
    executed: Arc<Mutex<Vec<Vec<String>>>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands that would have been executed, in order
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }

    fn record(&self, argv: &[&str]) {
        info!("DRY RUN: Would execute: {}", argv.join(" "));
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(argv.iter().map(|arg| arg.to_string()).collect());
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for DryRunRunner {
    async fn execute(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        self.record(argv);
        Ok(CommandOutput::success(""))
    }

    async fn execute_ignoring_failure(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        self.record(argv);
        Ok(CommandOutput::success(""))
    }

    async fn check_silent(&mut self, argv: &[&str]) -> Result<bool> {
        self.record(argv);
        Ok(true)
    }
}
