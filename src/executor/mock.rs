// file: src/executor/mock.rs
// version: 1.1.0
// guid: c9a5e217-48f0-4d3b-a1e6-7b02d94f58ce

//! Scripted runner for tests
//!
//! Records every argument vector and answers from rules matched on the
//! command's leading arguments. Clones share state, so a test keeps one
//! handle while the pipeline owns another.

use super::{process_error, CommandOutput, CommandRunner};
use crate::Result;
use std::sync::{Arc, Mutex};

struct Rule {
    prefix: Vec<String>,
    output: CommandOutput,
}

#[derive(Default)]
struct MockState {
    commands: Vec<Vec<String>>,
    rules: Vec<Rule>,
    reported_failures: Vec<String>,
}

/// A [`CommandRunner`] that never spawns processes
#[derive(Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with a successful `stdout`
    pub fn respond(&self, prefix: &[&str], stdout: &str) -> &Self {
        self.add_rule(prefix, CommandOutput::success(stdout))
    }

    /// Make commands starting with `prefix` exit with status 1
    pub fn fail(&self, prefix: &[&str], stderr: &str) -> &Self {
        self.add_rule(
            prefix,
            CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    /// Every command received so far
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state
            .lock()
            .map(|state| state.commands.clone())
            .unwrap_or_default()
    }

    /// Commands that failed through `execute`, which real runners log as errors
    pub fn reported_failures(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.reported_failures.clone())
            .unwrap_or_default()
    }

    /// Received commands joined with spaces, handy for assertions
    pub fn command_lines(&self) -> Vec<String> {
        self.commands().iter().map(|argv| argv.join(" ")).collect()
    }

    fn add_rule(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        if let Ok(mut state) = self.state.lock() {
            state.rules.push(Rule {
                prefix: prefix.iter().map(|arg| arg.to_string()).collect(),
                output,
            });
        }
        self
    }

    fn answer(&self, argv: &[&str]) -> CommandOutput {
        let Ok(mut state) = self.state.lock() else {
            return CommandOutput::success("");
        };
        state
            .commands
            .push(argv.iter().map(|arg| arg.to_string()).collect());

        state
            .rules
            .iter()
            .rev()
            .find(|rule| {
                rule.prefix.len() <= argv.len()
                    && rule.prefix.iter().zip(argv).all(|(want, got)| want.as_str() == *got)
            })
            .map(|rule| rule.output.clone())
            .unwrap_or_else(|| CommandOutput::success(""))
    }
}

#[async_trait::async_trait]
impl CommandRunner for MockRunner {
    async fn execute(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        let output = self.answer(argv);
        if output.is_success() {
            Ok(output)
        } else {
            if let Ok(mut state) = self.state.lock() {
                state.reported_failures.push(argv.join(" "));
            }
            Err(process_error(argv, output))
        }
    }

    async fn execute_ignoring_failure(&mut self, argv: &[&str]) -> Result<CommandOutput> {
        Ok(self.answer(argv))
    }

    async fn check_silent(&mut self, argv: &[&str]) -> Result<bool> {
        Ok(self.answer(argv).is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_match_on_prefix() {
        let runner = MockRunner::new();
        runner.respond(&["dmsetup"], "0 100 linear 253:1 0\n");
        runner.fail(&["qubesctl", "--all"], "state failed");

        let mut handle = runner.clone();
        let out = handle
            .execute(&["dmsetup", "-j", "253", "-m", "3", "table"])
            .await
            .unwrap();
        assert_eq!(out.stdout, "0 100 linear 253:1 0\n");

        assert!(handle
            .execute(&["qubesctl", "--all", "state.highstate"])
            .await
            .is_err());
        assert!(handle
            .execute(&["qubesctl", "saltutil.sync_all"])
            .await
            .is_ok());

        assert_eq!(runner.commands().len(), 3);
        assert_eq!(runner.command_lines()[2], "qubesctl saltutil.sync_all");
        assert_eq!(
            runner.reported_failures(),
            vec!["qubesctl --all state.highstate"]
        );
    }

    #[tokio::test]
    async fn test_quiet_failures_are_not_reported() {
        let runner = MockRunner::new();
        runner.fail(&["udevadm"], "no database");

        let mut handle = runner.clone();
        let output = handle
            .execute_ignoring_failure(&["udevadm", "info", "--export-db"])
            .await
            .unwrap();
        assert!(!output.is_success());
        assert!(!handle.check_silent(&["udevadm"]).await.unwrap());
        assert!(runner.reported_failures().is_empty());
    }

    #[tokio::test]
    async fn test_later_rules_win() {
        let runner = MockRunner::new();
        runner.fail(&["lvs"], "not found");
        runner.respond(&["lvs", "--noheadings", "vg/vm-pool"], "");

        let mut handle = runner.clone();
        assert!(handle
            .check_silent(&["lvs", "--noheadings", "vg/vm-pool"])
            .await
            .unwrap());
        assert!(!handle
            .check_silent(&["lvs", "--noheadings", "vg/other"])
            .await
            .unwrap());
    }
}
