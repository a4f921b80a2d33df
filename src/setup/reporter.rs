// file: src/setup/reporter.rs
// version: 1.0.0
// guid: 6e2b8c47-d1f9-4a35-9c0e-52a7f3b1d8e4

//! Human-readable stage notifications

use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receives the title of each stage as the pipeline enters it
pub trait StageReporter: Send + Sync {
    fn set_stage(&self, stage: &str);
}

/// Logs stages and prints them to standard output
pub struct ConsoleReporter;

impl StageReporter for ConsoleReporter {
    fn set_stage(&self, stage: &str) {
        info!("Stage: {}", stage);
        println!("{}", stage);
    }
}

/// Forwards stages to another task
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl StageReporter for ChannelReporter {
    fn set_stage(&self, stage: &str) {
        if self.tx.send(stage.to_string()).is_err() {
            debug!("Stage receiver gone, dropping: {}", stage);
        }
    }
}
