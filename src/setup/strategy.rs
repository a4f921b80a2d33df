// file: src/setup/strategy.rs
// version: 1.0.0
// guid: 3c9f0a58-b4e2-4716-8d3b-f5a16e27c90d

//! Where the pipeline runs relative to the caller

use super::pipeline::{SetupPipeline, SetupReport};
use super::reporter::{ChannelReporter, ConsoleReporter, StageReporter};
use crate::error::SetupError;
use crate::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Drives a [`SetupPipeline`] to completion
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn execute(&self, pipeline: SetupPipeline) -> Result<SetupReport>;
}

/// Await the pipeline on the calling task, printing stages to the console
pub struct Inline {
    reporter: Arc<dyn StageReporter>,
}

impl Inline {
    pub fn new() -> Self {
        Self {
            reporter: Arc::new(ConsoleReporter),
        }
    }

    pub fn with_reporter(reporter: Arc<dyn StageReporter>) -> Self {
        Self { reporter }
    }
}

impl Default for Inline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStrategy for Inline {
    async fn execute(&self, pipeline: SetupPipeline) -> Result<SetupReport> {
        pipeline.run(Arc::clone(&self.reporter)).await
    }
}

type StageCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Run the pipeline on its own task and feed stage titles to a callback
pub struct Background {
    on_stage: StageCallback,
    progress: Option<ProgressBar>,
}

impl Background {
    pub fn new(on_stage: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            on_stage: Box::new(on_stage),
            progress: None,
        }
    }

    /// Show the current stage next to a spinner
    pub fn with_spinner(title: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_prefix(title.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));

        let handle = spinner.clone();
        Self {
            on_stage: Box::new(move |stage: &str| handle.set_message(stage.to_string())),
            progress: Some(spinner),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for Background {
    async fn execute(&self, pipeline: SetupPipeline) -> Result<SetupReport> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter: Arc<dyn StageReporter> = Arc::new(ChannelReporter::new(tx));

        let task = tokio::spawn(pipeline.run(reporter));

        // Channel closes once the pipeline drops its reporter
        while let Some(stage) = rx.recv().await {
            debug!("Stage: {}", stage);
            (self.on_stage)(&stage);
        }

        let result = task
            .await
            .map_err(|e| SetupError::system(format!("Setup task failed: {}", e)))?;

        if let Some(progress) = &self.progress {
            match &result {
                Ok(_) => progress.finish_with_message("done"),
                Err(_) => progress.abandon_with_message("failed"),
            }
        }

        result
    }
}

/// Strategy for the requested presentation
pub fn strategy_for(progress: bool) -> Box<dyn ExecutionStrategy> {
    if progress {
        Box::new(Background::with_spinner("Qubes OS Setup"))
    } else {
        Box::new(Inline::new())
    }
}
