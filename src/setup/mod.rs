// file: src/setup/mod.rs
// version: 1.0.0
// guid: 5b1e7d93-0c4a-4f86-a2d9-e86f31c57b02

//! Post-install configuration of dom0 and the default qubes

pub mod context;
pub mod kernel;
pub mod pipeline;
pub mod reporter;
pub mod salt;
pub mod strategy;

pub use context::{
    ExecutionContext, GroupDatabase, PrivilegeDrop, ProcessPrivileges, QubesGroup, StaticGroups,
    SystemGroups,
};
pub use pipeline::{SetupPipeline, SetupReport, DISABLED_SERVICES};
pub use reporter::{ChannelReporter, ConsoleReporter, StageReporter};
pub use strategy::{strategy_for, Background, ExecutionStrategy, Inline};
