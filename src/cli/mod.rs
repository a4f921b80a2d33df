// file: src/cli/mod.rs
// version: 2.0.0
// guid: c4f09b27-6d3e-4a81-b5e2-90a7d16c4e58

//! Command line interface for the Qubes initial setup add-on

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
