// file: src/logging/mod.rs
// version: 2.0.0
// guid: 7f2c9a04-e1b8-4d63-95a7-c4e08b16d3f9

//! Logging setup for the setup add-on

pub mod logger;

pub use logger::{init_logger, with_async_operation_span};
