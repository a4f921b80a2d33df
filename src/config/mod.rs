// file: src/config/mod.rs
// version: 2.0.0
// guid: 2b7c4e19-a8d3-4f50-9c61-d03e85f2a7b4

//! Configuration module for the Qubes initial setup add-on
//!
//! Handles loading and validation of host settings and kickstart files.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{SetupSettings, DEFAULT_ADDON_NAME};
