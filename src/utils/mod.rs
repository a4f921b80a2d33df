// file: src/utils/mod.rs
// version: 2.0.0
// guid: 18c3f7e2-94d0-4b5a-a6c1-5e20d8b93f47

//! Utility modules for system operations

pub mod system;

pub use system::SystemUtils;
