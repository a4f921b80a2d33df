// file: src/kickstart/mod.rs
// version: 1.0.0
// guid: a4d09e63-f2b8-4c57-9e1a-38c6b0f7d245

//! Kickstart add-on data: the configuration record, its text format, and the
//! host facts probed when it is created

pub mod data;
pub mod facts;
pub mod options;
pub mod section;

pub use data::{SetupData, DEFAULT_TEMPLATES};
pub use facts::ProbedFacts;
pub use options::BoolOption;
pub use section::extract_addon_section;
