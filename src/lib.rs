// file: src/lib.rs
// version: 3.0.0
// guid: 5a92e0c7-3d1f-4b68-8e45-b71c06f9a2d3

//! # Qubes OS initial setup
//!
//! Post-install kickstart add-on that probes the host, carries the user's
//! choices in the `%addon org_qubes_os_initial_setup` section and brings a
//! fresh system into its configured state: default kernel, storage pool,
//! templates, dom0 services, salt-managed qubes and networking.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod kickstart;
pub mod logging;
pub mod probe;
pub mod setup;
pub mod utils;

pub use error::{Result, SetupError};

/// Version information for the add-on
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
