// file: src/cli/args.rs
// version: 2.0.0
// guid: 2a7d0c95-b3e1-4f68-9c24-6e81f5a07d3b

//! Command line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qubes-initial-setup")]
#[command(about = "Configure a freshly installed Qubes OS system from its kickstart add-on section")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// YAML file overriding host paths and names
    #[arg(short, long, global = true, env = "QUBES_SETUP_SETTINGS")]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the host and print the detected facts
    Probe {
        #[arg(short, long)]
        json: bool,
    },

    /// Parse the add-on section of a kickstart file
    Check {
        kickstart: PathBuf,
    },

    /// Print the add-on section as it would be written back
    Show {
        kickstart: PathBuf,
    },

    /// Configure the system from a kickstart file
    Run {
        kickstart: PathBuf,

        #[arg(long, help = "Show what would be done without actually doing it")]
        dry_run: bool,

        #[arg(long, help = "Run in the background behind a progress spinner")]
        progress: bool,
    },

    /// Check system prerequisites
    CheckPrereqs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::try_parse_from([
            "qubes-initial-setup",
            "run",
            "/root/ks.cfg",
            "--dry-run",
            "-v",
            "--settings",
            "/etc/qubes-setup.yaml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("/etc/qubes-setup.yaml")));
        match cli.command {
            Commands::Run {
                kickstart,
                dry_run,
                progress,
            } => {
                assert_eq!(kickstart, PathBuf::from("/root/ks.cfg"));
                assert!(dry_run);
                assert!(!progress);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_check_requires_kickstart() {
        assert!(Cli::try_parse_from(["qubes-initial-setup", "check"]).is_err());
    }
}
