// file: src/main.rs
// version: 2.0.0
// guid: e83b1f06-9c47-4d2a-b5e0-6f18a3c7d492

//! Qubes OS initial setup - Main entry point

use clap::Parser;
use qubes_initial_setup::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging::logger,
};
use tokio::signal;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_logger(cli.verbose, cli.quiet) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let shutdown_signal = async {
        if signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let Cli {
        command, settings, ..
    } = cli;
    let command_future = async move {
        match command {
            Commands::Probe { json } => probe_command(settings, json).await,
            Commands::Check { kickstart } => check_command(settings, &kickstart).await,
            Commands::Show { kickstart } => show_command(settings, &kickstart).await,
            Commands::Run {
                kickstart,
                dry_run,
                progress,
            } => run_command(settings, &kickstart, dry_run, progress).await,
            Commands::CheckPrereqs => check_prerequisites_command().await,
        }
    };

    tokio::select! {
        result = command_future => {
            if let Err(e) = result {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        _ = shutdown_signal => {
            warn!("Setup interrupted by user");
            std::process::exit(130);
        }
    }
}
