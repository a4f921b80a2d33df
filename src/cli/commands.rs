// file: src/cli/commands.rs
// version: 2.0.0
// guid: 9e36a1f7-0b52-4d8c-a7f4-3c15e8d2b960

//! Command implementations for the CLI

use crate::{
    config::{ConfigLoader, SetupSettings},
    executor::{CommandRunner, DryRunRunner, LocalRunner},
    kickstart::{ProbedFacts, SetupData},
    probe::probe_host,
    setup::{strategy_for, SetupPipeline, SetupReport},
    utils::system::SystemUtils,
    Result,
};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

fn load_settings(settings_path: Option<&Path>) -> Result<SetupSettings> {
    ConfigLoader::new().load_settings(settings_path)
}

/// Probe the host and print the detected facts
pub async fn probe_command(settings_path: Option<PathBuf>, json_output: bool) -> Result<()> {
    let settings = load_settings(settings_path.as_deref())?;
    let facts = probe_host(&settings, &mut LocalRunner::new()).await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&facts)?);
    } else {
        print_facts(&facts);
    }

    Ok(())
}

fn availability(available: bool) -> ColoredString {
    if available {
        "available".green()
    } else {
        "not available".red()
    }
}

fn print_facts(facts: &ProbedFacts) {
    println!("{}", "Templates".bold());
    for (family, available) in [
        ("fedora", facts.fedora_available),
        ("debian", facts.debian_available),
        ("whonix", facts.whonix_available),
    ] {
        let label = facts
            .templates_aliases
            .get(family)
            .map(String::as_str)
            .unwrap_or(family);
        println!("  {:<16} {}", label, availability(available));
    }

    println!("{}", "Devices".bold());
    println!("  {:<16} {}", "USB qube", availability(facts.usbvm_available));

    println!("{}", "Storage".bold());
    match &facts.default_pool {
        Some((volume_group, thin_pool)) => {
            println!("  {:<16} {}/{}", "default pool", volume_group, thin_pool)
        }
        None => println!("  {:<16} {}", "default pool", "none".yellow()),
    }
}

/// Parse the add-on section of a kickstart file
pub async fn check_command(settings_path: Option<PathBuf>, kickstart: &Path) -> Result<()> {
    let settings = load_settings(settings_path.as_deref())?;
    let mut data = SetupData::new(ProbedFacts::default());

    let lines = ConfigLoader::new().apply_kickstart(kickstart, &settings.addon_name, &mut data)?;

    if data.seen {
        info!("✓ {} add-on lines parsed from {}", lines, kickstart.display());
    } else {
        info!(
            "⚠ No {} section in {}",
            settings.addon_name,
            kickstart.display()
        );
    }
    Ok(())
}

/// Print the add-on section as it would be written back
pub async fn show_command(settings_path: Option<PathBuf>, kickstart: &Path) -> Result<()> {
    let settings = load_settings(settings_path.as_deref())?;
    let facts = probe_host(&settings, &mut LocalRunner::new()).await;
    let mut data = SetupData::new(facts);

    ConfigLoader::new().apply_kickstart(kickstart, &settings.addon_name, &mut data)?;

    print!("{}", data.serialize(&settings.addon_name));
    Ok(())
}

/// Configure the system from a kickstart file
pub async fn run_command(
    settings_path: Option<PathBuf>,
    kickstart: &Path,
    dry_run: bool,
    progress: bool,
) -> Result<()> {
    let settings = load_settings(settings_path.as_deref())?;
    info!("Configuring Qubes OS from {}", kickstart.display());

    let facts = probe_host(&settings, &mut LocalRunner::new()).await;
    let mut data = SetupData::new(facts);
    ConfigLoader::new().apply_kickstart(kickstart, &settings.addon_name, &mut data)?;

    let runner: Box<dyn CommandRunner> = if dry_run {
        Box::new(DryRunRunner::new())
    } else if settings.is_chrooted() {
        Box::new(LocalRunner::with_system_root(settings.system_root.clone()))
    } else {
        Box::new(LocalRunner::new())
    };

    let pipeline = SetupPipeline::new(data, settings, runner).with_dry_run(dry_run);
    let report = strategy_for(progress).execute(pipeline).await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &SetupReport) {
    if report.skipped {
        info!(
            "Default VM configuration skipped for {} (session {})",
            report.qubes_user, report.session_id
        );
        return;
    }

    info!("✓ Qubes OS configured for {}", report.qubes_user);
    if let Some(kernel) = &report.default_kernel {
        info!("  default kernel: {}", kernel);
    }
    if let Some(template) = &report.default_template {
        info!("  default template: {}", template);
    }
    info!("  salt states: {}", report.states.join(", "));
}

/// Check system prerequisites
pub async fn check_prerequisites_command() -> Result<()> {
    info!("Checking system prerequisites for Qubes initial setup");

    let missing = SystemUtils::check_prerequisites();

    if missing.is_empty() {
        info!("✓ All required system commands are available");
    } else {
        error!("✗ Missing required commands: {}", missing.join(", "));
        for command in &missing {
            match command.as_str() {
                "qubes-prefs" | "qvm-pool" | "qvm-prefs" | "qvm-start" => {
                    info!("  {} ships with qubes-core-admin-client", command)
                }
                "qubesctl" => info!("  qubesctl ships with qubes-mgmt-salt"),
                "dmsetup" | "lvs" => info!("  {} ships with lvm2", command),
                _ => {}
            }
        }
    }

    if SystemUtils::is_root() {
        info!("✓ Running as root");
    } else {
        info!("⚠ Not running as root - the setup pipeline requires root");
    }

    Ok(())
}
