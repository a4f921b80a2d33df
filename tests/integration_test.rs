// file: tests/integration_test.rs
// version: 2.0.0
// guid: 61f8c2d7-4a9e-4b05-93d1-e7a20c5b8f46

//! Integration tests for the Qubes initial setup add-on

use assert_cmd::Command;
use predicates::prelude::*;
use qubes_initial_setup::{
    config::{ConfigLoader, SetupSettings},
    executor::MockRunner,
    kickstart::SetupData,
    probe::probe_host,
    setup::{
        ChannelReporter, ExecutionContext, PrivilegeDrop, QubesGroup, SetupPipeline, StaticGroups,
    },
    Result, SetupError,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

struct NoPrivileges;

impl PrivilegeDrop for NoPrivileges {
    fn apply(&self, _context: &ExecutionContext) -> Result<()> {
        Ok(())
    }
}

fn qubes_groups() -> Box<StaticGroups> {
    Box::new(StaticGroups::new(vec![
        QubesGroup {
            name: "wheel".to_string(),
            gid: 10,
            members: Vec::new(),
        },
        QubesGroup {
            name: "qubes".to_string(),
            gid: 1000,
            members: vec!["user".to_string()],
        },
    ]))
}

/// Lay out a fake installed system under a temporary directory
fn fake_host(root: &Path) -> SetupSettings {
    let packages = root.join("template-packages");
    fs::create_dir_all(&packages).unwrap();
    for rpm in [
        "qubes-template-fedora-33-4.0.6-202103.noarch.rpm",
        "qubes-template-debian-10-4.0.6-202103.noarch.rpm",
        "qubes-template-whonix-gw-15-4.0.6-202103.noarch.rpm",
        "qubes-template-whonix-ws-15-4.0.6-202103.noarch.rpm",
    ] {
        fs::write(packages.join(rpm), b"").unwrap();
    }

    for kernel in ["5.4.90-1", "5.10.8-1", "4.19.0-2"] {
        fs::create_dir_all(root.join("vm-kernels").join(kernel)).unwrap();
    }

    let sysfs = root.join("sys-dev-block");
    fs::create_dir_all(sysfs.join("253:2").join("dm")).unwrap();
    fs::write(
        sysfs.join("253:2").join("dm").join("name"),
        "qubes_dom0-vm--pool-tpool\n",
    )
    .unwrap();

    fs::write(root.join("mounts"), "").unwrap();
    fs::create_dir_all(root.join("salt")).unwrap();

    SetupSettings {
        template_packages_dir: packages,
        vm_kernels_dir: root.join("vm-kernels"),
        salt_minion_log: root.join("salt").join("minion"),
        proc_mounts: root.join("mounts"),
        sysfs_dev_block: sysfs,
        ..SetupSettings::default()
    }
}

fn write_kickstart(root: &Path, body: &str) -> PathBuf {
    let path = root.join("ks.cfg");
    fs::write(
        &path,
        format!(
            "# Generated by the installer\nlang en_US.UTF-8\n\n%addon org_qubes_os_initial_setup\n{}%end\n\n%packages\n@core\n%end\n",
            body
        ),
    )
    .unwrap();
    path
}

fn probing_runner() -> MockRunner {
    let runner = MockRunner::new();
    runner.respond(
        &["udevadm", "info", "--export-db"],
        "P: /devices/platform/i8042/serio0/input/input3\nE: SUBSYSTEM=input\nE: ID_INPUT_KEYBOARD=1\n\n",
    );
    runner.respond(&["dmsetup"], "0 41943040 thin 253:2 1\n");
    runner
}

#[tokio::test]
async fn test_probe_then_kickstart_then_pipeline() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let settings = fake_host(dir.path());

    let probe_runner = probing_runner();
    let facts = probe_host(&settings, &mut probe_runner.clone()).await;

    assert!(facts.fedora_available && facts.debian_available && facts.whonix_available);
    assert!(facts.usbvm_available);
    assert_eq!(
        facts.default_pool,
        Some(("qubes_dom0".to_string(), "vm-pool".to_string()))
    );
    assert_eq!(facts.templates_aliases["whonix"], "Whonix 15");

    let mut data = SetupData::new(facts);
    assert!(data.whonix_vms);
    assert!(data.usbvm);

    let kickstart = write_kickstart(
        dir.path(),
        "# choices\nsystem_vms True\ndisp_netvm true\nwhonix_default false\n\
         usbvm false\ntemplates_to_install fedora whonix-gw whonix-ws\n\
         default_template fedora\nlvm_pool qubes_dom0/vm-pool\n",
    );
    let applied =
        ConfigLoader::new().apply_kickstart(&kickstart, &settings.addon_name, &mut data)?;
    assert_eq!(applied, 7);
    assert!(data.seen);

    let runner = MockRunner::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let report = SetupPipeline::new(data, settings.clone(), Box::new(runner.clone()))
        .with_privileges(Box::new(NoPrivileges))
        .with_groups(qubes_groups())
        .run(Arc::new(ChannelReporter::new(tx)))
        .await?;

    assert_eq!(report.qubes_user, "user");
    assert_eq!(report.default_kernel.as_deref(), Some("5.10.8-1"));
    assert_eq!(report.default_template.as_deref(), Some("fedora-33"));
    assert!(report.states.contains(&"qvm.sys-whonix".to_string()));
    assert!(!report.states.contains(&"qvm.sys-usb".to_string()));

    let lines = runner.command_lines();
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("/usr/bin/rpm -i")).count(),
        3
    );
    assert!(lines.contains(&"/usr/bin/qubes-prefs default-pool vm-pool".to_string()));
    assert!(lines.contains(&"/usr/bin/qubes-prefs updatevm sys-firewall".to_string()));
    assert!(lines.contains(&"/usr/bin/qubes-prefs default-dispvm fedora-33-dvm".to_string()));
    assert!(!lines.iter().any(|l| l.contains("qubes-vm@sys-usb")));
    assert!(!settings.template_packages_dir.exists());

    let stages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(stages.contains(&"Installing TemplateVM whonix-gw-15".to_string()));
    assert!(stages.contains(&"Installing TemplateVM whonix-ws-15".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_serialized_section_round_trips_through_loader() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let settings = fake_host(dir.path());
    let facts = probe_host(&settings, &mut probing_runner()).await;

    let mut original = SetupData::new(facts.clone());
    original.disp_netvm = true;
    original.templates_to_install = vec!["debian".to_string()];
    original.default_template = Some("debian".to_string());

    let kickstart = dir.path().join("written.cfg");
    fs::write(&kickstart, original.serialize(&settings.addon_name)).unwrap();

    let mut parsed = SetupData::new(facts);
    ConfigLoader::new().apply_kickstart(&kickstart, &settings.addon_name, &mut parsed)?;

    assert!(parsed.disp_netvm);
    assert_eq!(parsed.templates_to_install, vec!["debian"]);
    assert_eq!(parsed.default_template.as_deref(), Some("debian"));
    assert_eq!(parsed.vg_tpool, original.vg_tpool);

    Ok(())
}

#[tokio::test]
async fn test_skip_leaves_system_untouched() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let settings = fake_host(dir.path());

    let mut data = SetupData::new(probe_host(&settings, &mut probing_runner()).await);
    let kickstart = write_kickstart(dir.path(), "skip true\n");
    ConfigLoader::new().apply_kickstart(&kickstart, &settings.addon_name, &mut data)?;

    let runner = MockRunner::new();
    let report = SetupPipeline::new(data, settings.clone(), Box::new(runner.clone()))
        .with_privileges(Box::new(NoPrivileges))
        .with_groups(qubes_groups())
        .run(Arc::new(ChannelReporter::new(mpsc::unbounded_channel().0)))
        .await?;

    assert!(report.skipped);
    assert!(runner.commands().is_empty());
    assert!(settings.template_packages_dir.exists());

    Ok(())
}

#[tokio::test]
async fn test_invalid_kickstart_line_is_rejected() {
    let dir = TempDir::new().unwrap();
    let settings = fake_host(dir.path());
    let kickstart = write_kickstart(dir.path(), "lvm_pool qubes_dom0\n");

    let mut data = SetupData::new(Default::default());
    let err = ConfigLoader::new()
        .apply_kickstart(&kickstart, &settings.addon_name, &mut data)
        .unwrap_err();

    assert!(matches!(err, SetupError::KickstartError(_)));
    assert!(err.to_string().contains("invalid value for lvm_pool"));
}

#[test]
fn test_cli_check_accepts_kickstart() {
    let dir = TempDir::new().unwrap();
    let kickstart = write_kickstart(dir.path(), "system_vms false\ndefault_template None\n");

    Command::cargo_bin("qubes-initial-setup")
        .unwrap()
        .env_remove("QUBES_SETUP_SETTINGS")
        .arg("check")
        .arg(&kickstart)
        .assert()
        .success();
}

#[test]
fn test_cli_check_rejects_bad_value() {
    let dir = TempDir::new().unwrap();
    let kickstart = write_kickstart(dir.path(), "usbvm sometimes\n");

    Command::cargo_bin("qubes-initial-setup")
        .unwrap()
        .env_remove("QUBES_SETUP_SETTINGS")
        .arg("check")
        .arg(&kickstart)
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid value for bool property"));
}

#[test]
fn test_cli_help_lists_commands() {
    Command::cargo_bin("qubes-initial-setup")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check-prereqs"))
        .stdout(predicate::str::contains("run"));
}
