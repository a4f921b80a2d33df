// file: src/setup/pipeline.rs
// version: 1.1.0
// guid: a7c4e9d2-3b60-4f18-9d5a-0e8b2f7c1a64

//! The ordered post-install configuration run

use super::context::{ExecutionContext, GroupDatabase, PrivilegeDrop, ProcessPrivileges, SystemGroups};
use super::kernel::default_kernel;
use super::reporter::StageReporter;
use super::salt::{configuration_states, enable_args, pillar_name};
use crate::config::SetupSettings;
use crate::error::{SetupError, StageFailure};
use crate::executor::CommandRunner;
use crate::kickstart::SetupData;
use crate::logging::with_async_operation_span;
use crate::probe::TemplateInventory;
use crate::Result;
use serde::Serialize;
use std::fs;
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

const QUBES_PREFS: &str = "/usr/bin/qubes-prefs";
const QVM_POOL: &str = "/usr/bin/qvm-pool";
const QVM_PREFS: &str = "/usr/bin/qvm-prefs";
const QVM_START: &str = "/usr/bin/qvm-start";
const RPM: &str = "/usr/bin/rpm";

const DEFAULT_NETVM: &str = "sys-firewall";

/// Services disabled and stopped in dom0
pub const DISABLED_SERVICES: [&str; 4] = ["rdisc", "kdump", "libvirt-guests", "salt-minion"];

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub session_id: Uuid,
    /// First member of the VM group
    pub qubes_user: String,
    /// Whether the run stopped early because `skip` was set
    pub skipped: bool,
    pub default_kernel: Option<String>,
    /// Full `<template>-<version>` name set as the default template
    pub default_template: Option<String>,
    /// Salt states enabled for the convergence pass
    pub states: Vec<String>,
}

/// Executes the configuration steps against the installed system
pub struct SetupPipeline {
    data: SetupData,
    settings: SetupSettings,
    runner: Box<dyn CommandRunner>,
    privileges: Box<dyn PrivilegeDrop>,
    groups: Box<dyn GroupDatabase>,
    dry_run: bool,
    session_id: Uuid,
}

impl SetupPipeline {
    /// Create a pipeline that switches the process group and umask for real
    pub fn new(data: SetupData, settings: SetupSettings, runner: Box<dyn CommandRunner>) -> Self {
        let session_id = Uuid::new_v4();
        info!("Creating new setup session: {}", session_id);

        Self {
            data,
            settings,
            runner,
            privileges: Box::new(ProcessPrivileges),
            groups: Box::new(SystemGroups),
            dry_run: false,
            session_id,
        }
    }

    pub fn with_privileges(mut self, privileges: Box<dyn PrivilegeDrop>) -> Self {
        self.privileges = privileges;
        self
    }

    pub fn with_groups(mut self, groups: Box<dyn GroupDatabase>) -> Self {
        self.groups = groups;
        self
    }

    /// Skip privilege changes and filesystem mutations; commands still go
    /// through the runner
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run every step in order
    ///
    /// Step failures abort the run, except for the service changes in dom0
    /// (ignored per service) and the default DisposableVM (collected and
    /// reported as [`SetupError::StagesFailed`] once everything else ran).
    pub async fn run(self, reporter: Arc<dyn StageReporter>) -> Result<SetupReport> {
        let span = tracing::info_span!("setup", session = %self.session_id);
        self.run_steps(reporter).instrument(span).await
    }

    async fn run_steps(mut self, reporter: Arc<dyn StageReporter>) -> Result<SetupReport> {
        let group = self.groups.lookup(&self.settings.qubes_group)?;
        let qubes_user = group
            .first_member()
            .ok_or_else(|| {
                SetupError::system("You must create a user account to create default VMs.")
            })?
            .to_string();

        let mut report = SetupReport {
            session_id: self.session_id,
            qubes_user,
            ..SetupReport::default()
        };

        if self.data.skip {
            info!("Default VM configuration skipped");
            report.skipped = true;
            return Ok(report);
        }

        let mut failures = Vec::new();

        self.enter_context(&ExecutionContext {
            gid: group.gid,
            umask: self.settings.umask,
        })?;

        reporter.set_stage("Setting up default kernel");
        let kernel =
            with_async_operation_span("default-kernel", || self.configure_default_kernel()).await?;
        report.default_kernel = Some(kernel);

        reporter.set_stage("Setting up default pool");
        with_async_operation_span("default-pool", || self.configure_default_pool()).await?;

        with_async_operation_span("templates", || self.install_templates(reporter.as_ref()))
            .await?;

        reporter.set_stage("Setting up administration VM (dom0)");
        with_async_operation_span("dom0", || self.configure_dom0()).await;

        reporter.set_stage("Setting default template");
        report.default_template =
            with_async_operation_span("default-template", || self.configure_default_template())
                .await?;

        reporter.set_stage("Executing qubes configuration");
        report.states =
            with_async_operation_span("qubes-configuration", || self.configure_qubes()).await?;

        if self.data.system_vms {
            reporter.set_stage("Setting up networking");
            with_async_operation_span("network", || self.configure_network()).await?;
        }

        if self.data.usbvm && !self.data.usbvm_with_netvm {
            // qvm.start from salt cannot bring up the USB qube
            self.runner
                .execute(&["systemctl", "start", "qubes-vm@sys-usb.service"])
                .await?;
        }

        reporter.set_stage("Creating default DisposableVM");
        let default_template = report.default_template.clone();
        if let Err(e) = with_async_operation_span("default-dvm", || {
            self.configure_default_dvm(default_template.as_deref())
        })
        .await
        {
            warn!("Default DisposableVM setup failed: {}", e);
            failures.push(StageFailure::new("Default DVM", e));
        }

        if !failures.is_empty() {
            return Err(SetupError::StagesFailed(failures));
        }

        info!("Qubes initial setup completed");
        Ok(report)
    }

    fn enter_context(&self, context: &ExecutionContext) -> Result<()> {
        if self.dry_run {
            info!(
                "DRY RUN: Would switch to gid {} with umask {:03o}",
                context.gid, context.umask
            );
            return Ok(());
        }
        self.privileges.apply(context)
    }

    async fn configure_default_kernel(&mut self) -> Result<String> {
        let kernel = default_kernel(&self.settings.vm_kernels_dir)?;
        info!("Default VM kernel: {}", kernel);

        self.runner
            .execute(&[QUBES_PREFS, "default-kernel", kernel.as_str()])
            .await?;
        Ok(kernel)
    }

    async fn configure_default_pool(&mut self) -> Result<()> {
        let Some((volume_group, thin_pool)) = self.data.vg_tpool.clone() else {
            debug!("No thin pool selected, keeping the default pool");
            return Ok(());
        };

        let options = format!(
            "volume_group={},thin_pool={},revisions_to_keep=2",
            volume_group, thin_pool
        );
        self.runner
            .execute(&[QVM_POOL, "--add", thin_pool.as_str(), "lvm_thin", "-o", options.as_str()])
            .await?;
        self.runner
            .execute(&[QUBES_PREFS, "default-pool", thin_pool.as_str()])
            .await?;
        Ok(())
    }

    async fn install_templates(&mut self, reporter: &dyn StageReporter) -> Result<()> {
        let inventory = TemplateInventory::new(&self.settings.template_packages_dir);

        for template in self.data.templates_to_install.clone() {
            let version = self.data.facts().template_version(&template)?.to_string();
            reporter.set_stage(&format!("Installing TemplateVM {}-{}", template, version));

            let rpm = inventory.get_template_rpm(&template).ok_or_else(|| {
                SetupError::system(format!(
                    "No package for template {} in {}",
                    template,
                    inventory.dir().display()
                ))
            })?;
            let rpm = rpm.to_string_lossy().into_owned();
            self.runner.execute(&[RPM, "-i", rpm.as_str()]).await?;
        }

        self.remove_template_packages()
    }

    fn remove_template_packages(&self) -> Result<()> {
        let dir = &self.settings.template_packages_dir;
        if self.dry_run {
            info!("DRY RUN: Would remove {}", dir.display());
            return Ok(());
        }

        match fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!("Removed template packages in {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Template package directory already gone: {}", dir.display());
                Ok(())
            }
            Err(e) => Err(SetupError::system(format!(
                "Failed to remove {}: {}",
                dir.display(),
                e
            ))),
        }
    }

    async fn configure_dom0(&mut self) {
        for service in DISABLED_SERVICES {
            let unit = format!("{}.service", service);
            for action in ["disable", "stop"] {
                if let Err(e) = self
                    .runner
                    .execute_ignoring_failure(&["systemctl", action, unit.as_str()])
                    .await
                {
                    warn!("Ignoring failure to {} {}: {}", action, unit, e);
                }
            }
        }
    }

    async fn configure_default_template(&mut self) -> Result<Option<String>> {
        let Some(template) = self.data.default_template.clone() else {
            debug!("No default template selected");
            return Ok(None);
        };

        let version = self.data.facts().template_version(&template)?;
        let name = format!("{}-{}", template, version);
        self.runner
            .execute(&[QUBES_PREFS, "default-template", name.as_str()])
            .await?;
        Ok(Some(name))
    }

    async fn configure_qubes(&mut self) -> Result<Vec<String>> {
        let states = configuration_states(&self.data);

        self.archive_salt_log();

        self.runner
            .execute(&["qubesctl", "saltutil.clear_cache"])
            .await?;
        self.runner.execute(&["qubesctl", "saltutil.sync_all"]).await?;

        for state in &states {
            info!("Setting up state: {}", state);
            self.runner.execute(&enable_args(state)).await?;
        }

        if let Err(e) = self.converge(&states).await {
            error!("Salt configuration failed: {}", e);
            return Err(SetupError::ConfigurationFailed(Box::new(e)));
        }

        Ok(states)
    }

    /// Apply the enabled states, then disable the top files again so they do
    /// not reapply over later manual changes
    async fn converge(&mut self, states: &[String]) -> Result<()> {
        self.runner
            .execute(&["qubesctl", "--all", "state.highstate"])
            .await?;

        for state in states.iter().filter(|state| pillar_name(state).is_none()) {
            self.runner
                .execute(&["qubesctl", "top.disable", state.as_str()])
                .await?;
        }
        Ok(())
    }

    /// Move install-time minion log entries out of the way
    fn archive_salt_log(&self) {
        let log = &self.settings.salt_minion_log;
        let archived = log.with_file_name(format!(
            "{}.install",
            log.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));

        if self.dry_run {
            info!(
                "DRY RUN: Would rename {} to {}",
                log.display(),
                archived.display()
            );
            return;
        }

        if let Err(e) = fs::rename(log, &archived) {
            debug!("Not archiving {}: {}", log.display(), e);
        }
    }

    async fn configure_network(&mut self) -> Result<()> {
        let updatevm = if self.data.whonix_default {
            "sys-whonix"
        } else {
            DEFAULT_NETVM
        };

        self.runner
            .execute(&[QVM_PREFS, DEFAULT_NETVM, "netvm", "sys-net"])
            .await?;
        self.runner
            .execute(&[QUBES_PREFS, "default-netvm", DEFAULT_NETVM])
            .await?;
        self.runner
            .execute(&[QUBES_PREFS, "updatevm", updatevm])
            .await?;
        self.runner
            .execute(&[QUBES_PREFS, "clockvm", "sys-net"])
            .await?;
        self.runner.execute(&[QVM_START, DEFAULT_NETVM]).await?;
        Ok(())
    }

    async fn configure_default_dvm(&mut self, default_template: Option<&str>) -> Result<()> {
        let template = default_template
            .ok_or_else(|| SetupError::validation("No default template selected"))?;

        let dispvm = format!("{}-dvm", template);
        self.runner
            .execute(&[QUBES_PREFS, "default-dispvm", dispvm.as_str()])
            .await?;
        Ok(())
    }
}
