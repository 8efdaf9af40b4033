use anyhow::anyhow;
use nodeagent_core::{AgentConfig, LifecycleAction, Outcome};
use std::error::Error;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::backup::{
    create_backup, is_agent_installed, read_backup_version, remove_backup, restore_agent_config,
};
use crate::runner::{InstallRequest, NpmRunner, PackageRunner};
use crate::{AgentLayout, BackupSnapshot};

/// A lifecycle operation that stopped early.
///
/// `outcome` is the record to report; `error` is the underlying cause.
#[derive(Debug)]
pub struct LifecycleFailure {
    pub outcome: Outcome,
    pub error: anyhow::Error,
}

impl fmt::Display for LifecycleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.outcome.action.as_str())
    }
}

impl Error for LifecycleFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let source: &(dyn Error + 'static) = self.error.as_ref();
        Some(source)
    }
}

type LifecycleResult = Result<Outcome, LifecycleFailure>;

/// Converges one destination folder to the configured agent version.
pub struct LifecycleManager<R = NpmRunner> {
    config: AgentConfig,
    layout: AgentLayout,
    runner: R,
}

impl LifecycleManager<NpmRunner> {
    pub fn npm(config: AgentConfig) -> Self {
        Self::new(config, NpmRunner::default())
    }
}

impl<R: PackageRunner> LifecycleManager<R> {
    pub fn new(config: AgentConfig, runner: R) -> Self {
        let config = config.with_defaults();
        let layout = AgentLayout::from_config(&config);
        Self {
            config,
            layout,
            runner,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn layout(&self) -> &AgentLayout {
        &self.layout
    }

    pub fn run(&self, action: LifecycleAction) -> LifecycleResult {
        match action {
            LifecycleAction::Install => self.install(),
            LifecycleAction::Uninstall => self.uninstall(),
            LifecycleAction::Rollback => self.rollback(),
            LifecycleAction::Upgrade => self.upgrade(),
        }
    }

    /// Backs up, then installs unless the package is already listed in the
    /// manifest. The installed version is not compared to the requested one.
    pub fn install(&self) -> LifecycleResult {
        let action = LifecycleAction::Install;
        info!("starting Splunk Node.js agent installation");

        let snapshot = create_backup(&self.layout, &self.config.package_name)
            .map_err(|err| failure(action, "Backup failed", err))?;
        log_snapshot(&snapshot);
        self.layout
            .ensure_dest_dir()
            .map_err(|err| failure(action, "Directory creation failed", err))?;

        let installed = is_agent_installed(&self.layout, &self.config.package_name)
            .map_err(|err| failure(action, "Installation check failed", err))?;
        if installed {
            info!("agent already installed, skipping installation");
            return Ok(Outcome::success(
                &self.config,
                action,
                "Agent already installed",
            ));
        }

        self.install_package(&self.config)
            .map_err(|err| failure(action, "Package installation failed", err))?;

        info!("Splunk Node.js agent installation completed successfully");
        Ok(Outcome::success(
            &self.config,
            action,
            "Splunk Node.js agent install was successful",
        ))
    }

    pub fn uninstall(&self) -> LifecycleResult {
        let action = LifecycleAction::Uninstall;
        info!("starting Splunk Node.js agent uninstallation");

        self.runner
            .uninstall(&self.config.package_name, self.layout.dest_dir())
            .map_err(|err| failure(action, "Package uninstallation failed", err))?;

        if !self.config.keep_backup {
            if let Err(err) = remove_backup(&self.layout) {
                warn!(error = %format!("{err:#}"), "failed to remove backup folder");
            }
        }

        info!("Splunk Node.js agent uninstallation completed successfully");
        Ok(Outcome::success(
            &self.config,
            action,
            "Splunk Node.js agent was successfully removed",
        ))
    }

    /// Reinstalls the version recorded by the last backup. Does not take a new
    /// backup, so repeated rollbacks restore the same generation.
    pub fn rollback(&self) -> LifecycleResult {
        let action = LifecycleAction::Rollback;
        info!("starting Splunk Node.js agent rollback");

        let Some(backup_version) = read_backup_version(&self.layout)
            .map_err(|err| failure(action, "Failed to read backup version", err))?
        else {
            error!("no backup version found for rollback");
            return Err(LifecycleFailure {
                outcome: Outcome::failure(action, "No backup version found for rollback"),
                error: anyhow!("no backup version found"),
            });
        };

        if let Err(err) = restore_agent_config(&self.layout) {
            warn!(error = %format!("{err:#}"), "failed to restore agent config file");
        }

        let restored = self.config.with_agent_version(backup_version);
        self.install_package(&restored)
            .map_err(|err| failure(action, "Failed to install backup version", err))?;

        info!(
            version = %restored.agent_version,
            "Splunk Node.js agent rollback completed successfully"
        );
        Ok(Outcome::success(
            &restored,
            action,
            "Splunk Node.js agent was restored successfully",
        ))
    }

    /// Like install, minus the already-installed short-circuit.
    pub fn upgrade(&self) -> LifecycleResult {
        let action = LifecycleAction::Upgrade;
        info!("starting Splunk Node.js agent upgrade");

        let snapshot = create_backup(&self.layout, &self.config.package_name)
            .map_err(|err| failure(action, "Backup failed", err))?;
        log_snapshot(&snapshot);
        self.layout
            .ensure_dest_dir()
            .map_err(|err| failure(action, "Directory creation failed", err))?;

        self.install_package(&self.config)
            .map_err(|err| failure(action, "Package upgrade failed", err))?;

        info!("Splunk Node.js agent upgrade completed successfully");
        Ok(Outcome::success(
            &self.config,
            action,
            "Splunk Node.js agent upgrade was successful",
        ))
    }

    fn install_package(&self, config: &AgentConfig) -> anyhow::Result<String> {
        let version = install_version_token(&config.agent_version);
        info!(package = %config.package_name, version = %version, "installing package");
        self.runner.install(&InstallRequest {
            package: &config.package_name,
            version,
            registry: &config.npm_registry,
            working_dir: self.layout.dest_dir(),
        })
    }
}

/// Strips a leading `^` and then a leading `~`; the package manager gets an
/// exact version or a dist-tag, never a range.
pub fn install_version_token(version: &str) -> &str {
    let version = version.strip_prefix('^').unwrap_or(version);
    version.strip_prefix('~').unwrap_or(version)
}

fn log_snapshot(snapshot: &BackupSnapshot) {
    debug!(
        version = snapshot.version.as_deref().unwrap_or("none"),
        agent_config_saved = snapshot.agent_config_saved,
        "backup snapshot"
    );
}

fn failure(action: LifecycleAction, stage: &str, err: anyhow::Error) -> LifecycleFailure {
    error!(action = action.as_str(), error = %format!("{err:#}"), "{stage}");
    LifecycleFailure {
        outcome: Outcome::failure(action, format!("{stage}: {err:#}")),
        error: err,
    }
}
