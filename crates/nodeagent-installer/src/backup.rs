use anyhow::{Context, Result};
use nodeagent_core::PackageJson;
use std::fs;
use std::io;
use tracing::{debug, info, warn};

use crate::fs_utils::{copy_file, remove_dir_all_if_exists};
use crate::AgentLayout;

/// What [`create_backup`] captured. Both fields stay empty on a first-time
/// install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub version: Option<String>,
    pub agent_config_saved: bool,
}

pub fn is_agent_installed(layout: &AgentLayout, package_name: &str) -> Result<bool> {
    Ok(read_manifest(layout)?
        .map(|manifest| manifest.has_dependency(package_name))
        .unwrap_or(false))
}

/// Snapshots the installed version and agent config into the backup folder.
///
/// The live installation is never modified. A missing manifest means there is
/// nothing to back up. Losing the config copy is logged, not fatal.
pub fn create_backup(layout: &AgentLayout, package_name: &str) -> Result<BackupSnapshot> {
    layout.ensure_backup_dir()?;

    let Some(manifest) = read_manifest(layout)? else {
        info!(
            dest = %layout.dest_dir().display(),
            "no existing installation found, skipping backup"
        );
        return Ok(BackupSnapshot::default());
    };

    let mut snapshot = BackupSnapshot::default();
    if let Some(version) = manifest.dependency_version(package_name) {
        let path = layout.backup_version_path();
        fs::write(&path, version.as_bytes())
            .with_context(|| format!("failed to write backup version: {}", path.display()))?;
        info!(version = %version, "backed up version");
        snapshot.version = Some(version);
    }

    let agent_config = layout.agent_config_path();
    if agent_config.is_file() {
        match copy_file(&agent_config, &layout.backup_agent_config_path()) {
            Ok(()) => snapshot.agent_config_saved = true,
            Err(err) => warn!(error = %format!("{err:#}"), "failed to back up agent config file"),
        }
    }

    Ok(snapshot)
}

/// Trimmed version recorded by the last backup, `None` if no backup exists.
pub fn read_backup_version(layout: &AgentLayout) -> Result<Option<String>> {
    let path = layout.backup_version_path();
    match fs::read_to_string(&path) {
        Ok(raw) => Ok(Some(raw.trim().to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err)
            .with_context(|| format!("failed to read backup version: {}", path.display())),
    }
}

/// Copies the backed-up agent config over the live one. Returns whether a
/// backup copy existed.
pub fn restore_agent_config(layout: &AgentLayout) -> Result<bool> {
    let backup = layout.backup_agent_config_path();
    if !backup.is_file() {
        debug!(path = %backup.display(), "no backed up agent config to restore");
        return Ok(false);
    }
    copy_file(&backup, &layout.agent_config_path())?;
    Ok(true)
}

pub fn remove_backup(layout: &AgentLayout) -> Result<()> {
    remove_dir_all_if_exists(layout.backup_dir()).with_context(|| {
        format!(
            "failed to remove backup folder: {}",
            layout.backup_dir().display()
        )
    })
}

fn read_manifest(layout: &AgentLayout) -> Result<Option<PackageJson>> {
    let path = layout.manifest_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read manifest: {}", path.display()));
        }
    };

    let manifest = PackageJson::from_json_str(&raw)
        .with_context(|| format!("failed parsing manifest: {}", path.display()))?;
    Ok(Some(manifest))
}
