use anyhow::{Context, Result};
use nodeagent_core::{
    AgentConfig, AGENT_CONFIG_FILE_NAME, BACKUP_VERSION_FILE_NAME, MANIFEST_FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const DIR_MODE: u32 = 0o775;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLayout {
    dest: PathBuf,
    backup: PathBuf,
}

impl AgentLayout {
    pub fn new(dest: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            backup: backup.into(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(&config.dest_folder, &config.backup_folder)
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dest.join(MANIFEST_FILE_NAME)
    }

    pub fn agent_config_path(&self) -> PathBuf {
        self.dest.join(AGENT_CONFIG_FILE_NAME)
    }

    pub fn backup_version_path(&self) -> PathBuf {
        self.backup.join(BACKUP_VERSION_FILE_NAME)
    }

    pub fn backup_agent_config_path(&self) -> PathBuf {
        self.backup.join(AGENT_CONFIG_FILE_NAME)
    }

    pub fn ensure_dest_dir(&self) -> Result<()> {
        create_dir_all_with_mode(&self.dest)
    }

    pub fn ensure_backup_dir(&self) -> Result<()> {
        create_dir_all_with_mode(&self.backup)
    }
}

fn create_dir_all_with_mode(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(dir)
        .with_context(|| format!("failed to create {}", dir.display()))
}
