use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use nodeagent_core::AgentConfig;
use serde::Deserialize;

use crate::GlobalArgs;

pub(crate) const DEFAULT_CONFIG_FILE_NAME: &str = ".splunk-otel-manager.yaml";
const DEFAULT_NPM_BIN: &str = "npm";

/// Keys accepted in the config file. Every key is optional; flags and
/// environment variables win over anything set here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub dest_folder: Option<PathBuf>,
    pub backup_folder: Option<PathBuf>,
    pub agent_version: Option<String>,
    pub access_token: Option<String>,
    pub otlp_endpoint: Option<String>,
    pub keep_backup: Option<bool>,
    pub npm_registry: Option<String>,
    pub agent_node_name: Option<String>,
    pub no_node_name_suffix: Option<bool>,
    pub npm_bin: Option<PathBuf>,
}

impl FileConfig {
    pub(crate) fn parse(input: &str, format: ConfigFormat) -> Result<Self> {
        let parsed: Result<Self> = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(input).map_err(Into::into),
            ConfigFormat::Toml => toml::from_str(input).map_err(Into::into),
            ConfigFormat::Json => serde_json::from_str(input).map_err(Into::into),
        };
        parsed.context("failed to parse config file")
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Picks the parser from the file extension; no extension means YAML.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let Some(extension) = path.extension() else {
            return Ok(Self::Yaml);
        };
        match extension.to_string_lossy().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(anyhow!(
                "unsupported config file format '{other}': {}",
                path.display()
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub agent: AgentConfig,
    pub npm_bin: PathBuf,
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// Reads the explicit `--config` file, or the default file under `home` when
/// it exists. An explicit path that cannot be read is an error.
pub(crate) fn load_file_config(
    explicit: Option<&Path>,
    home: Option<&Path>,
) -> Result<Option<(PathBuf, FileConfig)>> {
    let (path, required) = match (explicit, home) {
        (Some(path), _) => (path.to_path_buf(), true),
        (None, Some(home)) => (home.join(DEFAULT_CONFIG_FILE_NAME), false),
        (None, None) => return Ok(None),
    };

    let format = ConfigFormat::from_path(&path)?;
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file: {}", path.display()));
        }
    };

    let config = FileConfig::parse(&raw, format)
        .with_context(|| format!("invalid config file: {}", path.display()))?;
    Ok(Some((path, config)))
}

/// Layers flag/env values over the config file and built-in defaults.
pub(crate) fn resolve_settings(args: &GlobalArgs, file: Option<FileConfig>) -> Settings {
    let file = file.unwrap_or_default();

    let agent = AgentConfig {
        dest_folder: args
            .dest_folder
            .clone()
            .or(file.dest_folder)
            .unwrap_or_default(),
        backup_folder: args
            .backup_folder
            .clone()
            .or(file.backup_folder)
            .unwrap_or_default(),
        agent_version: args
            .agent_version
            .clone()
            .or(file.agent_version)
            .unwrap_or_default(),
        access_token: args
            .access_token
            .clone()
            .or(file.access_token)
            .unwrap_or_default(),
        otlp_endpoint: args
            .otlp_endpoint
            .clone()
            .or(file.otlp_endpoint)
            .unwrap_or_default(),
        keep_backup: args.keep_backup.or(file.keep_backup).unwrap_or(true),
        npm_registry: args
            .npm_registry
            .clone()
            .or(file.npm_registry)
            .unwrap_or_default(),
        agent_node_name: args
            .node_name
            .clone()
            .or(file.agent_node_name)
            .unwrap_or_default(),
        no_node_name_suffix: args
            .no_node_name_suffix
            .or(file.no_node_name_suffix)
            .unwrap_or(false),
        package_name: String::new(),
    }
    .with_defaults();

    Settings {
        agent,
        npm_bin: args
            .npm_bin
            .clone()
            .or(file.npm_bin)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NPM_BIN)),
    }
}
