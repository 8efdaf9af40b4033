use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DEST_FOLDER: &str = "/opt/splunk-nodejs-agent";
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";
pub const DEFAULT_AGENT_VERSION: &str = "latest";
pub const DEFAULT_PACKAGE_NAME: &str = "@splunk/otel";

pub const MANIFEST_FILE_NAME: &str = "package.json";
pub const AGENT_CONFIG_FILE_NAME: &str = "splunk-config.js";
pub const BACKUP_VERSION_FILE_NAME: &str = "splunk-agent-version.txt";

/// Settings for one lifecycle run.
///
/// Empty fields are filled by [`AgentConfig::with_defaults`]; the backup folder
/// always derives from the destination folder unless set explicitly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AgentConfig {
    pub dest_folder: PathBuf,
    pub backup_folder: PathBuf,
    pub agent_version: String,
    pub access_token: String,
    pub otlp_endpoint: String,
    pub keep_backup: bool,
    pub npm_registry: String,
    pub agent_node_name: String,
    pub no_node_name_suffix: bool,
    pub package_name: String,
}

impl AgentConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.dest_folder.as_os_str().is_empty() {
            self.dest_folder = PathBuf::from(DEFAULT_DEST_FOLDER);
        }
        if self.backup_folder.as_os_str().is_empty() {
            self.backup_folder = self.dest_folder.join("backup");
        }
        if self.npm_registry.is_empty() {
            self.npm_registry = DEFAULT_NPM_REGISTRY.to_string();
        }
        if self.agent_version.is_empty() {
            self.agent_version = DEFAULT_AGENT_VERSION.to_string();
        }
        if self.package_name.is_empty() {
            self.package_name = DEFAULT_PACKAGE_NAME.to_string();
        }
        self
    }

    /// Copy of this config pinned to another agent version.
    pub fn with_agent_version(&self, version: impl Into<String>) -> Self {
        Self {
            agent_version: version.into(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access_token = if self.access_token.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("AgentConfig")
            .field("dest_folder", &self.dest_folder)
            .field("backup_folder", &self.backup_folder)
            .field("agent_version", &self.agent_version)
            .field("access_token", &access_token)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .field("keep_backup", &self.keep_backup)
            .field("npm_registry", &self.npm_registry)
            .field("agent_node_name", &self.agent_node_name)
            .field("no_node_name_suffix", &self.no_node_name_suffix)
            .field("package_name", &self.package_name)
            .finish()
    }
}
