mod config;
mod manifest;
mod outcome;

pub use config::{
    AgentConfig, AGENT_CONFIG_FILE_NAME, BACKUP_VERSION_FILE_NAME, DEFAULT_AGENT_VERSION,
    DEFAULT_DEST_FOLDER, DEFAULT_NPM_REGISTRY, DEFAULT_PACKAGE_NAME, MANIFEST_FILE_NAME,
};
pub use manifest::PackageJson;
pub use outcome::{LifecycleAction, Outcome, AGENT_TYPE, NODE_NAME_SUFFIX};
