use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;

pub const AGENT_TYPE: &str = "node";
pub const NODE_NAME_SUFFIX: &str = "-0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Install,
    Uninstall,
    Rollback,
    Upgrade,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Rollback => "rollback",
            Self::Upgrade => "upgrade",
        }
    }
}

/// Result record printed once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub node: String,
    pub error: bool,
    pub install_path: String,
    pub agent_type: String,
    pub agent_version: String,
    pub action: LifecycleAction,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Outcome {
    pub fn success(config: &AgentConfig, action: LifecycleAction, message: &str) -> Self {
        Self {
            node: node_label(&config.agent_node_name, config.no_node_name_suffix),
            error: false,
            install_path: config.dest_folder.display().to_string(),
            agent_type: AGENT_TYPE.to_string(),
            agent_version: config.agent_version.clone(),
            action,
            message: message.to_string(),
        }
    }

    /// Error outcomes never carry node, path or version so nothing reads as a
    /// partial success.
    pub fn failure(action: LifecycleAction, message: impl Into<String>) -> Self {
        Self {
            node: String::new(),
            error: true,
            install_path: String::new(),
            agent_type: AGENT_TYPE.to_string(),
            agent_version: String::new(),
            action,
            message: message.into(),
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn node_label(name: &str, no_suffix: bool) -> String {
    if no_suffix || name.ends_with(NODE_NAME_SUFFIX) {
        return name.to_string();
    }
    format!("{name}{NODE_NAME_SUFFIX}")
}
