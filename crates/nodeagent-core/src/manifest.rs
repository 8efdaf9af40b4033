use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The subset of an npm `package.json` the lifecycle cares about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PackageJson {
    #[serde(default, deserialize_with = "lenient_dependencies")]
    pub dependencies: BTreeMap<String, Value>,
}

impl PackageJson {
    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        serde_json::from_str(input).context("failed to parse package.json")
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Version recorded for `name`. String values are returned verbatim, any
    /// other JSON value in its compact textual form.
    pub fn dependency_version(&self, name: &str) -> Option<String> {
        self.dependencies.get(name).map(|value| match value {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        })
    }
}

// npm tolerates odd manifests; a non-object `dependencies` reads as empty.
fn lenient_dependencies<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(entries) => Ok(entries.into_iter().collect()),
        _ => Ok(BTreeMap::new()),
    }
}
