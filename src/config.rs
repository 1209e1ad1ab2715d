//! Workspace configuration read from `soil.yaml` at the workspace root.

use serde::{Deserialize, Deserializer, Serialize, de};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "soil.yaml";

const DEFAULT_LOOKUP_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_limit")]
    pub limit: usize,
}

fn default_lookup_limit() -> usize {
    DEFAULT_LOOKUP_LIMIT
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LOOKUP_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Quoted or bare (`version: 1`, `version: 1.2`).
    #[serde(default, deserialize_with = "scalar_to_string")]
    pub version: String,
    #[serde(default)]
    pub lookup: LookupConfig,
}

fn scalar_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a scalar version, got {:?}",
            other
        ))),
    }
}

/// Load `soil.yaml` from `ws_root`. A missing file yields the defaults; a file
/// that exists but cannot be parsed is an error.
pub fn load_config(ws_root: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let path = ws_root.join(CONFIG_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(WorkspaceConfig::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    if content.trim().is_empty() {
        return Ok(WorkspaceConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml { path, source })
}
