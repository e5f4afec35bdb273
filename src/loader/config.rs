//! YAML configuration for the load command.
//!
//! Every field is optional; values from the file are used wherever the
//! corresponding command-line flag was not given.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// ClickHouse connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Base URL of the HTTP interface, e.g. `http://localhost:8123`
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Batching and reporting settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: Option<usize>,
    /// Errors printed before the remainder is summarized
    pub max_errors: Option<usize>,
}

/// Complete YAML configuration for the load command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadYamlConfig {
    pub connection: ConnectionConfig,
    pub batch: BatchConfig,
}

impl LoadYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: LoadYamlConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}
