//! User tool configuration
//!
//! Declarations arrive from the hosting settings store as an ordered list of
//! entries. Field names are camelCase to match that schema. A file-backed
//! loader is provided for the standalone CLI; the orchestration core only
//! ever sees the parsed entries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::tools::descriptor::OutputKind;

/// One user-declared tool entry
///
/// An entry with `enabled: false` and no `command` is a disable directive
/// for an existing id rather than a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolConfigEntry {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub env: HashMap<String, String>,
    pub enabled: Option<bool>,
    pub auto_run: Option<bool>,
    pub refresh_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub shell: Option<bool>,
    pub output_type: Option<OutputKind>,
}

impl ToolConfigEntry {
    /// Create a minimal entry declaring a command
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: Some(command.into()),
            ..Default::default()
        }
    }

    /// Create a disable directive for an existing id
    pub fn disable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: Some(false),
            ..Default::default()
        }
    }

    /// Whether this entry disables an existing id instead of defining a tool
    pub fn is_disable_directive(&self) -> bool {
        self.enabled == Some(false) && self.command.is_none()
    }
}

/// Tool declarations as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub tools: Vec<ToolConfigEntry>,
}

impl ToolsConfig {
    /// Load configuration from a file, creating an empty default if it
    /// doesn't exist
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            let config = ToolsConfig::default();
            config.save(Some(config_path))?;
            return Ok(config);
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read tools config file")?;

        let config: ToolsConfig =
            toml::from_str(&contents).context("Failed to parse tools config file")?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write tools config file")?;

        Ok(())
    }

    /// Default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".contextbuddy").join("tools.toml"))
    }
}
