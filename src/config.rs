//! Configuration management for gtasks-sync
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{CONFIG_GENERATED, GOOGLE_TASKS_API, MARKER_LATER, MARKER_TODO};
use crate::graph::UserPreferences;
use crate::utils::datetime::{GraphDateFormat, DEFAULT_DATE_FORMAT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "gtasks-sync";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub graph: GraphConfig,
    pub google: GoogleConfig,
    pub logging: LoggingConfig,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fetch the tasks of all lists in parallel
    pub concurrent_fetch: bool,
}

/// Local graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// SQLite file holding the graph
    pub database_path: PathBuf,
    /// Journal page title pattern, e.g. "yyyy-MM-dd" or "MMM do, yyyy"
    pub date_format: String,
    /// Marker written on open tasks: "TODO" or "LATER"
    pub todo_marker: String,
}

/// Google Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// JSON file holding the OAuth credentials
    pub credentials_path: PathBuf,
    pub api_base: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// One of "error", "warn", "info", "debug", "trace"
    pub level: String,
    /// Also append log lines to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { concurrent_fetch: true }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join(APP_DIR).join("graph.db"),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            todo_marker: MARKER_TODO.to_string(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            credentials_path: config_dir.join(APP_DIR).join("credentials.json"),
            api_base: GOOGLE_TASKS_API.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl GraphConfig {
    /// Preferences the sync reads from the graph, built from this section.
    pub fn preferences(&self) -> Result<UserPreferences> {
        let date_format = GraphDateFormat::new(&self.date_format)
            .with_context(|| format!("Invalid date_format '{}'", self.date_format))?;
        Ok(UserPreferences {
            date_format,
            todo_marker: self.todo_marker.clone(),
        })
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(format!("{APP_DIR}.toml"));
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_DIR).join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let marker = self.graph.todo_marker.as_str();
        if marker != MARKER_TODO && marker != MARKER_LATER {
            anyhow::bail!("todo_marker must be {} or {}, got '{}'", MARKER_TODO, MARKER_LATER, marker);
        }

        let date_format = self.graph.preferences()?.date_format;
        if !date_format.is_unambiguous() {
            anyhow::bail!(
                "date_format '{}' must contain a year, a month and a day",
                self.graph.date_format
            );
        }

        if self.google.api_base.is_empty() {
            anyhow::bail!("google.api_base cannot be empty");
        }

        if let Err(e) = log::LevelFilter::from_str(&self.logging.level) {
            anyhow::bail!("Invalid logging level '{}': {}", self.logging.level, e);
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# gtasks-sync Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_DIR))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
