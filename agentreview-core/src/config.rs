//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/agentreview/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/agentreview/` (~/.config/agentreview/)
//! - Data: `$XDG_DATA_HOME/agentreview/` (~/.local/share/agentreview/)
//! - State/Logs: `$XDG_STATE_HOME/agentreview/` (~/.local/state/agentreview/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default ceiling on selected records before aggregation is refused.
pub const DEFAULT_MAX_RECORDS: usize = 250_000;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analysis defaults
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis defaults. Every field can be overridden on the command line.
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Record ceiling; 0 disables the check
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Agent identity reported in `meta.agent_id`
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Length of the default trailing window, in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Directory of session logs used when none is given
    #[serde(default)]
    pub sessions_dir: Option<PathBuf>,

    /// Directory holding prior weekly snapshots
    #[serde(default)]
    pub history_dir: Option<PathBuf>,

    /// Document listing installed skills
    #[serde(default)]
    pub skills_config: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            agent_id: default_agent_id(),
            window_days: default_window_days(),
            sessions_dir: None,
            history_dir: None,
            skills_config: None,
        }
    }
}

impl AnalysisConfig {
    /// History directory from config, or the XDG default.
    pub fn resolved_history_dir(&self) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(Config::history_dir)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(Error::Config(
                "analysis.window_days must be at least 1".to_string(),
            ));
        }
        if self.agent_id.trim().is_empty() {
            return Err(Error::Config(
                "analysis.agent_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

fn default_agent_id() -> String {
    "main".to_string()
}

fn default_window_days() -> u32 {
    7
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analysis.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/agentreview/config.toml` (~/.config/agentreview/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("agentreview").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/agentreview/` (~/.local/share/agentreview/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("agentreview")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/agentreview/` (~/.local/state/agentreview/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("agentreview")
    }

    /// Returns the default snapshot history directory
    ///
    /// `$XDG_DATA_HOME/agentreview/history/`
    pub fn history_dir() -> PathBuf {
        Self::data_dir().join("history")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/agentreview/agentreview.log` (~/.local/state/agentreview/agentreview.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("agentreview.log")
    }
}
