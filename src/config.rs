use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "MILESTONES_CONFIG_DIR";

const APP_DIR_NAME: &str = "milestones";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - `$MILESTONES_CONFIG_DIR` when set
    /// - Linux: $XDG_CONFIG_HOME/milestones or ~/.config/milestones
    /// - macOS: ~/Library/Application Support/milestones
    /// - Windows: %APPDATA%\milestones
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR_NAME))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR_NAME))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR_NAME))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".milestones"))
        }
    }

    /// Get the settings file path (config.toml)
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("milestones.log"))
    }

    /// Directory where issue reports are queued
    pub fn outbox_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("outbox"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Where provenance (author and message) of a materialized copy is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvenanceStyle {
    /// File comment metadata when the filesystem supports it, otherwise the file name
    #[default]
    Auto,
    /// Always append the provenance to the visible file name
    FileName,
    /// Only file comment metadata; copies keep their plain names
    Metadata,
    /// Provenance lives in the meta record only
    RecordOnly,
}

/// User settings stored in `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provenance: ProvenanceStyle,

    /// Commit uncommitted work before returning to a milestone
    #[serde(default = "default_mark_before_return")]
    pub mark_before_return: bool,

    /// Recipients of issue reports
    #[serde(default = "default_report_recipients")]
    pub report_recipients: Vec<String>,

    /// Folder that `share` copies into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_dir: Option<PathBuf>,
}

fn default_mark_before_return() -> bool {
    true
}

fn default_report_recipients() -> Vec<String> {
    vec!["support@milestones.invalid".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            provenance: ProvenanceStyle::default(),
            mark_before_return: default_mark_before_return(),
            report_recipients: default_report_recipients(),
            share_dir: None,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = ConfigManager::settings_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save settings to the config file
    pub fn save(&self) -> Result<()> {
        ConfigManager::ensure_config_dir()?;
        let path = ConfigManager::settings_path()?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
