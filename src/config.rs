//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::providers::{AdbBridge, AdbProvider, LocalProvider};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Local filesystem settings
    pub local: LocalConfig,
    /// Device bridge settings
    pub adb: AdbConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Show hidden files (starting with .) in new panels
    pub show_hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Home directory override; $HOME when unset
    pub home: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    /// Bridge executable, looked up on PATH when not absolute
    pub path: String,
    /// Device serial passed as `-s`; needed when several devices are attached
    pub serial: Option<String>,
    /// Default directory on the device
    pub home: String,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            path: "adb".to_string(),
            serial: None,
            home: "/sdcard".to_string(),
        }
    }
}

/// Get the config directory path for the current platform
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        // Linux: ~/.config/adb-commander
        dirs_next().map(|p| p.join("adb-commander"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config/adb-commander"))
    }

    #[cfg(target_os = "windows")]
    {
        // Windows: %APPDATA%\adb-commander
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("adb-commander"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".config/adb-commander"))
    }
}

#[cfg(target_os = "linux")]
fn dirs_next() -> Option<PathBuf> {
    // Check XDG_CONFIG_HOME first, then fall back to ~/.config
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
}

/// Get the config file path
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

const DEFAULT_CONFIG: &str = r##"# adb-commander configuration
# This file is auto-generated. Edit as needed.

[general]
# Show hidden files (starting with .) in new panels
show_hidden = false

[local]
# Home directory for the local panel; defaults to $HOME
# home = "/home/me"

[adb]
# adb executable (name on PATH or absolute path)
path = "adb"

# Serial of the device to use when more than one is attached (see `adb devices`)
# serial = "emulator-5554"

# Starting directory on the device
home = "/sdcard"
"##;

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Self {
        let Some(config_path) = config_file() else {
            log::warn!("Could not determine config directory, using defaults");
            return Config::default();
        };
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing the commented default when
    /// the file is missing. Any failure falls back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if let Some(config_dir) = config_path.parent()
            && !config_dir.exists()
            && let Err(e) = fs::create_dir_all(config_dir)
        {
            log::warn!("Could not create config directory: {}", e);
            return Config::default();
        }

        if !config_path.exists()
            && let Err(e) = fs::write(config_path, DEFAULT_CONFIG)
        {
            log::warn!("Could not create config file: {}", e);
            return Config::default();
        }

        match fs::read_to_string(config_path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                log::warn!("{}; using default configuration", e);
                Config::default()
            }),
            Err(e) => {
                log::warn!("Could not read config file: {}", e);
                Config::default()
            }
        }
    }

    /// Parse configuration text
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml_edit::de::from_str(content)
            .map_err(|e| AppError::Config(format!("could not parse config: {}", e)))
    }

    /// Save configuration to file (preserving comments)
    pub fn save(&self) -> AppResult<()> {
        let config_path = config_file()
            .ok_or_else(|| AppError::Config("could not determine config path".to_string()))?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir)?;
        }

        let existing = if config_path.exists() {
            fs::read_to_string(config_path).ok()
        } else {
            None
        };
        let content = match existing {
            Some(existing) => self.update_toml_preserving_comments(&existing)?,
            None => self.update_toml_preserving_comments(DEFAULT_CONFIG)?,
        };

        fs::write(config_path, content)?;
        Ok(())
    }

    /// Update TOML content while preserving comments and formatting
    fn update_toml_preserving_comments(&self, existing: &str) -> AppResult<String> {
        use toml_edit::{DocumentMut, Item, Table, value};

        let mut doc: DocumentMut = existing
            .parse()
            .map_err(|e| AppError::Config(format!("could not parse config: {}", e)))?;

        for section in ["general", "local", "adb"] {
            if !doc.contains_table(section) {
                doc[section] = Item::Table(Table::new());
            }
        }

        doc["general"]["show_hidden"] = value(self.general.show_hidden);

        match &self.local.home {
            Some(home) => doc["local"]["home"] = value(home.as_str()),
            None => {
                if let Some(local) = doc["local"].as_table_mut() {
                    local.remove("home");
                }
            }
        }

        doc["adb"]["path"] = value(self.adb.path.as_str());
        doc["adb"]["home"] = value(self.adb.home.as_str());
        match &self.adb.serial {
            Some(serial) => doc["adb"]["serial"] = value(serial.as_str()),
            None => {
                if let Some(adb) = doc["adb"].as_table_mut() {
                    adb.remove("serial");
                }
            }
        }

        Ok(doc.to_string())
    }

    /// Local provider honoring the `[local] home` override
    pub fn local_provider(&self) -> LocalProvider {
        match &self.local.home {
            Some(home) => LocalProvider::with_home(home.clone()),
            None => LocalProvider::new(),
        }
    }

    /// Device provider talking through the configured bridge
    pub fn adb_provider(&self) -> AdbProvider {
        let bridge = AdbBridge::new(self.adb.path.clone(), self.adb.serial.clone());
        AdbProvider::new(Box::new(bridge), self.adb.home.clone())
    }
}
