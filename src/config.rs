//! Configuration for the wincon tool.
//!
//! The configuration file is located at `~/.wincon/config.toml`:
//!
//! ```toml
//! # Colors applied before running a command
//! [colors]
//! foreground = "lightgray"
//! background = "black"
//!
//! [log]
//! enabled = true
//! level = "info"   # error, warn, info, debug, trace
//! ```
//!
//! Missing keys fall back to their defaults; an unreadable or malformed file
//! falls back to the default configuration.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::attr::{self, Attribute};
use crate::core::device::Result;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colors applied at startup
    pub colors: ColorConfig,
    /// Log file settings
    pub log: LogConfig,
}

/// Color settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub foreground: String,
    pub background: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            foreground: "lightgray".to_string(),
            background: "black".to_string(),
        }
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Parsed log level; unknown names mean `INFO`
    pub fn level(&self) -> Level {
        match self.level.to_ascii_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" | "warning" => Level::WARN,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Some(config) = Self::from_toml_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    /// Parse configuration text; `None` if it is not valid TOML for this schema
    pub fn from_toml_str(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Save configuration to file
    pub fn save(&self) -> std::result::Result<(), String> {
        if let Some(path) = Self::get_config_path() {
            let content = toml::to_string_pretty(self)
                .map_err(|e| format!("Failed to serialize config: {}", e))?;
            fs::write(&path, content)
                .map_err(|e| format!("Failed to write config: {}", e))?;
            Ok(())
        } else {
            Err("Could not determine config path".to_string())
        }
    }

    /// Directory holding the config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".wincon"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        let dir = Self::config_dir()?;
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        Some(dir.join("config.toml"))
    }

    /// Startup attribute, validated by the encoder
    pub fn attribute(&self) -> Result<Attribute> {
        attr::encode(&self.colors.foreground, &self.colors.background)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::{ColorPosition, ConsoleError};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.colors.foreground, "lightgray");
        assert_eq!(config.colors.background, "black");
        assert!(config.log.enabled);
        assert_eq!(config.log.level(), Level::INFO);
        assert_eq!(config.attribute().unwrap(), Attribute::DEFAULT);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [colors]
            foreground = "yellow"
            "#,
        )
        .unwrap();
        assert_eq!(config.colors.foreground, "yellow");
        assert_eq!(config.colors.background, "black");
        assert_eq!(config.log, LogConfig::default());
        assert_eq!(config.attribute().unwrap().bits(), 0x0E);
    }

    #[test]
    fn test_log_levels() {
        let config = Config::from_toml_str("[log]\nlevel = \"DEBUG\"\nenabled = false\n").unwrap();
        assert!(!config.log.enabled);
        assert_eq!(config.log.level(), Level::DEBUG);

        let log = LogConfig { enabled: true, level: "chatty".to_string() };
        assert_eq!(log.level(), Level::INFO);
    }

    #[test]
    fn test_malformed_file_rejected() {
        assert!(Config::from_toml_str("[colors\nforeground = ").is_none());
        assert!(Config::from_toml_str("[log]\nenabled = \"yes\"").is_none());
    }

    #[test]
    fn test_bad_color_reported() {
        let config = Config::from_toml_str("[colors]\nbackground = \"Navy\"\n").unwrap();
        match config.attribute() {
            Err(ConsoleError::InvalidColorName { position, name }) => {
                assert_eq!(position, ColorPosition::Background);
                assert_eq!(name, "Navy");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.colors.foreground = "white".to_string();
        config.log.level = "trace".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml_str(&text), Some(config));
    }
}
