// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration.
//!
//! [`Config`] is the on-disk JSON file at `~/.rfetch/config.json`; every field
//! has a default so a missing or partial file is fine. [`Settings`] is the
//! immutable runtime value built from it (plus CLI overrides) and handed to
//! the state machine at construction.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::KeyMap;
use crate::rclone::{RcloneClient, DEFAULT_BINARY, DEFAULT_STATS_INTERVAL};
use crate::ui::Theme;

const CONFIG_DIR: &str = ".rfetch";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "rfetch.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// rclone binary name or path
    #[serde(default = "default_rclone_binary")]
    pub rclone_binary: String,
    /// Download directory; the working directory when unset
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Passed to `rclone copy --stats`
    #[serde(default = "default_stats_interval")]
    pub stats_interval: String,
    /// UI refresh tick while transfers run
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Log filter used when `RUST_LOG` is not set (e.g. "debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_rclone_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_stats_interval() -> String {
    DEFAULT_STATS_INTERVAL.to_string()
}

fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rclone_binary: default_rclone_binary(),
            destination: None,
            stats_interval: default_stats_interval(),
            tick_interval_ms: default_tick_interval_ms(),
            log_level: None,
        }
    }
}

/// `~/.rfetch`, created on first use.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let dir = home.join(CONFIG_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    }
    Ok(dir)
}

/// Default config file location.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Log file location.
pub fn log_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(LOG_FILE))
}

/// Load the config at `path`, falling back to defaults when it does not exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

/// Load the config from the default location.
pub fn load_config() -> Result<Config> {
    load_config_from(&default_config_path()?)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}

impl Config {
    /// Client for the configured rclone binary.
    pub fn client(&self) -> RcloneClient {
        RcloneClient::new(&self.rclone_binary, &self.stats_interval)
    }

    /// Download directory: the configured one, else the working directory,
    /// else `"."`.
    pub fn resolved_destination(&self) -> PathBuf {
        match &self.destination {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Immutable runtime settings passed into [`crate::app::App`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub keys: KeyMap,
    pub theme: Theme,
    pub destination: PathBuf,
    pub tick_interval: Duration,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keys: KeyMap::default(),
            theme: Theme::default(),
            destination: config.resolved_destination(),
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(10)),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.rclone_binary, "rclone");
        assert_eq!(config.stats_interval, "500ms");
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"destination": "/data/dl", "stats_interval": "1s"}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.destination, Some(PathBuf::from("/data/dl")));
        assert_eq!(config.stats_interval, "1s");
        assert_eq!(config.rclone_binary, "rclone");
        assert_eq!(config.resolved_destination(), PathBuf::from("/data/dl"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            rclone_binary: "/usr/local/bin/rclone".into(),
            log_level: Some("debug".into()),
            ..Config::default()
        };
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            destination: Some(PathBuf::from("/dl")),
            tick_interval_ms: 250,
            ..Config::default()
        };
        let settings = Settings::from_config(&config);
        assert_eq!(settings.destination, PathBuf::from("/dl"));
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
    }
}
