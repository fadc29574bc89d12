use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::player::{PlayerTimings, TrackerSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_true")]
    pub autoplay: bool,

    /// Seconds of inactivity before the top controls hide
    #[serde(default = "default_controls_hide_delay")]
    pub controls_hide_delay: u64,

    #[serde(default = "default_resume_notice_duration")]
    pub resume_notice_duration: u64,

    /// Seconds an item may stay loading before it is shown as unplayable
    #[serde(default = "default_loading_timeout")]
    pub loading_timeout: u64,

    /// Stored completion percentage treated as fully watched
    #[serde(default = "default_completed_threshold")]
    pub completed_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,

    /// Minimum real seconds between unforced reports
    #[serde(default = "default_wall_interval")]
    pub wall_interval: u64,

    /// Minimum playback seconds between unforced reports
    #[serde(default = "default_playback_interval")]
    pub playback_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Config {
    /// Load from the default location, writing defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents = fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("portal-player").join("config.toml"))
    }

    pub fn timings(&self) -> PlayerTimings {
        PlayerTimings {
            controls_hide_delay: Duration::from_secs(self.playback.controls_hide_delay),
            resume_notice_duration: Duration::from_secs(self.playback.resume_notice_duration),
            loading_timeout: Duration::from_secs(self.playback.loading_timeout),
            tracker: TrackerSettings {
                enabled: self.progress.enabled,
                tick_interval: Duration::from_secs(self.progress.tick_interval.max(1)),
                wall_interval: Duration::from_secs(self.progress.wall_interval),
                playback_interval: Duration::from_secs(self.progress.playback_interval),
                completed_threshold: self.playback.completed_threshold,
            },
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: default_true(),
            controls_hide_delay: default_controls_hide_delay(),
            resume_notice_duration: default_resume_notice_duration(),
            loading_timeout: default_loading_timeout(),
            completed_threshold: default_completed_threshold(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            tick_interval: default_tick_interval(),
            wall_interval: default_wall_interval(),
            playback_interval: default_playback_interval(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout: default_request_timeout(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_controls_hide_delay() -> u64 { 3 }
fn default_resume_notice_duration() -> u64 { 3 }
fn default_loading_timeout() -> u64 { 30 }
fn default_completed_threshold() -> f64 { 95.0 }
fn default_tick_interval() -> u64 { 5 }
fn default_wall_interval() -> u64 { 5 }
fn default_playback_interval() -> u64 { 10 }
fn default_base_url() -> String { "http://localhost:3001/api".to_string() }
fn default_request_timeout() -> u64 { 10 }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(config.playback.autoplay);
        assert_eq!(config.progress.playback_interval, 10);

        let timings = config.timings();
        assert_eq!(timings.controls_hide_delay, Duration::from_secs(3));
        assert_eq!(timings.loading_timeout, Duration::from_secs(30));
        assert_eq!(timings.tracker.completed_threshold, 95.0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[playback]\nautoplay = false\n\n[service]\nbase_url = \"https://portal.example.com/api\"\ntoken = \"abc\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.playback.autoplay);
        assert_eq!(config.playback.loading_timeout, 30);
        assert_eq!(config.service.token.as_deref(), Some("abc"));
        assert_eq!(config.service.request_timeout, 10);
        assert!(config.progress.enabled);
    }

    #[test]
    fn saved_config_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.progress.enabled = false;
        config.playback.loading_timeout = 12;
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert!(!reloaded.progress.enabled);
        assert_eq!(reloaded.timings().loading_timeout, Duration::from_secs(12));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback\nautoplay = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
