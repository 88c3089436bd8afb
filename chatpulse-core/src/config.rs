//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatpulse/` (~/.config/chatpulse/)
//! - Data: `$XDG_DATA_HOME/chatpulse/` (~/.local/share/chatpulse/)
//! - State/Logs: `$XDG_STATE_HOME/chatpulse/` (~/.local/state/chatpulse/)

use crate::error::{Error, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest UTC offset accepted for bucketing (UTC+14:00).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Longest trend window accepted from configuration.
pub const MAX_TREND_WINDOW_DAYS: u32 = 366;

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
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Record source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Knobs for the analytics pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// UTC offset (minutes) used to bucket records into day/hour cells
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Length of each trend window in days
    #[serde(default = "default_trend_window_days")]
    pub trend_window_days: u32,

    /// Number of entries in the repeated-questions digest
    #[serde(default = "default_top_questions")]
    pub top_questions: usize,

    /// Page size for the conversations mode
    #[serde(default = "default_conversation_page_size")]
    pub conversation_page_size: usize,

    /// Sample questions kept per category in the topic breakdown
    #[serde(default = "default_samples_per_category")]
    pub samples_per_category: usize,

    /// Creators listed in the content summary
    #[serde(default = "default_top_creators")]
    pub top_creators: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            trend_window_days: default_trend_window_days(),
            top_questions: default_top_questions(),
            conversation_page_size: default_conversation_page_size(),
            samples_per_category: default_samples_per_category(),
            top_creators: default_top_creators(),
        }
    }
}

impl AnalyticsConfig {
    /// Fixed offset used for heatmap bucketing.
    ///
    /// Falls back to UTC when the configured value is out of range; call
    /// [`AnalyticsConfig::validate`] to surface that as an error instead.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_minutes.unsigned_abs() > MAX_OFFSET_MINUTES.unsigned_abs() {
            return Err(Error::Config(format!(
                "analytics.utc_offset_minutes must be within ±{}",
                MAX_OFFSET_MINUTES
            )));
        }
        if self.trend_window_days == 0 || self.trend_window_days > MAX_TREND_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "analytics.trend_window_days must be within 1..={}",
                MAX_TREND_WINDOW_DAYS
            )));
        }
        Ok(())
    }
}

fn default_trend_window_days() -> u32 {
    7
}

fn default_top_questions() -> usize {
    10
}

fn default_conversation_page_size() -> usize {
    20
}

fn default_samples_per_category() -> usize {
    3
}

fn default_top_creators() -> usize {
    5
}

/// Where raw records come from.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Upper bound for a single fetch from the record store
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Override for the SQLite record store location
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            database_path: None,
        }
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.max(1))
    }
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
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

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatpulse/config.toml` (~/.config/chatpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatpulse").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite record store)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("chatpulse")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatpulse")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/chatpulse/records.db`
    pub fn default_database_path() -> PathBuf {
        Self::data_dir().join("records.db")
    }

    /// Database path honoring the `[source] database_path` override.
    pub fn database_path(&self) -> PathBuf {
        self.source
            .database_path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.trend_window_days, 7);
        assert_eq!(config.analytics.utc_offset_minutes, 0);
        assert_eq!(config.source.fetch_timeout_ms, 5000);
        assert!(config.source.database_path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
utc_offset_minutes = 540
trend_window_days = 14
top_questions = 5

[source]
fetch_timeout_ms = 250
database_path = "/tmp/chatpulse-test.db"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.utc_offset_minutes, 540);
        assert_eq!(config.analytics.trend_window_days, 14);
        assert_eq!(config.analytics.top_questions, 5);
        assert_eq!(config.analytics.conversation_page_size, 20);
        assert_eq!(config.source.fetch_timeout(), Duration::from_millis(250));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/chatpulse-test.db")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.analytics.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_analytics_validation() {
        assert!(AnalyticsConfig::default().validate().is_ok());

        let config = AnalyticsConfig {
            trend_window_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            trend_window_days: MAX_TREND_WINDOW_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = AnalyticsConfig {
            trend_window_days: u32::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            utc_offset_minutes: 15 * 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        // Out-of-range offsets never panic, they fall back to UTC
        assert_eq!(config.offset().local_minus_utc(), 0);

        let config = AnalyticsConfig {
            utc_offset_minutes: i32::MIN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_load_from_rejects_invalid_window() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ntrend_window_days = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("trend_window_days"));
    }
}
