//! Configuration management for Freshet.
//!
//! Configuration is read from `~/.config/freshet/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::{Deserialize, Deserializer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between scheduled update passes.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 100;
pub const DEFAULT_WORKERS: usize = 10;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub fetcher: FetcherConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Period between scheduled passes.
    #[serde(deserialize_with = "deserialize_interval")]
    pub update_interval: Duration,
    /// Maximum feeds reconciled at the same time within a pass.
    pub workers: usize,
    /// Run one pass as soon as the daemon starts.
    pub update_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(DEFAULT_UPDATE_INTERVAL_SECS),
            workers: DEFAULT_WORKERS,
            update_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("freshet/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; defaults to `<data_dir>/freshet/freshet.db`.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/freshet/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("freshet").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Freshet Configuration
#
# Intervals can be written as "30s", "10m", "1h", "1d" or a bare number of seconds.

[sync]
# How often every known feed is re-polled
update_interval = "100s"

# Maximum feeds reconciled concurrently during one pass
workers = 10

# Run a pass immediately when the daemon starts
update_on_start = true

[fetcher]
# Per-request timeout in seconds
timeout_secs = 10

user_agent = "freshet/0.1.0"

[store]
# Database location (default: platform data directory)
# path = "/var/lib/freshet/freshet.db"
"##
        .to_string()
    }
}

/// Parse interval string like "1h", "30m", "6h", "1d" into seconds.
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    let scaled = |digits: &str, unit: &str, factor: u64| -> Result<u64, String> {
        digits
            .parse::<u64>()
            .map_err(|_| format!("Invalid {}: {}", unit, digits))?
            .checked_mul(factor)
            .ok_or_else(|| format!("Interval too large: {}", s))
    };

    let secs = if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, "hours", 3600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, "minutes", 60)
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, "days", 86400)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '100s', '30m', '1h'", s))
    }?;

    if secs == 0 {
        return Err("Interval must be greater than zero".to_string());
    }
    Ok(secs)
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    let secs = match Raw::deserialize(deserializer)? {
        Raw::Secs(0) => return Err(serde::de::Error::custom("interval must be greater than zero")),
        Raw::Secs(secs) => secs,
        Raw::Text(text) => parse_interval(&text).map_err(serde::de::Error::custom)?,
    };
    Ok(Duration::from_secs(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
