use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

use crate::models::Theme;

/// Price API used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";
/// Request timeout used when no override is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".crypto-monitor";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "crypto-monitor.sqlite";
/// Log file name stored next to the database.
const LOG_FILE_NAME: &str = "crypto-monitor.log";

/// Runtime configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the price API, without a trailing slash.
    pub api_url: String,
    /// Handed to the HTTP client, which enforces it.
    pub api_timeout: Duration,
    pub data_dir: PathBuf,
    /// Theme used until the user toggles and persists one.
    pub default_theme: Theme,
}

impl Config {
    /// Read every `CRYPTO_MONITOR_*` variable, falling back to defaults for
    /// missing or unparsable values. Only a missing home directory (with no
    /// explicit data dir) is an error.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env_opt("CRYPTO_MONITOR_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            api_url: normalize_url(&env_str("CRYPTO_MONITOR_API_URL", DEFAULT_API_URL)),
            api_timeout: Duration::from_millis(env_u64(
                "CRYPTO_MONITOR_API_TIMEOUT_MS",
                DEFAULT_TIMEOUT_MS,
            )),
            data_dir,
            default_theme: env_opt("CRYPTO_MONITOR_THEME")
                .and_then(|value| Theme::parse(&value.to_lowercase()))
                .unwrap_or(Theme::Dark),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            data_dir: PathBuf::from(DATA_DIR_NAME),
            default_theme: Theme::Dark,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_str(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env_opt(name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Resolve the application data directory inside the user's home.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(normalize_url("http://localhost:8080/api/"), "http://localhost:8080/api");
        assert_eq!(normalize_url(DEFAULT_API_URL), DEFAULT_API_URL);
    }

    #[test]
    fn files_live_in_the_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/monitor"),
            ..Config::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/monitor/crypto-monitor.sqlite"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/monitor/crypto-monitor.log"));
    }

    #[test]
    fn defaults_match_the_public_api() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.default_theme, Theme::Dark);
    }
}
