//! Runtime configuration
//!
//! Resolution order for each setting: command-line flag, environment
//! variable, `~/.innpulse/config.toml`, built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::Deserialize;

use crate::types::{InnpulseError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CURRENCY: &str = "TRY";

const ENV_API_URL: &str = "INNPULSE_API_URL";
const ENV_TOKEN: &str = "INNPULSE_TOKEN";
const ENV_HOTEL_ID: &str = "INNPULSE_HOTEL_ID";

/// On-disk config file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_url: Option<String>,
    token: Option<String>,
    hotel_id: Option<String>,
    timeout_secs: Option<u64>,
    currency: Option<String>,
}

/// Values given explicitly on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub hotel_id: Option<String>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved settings, passed explicitly to everything that needs them
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    /// Scopes queries to one property when the account manages several
    pub hotel_id: Option<String>,
    pub timeout: Duration,
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            hotel_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    /// Application home (~/.innpulse)
    pub fn home_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.home_dir().join(".innpulse"))
    }

    /// Default config file path (~/.innpulse/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        Self::home_dir().map(|d| d.join("config.toml"))
    }

    /// Load the config file (if any) and apply environment and flag overrides
    pub fn load(overrides: Overrides) -> Result<Self> {
        let explicit = overrides.config_path.is_some();
        let file = match overrides.config_path.clone().or_else(Self::default_path) {
            Some(path) if path.exists() => read_file(&path)?,
            Some(path) if explicit => {
                return Err(InnpulseError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )))
            }
            _ => FileConfig::default(),
        };

        Ok(Self::resolve(file, |key| std::env::var(key).ok(), overrides))
    }

    fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Self {
        let pick = |flag: Option<String>, key: &str, from_file: Option<String>| {
            flag.or_else(|| env(key))
                .or(from_file)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = pick(overrides.api_url, ENV_API_URL, file.api_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url,
            token: pick(overrides.token, ENV_TOKEN, file.token),
            hotel_id: pick(overrides.hotel_id, ENV_HOTEL_ID, file.hotel_id),
            timeout: Duration::from_secs(
                file.timeout_secs
                    .filter(|&s| s > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            currency: file
                .currency
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        }
    }

    /// Backend host and path without the scheme
    pub fn server(&self) -> &str {
        self.api_url
            .split_once("://")
            .map_or(self.api_url.as_str(), |(_, rest)| rest)
    }

    /// Cache key for per-hotel files: hotel id plus the backend server, so
    /// two servers never share a snapshot
    pub fn scope(&self) -> String {
        let hotel = self.hotel_id.as_deref().unwrap_or("default");
        format!("{}@{}", hotel, self.server())
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| InnpulseError::Config(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(FileConfig::default(), env_from(&[]), Overrides::default());
        assert_eq!(config, Config::default());
        assert_eq!(config.scope(), "default@localhost:5000/api");
    }

    #[test]
    fn test_flag_beats_env_beats_file() {
        let file = FileConfig {
            api_url: Some("http://file/api".into()),
            token: Some("file-token".into()),
            ..Default::default()
        };
        let env = env_from(&[(ENV_API_URL, "http://env/api"), (ENV_TOKEN, "env-token")]);
        let overrides = Overrides {
            api_url: Some("http://flag/api/".into()),
            ..Default::default()
        };

        let config = Config::resolve(file, env, overrides);
        assert_eq!(config.api_url, "http://flag/api");
        assert_eq!(config.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_blank_values_ignored() {
        let file = FileConfig {
            token: Some("   ".into()),
            currency: Some(" ".into()),
            timeout_secs: Some(0),
            ..Default::default()
        };
        let config = Config::resolve(file, env_from(&[]), Overrides::default());
        assert_eq!(config.token, None);
        assert_eq!(config.currency, DEFAULT_CURRENCY);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"https://pms.example.com/api\"\nhotel_id = \"h-42\"\ntimeout_secs = 30\ncurrency = \"eur\"\n",
        )
        .unwrap();

        let file = read_file(&path).unwrap();
        let config = Config::resolve(file, env_from(&[]), Overrides::default());
        assert_eq!(config.api_url, "https://pms.example.com/api");
        assert_eq!(config.scope(), "h-42@pms.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.currency, "EUR");
    }

    #[test]
    fn test_scope_differs_per_server() {
        let staging = Config {
            api_url: "https://staging.example.com/api".into(),
            hotel_id: Some("h-1".into()),
            ..Config::default()
        };
        let production = Config {
            api_url: "https://pms.example.com/api".into(),
            ..staging.clone()
        };
        assert_ne!(staging.scope(), production.scope());
        assert_eq!(production.scope(), "h-1@pms.example.com/api");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let overrides = Overrides {
            config_path: Some(dir.path().join("nope.toml")),
            ..Default::default()
        };
        assert!(matches!(
            Config::load(overrides),
            Err(InnpulseError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = [").unwrap();

        let err = read_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
