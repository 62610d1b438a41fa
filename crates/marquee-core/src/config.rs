use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::matcher::MatchStrategy;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `[tmdb] api_token`.
pub const TMDB_TOKEN_ENV: &str = "TMDB_API_TOKEN";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub tmdb: TmdbConfig,
    pub douban: DoubanConfig,
    pub vod: VodConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub strategy: MatchStrategy,
    pub noise_tokens: Vec<String>,
    /// Searches in flight at once during batch lookups; 0 is read as 1.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub language: String,
    pub image_base_url: String,
}

/// Headers and paging for the Douban `recent_hot` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubanConfig {
    pub referer: String,
    pub user_agent: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VodConfig {
    pub sites: Vec<VodSite>,
}

/// One aggregator endpoint speaking the `provide/vod` API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VodSite {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::from_overrides(&user_str)
        } else {
            Self::from_overrides("")
        }
    }

    /// Parse `overrides` as TOML and layer it over the built-in defaults.
    ///
    /// Tables merge key by key; arrays and scalars replace the default.
    pub fn from_overrides(overrides: &str) -> Result<Self, CoreError> {
        let mut base: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CoreError::Config(e.to_string()))?;
        let user: toml::Value =
            toml::from_str(overrides).map_err(|e| CoreError::Config(e.to_string()))?;
        merge(&mut base, user);
        base.try_into()
            .map_err(|e: toml::de::Error| CoreError::Config(e.to_string()))
    }

    /// The TMDB token, preferring the environment over the config file.
    pub fn tmdb_token(&self) -> Option<String> {
        std::env::var(TMDB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.tmdb.api_token.clone().filter(|t| !t.trim().is_empty()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the result cache database.
    pub fn db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("marquee.db"))
            .unwrap_or_else(|| PathBuf::from("marquee.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, CoreError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "marquee")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
