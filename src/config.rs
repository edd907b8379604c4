use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Usually supplied through `NEWS_API_KEY` rather than the file.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_regional_query")]
    pub regional_query: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    #[serde(default = "default_prefetch_distance")]
    pub prefetch_distance: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Directory holding the article store; platform cache dir when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` and apply environment overrides before validating,
    /// so the environment can correct a value in the file.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_overrides(path, |key| std::env::var(key).ok())
    }

    /// Load from `path` when it exists, otherwise start from defaults;
    /// environment overrides apply either way.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load_with_env(path);
        }

        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        Ok(toml::from_str(&content)?)
    }

    fn load_with_overrides<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read(path)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|_| ConfigError::InvalidUrl(self.api.base_url.clone()))?;

        if self.api.timeout == 0 {
            return Err(ConfigError::Invalid("Timeout must be greater than 0".to_string()));
        }

        if self.feeds.page_size == 0 || self.feeds.page_size > 100 {
            return Err(ConfigError::Invalid("Page size must be between 1 and 100".to_string()));
        }

        if self.feeds.country.trim().is_empty() {
            return Err(ConfigError::Invalid("Country cannot be empty".to_string()));
        }

        if self.feeds.regional_query.trim().is_empty() {
            return Err(ConfigError::Invalid("Regional query cannot be empty".to_string()));
        }

        Ok(())
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(key) = lookup("NEWS_API_KEY") {
            if !key.trim().is_empty() {
                self.api.api_key = Some(key);
            }
        }

        if let Some(base_url) = lookup("NEWS_READER_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Some(country) = lookup("NEWS_READER_COUNTRY") {
            self.feeds.country = country;
        }

        if let Some(page_size) = lookup("NEWS_READER_PAGE_SIZE") {
            if let Ok(val) = page_size.parse() {
                self.feeds.page_size = val;
            }
        }

        if let Some(level) = lookup("NEWS_READER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Directory of the article store.
    pub fn store_dir(&self) -> Result<PathBuf> {
        match &self.cache.directory {
            Some(dir) => Ok(dir.clone()),
            None => Self::cache_dir(),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("news-reader"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|dir| dir.join("news-reader"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine cache directory".to_string()))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            regional_query: default_regional_query(),
            page_size: default_page_size(),
            sort_by: default_sort_by(),
            prefetch_distance: default_prefetch_distance(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_base_url() -> String { crate::news::client::DEFAULT_BASE_URL.to_string() }
fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    format!("news-reader/{}", env!("CARGO_PKG_VERSION"))
}

fn default_country() -> String { crate::news::DEFAULT_COUNTRY.to_string() }
fn default_regional_query() -> String { "Indonesia".to_string() }
fn default_page_size() -> u32 { crate::news::DEFAULT_PAGE_SIZE }
fn default_sort_by() -> String { crate::news::DEFAULT_SORT_BY.to_string() }
fn default_prefetch_distance() -> usize { crate::controller::DEFAULT_PREFETCH_DISTANCE }

fn default_cache_enabled() -> bool { true }
fn default_log_level() -> String { "warn".to_string() }
