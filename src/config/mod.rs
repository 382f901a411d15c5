//! Configuration management.
//!
//! Configuration is read from an optional TOML file and overridden by
//! environment variables prefixed with `ZBMATH_SEARCH_`. Nested keys use a
//! double underscore, e.g. `ZBMATH_SEARCH_HTTP__TIMEOUT_SECS=5`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [endpoint]
//! base_url = "http://www.zentralblatt-math.org/zbmath/search/"
//! help_url = "http://www.zentralblatt-math.org/zbmath/help/search"
//! icon_url = "http://www.zentralblatt-math.org/zbmath/zbmath.ico"
//!
//! [http]
//! user_agent = "Jabref"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! max_retries = 2
//!
//! [fetch]
//! max_concurrent_requests = 1
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sources::DEFAULT_BASE_URL;

const ENV_PREFIX: &str = "ZBMATH_SEARCH";
const CONFIG_FILE_NAME: &str = "zbmath-search.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint and host metadata URLs
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Record fetching settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Search endpoint; listing POSTs and record GETs go here
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Help page shown by hosts
    #[serde(default = "default_help_url")]
    pub help_url: String,

    /// Icon shown by hosts
    #[serde(default = "default_icon_url")]
    pub icon_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            help_url: default_help_url(),
            icon_url: default_icon_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_help_url() -> String {
    "http://www.zentralblatt-math.org/zbmath/help/search".to_string()
}

fn default_icon_url() -> String {
    "http://www.zentralblatt-math.org/zbmath/zbmath.ico".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Extra attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_user_agent() -> String {
    "Jabref".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

/// Record fetching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Record requests in flight at once (1 = sequential)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    1
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Check values that would otherwise fail deep inside a search
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = url::Url::parse(&self.endpoint.base_url).map_err(|e| {
            ConfigError::Invalid(format!("base_url '{}': {}", self.endpoint.base_url, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must use http or https, got '{}'",
                base.scheme()
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.fetch.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_concurrent_requests must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the default configuration with environment overrides applied
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(environment()).build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Look for a configuration file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|p| p.is_file())
}

/// Per-user configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("zbmath-search").join("config.toml"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.http.user_agent, "Jabref");
        assert_eq!(config.fetch.max_concurrent_requests, 1);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[endpoint]
base_url = "https://zbmath.example.org/search/"

[http]
timeout_secs = 5
max_retries = 0

[fetch]
max_concurrent_requests = 4

[logging]
level = "debug"
format = "json"
"#;
        std::fs::write(&path, toml_content).unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.endpoint.base_url, "https://zbmath.example.org/search/");
        assert_eq!(config.endpoint.help_url, default_help_url());
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.fetch.max_concurrent_requests, 4);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.http.timeout_secs = 12;
        config.fetch.max_concurrent_requests = 3;

        config.save(&path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let result = load_config(Path::new("/nonexistent/zbmath-search.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.endpoint.base_url = "ftp://zbmath.example.org/".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.endpoint.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.max_concurrent_requests = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetch]\nmax_concurrent_requests = 0\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
    }
}
