//! Configuration loading and resolution
//!
//! Client settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file never stops the client: a warning is logged and the
//! compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Research API base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "RESEARCH_API_URL";

/// Environment variable overriding the PDF download directory
pub const DOWNLOAD_DIR_ENV: &str = "RESEARCH_DOWNLOAD_DIR";

const CONFIG_DIR_NAME: &str = "company-research";
const DEFAULT_SETTLE_DELAY_MS: u64 = 300;
const DEFAULT_COPIED_FLAG_MS: u64 = 2000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// On-disk TOML configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api_url: Option<String>,
    pub download_dir: Option<PathBuf>,
    /// Pause between the internal reset and a resubmission from a completed session
    pub settle_delay_ms: Option<u64>,
    /// How long the "copied" flag stays raised after a clipboard copy
    pub copied_flag_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Research API base URL, without trailing slash
    pub api_url: String,
    /// Directory receiving exported PDF reports
    pub download_dir: PathBuf,
    pub settle_delay: Duration,
    pub copied_flag_duration: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            download_dir: PathBuf::from("."),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            copied_flag_duration: Duration::from_millis(DEFAULT_COPIED_FLAG_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: default_log_level(),
        }
    }
}

/// Resolves [`ClientConfig`] from CLI overrides, environment and TOML
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_api_url: Option<String>,
    cli_download_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// API URL given on the command line
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        self.cli_api_url = api_url;
        self
    }

    /// Download directory given on the command line
    pub fn with_download_dir(mut self, download_dir: Option<PathBuf>) -> Self {
        self.cli_download_dir = download_dir;
        self
    }

    /// Explicit TOML file; when unset the platform default path is used
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Resolve the configuration
    ///
    /// Fails only when the TOML file exists but cannot be parsed, or when the
    /// winning API URL is not an http(s) URL.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let toml_config = match self.config_path.clone().or_else(default_config_path) {
            Some(path) => load_toml_config(&path)?,
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        };

        let defaults = ClientConfig::default();

        let api_url = first_present([
            self.cli_api_url.clone(),
            env_value(API_URL_ENV),
            toml_config.api_url.clone(),
        ])
        .unwrap_or(defaults.api_url);

        let download_dir = self
            .cli_download_dir
            .clone()
            .or_else(|| env_value(DOWNLOAD_DIR_ENV).map(PathBuf::from))
            .or(toml_config.download_dir)
            .unwrap_or(defaults.download_dir);

        Ok(ClientConfig {
            api_url: normalize_api_url(&api_url)?,
            download_dir,
            settle_delay: toml_config
                .settle_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            copied_flag_duration: toml_config
                .copied_flag_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.copied_flag_duration),
            request_timeout: toml_config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            log_level: toml_config.logging.level,
        })
    }
}

/// Platform config file location (`<config_dir>/company-research/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Load a TOML config file
///
/// Missing or unreadable files degrade to defaults with a warning; a file that
/// exists but does not parse is an [`Error::Toml`].
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("Config file not found: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read config file {}: {} (using defaults)", path.display(), e);
            return Ok(TomlConfig::default());
        }
    };

    let config: TomlConfig = toml::from_str(&content)?;
    debug!("Loaded config file {}", path.display());
    Ok(config)
}

/// Validate an API base URL and strip trailing slashes
pub fn normalize_api_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("API URL is empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https://: {}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slashes() {
        assert_eq!(
            normalize_api_url("http://localhost:8000//").unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_normalize_rejects_missing_scheme() {
        assert!(matches!(
            normalize_api_url("localhost:8000"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize_api_url("   ").is_err());
    }

    #[test]
    fn test_first_present_skips_blank_values() {
        let picked = first_present([Some("  ".to_string()), None, Some("x".to_string())]);
        assert_eq!(picked.as_deref(), Some("x"));
    }

    #[test]
    fn test_toml_logging_section_defaults() {
        let config: TomlConfig = toml::from_str("api_url = \"http://a\"").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.api_url.as_deref(), Some("http://a"));
        assert!(config.settle_delay_ms.is_none());
    }
}
