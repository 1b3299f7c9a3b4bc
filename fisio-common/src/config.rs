//! Configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Explicit override (command-line argument)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming the remote API base URL
pub const API_BASE_ENV: &str = "FISIO_API_BASE_URL";
/// Environment variable naming the bulk data file (path or URL)
pub const DATA_FILE_ENV: &str = "FISIO_DATA_FILE";
/// Environment variable naming the HTTP service bind address
pub const BIND_ENV: &str = "FISIO_BIND";

pub const DEFAULT_DATA_FILE: &str = "atendimentos_pacientes_bairro_ano.csv";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// On-disk TOML configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    pub api_base_url: Option<String>,
    pub data_file: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub bind_address: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
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
    DEFAULT_LOG_LEVEL.to_string()
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub data_file: Option<String>,
    pub bind_address: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Remote API base URL; `None` disables the remote strategy
    pub api_base_url: Option<String>,
    /// Bulk CSV location for the local strategy (path or http(s) URL)
    pub data_file: String,
    pub request_timeout: Duration,
    pub bind_address: String,
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            data_file: DEFAULT_DATA_FILE.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Resolve configuration from overrides, environment, TOML file and defaults.
    ///
    /// A missing default config file is not an error; an explicitly named one
    /// that cannot be read or parsed is.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let toml_config = match &overrides.config_file {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => load_toml_config(&path).unwrap_or_else(|e| {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }),
                None => {
                    debug!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };
        Ok(Self::merge(overrides, &toml_config))
    }

    /// Blank values at any level are skipped, so they never hide a lower one
    fn merge(overrides: &ConfigOverrides, file: &TomlConfig) -> Self {
        let defaults = Self::default();

        let api_base_url = overrides
            .api_base_url
            .clone()
            .and_then(non_blank)
            .or_else(|| std::env::var(API_BASE_ENV).ok().and_then(non_blank))
            .or_else(|| file.api_base_url.clone().and_then(non_blank));

        let data_file = overrides
            .data_file
            .clone()
            .and_then(non_blank)
            .or_else(|| std::env::var(DATA_FILE_ENV).ok().and_then(non_blank))
            .or_else(|| file.data_file.clone().and_then(non_blank))
            .unwrap_or(defaults.data_file);

        let bind_address = overrides
            .bind_address
            .clone()
            .and_then(non_blank)
            .or_else(|| std::env::var(BIND_ENV).ok().and_then(non_blank))
            .or_else(|| file.bind_address.clone().and_then(non_blank))
            .unwrap_or(defaults.bind_address);

        let request_timeout = overrides
            .request_timeout_ms
            .or(file.request_timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        Self {
            api_base_url,
            data_file,
            request_timeout,
            bind_address,
            log_level: file.logging.level.clone(),
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}

/// `<platform config dir>/fisio-dash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fisio-dash").join("config.toml"))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
