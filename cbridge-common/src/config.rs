//! Configuration loading and compiled defaults
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by the service's CLI parser; this module owns
//! the TOML file and the compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name under the platform config/data directories
pub const APP_DIR_NAME: &str = "cbridge";

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set ("trace".."error")
    pub level: Option<String>,
}

/// On-disk TOML configuration. Every field is optional so partial files work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub public_api_host: Option<String>,
    pub contracting_api_host: Option<String>,
    pub api_version: Option<String>,
    pub api_token: Option<String>,
    pub user_agent: Option<String>,
    /// Delay between retry attempts, in seconds
    pub error_interval: Option<u64>,
    /// Per-request HTTP timeout, in seconds
    pub request_timeout: Option<u64>,
    pub cache_db: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiled-in defaults, used when no other tier provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub public_api_host: String,
    pub api_version: String,
    pub api_token: String,
    pub user_agent: String,
    pub error_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub cache_db: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            public_api_host: "https://lb-api-sandbox-2.prozorro.gov.ua".to_string(),
            api_version: "2.5".to_string(),
            api_token: "contracting".to_string(),
            user_agent: "Databridge contracting 1.0.1".to_string(),
            error_interval_secs: 5,
            request_timeout_secs: 30,
            cache_db: default_cache_db_path(),
            log_level: "info".to_string(),
        }
    }
}

/// Default location of the sync cache database
fn default_cache_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./cbridge_data"))
        .join("contracting-cache.db")
}

/// Default TOML path: `<config_dir>/cbridge/contracting.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("contracting.toml"))
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Where the TOML tier came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// Default location checked, no file there
    Missing(PathBuf),
    /// No platform config directory
    NoConfigDir,
}

impl ConfigOrigin {
    /// Report the origin. Call once the tracing subscriber is installed.
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Missing(path) => warn!(
                "Config file {} not found, using environment and compiled defaults",
                path.display()
            ),
            ConfigOrigin::NoConfigDir => {
                warn!("Could not determine config directory, using environment and compiled defaults")
            }
        }
    }
}

/// TOML tier together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub origin: ConfigOrigin,
}

/// Load the TOML configuration file.
///
/// An explicitly requested file must exist. The default location is optional:
/// when it is missing the defaults are used. Nothing is logged here since the
/// log level itself may come from the file; see [`ConfigOrigin::log`].
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit_path {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config file {} failed: {}", path.display(), e))
        })?;
        return Ok(LoadedConfig {
            config: parse_toml_config(&content)?,
            origin: ConfigOrigin::File(path.to_path_buf()),
        });
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            Ok(LoadedConfig {
                config: parse_toml_config(&content)?,
                origin: ConfigOrigin::File(path),
            })
        }
        Some(path) => Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::Missing(path),
        }),
        None => Ok(LoadedConfig {
            config: TomlConfig::default(),
            origin: ConfigOrigin::NoConfigDir,
        }),
    }
}
