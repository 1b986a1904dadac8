//! Configuration for cbridge-contracting
//!
//! Resolution per field: CLI flag → environment variable → TOML file →
//! compiled default. Flags and environment variables are handled by `clap`,
//! the TOML file and defaults come from `cbridge_common::config`.

use crate::services::feed::FeedOptions;
use crate::utils::retry::RetryPolicy;
use cbridge_common::config::{CompiledDefaults, TomlConfig};
use cbridge_common::time::secs_to_duration;
use cbridge_common::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for cbridge-contracting
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cbridge-contracting")]
#[command(about = "Replicates active tender contracts into the contracting registry")]
#[command(version)]
pub struct Cli {
    /// Synchronize this tender now and exit instead of reading the feed
    #[arg(long)]
    pub tender_id: Option<String>,

    /// Load-balancer affinity token for the on-demand path
    #[arg(long, env = "SERVER_ID")]
    pub server_id: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "CBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source registry host, e.g. https://public.api.example
    #[arg(long, env = "PUBLIC_API_HOST")]
    pub public_api_host: Option<String>,

    /// Target registry host (defaults to the source host)
    #[arg(long, env = "CONTRACTING_API_HOST")]
    pub contracting_api_host: Option<String>,

    #[arg(long, env = "API_VERSION")]
    pub api_version: Option<String>,

    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Seconds between retry attempts and batch redeliveries
    #[arg(long, env = "ERROR_INTERVAL")]
    pub error_interval: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Sync cache database file
    #[arg(long, env = "CACHE_DB_PATH")]
    pub cache_db: Option<PathBuf>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Exit on the first failed batch instead of redelivering it
    #[arg(long)]
    pub stop_on_fatal: bool,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// `{public_api_host}/api/{api_version}`
    pub source_base_url: String,
    /// `{contracting_api_host}/api/{api_version}`
    pub target_base_url: String,
    pub api_token: String,
    pub user_agent: String,
    pub error_interval: Duration,
    pub request_timeout: Duration,
    pub cache_db: PathBuf,
    pub log_level: String,
    pub stop_on_fatal: bool,
}

impl BridgeConfig {
    pub fn resolve(cli: &Cli, toml: &TomlConfig) -> Result<Self> {
        Self::resolve_with_defaults(cli, toml, &CompiledDefaults::for_current_platform())
    }

    pub fn resolve_with_defaults(
        cli: &Cli,
        toml: &TomlConfig,
        defaults: &CompiledDefaults,
    ) -> Result<Self> {
        let public_host = pick(&cli.public_api_host, &toml.public_api_host)
            .unwrap_or_else(|| defaults.public_api_host.clone());
        let public_host = validate_host("public_api_host", &public_host)?;

        let contracting_host = match pick(&cli.contracting_api_host, &toml.contracting_api_host) {
            Some(host) => validate_host("contracting_api_host", &host)?,
            None => public_host.clone(),
        };

        let api_version = pick(&cli.api_version, &toml.api_version)
            .unwrap_or_else(|| defaults.api_version.clone());
        let api_version = api_version.trim().trim_matches('/').to_string();
        if api_version.is_empty() {
            return Err(Error::Config("api_version must not be empty".to_string()));
        }

        let api_token =
            pick(&cli.api_token, &toml.api_token).unwrap_or_else(|| defaults.api_token.clone());
        if api_token.trim().is_empty() {
            return Err(Error::Config("api_token must not be empty".to_string()));
        }

        let request_timeout_secs = cli
            .request_timeout
            .or(toml.request_timeout)
            .unwrap_or(defaults.request_timeout_secs);
        if request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout must be at least 1 second".to_string()));
        }

        Ok(Self {
            source_base_url: format!("{}/api/{}", public_host, api_version),
            target_base_url: format!("{}/api/{}", contracting_host, api_version),
            api_token,
            user_agent: pick(&cli.user_agent, &toml.user_agent)
                .unwrap_or_else(|| defaults.user_agent.clone()),
            error_interval: secs_to_duration(
                cli.error_interval
                    .or(toml.error_interval)
                    .unwrap_or(defaults.error_interval_secs),
            ),
            request_timeout: secs_to_duration(request_timeout_secs),
            cache_db: cli
                .cache_db
                .clone()
                .or_else(|| toml.cache_db.clone())
                .unwrap_or_else(|| defaults.cache_db.clone()),
            log_level: resolve_log_level(cli, toml, defaults),
            stop_on_fatal: cli.stop_on_fatal,
        })
    }

    /// Unbounded fixed-delay retries at the error interval
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.error_interval)
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            error_interval: self.error_interval,
            stop_on_fatal: self.stop_on_fatal,
        }
    }
}

/// Log level, needed before the rest of the configuration is validated
pub fn resolve_log_level(cli: &Cli, toml: &TomlConfig, defaults: &CompiledDefaults) -> String {
    pick(&cli.log_level, &toml.logging.level).unwrap_or_else(|| defaults.log_level.clone())
}

/// First non-blank value of the CLI/ENV tier and the TOML tier
fn pick(cli: &Option<String>, toml: &Option<String>) -> Option<String> {
    cli.iter()
        .chain(toml.iter())
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn validate_host(field: &str, host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');

    let rest = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"));

    match rest {
        Some(rest) if !rest.is_empty() => Ok(host.to_string()),
        _ => Err(Error::Config(format!(
            "{} must be an http:// or https:// URL, got {:?}",
            field, host
        ))),
    }
}
