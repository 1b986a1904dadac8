//! cbridge-contracting - contract replication bridge
//!
//! Two modes:
//! - `--tender-id ID`: synchronize one tender now and exit
//! - default: read feed batches (JSON lines) from stdin until EOF
//!
//! Runs on a single-threaded runtime; tender tasks of a batch interleave at
//! their network and storage awaits.

use anyhow::{Context, Result};
use cbridge_common::config::{load_toml_config, CompiledDefaults};
use cbridge_common::db::init_database;
use cbridge_common::logging::init_tracing;
use cbridge_contracting::config::{resolve_log_level, BridgeConfig, Cli};
use cbridge_contracting::services::feed::{run_feed, JsonLinesFeed};
use cbridge_contracting::services::http_transport::ReqwestTransport;
use cbridge_contracting::{CacheStore, RegistryClient, RequestContext, SyncOrchestrator};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_toml_config(cli.config.as_deref()).context("Failed to load configuration file")?;
    let toml = loaded.config;

    init_tracing(&resolve_log_level(
        &cli,
        &toml,
        &CompiledDefaults::for_current_platform(),
    ));

    info!("Starting cbridge-contracting v{}", env!("CARGO_PKG_VERSION"));
    loaded.origin.log();

    let config = BridgeConfig::resolve(&cli, &toml).context("Invalid configuration")?;
    info!(
        source = %config.source_base_url,
        target = %config.target_base_url,
        error_interval_secs = config.error_interval.as_secs(),
        "Registry endpoints configured"
    );

    let pool = init_database(&config.cache_db)
        .await
        .context("Failed to open cache database")?;

    let retry = config.retry_policy();
    let transport = ReqwestTransport::new(&config.user_agent, config.request_timeout)
        .context("Failed to build HTTP client")?;
    let client = RegistryClient::new(
        transport,
        &config.source_base_url,
        &config.target_base_url,
        &config.api_token,
        retry,
    );
    let orchestrator = SyncOrchestrator::new(client, CacheStore::new(pool.clone(), retry));

    if let Some(tender_id) = cli.tender_id.as_deref() {
        let ctx = RequestContext::new(cli.server_id.clone());
        let report = orchestrator
            .sync_single_tender(tender_id, &ctx)
            .await
            .with_context(|| format!("Failed to sync tender {}", tender_id))?;

        info!(
            tender_id,
            transferred = report.transferred.len(),
            already_synced = report.already_synced.len(),
            archived = report.archived.len(),
            rejected = report.rejected.len(),
            "Single tender sync finished"
        );
    } else {
        info!("Reading tender feed from stdin");
        let mut feed = JsonLinesFeed::new(BufReader::new(tokio::io::stdin()));

        let summary = run_feed(&orchestrator, &mut feed, &config.feed_options())
            .await
            .context("Feed processing stopped")?;

        info!(
            batches = summary.batches,
            failed_attempts = summary.failed_attempts,
            transferred = summary.transferred,
            "Feed processing finished"
        );
    }

    pool.close().await;
    Ok(())
}
