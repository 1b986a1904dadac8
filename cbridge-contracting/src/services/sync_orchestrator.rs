//! Sync orchestrator
//!
//! Drives one tender from feed summary to replicated contracts:
//!
//! 1. Qualify the summary (feed path only)
//! 2. Skip the tender while its checkpoint matches `dateModified` (feed path only)
//! 3. Fetch the full tender and its credentials
//! 4. For each active contract, in listed order: cache check → existence
//!    check → extend → create
//! 5. Record the tender checkpoint once the scan completed
//!
//! Re-entrant: a tender that failed half way can be processed again, already
//! created contracts are found by the cache or the existence check, and a
//! duplicate create is answered with 409.

use crate::db::cache::CacheStore;
use crate::error::{RegistryError, SyncError};
use crate::models::{Contract, RecordId, Tender, TenderCredentials};
use crate::services::contract_extender::extend_contract;
use crate::services::http_transport::HttpTransport;
use crate::services::registry_client::{ContractPresence, CreateOutcome, RegistryClient, RequestContext};
use crate::services::tender_qualifier::qualifies;

/// Stable `message_id` values carried by outcome log lines
pub mod message_id {
    pub const SKIP_NOT_MODIFIED: &str = "DATABRIDGE_SKIP_NOT_MODIFIED";
    pub const TENDER_PROCESS: &str = "DATABRIDGE_TENDER_PROCESS";
    pub const CACHED: &str = "DATABRIDGE_CACHED";
    pub const CONTRACT_TO_SYNC: &str = "DATABRIDGE_CONTRACT_TO_SYNC";
    pub const CONTRACT_ARCHIVED: &str = "DATABRIDGE_CONTRACT_ARCHIVED";
    pub const CONTRACT_EXISTS: &str = "DATABRIDGE_CONTRACT_EXISTS";
    pub const CONTRACT_CREATED: &str = "DATABRIDGE_CONTRACT_CREATED";
    pub const CONTRACT_REJECTED: &str = "DATABRIDGE_CONTRACT_REJECTED";
    pub const EXCEPTION: &str = "DATABRIDGE_EXCEPTION";
}

/// Per-contract terminal outcomes of one tender scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub tender_id: String,
    /// Created in the target registry by this scan
    pub transferred: Vec<RecordId>,
    /// Known from the cache, the existence check, or a 409 answer
    pub already_synced: Vec<RecordId>,
    /// Existence check answered 410
    pub archived: Vec<RecordId>,
    /// Create answered 422; dropped
    pub rejected: Vec<RecordId>,
    /// Contracts not in status "active"
    pub skipped_inactive: Vec<RecordId>,
}

impl SyncReport {
    pub fn new(tender_id: impl Into<String>) -> Self {
        Self {
            tender_id: tender_id.into(),
            ..Default::default()
        }
    }
}

enum ContractOutcome {
    Transferred,
    AlreadySynced,
    Archived,
    Rejected,
}

/// Per-tender workflow over an injected registry client and cache store
pub struct SyncOrchestrator<T> {
    client: RegistryClient<T>,
    cache: CacheStore,
}

impl<T: HttpTransport> SyncOrchestrator<T> {
    pub fn new(client: RegistryClient<T>, cache: CacheStore) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Feed path: process one tender summary delivered by the feed.
    ///
    /// Returns `Ok(None)` when the tender does not qualify or has not changed
    /// since the last completed scan.
    pub async fn process_listing(
        &self,
        summary: &Tender,
        ctx: &RequestContext,
    ) -> Result<Option<SyncReport>, SyncError> {
        if !qualifies(summary) {
            return Ok(None);
        }

        if self.cache.is_tender_unchanged(summary).await? {
            tracing::info!(
                tender_id = %summary.id,
                message_id = message_id::SKIP_NOT_MODIFIED,
                "Tender not modified from last check. Skipping"
            );
            return Ok(None);
        }

        tracing::info!(tender_id = %summary.id, message_id = message_id::TENDER_PROCESS, "Put tender to process");

        let report = self
            .scan_tender(&summary.id.as_key(), summary.date_modified.as_deref(), ctx)
            .await?;

        Ok(Some(report))
    }

    /// On-demand path: synchronize the named tender now, without qualification
    pub async fn sync_single_tender(
        &self,
        tender_id: &str,
        ctx: &RequestContext,
    ) -> Result<SyncReport, SyncError> {
        tracing::info!(tender_id, "Syncing single tender");
        self.scan_tender(tender_id, None, ctx).await
    }

    async fn scan_tender(
        &self,
        tender_id: &str,
        checkpoint: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(tender_id);

        let tender = match self.client.get_tender(tender_id, ctx).await {
            Ok(tender) => tender,
            Err(RegistryError::InvalidTender { reason, .. }) => {
                tracing::warn!(tender_id, reason = %reason, "Skipping tender with unexpected shape");
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(contracts) = tender.contracts.as_deref() else {
            tracing::warn!(tender_id, "No contracts found in tender");
            return Ok(report);
        };

        tracing::info!(tender_id, "Getting credentials for tender");
        let credentials = self.client.get_tender_credentials(tender_id, ctx).await?;

        for contract in contracts {
            let outcome = self
                .sync_contract(contract, &tender, &credentials, ctx)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        tender_id,
                        contract_id = %contract.id,
                        error = %e,
                        message_id = message_id::EXCEPTION,
                        "Fatal error, aborting tender scan"
                    );
                })?;

            let bucket = match outcome {
                Some(ContractOutcome::Transferred) => &mut report.transferred,
                Some(ContractOutcome::AlreadySynced) => &mut report.already_synced,
                Some(ContractOutcome::Archived) => &mut report.archived,
                Some(ContractOutcome::Rejected) => &mut report.rejected,
                None => &mut report.skipped_inactive,
            };
            bucket.push(contract.id.clone());
        }

        self.cache
            .record_tender_checkpoint(tender_id, checkpoint.or(tender.date_modified.as_deref()))
            .await?;

        if report.transferred.is_empty() {
            tracing::info!(tender_id, "Tender does not contain contracts to transfer");
        } else {
            let transferred: Vec<String> = report.transferred.iter().map(RecordId::as_key).collect();
            tracing::info!(tender_id, transferred = ?transferred, "Successfully transferred contracts");
        }

        Ok(report)
    }

    /// One contract to its terminal outcome; `None` for inactive contracts
    async fn sync_contract(
        &self,
        contract: &Contract,
        tender: &Tender,
        credentials: &TenderCredentials,
        ctx: &RequestContext,
    ) -> Result<Option<ContractOutcome>, SyncError> {
        let contract_key = contract.id.as_key();
        let contract_id = contract_key.as_str();
        let tender_key = tender.id.as_key();
        let tender_id = tender_key.as_str();

        if !contract.is_active() {
            tracing::debug!(contract_id, status = %contract.status, "Skip contract in status");
            return Ok(None);
        }

        if self.cache.is_contract_synced(contract_id).await? {
            tracing::info!(contract_id, tender_id, message_id = message_id::CACHED, "Contract exists in local cache");
            return Ok(Some(ContractOutcome::AlreadySynced));
        }

        match self.client.contract_exists(contract_id, ctx).await? {
            ContractPresence::Missing => {
                tracing::info!(contract_id, tender_id, message_id = message_id::CONTRACT_TO_SYNC, "Sync contract");
            }
            ContractPresence::Archived => {
                tracing::info!(
                    contract_id,
                    tender_id,
                    message_id = message_id::CONTRACT_ARCHIVED,
                    "Contract has been archived"
                );
                return Ok(Some(ContractOutcome::Archived));
            }
            ContractPresence::Exists => {
                self.cache.mark_contract_synced(contract_id).await?;
                tracing::info!(contract_id, tender_id, message_id = message_id::CONTRACT_EXISTS, "Contract exists");
                return Ok(Some(ContractOutcome::AlreadySynced));
            }
        }

        tracing::info!(contract_id, tender_id, "Extending contract with extra data");
        let mut extended = extend_contract(contract.clone(), tender);
        extended.owner = Some(credentials.owner.clone());
        extended.tender_token = Some(credentials.tender_token.clone());

        tracing::info!(contract_id, tender_id, "Creating contract");
        match self.client.create_contract(&extended, ctx).await? {
            CreateOutcome::Created => {
                self.cache.mark_contract_synced(contract_id).await?;
                tracing::info!(
                    contract_id,
                    tender_id,
                    message_id = message_id::CONTRACT_CREATED,
                    "Successfully created contract"
                );
                Ok(Some(ContractOutcome::Transferred))
            }
            CreateOutcome::AlreadyExists => {
                self.cache.mark_contract_synced(contract_id).await?;
                tracing::info!(
                    contract_id,
                    tender_id,
                    message_id = message_id::CONTRACT_EXISTS,
                    "Contract already exists in contracting registry"
                );
                Ok(Some(ContractOutcome::AlreadySynced))
            }
            CreateOutcome::Rejected { body } => {
                tracing::error!(
                    contract_id,
                    tender_id,
                    body = %body,
                    message_id = message_id::CONTRACT_REJECTED,
                    "Contract rejected by contracting registry, dropped"
                );
                Ok(Some(ContractOutcome::Rejected))
            }
        }
    }
}
