//! Feed batch handling
//!
//! The crawler that discovers changed tenders lives outside this crate. It
//! hands over pages of tender summaries through a [`FeedSource`]; each page is
//! processed with one concurrent task per tender and acknowledged only after
//! every task reached a terminal state without a fatal error.
//!
//! All tasks of a batch run on the calling task (`join_all`), so the single
//! threaded runtime multiplexes them at their network and storage awaits.

use crate::error::SyncError;
use crate::models::Tender;
use crate::services::http_transport::HttpTransport;
use crate::services::registry_client::RequestContext;
use crate::services::sync_orchestrator::{SyncOrchestrator, SyncReport};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// One page of tender summaries from the feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    pub tenders: Vec<Tender>,
    /// Load-balancer affinity token replayed on every request of the batch
    pub server_id: Option<String>,
}

impl FeedBatch {
    pub fn new(tenders: Vec<Tender>, server_id: Option<String>) -> Self {
        Self { tenders, server_id }
    }
}

/// Outcome of a fully processed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One report per scanned tender
    pub reports: Vec<SyncReport>,
    /// Tenders that did not qualify or were unchanged
    pub skipped: usize,
}

impl BatchReport {
    pub fn transferred_count(&self) -> usize {
        self.reports.iter().map(|r| r.transferred.len()).sum()
    }
}

impl<T: HttpTransport> SyncOrchestrator<T> {
    /// Process every tender of `batch` concurrently and join them all.
    ///
    /// A fatal error in one tender never cancels its siblings; it fails the
    /// batch as a whole so the caller does not acknowledge it.
    pub async fn handle_batch(&self, batch: &FeedBatch) -> Result<BatchReport, SyncError> {
        let ctx = RequestContext::new(batch.server_id.clone());
        let ctx = &ctx;

        tracing::debug!(tenders = batch.tenders.len(), "Handling feed batch");

        let results = join_all(
            batch
                .tenders
                .iter()
                .map(|tender| self.process_listing(tender, ctx)),
        )
        .await;

        let total = results.len();
        let mut failed = 0;
        let mut report = BatchReport::default();

        for (tender, result) in batch.tenders.iter().zip(results) {
            match result {
                Ok(Some(tender_report)) => report.reports.push(tender_report),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(tender_id = %tender.id, error = %e, "Tender processing failed");
                }
            }
        }

        if failed > 0 {
            return Err(SyncError::Batch { failed, total });
        }

        Ok(report)
    }
}

/// Seam to the external feed crawler
#[async_trait]
pub trait FeedSource: Send {
    /// Next page, or `None` once the feed is exhausted
    async fn next_batch(&mut self) -> cbridge_common::Result<Option<FeedBatch>>;

    /// Called once per batch after it was processed without fatal errors
    async fn acknowledge(&mut self, batch: &FeedBatch) -> cbridge_common::Result<()>;
}

#[derive(Deserialize)]
struct RawPage {
    data: Vec<Value>,
    #[serde(default)]
    server_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedLine {
    Listing(Vec<Value>),
    Page(RawPage),
}

/// Parse one feed line: a JSON array of summaries or `{"data": [...], "server_id": ...}`.
///
/// Fails only when the line itself is not a page. A summary with an
/// unexpected shape is logged and left out; its siblings are kept.
pub fn parse_feed_line(line: &str) -> cbridge_common::Result<FeedBatch> {
    let (entries, server_id) = match serde_json::from_str::<FeedLine>(line)? {
        FeedLine::Listing(entries) => (entries, None),
        FeedLine::Page(page) => (page.data, page.server_id),
    };

    let mut tenders = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let tender_id = entry.get("id").map(Value::to_string);
        match serde_json::from_value::<Tender>(entry) {
            Ok(tender) => tenders.push(tender),
            Err(e) => {
                tracing::warn!(
                    position,
                    tender_id = tender_id.as_deref().unwrap_or("<missing>"),
                    error = %e,
                    "Skipping tender summary with unexpected shape"
                );
            }
        }
    }

    Ok(FeedBatch::new(tenders, server_id))
}

/// Newline-delimited JSON feed, one batch per line
pub struct JsonLinesFeed<R> {
    lines: Lines<R>,
    line_number: usize,
    acknowledged: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            acknowledged: 0,
        }
    }

    /// Batches acknowledged so far
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FeedSource for JsonLinesFeed<R> {
    async fn next_batch(&mut self) -> cbridge_common::Result<Option<FeedBatch>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match parse_feed_line(text) {
                Ok(batch) => return Ok(Some(batch)),
                Err(e) => {
                    tracing::warn!(line = self.line_number, error = %e, "Skipping malformed feed line");
                }
            }
        }

        Ok(None)
    }

    async fn acknowledge(&mut self, batch: &FeedBatch) -> cbridge_common::Result<()> {
        self.acknowledged += 1;
        tracing::debug!(
            line = self.line_number,
            tenders = batch.tenders.len(),
            "Feed batch acknowledged"
        );
        Ok(())
    }
}

/// Behaviour of [`run_feed`] on a failed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    /// Wait before redelivering a failed batch
    pub error_interval: Duration,
    /// Return the batch error instead of redelivering
    pub stop_on_fatal: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            error_interval: Duration::from_secs(5),
            stop_on_fatal: false,
        }
    }
}

/// Totals of a [`run_feed`] session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub batches: usize,
    pub failed_attempts: usize,
    pub transferred: usize,
}

/// Drive `source` until it is exhausted.
///
/// A failed batch is redelivered after `error_interval` until it succeeds,
/// or returned as an error when `stop_on_fatal` is set.
pub async fn run_feed<T, S>(
    orchestrator: &SyncOrchestrator<T>,
    source: &mut S,
    options: &FeedOptions,
) -> Result<FeedSummary, SyncError>
where
    T: HttpTransport,
    S: FeedSource + ?Sized,
{
    let mut summary = FeedSummary::default();

    while let Some(batch) = source
        .next_batch()
        .await
        .map_err(|e| SyncError::Feed(e.to_string()))?
    {
        loop {
            match orchestrator.handle_batch(&batch).await {
                Ok(report) => {
                    source
                        .acknowledge(&batch)
                        .await
                        .map_err(|e| SyncError::Feed(e.to_string()))?;
                    summary.batches += 1;
                    summary.transferred += report.transferred_count();
                    break;
                }
                Err(e) => {
                    summary.failed_attempts += 1;

                    if options.stop_on_fatal {
                        tracing::error!(error = %e, "Stopping feed on fatal batch error");
                        return Err(e);
                    }

                    tracing::warn!(
                        error = %e,
                        delay_ms = options.error_interval.as_millis() as u64,
                        "Batch failed, redelivering after error interval"
                    );
                    tokio::time::sleep(options.error_interval).await;
                }
            }
        }
    }

    tracing::info!(
        batches = summary.batches,
        transferred = summary.transferred,
        "Feed exhausted"
    );

    Ok(summary)
}
