//! Registry API client
//!
//! Reads tenders and tender credentials from the public (source) registry and
//! checks/creates contracts in the contracting (target) registry.
//!
//! Every call retries under the injected [`RetryPolicy`]. What counts as
//! transient differs per operation:
//!
//! | operation | retried | returned |
//! |---|---|---|
//! | `get_tender`, `get_tender_credentials` | transport errors, any non-200, malformed envelope | tender / credentials |
//! | `contract_exists` | transport errors | 200 exists, 404 missing, 410 archived, other status as error |
//! | `create_contract` | transport errors, unlisted statuses | 201 created, 409/400 exists, 422 rejected, 403/404/405/410 as `Forbidden` |

use crate::error::RegistryError;
use crate::models::{Contract, Envelope, Tender, TenderCredentials};
use crate::services::http_transport::{HttpMethod, HttpRequest, HttpTransport};
use crate::utils::retry::{retry_with_policy, RetryPolicy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// Statuses that refuse a contract creation for good
pub const FORBIDDEN_CREATE_STATUSES: [u16; 4] = [403, 404, 405, 410];

/// Statuses meaning the contract is already present in the target registry
pub const ALREADY_EXISTS_STATUSES: [u16; 2] = [409, 400];

/// Per-workflow request settings.
///
/// `server_id` is the load-balancer affinity token captured by the feed
/// driver; it is replayed as a `SERVER_ID` cookie on every request of the
/// batch so reads and writes land on the same backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub server_id: Option<String>,
}

impl RequestContext {
    pub fn new(server_id: Option<String>) -> Self {
        Self { server_id }
    }
}

/// Result of an existence check in the target registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractPresence {
    /// 200
    Exists,
    /// 404
    Missing,
    /// 410: archived, must not be synchronized
    Archived,
}

/// Terminal, non-error result of a contract creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// 201
    Created,
    /// 409 (or legacy 400): idempotent success
    AlreadyExists,
    /// 422: permanently rejected, contract is dropped
    Rejected { body: String },
}

/// Client-generated id attached to every request for traceability
pub fn generate_request_id() -> String {
    format!("contracting-data-bridge-req-{}", Uuid::new_v4())
}

/// Registry API client
pub struct RegistryClient<T> {
    transport: T,
    source_base_url: String,
    target_base_url: String,
    authorization: String,
    retry: RetryPolicy,
}

impl<T: HttpTransport> RegistryClient<T> {
    /// `*_base_url` look like `https://host/api/2.5` (no trailing slash needed)
    pub fn new(
        transport: T,
        source_base_url: &str,
        target_base_url: &str,
        api_token: &str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            source_base_url: source_base_url.trim_end_matches('/').to_string(),
            target_base_url: target_base_url.trim_end_matches('/').to_string(),
            authorization: format!("Bearer {}", api_token),
            retry,
        }
    }

    /// Fetch the full tender document
    pub async fn get_tender(
        &self,
        tender_id: &str,
        ctx: &RequestContext,
    ) -> Result<Tender, RegistryError> {
        let url = format!("{}/tenders/{}", self.source_base_url, tender_id);
        let operation = format!("get tender {}", tender_id);

        let data: Value = self.get_envelope(&url, ctx, &operation).await?;

        let tender: Tender =
            serde_json::from_value(data).map_err(|e| RegistryError::InvalidTender {
                tender_id: tender_id.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(tender_id, status = %tender.status, "Got tender from api");
        Ok(tender)
    }

    /// Fetch owner and access token of a tender
    pub async fn get_tender_credentials(
        &self,
        tender_id: &str,
        ctx: &RequestContext,
    ) -> Result<TenderCredentials, RegistryError> {
        let url = format!(
            "{}/tenders/{}/extract_credentials",
            self.source_base_url, tender_id
        );
        let operation = format!("get credentials for tender {}", tender_id);

        self.get_envelope(&url, ctx, &operation).await
    }

    /// Check whether a contract is already present in the target registry
    pub async fn contract_exists(
        &self,
        contract_id: &str,
        ctx: &RequestContext,
    ) -> Result<ContractPresence, RegistryError> {
        let url = format!("{}/contracts/{}", self.target_base_url, contract_id);
        let operation = format!("check contract {}", contract_id);
        let url = url.as_str();

        retry_with_policy(
            &self.retry,
            &operation,
            |e| matches!(e, RegistryError::Transport(_)),
            || async move {
                let response = self
                    .transport
                    .execute(self.request(HttpMethod::Get, url, ctx))
                    .await?;

                match response.status {
                    200 => Ok(ContractPresence::Exists),
                    404 => Ok(ContractPresence::Missing),
                    410 => Ok(ContractPresence::Archived),
                    status => Err(RegistryError::UnexpectedStatus {
                        status,
                        body: response.body,
                    }),
                }
            },
        )
        .await
    }

    /// POST an extended contract to the target registry
    pub async fn create_contract(
        &self,
        contract: &Contract,
        ctx: &RequestContext,
    ) -> Result<CreateOutcome, RegistryError> {
        let url = format!("{}/contracts", self.target_base_url);
        let operation = format!("create contract {}", contract.id);
        let body = serde_json::to_value(Envelope { data: contract })
            .map_err(|e| RegistryError::Parse(e.to_string()))?;
        let (url, body) = (url.as_str(), &body);

        retry_with_policy(
            &self.retry,
            &operation,
            |e| {
                matches!(
                    e,
                    RegistryError::Transport(_) | RegistryError::UnexpectedStatus { .. }
                )
            },
            || async move {
                let request = self
                    .request(HttpMethod::Post, url, ctx)
                    .header("Content-Type", "application/json")
                    .json(body.clone());

                let response = self.transport.execute(request).await?;
                classify_create_status(response.status, response.body)
            },
        )
        .await
    }

    /// GET `url` until it answers 200 with a parseable `{"data": ...}` body
    async fn get_envelope<D: DeserializeOwned>(
        &self,
        url: &str,
        ctx: &RequestContext,
        operation: &str,
    ) -> Result<D, RegistryError> {
        retry_with_policy(&self.retry, operation, |_| true, || async move {
            let response = self
                .transport
                .execute(self.request(HttpMethod::Get, url, ctx))
                .await?;

            if response.status != 200 {
                return Err(RegistryError::UnexpectedStatus {
                    status: response.status,
                    body: response.body,
                });
            }

            serde_json::from_str::<Envelope<D>>(&response.body)
                .map(|envelope| envelope.data)
                .map_err(|e| RegistryError::Parse(e.to_string()))
        })
        .await
    }

    /// Request with the headers every call carries. Set per request, never
    /// as client defaults.
    fn request(&self, method: HttpMethod, url: &str, ctx: &RequestContext) -> HttpRequest {
        let mut request = HttpRequest::new(method, url)
            .header("Authorization", self.authorization.as_str())
            .header("X-Client-Request-ID", generate_request_id());

        if let Some(server_id) = &ctx.server_id {
            request = request.header("Cookie", format!("SERVER_ID={}", server_id));
        }

        request
    }
}

/// Map a create-contract response status to its outcome
pub fn classify_create_status(status: u16, body: String) -> Result<CreateOutcome, RegistryError> {
    match status {
        201 => Ok(CreateOutcome::Created),
        s if ALREADY_EXISTS_STATUSES.contains(&s) => Ok(CreateOutcome::AlreadyExists),
        422 => Ok(CreateOutcome::Rejected { body }),
        s if FORBIDDEN_CREATE_STATUSES.contains(&s) => Err(RegistryError::Forbidden { status, body }),
        _ => Err(RegistryError::UnexpectedStatus { status, body }),
    }
}
