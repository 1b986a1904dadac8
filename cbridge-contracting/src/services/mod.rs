//! Service modules for contract synchronization
//!
//! Leaf-first: the qualifier and extender are pure, the registry client sits
//! on the HTTP transport seam, the orchestrator drives one tender, and the
//! feed module fans batches of tenders out over the orchestrator.

pub mod contract_extender;
pub mod feed;
pub mod http_transport;
pub mod registry_client;
pub mod sync_orchestrator;
pub mod tender_qualifier;

pub use contract_extender::{extend_contract, find_award};
pub use feed::{run_feed, BatchReport, FeedBatch, FeedOptions, FeedSource, FeedSummary, JsonLinesFeed};
pub use http_transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use registry_client::{ContractPresence, CreateOutcome, RegistryClient, RequestContext};
pub use sync_orchestrator::{SyncOrchestrator, SyncReport};
pub use tender_qualifier::qualifies;
