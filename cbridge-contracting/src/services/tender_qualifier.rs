//! Tender qualification
//!
//! Decides from a feed summary whether a tender is worth fetching in full.
//! Status-based: a tender qualifies once it is past tendering and either one
//! of its lots is complete, or it has no lots and is complete itself.
//! Procedures that never produce contracts here are rejected up front.

use crate::models::{Tender, TenderStatus};

/// Procurement method types whose contracts are not replicated
pub const DISALLOWED_PROCUREMENT_METHOD_TYPES: [&str; 3] =
    ["competitiveDialogueUA", "competitiveDialogueEU", "esco"];

/// Statuses in which a tender may carry contracts
const CONTRACTING_STATUSES: [TenderStatus; 4] = [
    TenderStatus::ActiveQualification,
    TenderStatus::Active,
    TenderStatus::ActiveAwarded,
    TenderStatus::Complete,
];

pub fn is_disallowed_method(tender: &Tender) -> bool {
    tender
        .procurement_method_type
        .as_deref()
        .is_some_and(|method| DISALLOWED_PROCUREMENT_METHOD_TYPES.contains(&method))
}

/// Whether the tender should be processed at all. No side effects besides
/// logging.
pub fn qualifies(tender: &Tender) -> bool {
    if is_disallowed_method(tender) {
        tracing::info!(
            tender_id = %tender.id,
            procurement_method_type = tender.procurement_method_type.as_deref().unwrap_or_default(),
            "Skipping tender with disallowed procurement method"
        );
        return false;
    }

    if !CONTRACTING_STATUSES.contains(&tender.status) {
        tracing::debug!(tender_id = %tender.id, status = %tender.status, "Skipping tender in status");
        return false;
    }

    if tender.has_lots() {
        let any_complete = tender
            .lots
            .iter()
            .flatten()
            .any(|lot| lot.is_complete());

        if any_complete {
            tracing::info!(tender_id = %tender.id, status = %tender.status, "Found multilot tender with complete lot");
        }
        return any_complete;
    }

    if tender.status == TenderStatus::Complete {
        tracing::info!(tender_id = %tender.id, "Found tender in complete status");
        return true;
    }

    false
}
