//! Contract enrichment
//!
//! Fills a contract with the tender-level data the contracting registry
//! needs and repairs known data-quality defects. The steps run in a fixed
//! order; the value and supplier fallbacks reuse the award located for the
//! items fallback.
//!
//! Applying [`extend_contract`] to its own output returns it unchanged.

use crate::models::{is_present, Award, Contract, Item, Tender};

/// First award of the tender whose id equals the contract's `awardId`
pub fn find_award<'a>(tender: &'a Tender, contract: &Contract) -> Option<&'a Award> {
    let award_id = contract.award_id.as_deref()?;
    tender
        .awards()
        .iter()
        .find(|award| award.id.as_deref() == Some(award_id))
}

/// Return `contract` enriched from `tender` and its related award
pub fn extend_contract(mut contract: Contract, tender: &Tender) -> Contract {
    let contract_key = contract.id.to_string();
    let tender_key = tender.id.to_string();
    let (contract_id, tender_id) = (contract_key.as_str(), tender_key.as_str());

    contract.tender_id = Some(tender.id.clone());
    if tender.procuring_entity.is_some() {
        contract.procuring_entity = tender.procuring_entity.clone();
    }
    if let Some(mode) = tender.mode.as_ref().filter(|mode| !mode.is_empty()) {
        contract.mode = Some(mode.clone());
    }

    let award = find_award(tender, &contract);

    if !contract.has_items() {
        contract.items = fallback_items(tender, award, contract_id);
    }

    if contract.items.as_ref().is_some_and(|items| items.is_empty()) {
        tracing::debug!(contract_id, "Clearing empty items list");
        contract.items = None;
    }

    if !contract.has_items() {
        tracing::warn!(contract_id, tender_id, "Contract does not contain items info");
    }

    for item in contract.items.iter_mut().flatten() {
        repair_delivery_date(item, contract_id);
    }

    if !contract.has_value() {
        match award.and_then(|a| a.value.as_ref()).filter(|v| is_present(Some(v))) {
            Some(value) => contract.value = Some(value.clone()),
            None => tracing::info!(contract_id, "No value found with related award"),
        }
    }

    if !contract.has_suppliers() {
        match award
            .and_then(|a| a.suppliers.as_ref())
            .filter(|suppliers| !suppliers.is_empty())
        {
            Some(suppliers) => contract.suppliers = Some(suppliers.clone()),
            None => tracing::info!(contract_id, "No suppliers found with related award"),
        }
    }

    contract
}

/// Items for a contract that has none
fn fallback_items(tender: &Tender, award: Option<&Award>, contract_id: &str) -> Option<Vec<Item>> {
    if !tender.has_lots() {
        tracing::info!(contract_id, tender_id = %tender.id, "Copying all tender items into contract");
        return Some(tender.items.clone().unwrap_or_default());
    }

    let Some(award) = award else {
        tracing::warn!(contract_id, tender_id = %tender.id, "Related award not found for contract");
        return None;
    };

    if let Some(items) = award.items.as_ref().filter(|items| !items.is_empty()) {
        tracing::info!(contract_id, award_id = award.id.as_deref().unwrap_or_default(), "Copying items from related award");
        return Some(items.clone());
    }

    let lot_id = award.lot_id.as_deref();
    tracing::info!(contract_id, lot_id = lot_id.unwrap_or_default(), "Copying items matching related lot");

    let items = tender
        .items
        .iter()
        .flatten()
        .filter(|item| lot_id.is_some() && item.related_lot.as_deref() == lot_id)
        .cloned()
        .collect();

    Some(items)
}

/// Drop `startDate` when it is after `endDate`. ISO-8601 strings compare
/// lexicographically.
fn repair_delivery_date(item: &mut Item, contract_id: &str) {
    let Some(delivery) = item.delivery_date.as_mut() else {
        return;
    };

    let mismatch = match (delivery.start_date.as_deref(), delivery.end_date.as_deref()) {
        (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => start > end,
        _ => false,
    };

    if mismatch {
        tracing::info!(
            contract_id,
            start_date = delivery.start_date.as_deref().unwrap_or_default(),
            end_date = delivery.end_date.as_deref().unwrap_or_default(),
            "Found delivery dates mismatch, startDate cleaned"
        );
        delivery.start_date = None;
    }
}
