//! Registry data model
//!
//! Tender, Lot, Award, Contract and Item mirror the JSON documents served by
//! the registry API. Only the fields the bridge reads or writes are typed;
//! everything else is carried through untouched in `extra` so a contract is
//! forwarded to the target registry with all of its original attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier as it appears on the wire: registries use strings, fixtures
/// and legacy records sometimes use integers. Serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Cache/URL key form
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

/// Tender procedure status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TenderStatus {
    Draft,
    Active,
    ActiveQualification,
    ActiveAwarded,
    Complete,
    Unsuccessful,
    Cancelled,
    /// Any status this bridge does not act on (tendering, pre-qualification, ...)
    Other(String),
}

impl TenderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TenderStatus::Draft => "draft",
            TenderStatus::Active => "active",
            TenderStatus::ActiveQualification => "active.qualification",
            TenderStatus::ActiveAwarded => "active.awarded",
            TenderStatus::Complete => "complete",
            TenderStatus::Unsuccessful => "unsuccessful",
            TenderStatus::Cancelled => "cancelled",
            TenderStatus::Other(s) => s,
        }
    }
}

impl Default for TenderStatus {
    fn default() -> Self {
        TenderStatus::Other(String::new())
    }
}

impl From<String> for TenderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "draft" => TenderStatus::Draft,
            "active" => TenderStatus::Active,
            "active.qualification" => TenderStatus::ActiveQualification,
            "active.awarded" => TenderStatus::ActiveAwarded,
            "complete" => TenderStatus::Complete,
            "unsuccessful" => TenderStatus::Unsuccessful,
            "cancelled" => TenderStatus::Cancelled,
            _ => TenderStatus::Other(value),
        }
    }
}

impl From<TenderStatus> for String {
    fn from(value: TenderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-division of a tender's procurement scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lot {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDate {
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Procured item (shared shape between tenders, awards and contracts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "relatedLot", default, skip_serializing_if = "Option::is_none")]
    pub related_lot: Option<String>,
    #[serde(rename = "deliveryDate", default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DeliveryDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Procurement decision; fallback source of items/value/suppliers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "lotID", default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contract embedded in a tender, and the body posted to the target registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: RecordId,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "awardId", default, skip_serializing_if = "Option::is_none")]
    pub award_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Value>>,
    #[serde(rename = "procuringEntity", default, skip_serializing_if = "Option::is_none")]
    pub procuring_entity: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contract {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// `value` counts as missing when absent, null or an empty object
    pub fn has_value(&self) -> bool {
        is_present(self.value.as_ref())
    }

    pub fn has_items(&self) -> bool {
        self.items.as_ref().is_some_and(|items| !items.is_empty())
    }

    pub fn has_suppliers(&self) -> bool {
        self.suppliers.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Tender as fetched from the source registry, or as summarised by the feed
/// (the feed only fills `id`, `status`, `procurementMethodType`, `lots` and
/// `dateModified`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    pub id: RecordId,
    #[serde(default)]
    pub status: TenderStatus,
    #[serde(rename = "procurementMethodType", default, skip_serializing_if = "Option::is_none")]
    pub procurement_method_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lots: Option<Vec<Lot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards: Option<Vec<Award>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    #[serde(rename = "procuringEntity", default, skip_serializing_if = "Option::is_none")]
    pub procuring_entity: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<Vec<Contract>>,
    #[serde(rename = "dateModified", default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tender {
    /// Lots present and non-empty
    pub fn has_lots(&self) -> bool {
        self.lots.as_ref().is_some_and(|lots| !lots.is_empty())
    }

    pub fn awards(&self) -> &[Award] {
        self.awards.as_deref().unwrap_or_default()
    }
}

/// Owner identity and access token returned by `extract_credentials`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderCredentials {
    pub owner: String,
    pub tender_token: String,
}

/// `{"data": ...}` wrapper used by every registry endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Truthiness of an optional JSON value: absent, null, `{}`, `[]` and `""`
/// all count as missing.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(list)) => !list.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
