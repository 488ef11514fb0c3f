// src/models/property.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Status;

/// Schema-less listing document as produced by a parser.
pub type Document = Map<String, Value>;

/// One row of a projection query, keyed by output name.
pub type Row = Map<String, Value>;

/// A stored listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub key: String,
    pub status: Status,
    pub data: Document,
    pub updated_at: DateTime<Utc>,
}

/// Display fields projected for one listing in a status bucket.
///
/// Documents carry no schema, so projected fields keep whatever JSON type the
/// listing stored; the `*_text` accessors render them for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub key: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub address: Value,
    #[serde(default)]
    pub price: Value,
}

impl ListingSummary {
    /// Listing id as plain text, whether stored as a number or a string.
    pub fn id_text(&self) -> String {
        text(&self.id).unwrap_or_default()
    }

    pub fn description_text(&self) -> Option<String> {
        text(&self.description)
    }

    pub fn address_text(&self) -> Option<String> {
        text(&self.address)
    }

    pub fn price_text(&self) -> Option<String> {
        text(&self.price)
    }
}

/// Strings verbatim, null as absent, anything else as its JSON text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
