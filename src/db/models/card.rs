//! Cached card names.
//!
//! A row is written whenever an external card lookup succeeds and is only
//! removed by an explicit cache clear.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCacheEntry {
    /// Normalized (lowercase, trimmed) name; primary key.
    pub name: String,
    pub raw_display_name: String,
    pub last_seen: DateTime<Utc>,
    /// Whatever the card-data client returned; opaque to the learning layer.
    pub source_metadata: Value,
}

/// One entry of the in-memory name index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardName {
    pub key: String,
    pub display: String,
}

/// True when there is nothing worth caching.
pub fn metadata_is_empty(metadata: &Value) -> bool {
    match metadata {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
