use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::ScanKind;

/// Lookup key used by every record family: lowercase with surrounding
/// whitespace removed.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_scan_kind(value: &str) -> Result<ScanKind> {
    match value {
        "ocr" => Ok(ScanKind::Ocr),
        "manual" => Ok(ScanKind::Manual),
        "correction" => Ok(ScanKind::Correction),
        other => Err(anyhow!("unknown scan kind {other}")),
    }
}
