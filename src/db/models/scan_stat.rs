use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Ocr,
    Manual,
    Correction,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanKind::Ocr => "ocr",
            ScanKind::Manual => "manual",
            ScanKind::Correction => "correction",
        }
    }
}

/// Append-only scan outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStat {
    pub id: i64,
    pub scan_kind: ScanKind,
    pub card_name: Option<String>,
    pub succeeded: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Counts over the whole scan log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub by_kind: BTreeMap<ScanKind, u64>,
    pub total_scans: u64,
    pub successful_scans: u64,
    /// Fraction in [0, 1]; 0 when nothing has been scanned.
    pub success_rate: f64,
}

impl StatsSummary {
    pub fn count(&self, kind: ScanKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}
