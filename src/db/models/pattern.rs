use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Learned mapping from a normalized OCR string to a card name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPattern {
    pub ocr_text: String,
    pub resolved_name: String,
    pub success_count: u64,
    pub total_count: u64,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl OcrPattern {
    /// `success_count / total_count`, 0 for an unobserved pattern.
    pub fn ratio(success_count: u64, total_count: u64) -> f64 {
        if total_count == 0 {
            0.0
        } else {
            success_count as f64 / total_count as f64
        }
    }

    pub fn is_trusted(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
