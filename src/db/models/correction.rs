use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Explicit user fix for an OCR string. Always trusted; a later correction
/// for the same key replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCorrection {
    pub ocr_text: String,
    pub resolved_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserCorrection {
    pub const CONFIDENCE: f64 = 1.0;

    pub fn confidence(&self) -> f64 {
        Self::CONFIDENCE
    }
}
