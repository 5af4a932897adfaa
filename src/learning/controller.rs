use crate::{
    db::{helpers::normalize_key, Database, OcrPattern, ScanKind, UserCorrection},
    error::{Result, StoreResultExt},
    log_info,
};

const ENABLE_LOGS: bool = true;

/// Writes scan outcomes back into the learning store.
///
/// Holds nothing but a store handle; every call is durable before it returns.
#[derive(Clone)]
pub struct FeedbackController {
    db: Database,
}

impl FeedbackController {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Report what happened after the caller tried to use a candidate.
    ///
    /// Always appends an OCR scan stat. When a name was involved, the
    /// (`ocr_text`, name) mapping gains one observation, counted as a success
    /// only if `accepted`. Rejections lower that mapping's confidence without
    /// erasing its history; other names learned for the same text are left
    /// alone. Returns the updated mapping, if any.
    pub async fn record_outcome(
        &self,
        ocr_text: &str,
        resolved_name: Option<&str>,
        accepted: bool,
    ) -> Result<Option<OcrPattern>> {
        let name = resolved_name
            .map(str::trim)
            .filter(|name| !name.is_empty());

        self.db
            .record_stat(ScanKind::Ocr, accepted, name.map(str::to_string))
            .await
            .store()?;

        let Some(name) = name else {
            return Ok(None);
        };

        // Blank OCR text yields no pattern; the scan itself is already counted.
        let pattern = self.db.upsert_pattern(ocr_text, name, accepted).await.store()?;
        if let Some(pattern) = &pattern {
            log_info!(
                "Pattern '{}' -> '{}' now {}/{} ({:.2})",
                pattern.ocr_text,
                pattern.resolved_name,
                pattern.success_count,
                pattern.total_count,
                pattern.confidence
            );
        }
        Ok(pattern)
    }

    /// Store an explicit user correction. It replaces any earlier correction
    /// for the same text and is counted as a successful correction event.
    pub async fn record_correction(
        &self,
        ocr_text: &str,
        corrected_name: &str,
    ) -> Result<Option<UserCorrection>> {
        let corrected_name = corrected_name.trim();
        let has_content = !normalize_key(ocr_text).is_empty() && !corrected_name.is_empty();

        let correction = if has_content {
            let correction = self
                .db
                .upsert_correction(ocr_text, corrected_name)
                .await
                .store()?;
            self.db
                .upsert_pattern(ocr_text, corrected_name, true)
                .await
                .store()?;
            correction
        } else {
            None
        };

        let card_name = (!corrected_name.is_empty()).then(|| corrected_name.to_string());
        self.db
            .record_stat(ScanKind::Correction, true, card_name)
            .await
            .store()?;

        if let Some(correction) = &correction {
            log_info!(
                "Correction stored: '{}' -> '{}'",
                correction.ocr_text,
                correction.resolved_name
            );
        }
        Ok(correction)
    }

    /// The user typed a card name instead of scanning it.
    pub async fn record_manual_lookup(&self, card_name: &str, succeeded: bool) -> Result<()> {
        let card_name = card_name.trim();
        let card_name = (!card_name.is_empty()).then(|| card_name.to_string());
        self.db
            .record_stat(ScanKind::Manual, succeeded, card_name)
            .await
            .store()?;
        Ok(())
    }
}
