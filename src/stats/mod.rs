mod types;

pub use types::StatisticsSnapshot;

use crate::{
    db::Database,
    error::{Result, StoreResultExt},
};

/// Summaries of the learning store, recomputed on every call.
#[derive(Clone)]
pub struct StatisticsAggregator {
    db: Database,
    high_confidence_threshold: f64,
}

impl StatisticsAggregator {
    pub fn new(db: Database, high_confidence_threshold: f64) -> Self {
        Self {
            db,
            high_confidence_threshold,
        }
    }

    pub async fn get_statistics(&self) -> Result<StatisticsSnapshot> {
        let cached_card_count = self.db.card_count().await.store()?;
        let summary = self.db.aggregate_stats().await.store()?;
        let (learned_pattern_count, high_confidence_pattern_count) = self
            .db
            .pattern_stats(self.high_confidence_threshold)
            .await
            .store()?;
        let correction_count = self.db.correction_count().await.store()?;

        Ok(StatisticsSnapshot {
            cached_card_count,
            total_scans: summary.total_scans,
            successful_scans: summary.successful_scans,
            success_rate: summary.success_rate,
            learned_pattern_count,
            high_confidence_pattern_count,
            correction_count,
            scans_by_kind: summary.by_kind,
        })
    }

    pub async fn export_report(&self) -> Result<String> {
        Ok(self.get_statistics().await?.to_report())
    }
}
