use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::ScanKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub cached_card_count: u64,
    pub total_scans: u64,
    pub successful_scans: u64,
    /// Fraction in [0, 1].
    pub success_rate: f64,
    pub learned_pattern_count: u64,
    pub high_confidence_pattern_count: u64,
    pub correction_count: u64,
    pub scans_by_kind: BTreeMap<ScanKind, u64>,
}

impl StatisticsSnapshot {
    /// Plain-text report for display surfaces.
    pub fn to_report(&self) -> String {
        let mut output = String::from("=== Learning System Statistics ===\n\n");
        output.push_str(&format!("Cached Cards: {}\n", self.cached_card_count));
        output.push_str(&format!("Total Scans: {}\n", self.total_scans));
        output.push_str(&format!("Successful Scans: {}\n", self.successful_scans));
        output.push_str(&format!("Success Rate: {:.2}%\n", self.success_rate * 100.0));
        for (kind, count) in &self.scans_by_kind {
            output.push_str(&format!("  {} scans: {}\n", kind.as_str(), count));
        }
        output.push_str(&format!("Learned OCR Patterns: {}\n", self.learned_pattern_count));
        output.push_str(&format!(
            "High Confidence Patterns: {}\n",
            self.high_confidence_pattern_count
        ));
        output.push_str(&format!("User Corrections: {}\n", self.correction_count));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_formats_rate_as_percentage() {
        let snapshot = StatisticsSnapshot {
            total_scans: 3,
            successful_scans: 2,
            success_rate: 2.0 / 3.0,
            scans_by_kind: BTreeMap::from([(ScanKind::Ocr, 3)]),
            ..StatisticsSnapshot::default()
        };

        let report = snapshot.to_report();
        assert!(report.contains("Success Rate: 66.67%"));
        assert!(report.contains("  ocr scans: 3"));
        assert!(report.contains("User Corrections: 0"));
    }
}
