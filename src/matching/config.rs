use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};

/// Tunable thresholds for candidate resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatcherConfig {
    /// Fuzzy candidates scoring below this are dropped. Deliberately lenient.
    pub fuzzy_threshold: f64,

    /// Added to a fuzzy score when the OCR text and the candidate share a word.
    pub word_overlap_bonus: f64,

    /// Learned patterns below this confidence are not used for auto-resolution.
    pub high_confidence_threshold: f64,

    /// Minimum similarity when one string contains the other.
    pub substring_floor: f64,

    /// Words shorter than this (in chars) are ignored by the overlap bonus.
    pub min_word_len: usize,

    pub max_suggestions: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.3,
            word_overlap_bonus: 0.1,
            high_confidence_threshold: 0.8,
            substring_floor: 0.7,
            min_word_len: 3,
            max_suggestions: 10,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("word_overlap_bonus", self.word_overlap_bonus),
            ("high_confidence_threshold", self.high_confidence_threshold),
            ("substring_floor", self.substring_floor),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(LearningError::InvalidConfig(format!(
                    "{field} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.max_suggestions == 0 {
            return Err(LearningError::InvalidConfig(
                "max_suggestions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
