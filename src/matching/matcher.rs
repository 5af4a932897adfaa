use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    db::{helpers::normalize_key, CardName, Database},
    error::{Result, StoreResultExt},
    log_debug, log_info, log_warn,
};

use super::{config::MatcherConfig, index::NameIndex, similarity::normalized_similarity};

const ENABLE_LOGS: bool = true;

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Correction,
    LearnedPattern,
    FuzzyCache,
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Correction => "correction",
            MatchMethod::LearnedPattern => "learned_pattern",
            MatchMethod::FuzzyCache => "fuzzy_cache",
            MatchMethod::None => "none",
        }
    }
}

/// Outcome of [`Matcher::resolve`]. Not finding anything is a normal result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Resolution {
    Correction { name: String },
    LearnedPattern { name: String, confidence: f64 },
    FuzzyCache { name: String, score: f64 },
    NoMatch,
}

impl Resolution {
    pub fn candidate(&self) -> Option<&str> {
        match self {
            Resolution::Correction { name }
            | Resolution::LearnedPattern { name, .. }
            | Resolution::FuzzyCache { name, .. } => Some(name),
            Resolution::NoMatch => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Resolution::Correction { .. } => 1.0,
            Resolution::LearnedPattern { confidence, .. } => *confidence,
            Resolution::FuzzyCache { score, .. } => *score,
            Resolution::NoMatch => 0.0,
        }
    }

    pub fn method(&self) -> MatchMethod {
        match self {
            Resolution::Correction { .. } => MatchMethod::Correction,
            Resolution::LearnedPattern { .. } => MatchMethod::LearnedPattern,
            Resolution::FuzzyCache { .. } => MatchMethod::FuzzyCache,
            Resolution::NoMatch => MatchMethod::None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Resolution::NoMatch)
    }
}

/// Resolution stages. Earlier stages win outright, whatever later ones
/// would have scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Correction,
    LearnedPattern,
    FuzzyCache,
}

pub const STRATEGY_ORDER: [MatchStrategy; 3] = [
    MatchStrategy::Correction,
    MatchStrategy::LearnedPattern,
    MatchStrategy::FuzzyCache,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyCandidate {
    pub name: String,
    pub key: String,
    pub score: f64,
}

fn significant_words(text: &str, min_len: usize) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty() && word.chars().count() >= min_len)
        .collect()
}

/// Score every cached name against `key` (already normalized) and return the
/// ones that clear the fuzzy threshold, best first.
///
/// Ties are broken by the shorter name, then lexicographically.
pub fn rank_candidates(key: &str, names: &[CardName], config: &MatcherConfig) -> Vec<FuzzyCandidate> {
    if key.is_empty() {
        return Vec::new();
    }

    let query_words = significant_words(key, config.min_word_len);
    let mut candidates: Vec<FuzzyCandidate> = names
        .iter()
        .filter_map(|name| {
            let mut score = normalized_similarity(key, &name.key, config.substring_floor);
            if !query_words.is_empty() {
                let shares_word = significant_words(&name.key, config.min_word_len)
                    .iter()
                    .any(|word| query_words.contains(word));
                if shares_word {
                    score = (score + config.word_overlap_bonus).min(1.0);
                }
            }

            (score >= config.fuzzy_threshold).then(|| FuzzyCandidate {
                name: name.display.clone(),
                key: name.key.clone(),
                score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.key.chars().count().cmp(&b.key.chars().count()))
            .then_with(|| a.key.cmp(&b.key))
    });
    candidates
}

/// Resolves OCR text to a card name: user corrections first, then trusted
/// learned patterns, then fuzzy search over the cached names.
///
/// The matcher owns no durable state. Its name index mirrors the card cache
/// and is rebuilt after every cache write made through it.
#[derive(Clone)]
pub struct Matcher {
    db: Database,
    index: Arc<NameIndex>,
    refresh_lock: Arc<Mutex<()>>,
    config: Arc<RwLock<MatcherConfig>>,
}

impl Matcher {
    /// Build a matcher and load the name index. A store failure here is
    /// logged rather than returned: the matcher then runs without cached
    /// names until a later refresh succeeds.
    pub async fn new(db: Database, config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        let matcher = Self {
            db,
            index: Arc::new(NameIndex::new()),
            refresh_lock: Arc::new(Mutex::new(())),
            config: Arc::new(RwLock::new(config)),
        };

        if let Err(err) = matcher.refresh_index().await {
            log_warn!("Name index not loaded, fuzzy search disabled until refresh: {err}");
        }

        Ok(matcher)
    }

    pub fn config(&self) -> MatcherConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_config(&self, config: MatcherConfig) -> Result<()> {
        config.validate()?;
        let mut guard = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = config;
        Ok(())
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    /// Reload the name index from the store. Returns the number of names.
    pub async fn refresh_index(&self) -> Result<usize> {
        let _guard = self.refresh_lock.lock().await;
        let names = self.db.load_card_index().await.store()?;
        let count = self.index.replace(names);
        log_info!("Name index refreshed with {count} cards");
        Ok(count)
    }

    pub async fn resolve(&self, ocr_text: &str) -> Resolution {
        let key = normalize_key(ocr_text);
        if key.is_empty() {
            return Resolution::NoMatch;
        }

        let config = self.config();
        for strategy in STRATEGY_ORDER {
            if let Some(resolution) = self.apply(strategy, &key, &config).await {
                log_debug!(
                    "Resolved '{key}' via {} ({:.2})",
                    resolution.method().as_str(),
                    resolution.confidence()
                );
                return resolution;
            }
        }

        Resolution::NoMatch
    }

    /// Ranked fuzzy candidates for `ocr_text`, capped at `max_suggestions`.
    /// Corrections and patterns are not consulted.
    pub async fn suggestions(&self, ocr_text: &str) -> Vec<FuzzyCandidate> {
        let key = normalize_key(ocr_text);
        if key.is_empty() {
            return Vec::new();
        }

        let config = self.config();
        self.ensure_index().await;
        let mut candidates = rank_candidates(&key, &self.index.snapshot(), &config);
        candidates.truncate(config.max_suggestions);
        candidates
    }

    async fn apply(
        &self,
        strategy: MatchStrategy,
        key: &str,
        config: &MatcherConfig,
    ) -> Option<Resolution> {
        match strategy {
            MatchStrategy::Correction => match self.db.get_correction(key).await {
                Ok(found) => found.map(|correction| Resolution::Correction {
                    name: correction.resolved_name,
                }),
                Err(err) => {
                    log_warn!("Correction lookup failed for '{key}', continuing degraded: {err:#}");
                    None
                }
            },
            MatchStrategy::LearnedPattern => match self.db.get_pattern(key).await {
                Ok(found) => found
                    .filter(|pattern| pattern.is_trusted(config.high_confidence_threshold))
                    .map(|pattern| Resolution::LearnedPattern {
                        name: pattern.resolved_name,
                        confidence: pattern.confidence,
                    }),
                Err(err) => {
                    log_warn!("Pattern lookup failed for '{key}', continuing degraded: {err:#}");
                    None
                }
            },
            MatchStrategy::FuzzyCache => {
                self.ensure_index().await;
                rank_candidates(key, &self.index.snapshot(), config)
                    .into_iter()
                    .next()
                    .map(|best| Resolution::FuzzyCache {
                        name: best.name,
                        score: best.score,
                    })
            }
        }
    }

    async fn ensure_index(&self) {
        if self.index.is_loaded() {
            return;
        }
        if let Err(err) = self.refresh_index().await {
            log_warn!("Name index still unavailable: {err}");
        }
    }

    /// Cache a card after a successful external lookup and refresh the index.
    /// Returns false when the entry was skipped (empty name or metadata).
    pub async fn cache_card(&self, name: &str, metadata: Value) -> Result<bool> {
        let written = self.db.upsert_card(name, metadata).await.store()?;
        if written {
            self.refresh_index().await?;
        }
        Ok(written)
    }

    pub async fn cache_cards(&self, cards: Vec<(String, Value)>) -> Result<usize> {
        let written = self.db.upsert_cards(cards).await.store()?;
        if written > 0 {
            self.refresh_index().await?;
        }
        Ok(written)
    }

    /// Remove every cached card; learned data is untouched.
    pub async fn clear_cache(&self) -> Result<u64> {
        let removed = self.db.clear_card_cache().await.store()?;
        self.refresh_index().await?;
        Ok(removed)
    }
}
