mod utils;

mod commands;
pub mod db;
pub mod error;
pub mod learning;
pub mod matching;
pub mod settings;
pub mod stats;

use std::path::Path;

use serde_json::Value;

use db::{Database, OcrPattern, UserCorrection};
use error::{LearningError, StoreResultExt};
use learning::FeedbackController;
use matching::{FuzzyCandidate, Matcher, MatcherConfig};
use settings::SettingsStore;
use stats::{StatisticsAggregator, StatisticsSnapshot};

pub use error::Result;
pub use matching::{similarity, MatchMethod, Resolution};

const ENABLE_LOGS: bool = true;

pub const DATABASE_FILE: &str = "learning.sqlite3";
pub const SETTINGS_FILE: &str = "settings.json";

/// One installation's learning layer: a store handle shared by the matcher,
/// the feedback controller and the statistics aggregator.
///
/// Opened once at startup and dropped at shutdown; clones of the inner
/// components all talk to the same store worker.
pub struct CardLearner {
    db: Database,
    matcher: Matcher,
    feedback: FeedbackController,
    stats: StatisticsAggregator,
    settings: Option<SettingsStore>,
}

impl CardLearner {
    /// Open (or create) the store and settings under `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let settings =
            SettingsStore::new(data_dir.join(SETTINGS_FILE)).map_err(LearningError::Settings)?;
        let db = Database::new(data_dir.join(DATABASE_FILE)).store()?;

        let mut learner = Self::with_database(db, settings.matcher()).await?;
        learner.settings = Some(settings);
        Ok(learner)
    }

    /// Build on an already opened store, without a settings file.
    pub async fn with_database(db: Database, config: MatcherConfig) -> Result<Self> {
        let stats = StatisticsAggregator::new(db.clone(), config.high_confidence_threshold);
        let matcher = Matcher::new(db.clone(), config).await?;
        let feedback = FeedbackController::new(db.clone());

        Ok(Self {
            db,
            matcher,
            feedback,
            stats,
            settings: None,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn feedback(&self) -> &FeedbackController {
        &self.feedback
    }

    pub fn statistics(&self) -> &StatisticsAggregator {
        &self.stats
    }

    pub fn config(&self) -> MatcherConfig {
        self.matcher.config()
    }

    /// Apply new thresholds and persist them when a settings file is attached.
    pub fn update_config(&mut self, config: MatcherConfig) -> Result<()> {
        self.matcher.set_config(config.clone())?;
        self.stats = StatisticsAggregator::new(self.db.clone(), config.high_confidence_threshold);
        if let Some(settings) = &self.settings {
            settings
                .update_matcher(config)
                .map_err(LearningError::Settings)?;
        }
        log_info!("Matcher configuration updated");
        Ok(())
    }

    pub async fn resolve(&self, ocr_text: &str) -> Resolution {
        self.matcher.resolve(ocr_text).await
    }

    pub async fn suggestions(&self, ocr_text: &str) -> Vec<FuzzyCandidate> {
        self.matcher.suggestions(ocr_text).await
    }

    pub async fn cache_card(&self, name: &str, metadata: Value) -> Result<bool> {
        self.matcher.cache_card(name, metadata).await
    }

    pub async fn cache_cards(&self, cards: Vec<(String, Value)>) -> Result<usize> {
        self.matcher.cache_cards(cards).await
    }

    pub async fn clear_cache(&self) -> Result<u64> {
        self.matcher.clear_cache().await
    }

    pub async fn record_outcome(
        &self,
        ocr_text: &str,
        resolved_name: Option<&str>,
        accepted: bool,
    ) -> Result<Option<OcrPattern>> {
        self.feedback
            .record_outcome(ocr_text, resolved_name, accepted)
            .await
    }

    pub async fn record_correction(
        &self,
        ocr_text: &str,
        corrected_name: &str,
    ) -> Result<Option<UserCorrection>> {
        self.feedback.record_correction(ocr_text, corrected_name).await
    }

    pub async fn record_manual_lookup(&self, card_name: &str, succeeded: bool) -> Result<()> {
        self.feedback.record_manual_lookup(card_name, succeeded).await
    }

    pub async fn get_statistics(&self) -> Result<StatisticsSnapshot> {
        self.stats.get_statistics().await
    }

    pub async fn export_report(&self) -> Result<String> {
        self.stats.export_report().await
    }
}

/// Entry point for the `cardlearn` binary.
pub fn run() -> anyhow::Result<()> {
    // Info by default; RUST_LOG overrides.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = commands::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(commands::dispatch(cli))
}
