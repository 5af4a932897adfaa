use cardlearn_lib::{
    db::{Database, ScanKind},
    error::LearningError,
    matching::MatcherConfig,
    similarity, CardLearner, MatchMethod, Resolution,
};
use serde_json::json;
use tempfile::TempDir;

async fn seeded(dir: &TempDir, names: &[&str]) -> CardLearner {
    let learner = CardLearner::open(dir.path()).await.unwrap();
    let cards = names
        .iter()
        .map(|name| (name.to_string(), json!({ "name": name, "set": "Base" })))
        .collect();
    learner.cache_cards(cards).await.unwrap();
    learner
}

#[tokio::test]
async fn learned_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let learner = seeded(&dir, &["Pikachu", "Charizard"]).await;
        learner.record_outcome("Pikachv", Some("Pikachu"), true).await.unwrap();
        learner.record_correction("Charzrd", "Charizard").await.unwrap();
    }

    let learner = CardLearner::open(dir.path()).await.unwrap();
    assert_eq!(learner.matcher().index().len(), 2);

    let pattern = learner.database().get_pattern("pikachv").await.unwrap().unwrap();
    assert_eq!(pattern.total_count, 1);
    assert_eq!(
        learner.resolve("charzrd").await,
        Resolution::Correction { name: "Charizard".into() }
    );

    let stats = learner.get_statistics().await.unwrap();
    assert_eq!(stats.cached_card_count, 2);
    assert_eq!(stats.total_scans, 2);
    assert_eq!(stats.correction_count, 1);
}

#[tokio::test]
async fn scan_flow_promotes_pattern_after_feedback() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Pikachu", "Charizard", "Bulbasaur"]).await;

    let first = learner.resolve("Pikachu").await;
    assert_eq!(first.candidate(), Some("Pikachu"));
    assert_eq!(first.confidence(), 1.0);
    assert_eq!(first.method(), MatchMethod::FuzzyCache);

    learner
        .record_outcome("Pikachu", first.candidate(), true)
        .await
        .unwrap();

    let second = learner.resolve("  PIKACHU ").await;
    assert_eq!(second.method(), MatchMethod::LearnedPattern);
    assert_eq!(second.candidate(), Some("Pikachu"));
}

#[tokio::test]
async fn rejection_demotes_pattern_back_to_fuzzy() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Pikachu"]).await;

    learner.record_outcome("pika", Some("Pikachu"), true).await.unwrap();
    assert_eq!(learner.resolve("pika").await.method(), MatchMethod::LearnedPattern);

    learner.record_outcome("pika", Some("Pikachu"), false).await.unwrap();
    let resolution = learner.resolve("pika").await;
    assert_eq!(resolution.method(), MatchMethod::FuzzyCache);
    assert!(resolution.confidence() >= 0.7);

    let stats = learner.get_statistics().await.unwrap();
    assert_eq!(stats.learned_pattern_count, 1);
    assert_eq!(stats.high_confidence_pattern_count, 0);
    assert_eq!(stats.success_rate, 0.5);
}

#[tokio::test]
async fn accepting_a_new_name_does_not_inherit_confidence() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Pikachu", "Pichu"]).await;

    for _ in 0..9 {
        learner.record_outcome("pika", Some("Pikachu"), true).await.unwrap();
    }
    let pichu = learner
        .record_outcome("pika", Some("Pichu"), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((pichu.success_count, pichu.total_count), (1, 1));

    assert_eq!(
        learner.resolve("pika").await,
        Resolution::LearnedPattern {
            name: "Pikachu".into(),
            confidence: 1.0
        }
    );

    let stats = learner.get_statistics().await.unwrap();
    assert_eq!(stats.learned_pattern_count, 2);
}

#[tokio::test]
async fn correction_outranks_trusted_pattern() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Mewtwo", "Mew"]).await;

    for _ in 0..3 {
        learner.record_outcome("mevv", Some("Mewtwo"), true).await.unwrap();
    }
    assert_eq!(learner.resolve("mevv").await.method(), MatchMethod::LearnedPattern);

    learner.record_correction("mevv", "Mew").await.unwrap();
    assert_eq!(
        learner.resolve("mevv").await,
        Resolution::Correction { name: "Mew".into() }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_feedback_loses_no_increments() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Gengar"]).await;

    let mut handles = Vec::new();
    for i in 0..40 {
        let feedback = learner.feedback().clone();
        handles.push(tokio::spawn(async move {
            feedback
                .record_outcome("gengr", Some("Gengar"), i % 2 == 0)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let pattern = learner.database().get_pattern("gengr").await.unwrap().unwrap();
    assert_eq!(pattern.total_count, 40);
    assert_eq!(pattern.success_count, 20);
    assert_eq!(pattern.confidence, 0.5);

    let stats = learner.get_statistics().await.unwrap();
    assert_eq!(stats.scans_by_kind.get(&ScanKind::Ocr), Some(&40));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cache_writes_keep_index_in_step() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &[]).await;

    let names: Vec<String> = (0..20).map(|i| format!("Card {i}")).collect();
    let mut handles = Vec::new();
    for name in names.clone() {
        let matcher = learner.matcher().clone();
        handles.push(tokio::spawn(async move {
            matcher.cache_card(&name, json!({ "name": name })).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(learner.matcher().index().len(), names.len());
    assert_eq!(learner.database().card_count().await.unwrap(), 20);
}

#[tokio::test]
async fn lookups_degrade_to_fuzzy_when_learning_tables_fail() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Pikachu"]).await;

    learner
        .database()
        .execute(|conn| {
            conn.execute_batch("DROP TABLE user_corrections; DROP TABLE ocr_patterns;")?;
            Ok(())
        })
        .await
        .unwrap();

    let resolution = learner.resolve("Pikachu").await;
    assert_eq!(resolution.method(), MatchMethod::FuzzyCache);
    assert_eq!(resolution.candidate(), Some("Pikachu"));

    let err = learner.record_correction("pikachv", "Pikachu").await.unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(matches!(err, LearningError::StoreUnavailable(_)));
}

#[tokio::test]
async fn unloaded_index_resolves_nothing() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("learning.sqlite3")).unwrap();
    db.execute(|conn| {
        conn.execute_batch("DROP TABLE card_cache;")?;
        Ok(())
    })
    .await
    .unwrap();

    let learner = CardLearner::with_database(db, MatcherConfig::default())
        .await
        .unwrap();
    assert!(!learner.matcher().index().is_loaded());

    assert_eq!(learner.resolve("Pikachu").await, Resolution::NoMatch);
    assert!(learner.suggestions("Pikachu").await.is_empty());

    let err = learner.matcher().refresh_index().await.unwrap_err();
    assert!(matches!(err, LearningError::StoreUnavailable(_)));
}

#[tokio::test]
async fn strict_threshold_needs_a_correction() {
    let dir = TempDir::new().unwrap();
    let mut learner = seeded(&dir, &["Charizard"]).await;
    learner
        .update_config(MatcherConfig {
            fuzzy_threshold: 0.9,
            ..MatcherConfig::default()
        })
        .unwrap();

    assert!(similarity("Charzrd", "Charizard") < 0.9);
    assert_eq!(learner.resolve("Charzrd").await, Resolution::NoMatch);

    learner.record_correction("Charzrd", "Charizard").await.unwrap();
    let resolution = learner.resolve("Charzrd").await;
    assert_eq!(resolution.candidate(), Some("Charizard"));
    assert_eq!(resolution.confidence(), 1.0);
    assert_eq!(resolution.method(), MatchMethod::Correction);
}

#[tokio::test]
async fn report_reflects_all_scan_kinds() {
    let dir = TempDir::new().unwrap();
    let learner = seeded(&dir, &["Eevee"]).await;
    learner.record_outcome("eeve", Some("Eevee"), true).await.unwrap();
    learner.record_manual_lookup("Eevee", true).await.unwrap();
    learner.record_correction("eev", "Eevee").await.unwrap();

    let report = learner.export_report().await.unwrap();
    assert!(report.contains("Cached Cards: 1"));
    assert!(report.contains("Total Scans: 3"));
    assert!(report.contains("Success Rate: 100.00%"));
    assert!(report.contains("  manual scans: 1"));
    assert!(report.contains("User Corrections: 1"));
}
