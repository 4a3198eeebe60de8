//! Integration tests for the candidate ranker

use candidate_ranker::config::{EmbeddingConfig, IndexConfig};
use candidate_ranker::embedding::EmbeddingService;
use candidate_ranker::index::{CandidateIndex, EntryMetadata, JobQuery, VectorEntry, VectorStore};
use candidate_ranker::model::Candidate;
use candidate_ranker::ranking::{
    AdjustmentOutcome, FeedbackStore, FeedbackSubmission, RankingEngine, ScoringEngine,
    WeightVector, WeightsManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn disabled_embedding_config() -> EmbeddingConfig {
    EmbeddingConfig {
        models_dir: PathBuf::from("/nonexistent"),
        model_name: "test-model".to_string(),
        batch_size: 8,
        cache_capacity: 64,
        enabled: false,
    }
}

fn unavailable_embeddings() -> Arc<EmbeddingService> {
    Arc::new(EmbeddingService::unavailable(&disabled_embedding_config()))
}

fn candidate(id: &str, name: &str, summary: &str, years: f32, skills: &[&str]) -> Candidate {
    Candidate::new(
        id,
        name,
        summary,
        years,
        skills.iter().map(|s| s.to_string()).collect(),
    )
}

fn submission(candidate_id: &str, is_relevant: bool, score: f32) -> FeedbackSubmission {
    FeedbackSubmission {
        candidate_id: candidate_id.to_string(),
        job_id: "backend-01".to_string(),
        recruiter_id: "rec-1".to_string(),
        is_relevant,
        predicted_score: score,
        feedback_reason: String::new(),
    }
}

fn entry(id: &str, embedding: Vec<f32>, recruiter: &str, name: &str) -> VectorEntry {
    VectorEntry {
        id: id.to_string(),
        embedding,
        document: format!("{} profile", name),
        metadata: EntryMetadata {
            candidate_id: id.to_string(),
            name: name.to_string(),
            experience_years: 4.0,
            skills: "Python, SQL".to_string(),
            recruiter_id: recruiter.to_string(),
        },
    }
}

fn engine_in(dir: &TempDir) -> RankingEngine {
    RankingEngine::new(
        WeightsManager::new(dir.path().join("weights.json")),
        FeedbackStore::new(dir.path().join("feedback.json")),
        30,
    )
}

#[test]
fn test_weights_survive_restart() {
    let dir = TempDir::new().unwrap();

    let manager = WeightsManager::new(dir.path().join("weights.json"));
    let updated = manager.update(Some(0.6), Some(0.15), Some(0.25));

    let reloaded = WeightsManager::new(dir.path().join("weights.json"));
    let weights = reloaded.get();

    assert!((weights.skills - updated.skills).abs() < 1e-6);
    assert!((weights.experience - updated.experience).abs() < 1e-6);
    assert!((weights.summary - updated.summary).abs() < 1e-6);
}

#[test]
fn test_repeated_adjustments_keep_weights_bounded_and_normalized() {
    let dir = TempDir::new().unwrap();
    let manager = WeightsManager::new(dir.path().join("weights.json"));

    // The correction path only ever steps every component down by a fixed
    // amount; walk that trajectory and hold the invariants throughout.
    for _ in 0..20 {
        let current = manager.get();
        let weights = manager.update(
            Some(current.skills - 0.02),
            Some(current.experience - 0.02),
            Some(current.summary - 0.02),
        );

        assert!((weights.sum() - 1.0).abs() < 1e-3);
        assert!(weights.skills >= WeightVector::MIN.skills - 1e-3);
        assert!(weights.skills <= WeightVector::MAX.skills + 1e-3);
        assert!(weights.experience >= WeightVector::MIN.experience - 1e-3);
        assert!(weights.experience <= WeightVector::MAX.experience + 1e-3);
        assert!(weights.summary >= WeightVector::MIN.summary - 1e-3);
        assert!(weights.summary <= WeightVector::MAX.summary + 1e-3);
    }
}

#[test]
fn test_reset_restores_exact_defaults_across_restart() {
    let dir = TempDir::new().unwrap();

    let manager = WeightsManager::new(dir.path().join("weights.json"));
    manager.update(Some(0.8), None, None);
    let reset = manager.reset();
    assert_eq!(reset, WeightVector::DEFAULT);

    let reloaded = WeightsManager::new(dir.path().join("weights.json"));
    assert_eq!(reloaded.get(), WeightVector::DEFAULT);
}

#[test]
fn test_feedback_loop_adjusts_and_persists_weights() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    let submissions: Vec<FeedbackSubmission> = (0..6)
        .map(|i| submission(&format!("c{}", i), false, 0.9))
        .collect();

    let outcome = engine.record_batch(&submissions, true, 100);
    assert_eq!(outcome.recorded, 6);
    assert_eq!(outcome.rejected, 0);

    let new_weights = match outcome.adjustment {
        Some(AdjustmentOutcome::Adjusted {
            adjustments,
            new_weights,
            ..
        }) => {
            assert!(adjustments.skills < 0.0);
            assert!(adjustments.experience < 0.0);
            assert!(adjustments.summary < 0.0);
            new_weights
        }
        other => panic!("Expected adjusted outcome, got {:?}", other),
    };

    // A fresh engine over the same storage paths sees both the feedback log
    // and the adjusted weights.
    let restarted = engine_in(&dir);
    assert_eq!(restarted.feedback_store().all().len(), 6);
    let reloaded = restarted.weights();
    assert!((reloaded.skills - new_weights.skills).abs() < 1e-6);
    assert!((reloaded.experience - new_weights.experience).abs() < 1e-6);
    assert!((reloaded.summary - new_weights.summary).abs() < 1e-6);
}

#[test]
fn test_feedback_stats_reflect_recorded_judgments() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    for i in 0..3 {
        engine.record_and_adjust(&submission(&format!("good{}", i), true, 0.8), false, 100);
    }
    for i in 0..2 {
        engine.record_and_adjust(&submission(&format!("bad{}", i), false, 0.4), false, 100);
    }

    let stats = engine.stats(None);
    assert_eq!(stats.total_feedback, 5);
    assert_eq!(stats.relevant_count, 3);
    assert_eq!(stats.irrelevant_count, 2);
    assert!((stats.accuracy - 0.6).abs() < 1e-6);
    assert!((stats.avg_predicted_score_relevant - 0.8).abs() < 1e-6);
    assert!((stats.avg_predicted_score_irrelevant - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn test_scoring_respects_adaptive_weights() {
    let dir = TempDir::new().unwrap();
    let manager = WeightsManager::new(dir.path().join("weights.json"));
    let scoring = ScoringEngine::new(unavailable_embeddings()).unwrap();

    let pool = vec![
        candidate("veteran", "Veteran", "Team lead", 10.0, &[]),
        candidate(
            "specialist",
            "Specialist",
            "Python Flask SQL services",
            1.0,
            &["Python", "Flask", "SQL"],
        ),
    ];
    let job = "Python developer with Flask and SQL, minimum 5 years experience";

    let skill_heavy = manager.update(Some(0.8), Some(0.05), Some(0.1));
    let ranked = scoring
        .score_candidates(job, pool.clone(), &skill_heavy, false)
        .await;
    assert_eq!(ranked[0].id, "specialist");

    let experience_heavy = manager.update(Some(0.2), Some(0.5), Some(0.1));
    let ranked = scoring
        .score_candidates(job, pool, &experience_heavy, false)
        .await;
    assert_eq!(ranked[0].id, "veteran");
}

#[tokio::test]
async fn test_ranked_candidates_carry_breakdown_and_reasons() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let scoring = ScoringEngine::new(unavailable_embeddings()).unwrap();

    let pool = vec![candidate(
        "c1",
        "Dana",
        "Python backend developer",
        4.0,
        &["Python", "Flask"],
    )];
    let ranked = scoring
        .score_candidates(
            "Python developer with Flask, minimum 2 years experience",
            pool,
            &engine.weights(),
            false,
        )
        .await;

    let scored = &ranked[0];
    assert!(scored.match_score.is_some());
    let breakdown = scored.score_breakdown.as_ref().unwrap();
    assert_eq!(breakdown.skills_score, 1.0);
    assert_eq!(breakdown.experience_score, 1.0);
    assert_eq!(breakdown.semantic_score, 0.0);
    assert!(scored
        .match_reasons
        .iter()
        .any(|r| r.to_lowercase().contains("python")));
}

#[test]
fn test_index_degrades_without_embedding_backend() {
    let dir = TempDir::new().unwrap();
    let config = IndexConfig {
        enabled: true,
        list_cap: 500,
    };
    let index = CandidateIndex::new(
        &config,
        dir.path().join("index.json"),
        unavailable_embeddings(),
    );

    let pool = vec![candidate("c1", "Dana", "Python dev", 4.0, &["Python"])];

    assert_eq!(index.index_candidates(&pool, "rec-1"), 0);
    assert!(index.semantic_search("python", None, 5).is_empty());
    assert!(index.list_candidates(None, None).is_empty());
    assert!(index.find_candidate_by_name("Dana", None).is_none());

    let jobs = vec![JobQuery {
        job_id: "j1".to_string(),
        job_description: "python developer".to_string(),
        top_k: None,
    }];
    let matches = index.multi_job_match("rec-1", &jobs, 5);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].candidates.is_empty());

    let stats = index.stats();
    assert_eq!(stats.total_entries, 0);
}

#[test]
fn test_vector_store_reload_preserves_entries_and_ordering() {
    let dir = TempDir::new().unwrap();

    let store = VectorStore::new(dir.path().join("index.json"));
    assert!(store.upsert(vec![
        entry("a", vec![1.0, 0.0], "rec-1", "Aligned"),
        entry("b", vec![0.6, 0.8], "rec-1", "Slanted"),
        entry("c", vec![0.0, 1.0], "rec-2", "Orthogonal"),
    ]));

    let reloaded = VectorStore::new(dir.path().join("index.json"));
    assert_eq!(reloaded.len(), 3);

    let results = reloaded.query(&[1.0, 0.0], 10, Some("rec-1"));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, "a");
    assert!(results[0].1 <= results[1].1);

    let all = reloaded.query(&[1.0, 0.0], 10, None);
    assert_eq!(all.len(), 3);
    let distances: Vec<f32> = all.iter().map(|(_, d)| *d).collect();
    let mut sorted = distances.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(distances, sorted);
}

#[test]
fn test_feedback_log_survives_restart() {
    let dir = TempDir::new().unwrap();

    let store = FeedbackStore::new(dir.path().join("feedback.json"));
    store.record("c1", "j1", "rec-1", true, 0.9, "great fit");
    store.record("c2", "j1", "rec-1", false, 0.7, "");

    let reloaded = FeedbackStore::new(dir.path().join("feedback.json"));
    let records = reloaded.all();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].candidate_id, "c1");
    assert_eq!(records[0].feedback_reason, "great fit");
    assert!(!records[1].is_relevant);
}
