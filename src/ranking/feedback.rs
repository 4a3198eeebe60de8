//! Append-only recruiter feedback log

use crate::error::CandidateRankerError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recruiter relevance judgment on a candidate-job pairing. Immutable
/// once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub candidate_id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub is_relevant: bool,
    pub predicted_score: f32,
    #[serde(default)]
    pub feedback_reason: String,
    pub timestamp: String,
}

/// Aggregate feedback statistics over a look-back window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub relevant_count: usize,
    pub irrelevant_count: usize,
    pub accuracy: f32,
    pub period_days: i64,
    pub avg_predicted_score_relevant: f32,
    pub avg_predicted_score_irrelevant: f32,
}

/// Append-only feedback collection, persisted as a whole on every append.
/// Whole-file writes are acceptable at recruiter-triggered volumes.
pub struct FeedbackStore {
    storage_path: PathBuf,
    records: Mutex<Vec<FeedbackRecord>>,
}

impl FeedbackStore {
    /// Create a store backed by the given file, loading any persisted
    /// history. Missing or corrupt storage starts empty without failing.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let records = Self::load(&storage_path);

        Self {
            storage_path,
            records: Mutex::new(records),
        }
    }

    fn load(path: &Path) -> Vec<FeedbackRecord> {
        if !path.exists() {
            return Vec::new();
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(CandidateRankerError::from)
            .and_then(|text| {
                serde_json::from_str::<Vec<FeedbackRecord>>(&text)
                    .map_err(CandidateRankerError::from)
            });

        match loaded {
            Ok(records) => {
                info!("event=feedback_history_loaded count={}", records.len());
                records
            }
            Err(e) => {
                error!("event=feedback_history_load_failed error={}", e);
                Vec::new()
            }
        }
    }

    fn save_locked(&self, records: &[FeedbackRecord]) {
        let result = serde_json::to_string_pretty(records)
            .map_err(CandidateRankerError::from)
            .and_then(|json| {
                std::fs::write(&self.storage_path, json).map_err(CandidateRankerError::from)
            });

        if let Err(e) = result {
            error!("event=feedback_history_save_failed error={}", e);
        }
    }

    /// Append one feedback record and persist the log.
    ///
    /// Input validation (score range, non-empty ids) is the caller's
    /// responsibility. The id embeds a unix-second timestamp; a same-second
    /// resubmission of the same triple produces a duplicate id and the log
    /// keeps both entries.
    pub fn record(
        &self,
        candidate_id: &str,
        job_id: &str,
        recruiter_id: &str,
        is_relevant: bool,
        predicted_score: f32,
        feedback_reason: &str,
    ) -> FeedbackRecord {
        let now = Utc::now();
        let record = FeedbackRecord {
            id: format!(
                "{}_{}_{}_{}",
                candidate_id,
                job_id,
                recruiter_id,
                now.timestamp()
            ),
            candidate_id: candidate_id.to_string(),
            job_id: job_id.to_string(),
            recruiter_id: recruiter_id.to_string(),
            is_relevant,
            predicted_score,
            feedback_reason: feedback_reason.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.push(record.clone());
            self.save_locked(&records);
        }

        info!(
            "event=feedback_recorded candidate_id={} job_id={} is_relevant={}",
            candidate_id, job_id, is_relevant
        );

        record
    }

    /// Aggregate statistics over records newer than `now - days`, optionally
    /// filtered by recruiter.
    pub fn stats(&self, recruiter_id: Option<&str>, days: i64) -> FeedbackStats {
        let cutoff = Utc::now() - Duration::days(days);

        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut relevant_scores: Vec<f32> = Vec::new();
        let mut irrelevant_scores: Vec<f32> = Vec::new();

        for record in records.iter() {
            if !Self::in_window(record, recruiter_id, cutoff) {
                continue;
            }
            if record.is_relevant {
                relevant_scores.push(record.predicted_score);
            } else {
                irrelevant_scores.push(record.predicted_score);
            }
        }
        drop(records);

        let relevant_count = relevant_scores.len();
        let irrelevant_count = irrelevant_scores.len();
        let total = relevant_count + irrelevant_count;

        FeedbackStats {
            total_feedback: total,
            relevant_count,
            irrelevant_count,
            accuracy: if total > 0 {
                relevant_count as f32 / total as f32
            } else {
                0.0
            },
            period_days: days,
            avg_predicted_score_relevant: average(&relevant_scores),
            avg_predicted_score_irrelevant: average(&irrelevant_scores),
        }
    }

    fn in_window(
        record: &FeedbackRecord,
        recruiter_id: Option<&str>,
        cutoff: DateTime<Utc>,
    ) -> bool {
        if let Some(recruiter) = recruiter_id {
            if record.recruiter_id != recruiter {
                return false;
            }
        }

        // Records with unparseable timestamps fall outside every window.
        DateTime::parse_from_rfc3339(&record.timestamp)
            .map(|ts| ts.with_timezone(&Utc) >= cutoff)
            .unwrap_or(false)
    }

    /// Copy of the full log in insertion order.
    pub fn all(&self) -> Vec<FeedbackRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent `limit` records, oldest first.
    pub fn history(&self, limit: usize) -> Vec<FeedbackRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let start = records.len().saturating_sub(limit);
        records[start..].to_vec()
    }

    /// Drop every record and persist the empty log.
    pub fn clear(&self) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.clear();
        self.save_locked(&records);
    }
}

fn average(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FeedbackStore {
        FeedbackStore::new(dir.path().join("feedback.json"))
    }

    #[test]
    fn test_record_builds_composite_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let record = store.record("cand-1", "job-9", "rec-3", true, 0.82, "");

        assert!(record.id.starts_with("cand-1_job-9_rec-3_"));
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn test_stats_counts_and_accuracy() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.record("c1", "j1", "r1", true, 0.9, "");
        store.record("c2", "j1", "r1", true, 0.7, "");
        store.record("c3", "j1", "r1", false, 0.8, "bad fit");

        let stats = store.stats(None, 30);

        assert_eq!(stats.total_feedback, 3);
        assert_eq!(stats.relevant_count, 2);
        assert_eq!(stats.irrelevant_count, 1);
        assert!((stats.accuracy - 2.0 / 3.0).abs() < 1e-5);
        assert!((stats.avg_predicted_score_relevant - 0.8).abs() < 1e-5);
        assert!((stats.avg_predicted_score_irrelevant - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_stats_empty_store_has_zero_accuracy() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let stats = store.stats(None, 30);

        assert_eq!(stats.total_feedback, 0);
        assert_eq!(stats.accuracy, 0.0);
    }

    #[test]
    fn test_stats_filters_by_recruiter() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.record("c1", "j1", "r1", true, 0.9, "");
        store.record("c2", "j1", "r2", false, 0.4, "");

        let stats = store.stats(Some("r1"), 30);

        assert_eq!(stats.total_feedback, 1);
        assert_eq!(stats.relevant_count, 1);
    }

    #[test]
    fn test_history_returns_most_recent_records() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for i in 0..5 {
            store.record(&format!("c{}", i), "j1", "r1", true, 0.5, "");
        }

        let history = store.history(2);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].candidate_id, "c3");
        assert_eq!(history[1].candidate_id, "c4");
    }

    #[test]
    fn test_log_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");

        {
            let store = FeedbackStore::new(&path);
            store.record("c1", "j1", "r1", true, 0.9, "");
            store.record("c2", "j1", "r1", false, 0.3, "");
        }

        let reloaded = FeedbackStore::new(&path);

        assert_eq!(reloaded.all().len(), 2);
    }

    #[test]
    fn test_clear_empties_log_and_storage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");

        let store = FeedbackStore::new(&path);
        store.record("c1", "j1", "r1", true, 0.9, "");
        store.clear();

        assert!(store.all().is_empty());
        assert!(FeedbackStore::new(&path).all().is_empty());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "{broken").unwrap();

        let store = FeedbackStore::new(&path);

        assert!(store.all().is_empty());
    }
}
