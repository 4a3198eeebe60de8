//! File-backed vector storage with exact nearest-neighbor scans

use crate::embedding::EmbeddingService;
use crate::error::CandidateRankerError;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Metadata carried alongside each stored vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub candidate_id: String,
    pub name: String,
    pub experience_years: f32,
    /// Comma-joined skill list.
    pub skills: String,
    pub recruiter_id: String,
}

/// One stored vector with the document it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: EntryMetadata,
}

/// Vector store persisted as a single JSON file, with brute-force exact
/// nearest-neighbor queries.
///
/// Collection sizes are small (one recruiter's candidate pool), so an exact
/// scan stays well within budget and avoids approximate-index recall issues.
/// If storage initialization fails the store latches unavailable for the
/// process lifetime; every operation then degrades to a no-op.
pub struct VectorStore {
    storage_path: PathBuf,
    entries: Mutex<HashMap<String, VectorEntry>>,
    available: bool,
}

impl VectorStore {
    /// Open or create a store at the given path. Initialization failure
    /// (storage directory cannot be created) yields an unavailable store
    /// rather than an error.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();

        let available = match storage_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).is_ok()
            }
            _ => true,
        };

        let entries = if available {
            Self::load(&storage_path)
        } else {
            error!(
                "event=vector_store_unavailable path={}",
                storage_path.display()
            );
            HashMap::new()
        };

        Self {
            storage_path,
            entries: Mutex::new(entries),
            available,
        }
    }

    fn load(path: &Path) -> HashMap<String, VectorEntry> {
        if !path.exists() {
            return HashMap::new();
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(CandidateRankerError::from)
            .and_then(|text| {
                serde_json::from_str::<HashMap<String, VectorEntry>>(&text)
                    .map_err(CandidateRankerError::from)
            });

        match loaded {
            Ok(entries) => {
                info!("event=vector_store_loaded entries={}", entries.len());
                entries
            }
            Err(e) => {
                error!("event=vector_store_load_failed error={}", e);
                HashMap::new()
            }
        }
    }

    fn persist_locked(&self, entries: &HashMap<String, VectorEntry>) -> bool {
        let result = serde_json::to_string(entries)
            .map_err(CandidateRankerError::from)
            .and_then(|json| {
                std::fs::write(&self.storage_path, json).map_err(CandidateRankerError::from)
            });

        if let Err(e) = result {
            error!("event=vector_store_save_failed error={}", e);
            return false;
        }
        true
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace entries keyed by id. Returns whether the updated
    /// collection was persisted.
    pub fn upsert(&self, batch: Vec<VectorEntry>) -> bool {
        if !self.available {
            return false;
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for entry in batch {
            entries.insert(entry.id.clone(), entry);
        }

        self.persist_locked(&entries)
    }

    /// Exact nearest-neighbor query, optionally restricted to one recruiter.
    /// Returns up to `top_k` entries paired with their cosine distance,
    /// nearest first.
    pub fn query(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        recruiter_id: Option<&str>,
    ) -> Vec<(VectorEntry, f32)> {
        if !self.available {
            return Vec::new();
        }

        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut scored: Vec<(VectorEntry, f32)> = entries
            .values()
            .filter(|entry| {
                recruiter_id.map_or(true, |recruiter| entry.metadata.recruiter_id == recruiter)
            })
            .map(|entry| {
                // Entries embedded by a different model dimension score as
                // maximally distant instead of failing the query.
                let similarity =
                    EmbeddingService::cosine_similarity(&entry.embedding, query_embedding)
                        .unwrap_or(0.0);
                (entry.clone(), 1.0 - similarity)
            })
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(top_k.max(1));
        scored
    }

    /// Bulk metadata scan in stable id order, capped at `limit` entries.
    pub fn scan(&self, recruiter_id: Option<&str>, limit: usize) -> Vec<VectorEntry> {
        if !self.available {
            return Vec::new();
        }

        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut matched: Vec<VectorEntry> = entries
            .values()
            .filter(|entry| {
                recruiter_id.map_or(true, |recruiter| entry.metadata.recruiter_id == recruiter)
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched.truncate(limit);
        matched
    }

    /// Case-insensitive exact-name lookup. Ties on duplicate names resolve
    /// to the smallest id.
    pub fn find_by_name(&self, name: &str, recruiter_id: Option<&str>) -> Option<VectorEntry> {
        if !self.available {
            return None;
        }

        let target = name.trim().to_lowercase();
        if target.is_empty() {
            return None;
        }

        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|entry| {
                recruiter_id.map_or(true, |recruiter| entry.metadata.recruiter_id == recruiter)
            })
            .filter(|entry| entry.metadata.name.trim().to_lowercase() == target)
            .min_by(|a, b| a.id.cmp(&b.id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: &str, embedding: Vec<f32>, name: &str, recruiter: &str) -> VectorEntry {
        VectorEntry {
            id: id.to_string(),
            embedding,
            document: format!("{} profile", name),
            metadata: EntryMetadata {
                candidate_id: id.to_string(),
                name: name.to_string(),
                experience_years: 3.0,
                skills: "python,flask".to_string(),
                recruiter_id: recruiter.to_string(),
            },
        }
    }

    fn store_in(dir: &TempDir) -> VectorStore {
        VectorStore::new(dir.path().join("index.json"))
    }

    #[test]
    fn test_query_returns_nearest_first() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![
            entry("far", vec![0.0, 1.0], "Far", "r1"),
            entry("near", vec![1.0, 0.0], "Near", "r1"),
            entry("mid", vec![0.7, 0.7], "Mid", "r1"),
        ]);

        let hits = store.query(&[1.0, 0.0], 3, None);

        assert_eq!(hits[0].0.id, "near");
        assert_eq!(hits[1].0.id, "mid");
        assert_eq!(hits[2].0.id, "far");
        assert!(hits[0].1 <= hits[1].1 && hits[1].1 <= hits[2].1);
    }

    #[test]
    fn test_query_respects_recruiter_filter() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![
            entry("a", vec![1.0, 0.0], "A", "r1"),
            entry("b", vec![1.0, 0.0], "B", "r2"),
        ]);

        let hits = store.query(&[1.0, 0.0], 5, Some("r2"));

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.id, "b");
    }

    #[test]
    fn test_query_caps_results_at_top_k() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![
            entry("a", vec![1.0, 0.0], "A", "r1"),
            entry("b", vec![0.9, 0.1], "B", "r1"),
            entry("c", vec![0.8, 0.2], "C", "r1"),
        ]);

        assert_eq!(store.query(&[1.0, 0.0], 2, None).len(), 2);
        // top_k of zero still returns the single nearest entry.
        assert_eq!(store.query(&[1.0, 0.0], 0, None).len(), 1);
    }

    #[test]
    fn test_upsert_replaces_existing_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![entry("a", vec![1.0, 0.0], "Old Name", "r1")]);
        store.upsert(vec![entry("a", vec![0.0, 1.0], "New Name", "r1")]);

        assert_eq!(store.len(), 1);
        let found = store.find_by_name("new name", None).unwrap();
        assert_eq!(found.id, "a");
    }

    #[test]
    fn test_scan_sorts_and_caps() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![
            entry("c", vec![1.0], "C", "r1"),
            entry("a", vec![1.0], "A", "r1"),
            entry("b", vec![1.0], "B", "r1"),
        ]);

        let scanned = store.scan(None, 2);

        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].id, "a");
        assert_eq!(scanned[1].id, "b");
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.upsert(vec![entry("a", vec![1.0], "Dana Smith", "r1")]);

        assert!(store.find_by_name("dana smith", None).is_some());
        assert!(store.find_by_name("DANA SMITH", Some("r1")).is_some());
        assert!(store.find_by_name("dana smith", Some("r2")).is_none());
        assert!(store.find_by_name("unknown", None).is_none());
    }

    #[test]
    fn test_entries_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        {
            let store = VectorStore::new(&path);
            store.upsert(vec![entry("a", vec![1.0, 2.0], "A", "r1")]);
        }

        let reloaded = VectorStore::new(&path);

        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find_by_name("a", None).is_some());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "[not a map]").unwrap();

        let store = VectorStore::new(&path);

        assert!(store.is_available());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unavailable_store_degrades_to_noops() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = VectorStore::new(blocker.join("sub").join("index.json"));

        assert!(!store.is_available());
        assert!(!store.upsert(vec![entry("a", vec![1.0], "A", "r1")]));
        assert!(store.query(&[1.0], 5, None).is_empty());
        assert!(store.scan(None, 10).is_empty());
    }
}
