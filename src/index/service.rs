//! Candidate indexing and semantic retrieval over the vector store

use crate::config::IndexConfig;
use crate::embedding::EmbeddingService;
use crate::index::store::{EntryMetadata, VectorEntry, VectorStore};
use crate::model::Candidate;
use crate::ranking::scoring::round4;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// One job description in a multi-job match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobQuery {
    pub job_id: String,
    pub job_description: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Semantic matches for one job in a multi-job request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMatches {
    pub job_id: String,
    pub job_description: String,
    pub candidates: Vec<Candidate>,
}

/// Index availability and occupancy, for status surfaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    pub available: bool,
    pub total_entries: usize,
}

/// Coordinates embedding generation and vector store operations.
///
/// Every operation degrades to an empty result when the index is disabled or
/// a backend is unavailable; indexing and retrieval failures never propagate
/// to callers.
pub struct CandidateIndex {
    enabled: bool,
    list_cap: usize,
    embeddings: Arc<EmbeddingService>,
    store: VectorStore,
}

impl CandidateIndex {
    pub fn new(
        config: &IndexConfig,
        storage_path: impl Into<PathBuf>,
        embeddings: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            enabled: config.enabled,
            list_cap: config.list_cap,
            embeddings,
            store: VectorStore::new(storage_path),
        }
    }

    /// Embed and upsert candidate profiles, returning how many were indexed.
    ///
    /// Candidates without an id are skipped; the rest still index. Returns 0
    /// without error when the index is disabled or either backend is
    /// unavailable, so indexing can never fail an upload flow.
    pub fn index_candidates(&self, candidates: &[Candidate], recruiter_id: &str) -> usize {
        if !self.enabled || candidates.is_empty() {
            return 0;
        }

        if !self.store.is_available() {
            warn!("event=vector_index_skipped reason=store_unavailable");
            return 0;
        }

        let recruiter = if recruiter_id.trim().is_empty() {
            "default"
        } else {
            recruiter_id
        };

        let mut ids: Vec<String> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        let mut metadatas: Vec<EntryMetadata> = Vec::new();

        for candidate in candidates {
            let candidate_id = candidate.id.trim();
            if candidate_id.is_empty() {
                continue;
            }

            ids.push(candidate_id.to_string());
            texts.push(candidate.document_text());
            metadatas.push(EntryMetadata {
                candidate_id: candidate_id.to_string(),
                name: candidate.name.clone(),
                experience_years: candidate.experience_years,
                skills: candidate.skills.join(","),
                recruiter_id: recruiter.to_string(),
            });
        }

        if texts.is_empty() {
            return 0;
        }

        let embeddings = match self.embeddings.embed_batch(&texts) {
            Some(embeddings) => embeddings,
            None => {
                warn!("event=vector_index_skipped reason=embedding_unavailable");
                return 0;
            }
        };

        let entries: Vec<VectorEntry> = ids
            .into_iter()
            .zip(embeddings)
            .zip(texts)
            .zip(metadatas)
            .map(|(((id, embedding), document), metadata)| VectorEntry {
                id,
                embedding,
                document,
                metadata,
            })
            .collect();

        let indexed_count = entries.len();
        if self.store.upsert(entries) {
            info!("event=vector_index_completed indexed_count={}", indexed_count);
            indexed_count
        } else {
            error!("event=vector_index_failed");
            0
        }
    }

    /// Top-k semantically similar candidates for a job description. Results
    /// carry a match score of `max(0, 1 - distance)` rounded to 4 decimals
    /// and are always returned in exact descending score order.
    pub fn semantic_search(
        &self,
        job_description: &str,
        recruiter_id: Option<&str>,
        top_k: usize,
    ) -> Vec<Candidate> {
        if !self.enabled || job_description.trim().is_empty() {
            return Vec::new();
        }

        let query_embedding = match self.embeddings.embed(job_description.trim()) {
            Some(embedding) => embedding,
            None => {
                warn!("event=semantic_search_skipped reason=embedding_unavailable");
                return Vec::new();
            }
        };

        let mut results: Vec<Candidate> = self
            .store
            .query(&query_embedding, top_k, recruiter_id)
            .into_iter()
            .map(|(entry, distance)| {
                let mut candidate = candidate_from_entry(&entry);
                candidate.match_score = Some(round4((1.0 - distance).max(0.0)));
                candidate
            })
            .collect();

        results.sort_by(|a, b| {
            let a_score = a.match_score.unwrap_or(0.0);
            let b_score = b.match_score.unwrap_or(0.0);
            b_score.total_cmp(&a_score)
        });

        results
    }

    /// Run a semantic search per job and group the matches by job id.
    pub fn multi_job_match(
        &self,
        recruiter_id: &str,
        jobs: &[JobQuery],
        default_top_k: usize,
    ) -> Vec<JobMatches> {
        jobs.iter()
            .map(|job| {
                let top_k = match job.top_k {
                    Some(k) if k > 0 => k,
                    _ => default_top_k,
                };
                let job_description = job.job_description.trim().to_string();
                let candidates =
                    self.semantic_search(&job_description, Some(recruiter_id), top_k);

                JobMatches {
                    job_id: job.job_id.clone(),
                    job_description,
                    candidates,
                }
            })
            .collect()
    }

    /// Case-insensitive exact-name lookup over indexed metadata.
    pub fn find_candidate_by_name(
        &self,
        name: &str,
        recruiter_id: Option<&str>,
    ) -> Option<Candidate> {
        if !self.enabled {
            return None;
        }

        self.store
            .find_by_name(name, recruiter_id)
            .map(|entry| candidate_from_entry(&entry))
    }

    /// Bulk metadata listing, capped to bound memory.
    pub fn list_candidates(
        &self,
        recruiter_id: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Candidate> {
        if !self.enabled {
            return Vec::new();
        }

        let cap = limit.unwrap_or(self.list_cap).min(self.list_cap);
        self.store
            .scan(recruiter_id, cap)
            .iter()
            .map(candidate_from_entry)
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            available: self.enabled && self.store.is_available(),
            total_entries: self.store.len(),
        }
    }
}

/// Rebuild a candidate from stored metadata. The summary is not persisted in
/// the index, so it comes back empty.
fn candidate_from_entry(entry: &VectorEntry) -> Candidate {
    Candidate::new(
        entry.metadata.candidate_id.clone(),
        entry.metadata.name.clone(),
        "",
        entry.metadata.experience_years,
        Candidate::split_skills(&entry.metadata.skills),
    )
}
